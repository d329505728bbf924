//! TCP listener and serve loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::BrokerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{AppState, router};

/// A bound broker, ready to serve.
pub struct BrokerServer {
    listener: TcpListener,
    router: Router,
}

impl BrokerServer {
    /// Binds the configured address and builds the router.
    pub async fn bind(config: &BrokerConfig) -> ServerResult<Self> {
        let state = Arc::new(AppState {
            exchange: config.exchange_service()?,
        });
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind,
                source,
            })?;

        Ok(Self {
            listener,
            router: router(state),
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until `shutdown` completes, then drains in-flight ones.
    pub async fn run_until_shutdown<S>(self, shutdown: S) -> ServerResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(addr = %addr, "broker listening");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Shutdown signal received");
            })
            .await?;

        info!("broker stopped");
        Ok(())
    }
}
