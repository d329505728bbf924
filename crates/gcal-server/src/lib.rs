//! OAuth token broker.
//!
//! Holds the Google client secret and brokers authorization-code and
//! refresh-token grants for the CLI, plus a small set of calendar
//! pass-through routes. The broker keeps no per-user state.
//!
//! ```rust,no_run
//! use gcal_server::{BrokerConfig, BrokerServer, ShutdownHandle};
//!
//! # async fn run() -> Result<(), gcal_server::ServerError> {
//! let server = BrokerServer::bind(&BrokerConfig::default()).await?;
//! let shutdown = ShutdownHandle::new();
//! shutdown.spawn_signal_listener();
//! server.run_until_shutdown(shutdown.wait()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
mod config;
mod error;
mod exchange;
mod handler;
mod secret;
mod server;
mod signals;

pub use config::{BrokerConfig, BrokerFile, DEFAULT_BIND, GoogleSection};
pub use error::{ApiError, ServerError, ServerResult};
pub use exchange::{ExchangeError, TokenExchangeService};
pub use handler::{AppState, SharedState, router};
pub use server::BrokerServer;
pub use signals::ShutdownHandle;
