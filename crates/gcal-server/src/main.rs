//! gcal-broker entry point.

use std::process::ExitCode;

use clap::Parser;
use gcal_core::{TracingConfig, TracingOutputFormat, init_tracing};
use gcal_server::cli::BrokerArgs;
use gcal_server::{BrokerConfig, BrokerServer, ServerResult, ShutdownHandle};
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let args = BrokerArgs::parse();

    let mut tracing_config = TracingConfig::daemon();
    if args.pretty_logs {
        tracing_config = tracing_config.with_format(TracingOutputFormat::Pretty);
    }
    if args.debug {
        tracing_config = tracing_config.with_level(Level::DEBUG);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: BrokerArgs) -> ServerResult<()> {
    let config = BrokerConfig::resolve(&args)?;
    let server = BrokerServer::bind(&config).await?;

    let shutdown = ShutdownHandle::new();
    shutdown.spawn_signal_listener();
    server.run_until_shutdown(shutdown.wait()).await
}
