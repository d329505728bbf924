//! Command-line arguments for `gcal-broker`.

use std::path::PathBuf;

use clap::Parser;

/// OAuth token broker for the gcal CLI.
#[derive(Debug, Clone, Parser)]
#[command(name = "gcal-broker", version, about)]
pub struct BrokerArgs {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GCAL_BROKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on [default: 127.0.0.1:8000].
    #[arg(long, env = "GCAL_BROKER_BIND")]
    pub bind: Option<String>,

    /// Google OAuth client id (supports pass:: and env:: references).
    #[arg(long, env = "GOOGLE_API_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Google OAuth client secret (supports pass:: and env:: references).
    #[arg(long, env = "GOOGLE_API_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Google Cloud Console credentials JSON.
    #[arg(long)]
    pub credentials_file: Option<PathBuf>,

    /// Redirect URL registered with Google.
    #[arg(long)]
    pub redirect_url: Option<String>,

    /// Timeout for calls to Google, in seconds.
    #[arg(long)]
    pub upstream_timeout: Option<u64>,

    /// Human-readable logs instead of JSON.
    #[arg(long)]
    pub pretty_logs: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}
