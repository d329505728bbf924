//! gcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use gcal_core::{TracingConfig, init_tracing};

use gcal_client::broker::BrokerClient;
use gcal_client::browser::SystemBrowser;
use gcal_client::cli::{Cli, Command, ConfigAction};
use gcal_client::commands::{self, Context, calendar, event};
use gcal_client::config::ClientConfig;
use gcal_client::current::CurrentCalendar;
use gcal_client::error::ClientResult;
use gcal_client::lifecycle::TokenLifecycle;
use gcal_client::prompt::TerminalPicker;
use gcal_client::store::KeyringStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    if let Some(url) = cli.broker_url {
        config.broker.url = url;
    }
    let current_path = CurrentCalendar::default_path();

    let command = match cli.command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Dump => commands::config::dump(&config, &config_path),
                ConfigAction::Validate => commands::config::validate(&config),
                ConfigAction::Path => commands::config::path(&config_path, &current_path),
            };
        }
        command => command,
    };

    let lifecycle = TokenLifecycle::new(
        Box::new(KeyringStore::new(config.keyring.service.clone())),
        Box::new(BrokerClient::new(config.broker_http()?)?),
        Box::new(SystemBrowser),
        config.callback.clone(),
    );
    let mut ctx = Context::new(config, lifecycle, Box::new(TerminalPicker), current_path)?;

    match command {
        Command::Auth { logout, force } => {
            commands::auth::run(&ctx.lifecycle, logout, force).await?;
        }
        Command::Checkout { id } => {
            calendar::checkout(&mut ctx, id).await?;
        }
        Command::GetCalendar { table } => calendar::list(&ctx, table).await?,
        Command::CreateCalendar { fields } => {
            calendar::create(&ctx, fields.into()).await?;
        }
        Command::UpdateCalendar { id, fields } => {
            calendar::update(&ctx, id, fields.into()).await?;
        }
        Command::DeleteCalendar { id } => calendar::delete(&mut ctx, id).await?,
        Command::GetEvents {
            from,
            to,
            max_results,
        } => {
            event::list(&ctx, from.as_deref(), to.as_deref(), max_results).await?;
        }
        Command::CreateEvent {
            summary,
            from,
            to,
            description,
            location,
            color,
        } => {
            let new_event = event::NewEvent {
                summary,
                from,
                to,
                description,
                location,
                color,
            };
            event::create(&ctx, new_event).await?;
        }
        Command::UpdateEvent {
            start,
            end,
            from,
            to,
            summary,
            description,
            location,
            color,
        } => {
            let changes = event::EventChanges {
                from,
                to,
                summary,
                description,
                location,
                color,
            };
            event::update(&ctx, &start, &end, changes).await?;
        }
        Command::DeleteEvent { start, end } => event::delete(&ctx, &start, &end).await?,
        Command::Config { .. } => {}
    }
    Ok(())
}
