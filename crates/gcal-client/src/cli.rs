//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::calendar::CalendarFields;

/// gcal - Google Calendar from the terminal
#[derive(Debug, Parser)]
#[command(name = "gcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "GCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the token broker (overrides config)
    #[arg(long, global = true, env = "GCAL_BROKER_URL")]
    pub broker_url: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grant access to your Google account
    Auth {
        /// Delete the stored Google credentials
        #[arg(long)]
        logout: bool,

        /// Run the consent flow even if already authenticated
        #[arg(long, conflicts_with = "logout")]
        force: bool,
    },

    /// Choose the calendar event commands operate on
    Checkout {
        /// Calendar id (prompts when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// List all calendars
    GetCalendar {
        /// Show as a table
        #[arg(long)]
        table: bool,
    },

    /// Create a calendar
    CreateCalendar {
        #[command(flatten)]
        fields: CalendarArgs,
    },

    /// Update a calendar
    UpdateCalendar {
        /// Calendar id (prompts when omitted)
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        fields: CalendarArgs,
    },

    /// Delete a calendar
    DeleteCalendar {
        /// Calendar id (prompts when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// List events of the current calendar
    GetEvents {
        /// Start of the window (MM-DD-YYYY HH:MM or RFC 3339), default now
        #[arg(long)]
        from: Option<String>,

        /// End of the window, default end of today
        #[arg(long)]
        to: Option<String>,

        /// Maximum number of events (at most 20)
        #[arg(long)]
        max_results: Option<u32>,
    },

    /// Create an event in the current calendar
    CreateEvent {
        /// Event title
        #[arg(long)]
        summary: String,

        /// Start time (MM-DD-YYYY HH:MM or RFC 3339)
        #[arg(long)]
        from: String,

        /// End time
        #[arg(long)]
        to: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Color name from the [event_colors] table
        #[arg(long)]
        color: Option<String>,
    },

    /// Update an event chosen among those in a window
    UpdateEvent {
        /// Start of the search window
        #[arg(long)]
        start: String,

        /// End of the search window
        #[arg(long)]
        end: String,

        /// New start time
        #[arg(long)]
        from: String,

        /// New end time
        #[arg(long)]
        to: String,

        #[arg(long)]
        summary: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete an event chosen among those in a window
    DeleteEvent {
        /// Start of the search window
        #[arg(long)]
        start: String,

        /// End of the search window
        #[arg(long)]
        end: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Calendar fields shared by create and update.
#[derive(Debug, Clone, Args)]
pub struct CalendarArgs {
    /// Calendar title
    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// IANA timezone, e.g. Europe/Paris
    #[arg(long)]
    pub timezone: Option<String>,

    #[arg(long)]
    pub location: Option<String>,
}

impl From<CalendarArgs> for CalendarFields {
    fn from(args: CalendarArgs) -> Self {
        Self {
            summary: args.summary,
            description: args.description,
            timezone: args.timezone,
            location: args.location,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,
    /// Check the configuration
    Validate,
    /// Show configuration file paths
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_event_window() {
        let cli = Cli::try_parse_from([
            "gcal",
            "get-events",
            "--from",
            "06-01-2025 09:00",
            "--max-results",
            "50",
        ])
        .unwrap();
        match cli.command {
            Command::GetEvents {
                from, max_results, ..
            } => {
                assert_eq!(from.as_deref(), Some("06-01-2025 09:00"));
                assert_eq!(max_results, Some(50));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn logout_conflicts_with_force() {
        assert!(Cli::try_parse_from(["gcal", "auth", "--logout", "--force"]).is_err());
    }

    #[test]
    fn create_event_requires_times() {
        assert!(Cli::try_parse_from(["gcal", "create-event", "--summary", "x"]).is_err());
    }
}
