//! CLI, token store, token lifecycle and calendar commands
//!
//! This crate provides the `gcal` command-line interface.

pub mod broker;
pub mod browser;
pub mod callback;
pub mod cli;
pub mod commands;
pub mod config;
pub mod current;
pub mod error;
pub mod lifecycle;
pub mod prompt;
pub mod render;
pub mod store;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use lifecycle::TokenLifecycle;
