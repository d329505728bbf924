//! Authentication command.

use gcal_core::AuthState;
use tracing::info;

use crate::error::ClientResult;
use crate::lifecycle::TokenLifecycle;

/// What `gcal auth` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn,
    AlreadySignedIn,
    LoggedOut,
}

/// Signs in, checks an existing sign-in, or logs out.
///
/// With stored tokens and no `force`, the access token is validated (and
/// refreshed if needed) instead of starting a new grant.
pub async fn run(lifecycle: &TokenLifecycle, logout: bool, force: bool) -> ClientResult<AuthOutcome> {
    if logout {
        lifecycle.logout().await?;
        println!("Logged out. Stored Google credentials were removed.");
        return Ok(AuthOutcome::LoggedOut);
    }

    let state = lifecycle.state().await?;
    info!(state = %state, force, "auth requested");
    if state != AuthState::Unauthenticated && !force {
        lifecycle.ensure_valid().await?;
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to re-authenticate.");
        return Ok(AuthOutcome::AlreadySignedIn);
    }

    println!("Starting Google Calendar authentication...");
    lifecycle.authenticate().await?;
    println!("Authentication successful! Tokens are stored in the system keyring.");
    Ok(AuthOutcome::SignedIn)
}
