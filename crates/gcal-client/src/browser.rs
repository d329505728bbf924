//! Sending the user to the consent page.

use tracing::warn;

use crate::store::BoxFuture;

/// Opens a URL for the user.
///
/// Returns once the URL has been handed off; opening is best effort.
pub trait BrowserOpener: Send + Sync {
    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ()>;
}

/// Opens the system browser and prints the URL as a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            eprintln!("Opening your browser to authorize access.");
            if let Err(e) = open::that(url) {
                warn!("failed to open browser: {}", e);
            }
            eprintln!("\nIf the browser did not open, visit this URL:\n\n{}\n", url);
        })
    }
}
