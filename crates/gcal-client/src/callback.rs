//! One-shot loopback listener for the OAuth redirect.
//!
//! The browser is sent back to `http://{host}:{port}{path}?code=..&state=..`.
//! [`CallbackListener`] owns the socket; dropping it frees the port, so a
//! caller that keeps it in a local releases it on every exit path.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::CallbackSettings;

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization Successful</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization Failed</h1>\
    <p>You can close this window.</p></body></html>";

/// Upper bound on a request line plus headers.
const MAX_REQUEST_HEAD: u64 = 8 * 1024;

/// How long a connection may take to send its request head.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

const NOT_FOUND: &str =
    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Errors from the redirect listener.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to bind callback listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("callback connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no redirect received within {0:?}")]
    Timeout(Duration),

    #[error("authorization denied: {0}")]
    Denied(String),

    #[error("missing authorization code in callback")]
    MissingCode,

    #[error("OAuth state mismatch")]
    StateMismatch,
}

/// Query parameters of the redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackRequest {
    /// Parses the query string of a request target such as
    /// `/oauth/callback?code=abc&state=xyz`.
    pub fn from_query(query: &str) -> Self {
        let mut request = Self::default();
        for param in query.split('&') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(&value.replace('+', " "))
                .map(|v| v.into_owned())
                .unwrap_or_default();
            match key {
                "code" => request.code = Some(value),
                "state" => request.state = Some(value),
                "error" => request.error = Some(value),
                _ => {}
            }
        }
        request
    }

    /// Returns the code if the redirect carries one and `expected_state`
    /// matches.
    pub fn into_code(self, expected_state: &str) -> Result<String, CallbackError> {
        if let Some(error) = self.error {
            return Err(CallbackError::Denied(error));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(CallbackError::StateMismatch);
        }
        match self.code {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(CallbackError::MissingCode),
        }
    }
}

/// A matched redirect whose browser connection is still open.
#[derive(Debug)]
pub struct PendingCallback {
    stream: TcpStream,
    pub request: CallbackRequest,
}

impl PendingCallback {
    /// Answers the browser and closes the connection.
    pub async fn respond(mut self, success: bool) -> Result<(), CallbackError> {
        let page = if success { SUCCESS_PAGE } else { FAILURE_PAGE };
        self.stream.write_all(page.as_bytes()).await?;
        self.stream.flush().await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Loopback listener waiting for a single redirect.
#[derive(Debug)]
pub struct CallbackListener {
    listener: TcpListener,
    host: String,
    path: String,
    timeout: Option<Duration>,
}

impl CallbackListener {
    /// Binds the configured host and port.
    pub async fn bind(settings: &CallbackSettings) -> Result<Self, CallbackError> {
        let addr = format!("{}:{}", settings.host, settings.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| CallbackError::Bind { addr, source })?;
        debug!(addr = ?listener.local_addr().ok(), path = %settings.path, "callback listener bound");

        Ok(Self {
            listener,
            host: settings.host.clone(),
            path: settings.path.clone(),
            timeout: settings.timeout(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// URL the browser will be redirected to.
    pub fn redirect_url(&self) -> std::io::Result<String> {
        let port = self.local_addr()?.port();
        Ok(format!("http://{}:{}{}", self.host, port, self.path))
    }

    /// Waits for a request on the callback path.
    ///
    /// Requests on other paths get a 404 and the wait continues.
    pub async fn wait(&self) -> Result<PendingCallback, CallbackError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.accept_matching())
                .await
                .map_err(|_| CallbackError::Timeout(limit))?,
            None => self.accept_matching().await,
        }
    }

    /// Reads every accepted connection in its own task, so a browser's idle
    /// preconnect socket cannot hold up the redirect arriving on another.
    async fn accept_matching(&self) -> Result<PendingCallback, CallbackError> {
        let mut readers = JoinSet::new();
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    readers.spawn(read_request(stream, peer));
                }
                Some(joined) = readers.join_next() => {
                    let Ok((stream, peer, target)) = joined else {
                        continue;
                    };
                    if let Some(pending) = self.route(stream, peer, target).await {
                        return Ok(pending);
                    }
                }
            }
        }
    }

    /// Matches a read request against the callback path; anything else is
    /// answered with a 404 and dropped.
    async fn route(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        target: std::io::Result<Option<String>>,
    ) -> Option<PendingCallback> {
        match target {
            Ok(Some(target)) => {
                let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
                if path == self.path {
                    debug!(peer = %peer, "received OAuth redirect");
                    return Some(PendingCallback {
                        request: CallbackRequest::from_query(query),
                        stream,
                    });
                }
                debug!(peer = %peer, path = %path, "ignoring request on other path");
            }
            Ok(None) => debug!(peer = %peer, "ignoring non-GET request"),
            Err(e) => {
                warn!(peer = %peer, error = %e, "failed to read callback request");
                return None;
            }
        }
        if let Err(e) = stream.write_all(NOT_FOUND.as_bytes()).await {
            debug!(error = %e, "failed to answer stray request");
        }
        None
    }
}

type ReadRequest = (TcpStream, SocketAddr, std::io::Result<Option<String>>);

async fn read_request(mut stream: TcpStream, peer: SocketAddr) -> ReadRequest {
    let target = match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_target(&mut stream)).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "request head not received",
        )),
    };
    (stream, peer, target)
}

/// Reads the request line and headers, returning the target of a GET.
///
/// At most [`MAX_REQUEST_HEAD`] bytes are read.
async fn read_target<R>(stream: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(AsyncReadExt::take(stream, MAX_REQUEST_HEAD));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain headers so the browser sees a clean response.
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(Some(target.to_string())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CallbackSettings {
        CallbackSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            path: "/oauth/callback".to_string(),
            timeout_secs: None,
        }
    }

    async fn get(addr: SocketAddr, target: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
            .await
            .unwrap();
        response
    }

    #[test]
    fn parses_query_parameters() {
        let request = CallbackRequest::from_query("state=a%2Fb&code=4%2F0Ab&scope=x+y");
        assert_eq!(request.code.as_deref(), Some("4/0Ab"));
        assert_eq!(request.state.as_deref(), Some("a/b"));
        assert!(request.error.is_none());
    }

    #[test]
    fn into_code_checks_state_and_error() {
        let ok = CallbackRequest::from_query("code=abc123&state=s1");
        assert_eq!(ok.clone().into_code("s1").unwrap(), "abc123");
        assert!(matches!(ok.into_code("s2"), Err(CallbackError::StateMismatch)));

        let denied = CallbackRequest::from_query("error=access_denied&state=s1");
        assert!(matches!(denied.into_code("s1"), Err(CallbackError::Denied(e)) if e == "access_denied"));

        let missing = CallbackRequest::from_query("state=s1");
        assert!(matches!(missing.into_code("s1"), Err(CallbackError::MissingCode)));
    }

    #[tokio::test]
    async fn waits_past_other_paths() {
        let listener = CallbackListener::bind(&settings()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let stray = get(addr, "/favicon.ico").await;
            let hit = get(addr, "/oauth/callback?code=abc123&state=xyz").await;
            (stray, hit)
        });

        let pending = listener.wait().await.unwrap();
        assert_eq!(pending.request.code.as_deref(), Some("abc123"));
        assert_eq!(pending.request.state.as_deref(), Some("xyz"));
        pending.respond(true).await.unwrap();

        let (stray, hit) = client.await.unwrap();
        assert!(stray.starts_with("HTTP/1.1 404"));
        assert!(hit.starts_with("HTTP/1.1 200"));
        assert!(hit.contains("Authorization Successful"));
    }

    #[tokio::test]
    async fn idle_connection_does_not_block_redirect() {
        let mut settings = settings();
        settings.timeout_secs = Some(5);
        let listener = CallbackListener::bind(&settings).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let idle = TcpStream::connect(addr).await.unwrap();
        let client = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            get(addr, "/oauth/callback?code=abc123&state=s").await
        });

        let pending = listener.wait().await.unwrap();
        assert_eq!(pending.request.code.as_deref(), Some("abc123"));
        pending.respond(true).await.unwrap();
        assert!(client.await.unwrap().starts_with("HTTP/1.1 200"));
        drop(idle);
    }

    #[tokio::test]
    async fn request_head_is_capped() {
        let (mut client, mut server) = tokio::io::duplex(64 * 1024);
        client.write_all(&vec![b'a'; 20 * 1024]).await.unwrap();

        // The writer stays open; only the size cap ends the read.
        let target = tokio::time::timeout(Duration::from_secs(2), read_target(&mut server))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target, None);
        drop(client);
    }

    #[tokio::test]
    async fn failure_page_is_400() {
        let listener = CallbackListener::bind(&settings()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::spawn(async move { get(addr, "/oauth/callback?error=access_denied").await });

        listener.wait().await.unwrap().respond(false).await.unwrap();
        assert!(client.await.unwrap().starts_with("HTTP/1.1 400"));
    }

    #[tokio::test]
    async fn optional_timeout_expires() {
        let mut settings = settings();
        settings.timeout_secs = Some(0);
        let listener = CallbackListener::bind(&settings).await.unwrap();
        assert!(matches!(listener.wait().await, Err(CallbackError::Timeout(_))));
    }

    #[tokio::test]
    async fn dropping_listener_frees_port() {
        let listener = CallbackListener::bind(&settings()).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut again = settings();
        again.port = port;
        CallbackListener::bind(&again).await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let first = CallbackListener::bind(&settings()).await.unwrap();
        let mut taken = settings();
        taken.port = first.local_addr().unwrap().port();
        assert!(matches!(
            CallbackListener::bind(&taken).await,
            Err(CallbackError::Bind { .. })
        ));
    }

    #[tokio::test]
    async fn redirect_url_uses_bound_port() {
        let listener = CallbackListener::bind(&settings()).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(
            listener.redirect_url().unwrap(),
            format!("http://127.0.0.1:{}/oauth/callback", port)
        );
    }
}
