use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::browser::open_browser;
use crate::endpoint::RedirectEndpoint;
use crate::query::decode_query;
use crate::server::{wait_for_redirect, LoopbackListener};
use crate::{RedirectError, Result};

/// Default ceiling on how long [`RedirectReceiver::receive_code`] waits for
/// the browser to come back.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Parameters carried back by the authorization redirect
///
/// Typically `code` and `state` on success or `error` on denial, but every
/// query parameter the authorization server sent is available through
/// [`get`](Self::get).
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationResponse {
    parameters: HashMap<String, Option<String>>,
}

impl AuthorizationResponse {
    pub(crate) fn from_query(query: &str) -> Self {
        Self {
            parameters: decode_query(query),
        }
    }

    /// Look up a single parameter
    ///
    /// `None` means the key was absent; `Some(None)` means it was present
    /// without a value (a bare flag).
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.parameters.get(key).map(|value| value.as_deref())
    }

    /// The authorization code, if the server sent one.
    pub fn code(&self) -> Option<&str> {
        self.parameters.get("code").and_then(|v| v.as_deref())
    }

    /// The CSRF state token echoed back by the server, if any.
    pub fn state(&self) -> Option<&str> {
        self.parameters.get("state").and_then(|v| v.as_deref())
    }

    /// The OAuth error code, if the server reported a failure.
    pub fn error(&self) -> Option<&str> {
        self.parameters.get("error").and_then(|v| v.as_deref())
    }

    /// All decoded parameters.
    pub fn parameters(&self) -> &HashMap<String, Option<String>> {
        &self.parameters
    }
}

/// One-shot loopback receiver for the OAuth authorization redirect
///
/// A receiver owns one ephemeral port for one authorization attempt: ask it
/// for the [redirect URI](Self::redirect_uri), build the authorization URL
/// around that, then call [`receive_code`](Self::receive_code) to open the
/// browser and wait for the redirect. To retry a failed flow, create a new
/// receiver (and register its new redirect URI).
///
/// # Example
///
/// ```no_run
/// use oauth_loopback::{CancellationToken, RedirectReceiver};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut receiver = RedirectReceiver::new();
/// let redirect_uri = receiver.redirect_uri()?;
///
/// // Hand `redirect_uri` to your authorization-URL builder...
/// let authorization_url = format!(
///     "https://auth.example.com/authorize?response_type=code&redirect_uri={redirect_uri}"
/// );
///
/// let response = receiver
///     .receive_code(&authorization_url, CancellationToken::new())
///     .await?;
/// println!("code: {:?}", response.code());
/// # Ok(())
/// # }
/// ```
pub struct RedirectReceiver {
    endpoint: Option<RedirectEndpoint>,
    timeout: Duration,
    used: bool,
}

impl RedirectReceiver {
    /// Create a receiver with the default 60 second wait ceiling.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a receiver with a custom wait ceiling.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            endpoint: None,
            timeout,
            used: false,
        }
    }

    /// Allocate the redirect port
    ///
    /// Idempotent: the first call picks an ephemeral port; every later call
    /// returns the same endpoint without touching the OS again.
    pub fn allocate(&mut self) -> Result<&RedirectEndpoint> {
        match &mut self.endpoint {
            Some(endpoint) => Ok(endpoint),
            slot => {
                let endpoint = RedirectEndpoint::allocate()?;
                debug!(port = endpoint.port(), "redirect port allocated");
                Ok(slot.insert(endpoint))
            }
        }
    }

    /// Pure read of the memoized endpoint; `None` until [`allocate`](Self::allocate)
    /// (or [`redirect_uri`](Self::redirect_uri)) has run.
    pub fn endpoint(&self) -> Option<&RedirectEndpoint> {
        self.endpoint.as_ref()
    }

    /// The URI to register as the OAuth redirect target
    ///
    /// Allocates the port on first use and returns an identical value on
    /// every later call.
    pub fn redirect_uri(&mut self) -> Result<String> {
        Ok(self.allocate()?.uri())
    }

    /// Open the browser at `authorization_url` and wait for the redirect
    ///
    /// Binds the listener on the allocated port, launches the browser (best
    /// effort), and suspends until the first redirect arrives, the wait
    /// ceiling elapses, or `cancel` fires. The listener is stopped on every
    /// exit path; on success the confirmation page has been fully sent to the
    /// browser before this returns.
    ///
    /// # Errors
    ///
    /// - [`RedirectError::Timeout`] if no redirect arrives within the ceiling
    /// - [`RedirectError::Cancelled`] if `cancel` fires first
    /// - [`RedirectError::Listener`] if the port cannot be bound or the
    ///   listener fails while serving
    /// - [`RedirectError::AlreadyUsed`] if this receiver already ran a
    ///   receive attempt; its port is not reused
    pub async fn receive_code(
        &mut self,
        authorization_url: &str,
        cancel: CancellationToken,
    ) -> Result<AuthorizationResponse> {
        if self.used {
            return Err(RedirectError::AlreadyUsed);
        }
        let port = self.allocate()?.port();

        let (mut listener, request_rx) = LoopbackListener::start(port).await?;
        self.used = true;

        open_browser(authorization_url);

        let outcome = wait_for_redirect(request_rx, self.timeout, &cancel).await;
        // Stop on every exit path so the port never leaks; on the success
        // path this also waits for the page to finish sending.
        listener.stop().await;

        let request = outcome?;
        debug!(
            method = %request.method,
            path = %request.path,
            "authorization redirect received"
        );
        Ok(AuthorizationResponse::from_query(&request.query))
    }
}

impl Default for RedirectReceiver {
    fn default() -> Self {
        Self::new()
    }
}
