//! # oauth-loopback
//!
//! A loopback redirect receiver for OAuth 2.0 authorization-code flows
//! running on a user's workstation.
//!
//! Native applications have no registered web redirect URI, so this crate
//! stands one up on the fly: it picks an ephemeral local port, exposes
//! `http://localhost:{port}/authorize/` for the authorization-URL builder,
//! opens the user's browser at the consent page, waits for the browser to be
//! redirected back with the authorization response in the query string, sends
//! a small self-closing confirmation page, and shuts the listener down. One
//! receiver serves exactly one request for exactly one flow.
//!
//! ## Features
//!
//! - **Ephemeral ports**: no fixed port to collide with other local apps
//! - **Single-use listener**: serves one redirect, then releases the port
//! - **Timeout and cancellation**: the wait races the first redirect against
//!   a configurable ceiling (60 s by default) and a caller-supplied
//!   [`CancellationToken`]
//! - **Browser integration**: best-effort launch of the system browser via
//!   the platform's native open-URL command
//! - **Defensive query decoding**: missing values, duplicate keys, and bad
//!   percent-escapes never crash the receiver
//!
//! Building the authorization URL and exchanging the returned code for tokens
//! are the caller's business; this crate only runs the redirect leg.
//!
//! ## Quick Start
//!
//! ```no_run
//! use oauth_loopback::{CancellationToken, RedirectReceiver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut receiver = RedirectReceiver::new();
//!     let redirect_uri = receiver.redirect_uri()?;
//!
//!     // Build the consent URL with your OAuth client, using `redirect_uri`.
//!     let authorization_url = format!(
//!         "https://auth.example.com/authorize?response_type=code&redirect_uri={redirect_uri}"
//!     );
//!
//!     let response = receiver
//!         .receive_code(&authorization_url, CancellationToken::new())
//!         .await?;
//!
//!     match (response.code(), response.error()) {
//!         (Some(code), _) => println!("authorization code: {code}"),
//!         (None, Some(error)) => println!("authorization denied: {error}"),
//!         _ => println!("redirect carried no code"),
//!     }
//!     Ok(())
//! }
//! ```

mod browser;
mod endpoint;
mod error;
mod page;
mod query;
mod receiver;
mod server;

// Public API exports
pub use browser::open_browser;
pub use endpoint::RedirectEndpoint;
pub use error::{RedirectError, Result};
pub use receiver::{AuthorizationResponse, RedirectReceiver, DEFAULT_TIMEOUT};

// Re-exported so callers do not need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
