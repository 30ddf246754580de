use axum::{
    extract::{Request, State},
    response::Html,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::endpoint::REDIRECT_PATH;
use crate::page;
use crate::{RedirectError, Result};

/// The single HTTP request captured from the browser redirect
///
/// Transient: exists only between arrival and the point the query string is
/// decoded into an [`crate::AuthorizationResponse`].
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: String,
}

struct ListenerState {
    // Single-slot rendezvous: the first request takes the sender, later
    // requests find it empty and only get the confirmation page.
    tx: Mutex<Option<oneshot::Sender<PendingRequest>>>,
}

/// Handle for the bound socket and its accept loop
///
/// Created by [`LoopbackListener::start`]; must be stopped exactly once on
/// every exit path so the port is never leaked, and `stop` tolerates being
/// called again as a no-op.
#[derive(Debug)]
pub(crate) struct LoopbackListener {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LoopbackListener {
    /// Bind `127.0.0.1:port` and begin accepting
    ///
    /// The returned receiver fires once, with the first request that reaches
    /// the redirect path.
    pub(crate) async fn start(port: u16) -> Result<(Self, oneshot::Receiver<PendingRequest>)> {
        let (request_tx, request_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(ListenerState {
            tx: Mutex::new(Some(request_tx)),
        });
        let app = Router::new()
            .route(REDIRECT_PATH, get(handle_redirect))
            .with_state(state);

        let addr = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| RedirectError::Listener(format!("failed to bind {addr}: {e}")))?;
        debug!(%addr, "redirect listener bound");

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok((
            Self {
                shutdown: Some(shutdown_tx),
                task: Some(task),
            },
            request_rx,
        ))
    }

    /// Stop accepting and release the port
    ///
    /// Graceful: an in-flight response is fully written to the browser before
    /// the socket goes away. Calling `stop` on an already stopped listener is
    /// a no-op.
    pub(crate) async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
            debug!("redirect listener stopped");
        }
    }
}

async fn handle_redirect(
    State(state): State<Arc<ListenerState>>,
    request: Request,
) -> Html<&'static str> {
    let pending = PendingRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().unwrap_or("").to_string(),
    };
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(pending);
    }
    page::render()
}

/// Wait for the first redirect, racing it against the timeout ceiling and the
/// caller's cancellation signal; whichever fires first wins and the others
/// have no effect.
pub(crate) async fn wait_for_redirect(
    request_rx: oneshot::Receiver<PendingRequest>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<PendingRequest> {
    tokio::select! {
        received = request_rx => received.map_err(|_| {
            RedirectError::Listener("listener shut down before a redirect arrived".to_string())
        }),
        _ = tokio::time::sleep(timeout) => Err(RedirectError::Timeout(timeout)),
        _ = cancel.cancelled() => Err(RedirectError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::allocate_port;

    async fn start_listener() -> (LoopbackListener, oneshot::Receiver<PendingRequest>, u16) {
        let port = allocate_port().unwrap();
        let (listener, rx) = LoopbackListener::start(port).await.unwrap();
        (listener, rx, port)
    }

    #[tokio::test]
    async fn delivers_first_request_and_serves_page() {
        let (mut listener, rx, port) = start_listener().await;

        let browser = tokio::spawn(async move {
            let url = format!("http://127.0.0.1:{port}/authorize/?code=ABC123&state=xyz");
            reqwest::get(url).await.unwrap().text().await.unwrap()
        });

        let request = wait_for_redirect(rx, Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/authorize/");
        assert_eq!(request.query, "code=ABC123&state=xyz");

        listener.stop().await;

        let body = browser.await.unwrap();
        assert!(body.contains("window.close()"));
    }

    #[tokio::test]
    async fn times_out_when_no_redirect_arrives() {
        let (mut listener, rx, port) = start_listener().await;

        let err = wait_for_redirect(rx, Duration::from_millis(50), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RedirectError::Timeout(_)));

        listener.stop().await;
        // The port is free again once the listener is stopped.
        std::net::TcpListener::bind(("127.0.0.1", port)).unwrap();
    }

    #[tokio::test]
    async fn cancellation_wins_over_waiting() {
        let (mut listener, rx, _port) = start_listener().await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = wait_for_redirect(rx, Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RedirectError::Cancelled));

        listener.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (mut listener, _rx, _port) = start_listener().await;
        listener.stop().await;
        listener.stop().await;
    }

    #[tokio::test]
    async fn second_request_is_ignored_but_still_answered() {
        let (mut listener, rx, port) = start_listener().await;

        let url = format!("http://127.0.0.1:{port}/authorize/?code=first");
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(body.contains("window.close()"));

        let url = format!("http://127.0.0.1:{port}/authorize/?code=second");
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(body.contains("window.close()"));

        let request = wait_for_redirect(rx, Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(request.query, "code=first");

        listener.stop().await;
    }

    #[tokio::test]
    async fn bind_failure_surfaces_as_listener_error() {
        let (_guard, _rx, port) = start_listener().await;

        let err = LoopbackListener::start(port).await.unwrap_err();
        assert!(matches!(err, RedirectError::Listener(_)));
    }
}
