//! HTTP webhook receiver for console lines pushed by the server side.

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::common::error::SourceError;

/// Webhook input source.
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    port: u16,
    path: String,
}

impl WebhookReceiver {
    pub fn new(port: u16, path: impl Into<String>) -> Self {
        Self {
            port,
            path: path.into(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Serve until the listener fails.
    pub async fn run(self, tx: mpsc::UnboundedSender<String>) -> Result<(), SourceError> {
        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .map_err(|e| SourceError::Bind {
                port: self.port,
                source: e,
            })?;

        info!("Webhook receiver listening on *:{}{}", self.port, self.path);
        axum::serve(listener, router(&self.path, tx)).await?;
        Ok(())
    }
}

/// Router accepting `POST <path>` with the raw line as body.
pub fn router(path: &str, tx: mpsc::UnboundedSender<String>) -> Router {
    Router::new().route(path, post(receive_line)).with_state(tx)
}

/// One emission per request, answered with an empty body.
async fn receive_line(State(tx): State<mpsc::UnboundedSender<String>>, body: String) -> &'static str {
    debug!("Webhook received {} bytes", body.len());
    if let Err(e) = tx.send(body) {
        warn!("Dropping webhook line, relay not running: {}", e);
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_post_emits_full_body() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let app = router("/minecraft/hook", tx);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/minecraft/hook")
                    .body(Body::from("[Server thread/INFO]: <Steve> hi there"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(rx.recv().await.unwrap(), "[Server thread/INFO]: <Steve> hi there");
    }

    #[tokio::test]
    async fn test_other_paths_are_not_relayed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let app = router("/minecraft/hook", tx);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/elsewhere")
                    .body(Body::from("line"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let app = router("/minecraft/hook", tx);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/minecraft/hook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
