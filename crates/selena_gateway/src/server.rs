use crate::types::{ControlResponse, HealthResponse};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use selena_core::{LoopControl, LoopStatus};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
struct AppState {
    control: Arc<dyn LoopControl>,
}

/// Build the control routes:
/// - `GET /health` liveness
/// - `GET /status` loop status
/// - `POST /start` start the loop
/// - `POST /stop` stop the loop
pub fn router(control: Arc<dyn LoopControl>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .layer(CorsLayer::permissive())
        .with_state(AppState { control })
}

/// The HTTP control surface for the character loop.
pub struct GatewayServer {
    control: Arc<dyn LoopControl>,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(control: Arc<dyn LoopControl>, host: &str, port: u16) -> Self {
        Self {
            control,
            host: host.to_string(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Start the server. This spawns a background task and returns the join handle.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        let addr = self.addr();
        let app = router(self.control);
        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Gateway failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Gateway listening on {}", addr);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        })
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn status(State(state): State<AppState>) -> Json<LoopStatus> {
    Json(state.control.status().await)
}

async fn start(State(state): State<AppState>) -> Json<ControlResponse> {
    let changed = state.control.start().await;
    if changed {
        tracing::info!("Loop started via gateway");
    }
    Json(ControlResponse {
        running: state.control.is_running(),
        changed,
    })
}

async fn stop(State(state): State<AppState>) -> Json<ControlResponse> {
    let changed = state.control.stop().await;
    if changed {
        tracing::info!("Loop stopped via gateway");
    }
    Json(ControlResponse {
        running: state.control.is_running(),
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use selena_core::Phase;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeLoop {
        running: AtomicBool,
    }

    #[async_trait]
    impl LoopControl for FakeLoop {
        async fn start(&self) -> bool {
            !self.running.swap(true, Ordering::SeqCst)
        }

        async fn stop(&self) -> bool {
            self.running.swap(false, Ordering::SeqCst)
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        async fn status(&self) -> LoopStatus {
            LoopStatus {
                running: self.is_running(),
                phase: Phase::Active,
                next_wake_secs: Some(300),
                energy: 0.8,
                mood: 0.5,
            }
        }
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(FakeLoop::default()));
        let (status, body) = call(app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_start_stop_round_trip() {
        let control: Arc<dyn LoopControl> = Arc::new(FakeLoop::default());

        let (_, body) = call(router(control.clone()), "POST", "/start").await;
        let resp: ControlResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            resp,
            ControlResponse {
                running: true,
                changed: true
            }
        );

        let (_, body) = call(router(control.clone()), "POST", "/start").await;
        let resp: ControlResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.running);
        assert!(!resp.changed);

        let (_, body) = call(router(control.clone()), "POST", "/stop").await;
        let resp: ControlResponse = serde_json::from_slice(&body).unwrap();
        assert!(!resp.running);
        assert!(resp.changed);

        let (_, body) = call(router(control), "POST", "/stop").await;
        let resp: ControlResponse = serde_json::from_slice(&body).unwrap();
        assert!(!resp.changed);
    }

    #[tokio::test]
    async fn test_status_reports_loop() {
        let control: Arc<dyn LoopControl> = Arc::new(FakeLoop::default());
        control.start().await;
        let (status, body) = call(router(control), "GET", "/status").await;
        assert_eq!(status, StatusCode::OK);
        let s: LoopStatus = serde_json::from_slice(&body).unwrap();
        assert!(s.running);
        assert_eq!(s.phase, Phase::Active);
        assert_eq!(s.next_wake_secs, Some(300));
    }

    #[tokio::test]
    async fn test_start_requires_post() {
        let app = router(Arc::new(FakeLoop::default()));
        let (status, _) = call(app, "GET", "/start").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_gateway_server_addr() {
        let server = GatewayServer::new(Arc::new(FakeLoop::default()), "127.0.0.1", 0);
        assert_eq!(server.addr(), "127.0.0.1:0");
    }
}
