//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::Value;
use storyhall_core::clock::Clock;
use storyhall_core::rng::DeterministicRng;
use storyhall_narration::guarded::{GuardedNarrator, NarrationLimits};
use storyhall_narration::narrator::Narrator;
use storyhall_session::application::router::ConnectionRouter;
use storyhall_test_support::{FixedClock, ScriptedNarrator, SequenceRng};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use storyhall_api::qr::SvgQrRenderer;
use storyhall_api::routes;
use storyhall_api::state::AppState;

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for an expected event.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build application state with deterministic Clock/RNG and the given narrator.
pub fn build_test_state(rng: SequenceRng, narrator: Arc<dyn Narrator>) -> AppState {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let narrator = GuardedNarrator::new(
        narrator,
        NarrationLimits {
            timeout: Duration::from_millis(500),
            max_concurrent: 4,
        },
    );
    AppState::new(
        Arc::new(ConnectionRouter::new(fixed_clock(), rng, narrator)),
        Arc::new(SvgQrRenderer::default()),
        None,
        "http://localhost:3000".to_string(),
    )
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    routes::app(build_test_state(
        SequenceRng::new(vec![]),
        Arc::new(ScriptedNarrator::new("The story continues.")),
    ))
}

/// Send a request and return status plus JSON body (`Null` when empty).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, json)
}

/// Send a POST request with an empty body.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("host", "localhost:3000")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a GET request.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Serve the full app on an ephemeral port.
pub async fn spawn_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::app(state);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, handle)
}

pub async fn ws_connect(addr: SocketAddr) -> TestSocket {
    let url = format!("ws://{addr}/ws");
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub async fn ws_send(ws: &mut TestSocket, frame: &Value) {
    let json = serde_json::to_string(frame).unwrap();
    ws.send(WsMessage::Text(json)).await.unwrap();
}

/// Next JSON event from the server, failing the test after `RECV_TIMEOUT`.
pub async fn ws_recv(ws: &mut TestSocket) -> Value {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await.unwrap().unwrap() {
                WsMessage::Text(text) => return serde_json::from_str::<Value>(&text).unwrap(),
                WsMessage::Binary(bin) => return serde_json::from_slice::<Value>(&bin).unwrap(),
                _ => {}
            }
        }
    })
    .await
    .expect("timed out waiting for server event")
}

/// Receives events until one named `event` arrives.
pub async fn ws_expect(ws: &mut TestSocket, event: &str) -> Value {
    loop {
        let frame = ws_recv(ws).await;
        if frame["event"] == event {
            return frame;
        }
    }
}
