//! WebSocket tests against a router served on a local port.

mod common;

use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use cinetrend_core::SearchOutcome;

use common::{fixtures, TestFixture};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Serve the fixture router on an ephemeral port and return its address.
async fn serve(fixture: &TestFixture) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = fixture.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Read frames until a `state` message satisfies `predicate`.
async fn next_state(ws: &mut WsStream, predicate: impl Fn(&Value) -> bool) -> Value {
    timeout(Duration::from_secs(5), async {
        while let Some(frame) = ws.next().await {
            let Message::Text(text) = frame.expect("WebSocket error") else {
                continue;
            };
            let msg: Value = serde_json::from_str(&text).unwrap();
            if msg["type"] == "state" && predicate(&msg["state"]) {
                return msg;
            }
        }
        panic!("WebSocket closed before a matching state arrived");
    })
    .await
    .expect("Timed out waiting for state frame")
}

#[tokio::test]
async fn test_first_frame_is_state_snapshot() {
    let fixture = TestFixture::new().await;
    let addr = serve(&fixture).await;

    let (mut ws, _) = connect_async(format!("ws://{}/api/v1/ws", addr))
        .await
        .expect("Failed to connect");

    let frame = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Timed out waiting for first frame")
        .expect("Stream ended")
        .expect("WebSocket error");
    let Message::Text(text) = frame else {
        panic!("Expected a text frame, got {:?}", frame);
    };
    let msg: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(msg["type"], "state");
    assert_eq!(msg["state"]["phase"], "idle");
    assert_eq!(msg["state"]["searchTerm"], "");
    assert_eq!(msg["state"]["movieList"], json!([]));
}

#[tokio::test]
async fn test_query_change_pushes_new_state() {
    let fixture = TestFixture::started().await;
    fixture
        .metadata
        .set_outcome(
            "alien",
            SearchOutcome::Success(vec![fixtures::movie(348, "Alien")]),
        )
        .await;
    let addr = serve(&fixture).await;

    let (mut ws, _) = connect_async(format!("ws://{}/api/v1/ws", addr))
        .await
        .expect("Failed to connect");
    next_state(&mut ws, |_| true).await;

    let response = fixture
        .put("/api/v1/query", json!({ "searchTerm": "alien" }))
        .await;
    assert_eq!(response.status, axum::http::StatusCode::ACCEPTED);

    // Intermediate pushes may be coalesced; wait for the settled search
    let msg = next_state(&mut ws, |s| {
        s["debouncedSearchTerm"] == "alien" && s["isLoading"] == false
    })
    .await;
    assert_eq!(msg["state"]["searchTerm"], "alien");
    assert_eq!(msg["state"]["phase"], "success");
    assert_eq!(msg["state"]["movieList"][0]["title"], "Alien");

    fixture.orchestrator.stop().await;
}
