//! Integration tests for the status API
//!
//! The API is read-only: it reports what the engine and session already hold.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chatwarden::core::{create_router, ModerationModes, PenaltyStore, StatusState};
use chatwarden::types::{ModeFlag, SessionState};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;

struct Fixture {
    penalties: Arc<PenaltyStore>,
    modes: Arc<ModerationModes>,
    session_tx: watch::Sender<SessionState>,
}

impl Fixture {
    fn new() -> Self {
        let (session_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            penalties: Arc::new(PenaltyStore::new()),
            modes: Arc::new(ModerationModes::new()),
            session_tx,
        }
    }

    fn router(&self) -> axum::Router {
        create_router(StatusState {
            penalties: self.penalties.clone(),
            modes: self.modes.clone(),
            session: self.session_tx.subscribe(),
        })
    }
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = Fixture::new();
    let (status, json) = get_json(fixture.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], chatwarden::VERSION);
}

#[tokio::test]
async fn test_status_reflects_live_state() {
    let fixture = Fixture::new();
    fixture.session_tx.send_replace(SessionState::Active);
    fixture.modes.set(ModeFlag::Nuke, true);
    fixture.penalties.apply_offense("alice");
    fixture.penalties.apply_offense("bob");

    let (status, json) = get_json(fixture.router(), "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_state"], "ACTIVE");
    assert_eq!(json["modes"]["nuke_active"], true);
    assert_eq!(json["modes"]["media_announce_active"], false);
    assert_eq!(json["tracked_chatters"], 2);
}

#[tokio::test]
async fn test_chatter_lookup() {
    let fixture = Fixture::new();
    fixture.penalties.apply_offense("alice");
    fixture.penalties.apply_offense("alice");

    let (status, json) = get_json(fixture.router(), "/chatters/alice").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["identity"], "alice");
    assert_eq!(json["current_duration"], 300);
    assert_eq!(json["offense_count"], 2);
}

#[tokio::test]
async fn test_unknown_chatter_is_not_found() {
    let fixture = Fixture::new();
    let (status, _) = get_json(fixture.router(), "/chatters/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_does_not_create_chatters() {
    let fixture = Fixture::new();
    let _ = get_json(fixture.router(), "/chatters/alice").await;
    assert!(fixture.penalties.is_empty());
}
