#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use launchpad::config::Config;
use launchpad::db::DbActorHandle;
use launchpad::email::{Mailer, OutboundEmail};
use launchpad::{LaunchpadError, LaunchpadState, launchpad_router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "admin-test-key";

pub async fn spawn_db(label: &str) -> DbActorHandle {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "launchpad-{label}-{}-{nanos}.sqlite",
        std::process::id()
    ));
    launchpad::db::spawn(&format!("sqlite:{}", temp_path.display())).await
}

/// Config independent of any `config.toml` in the working directory.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.basic.admin_key = ADMIN_KEY.to_string();
    cfg.rate_limit.per_minute = 1000;
    cfg.rate_limit.burst = 1000;
    cfg.email.send_delay_ms = 0;
    cfg
}

pub async fn test_app(label: &str, cfg: Config) -> (Router, LaunchpadState) {
    let db = spawn_db(label).await;
    let state = LaunchpadState::new(Arc::new(cfg), db);
    (launchpad_router(state.clone()), state)
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not utf-8")
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_str(&body_text(resp).await).expect("body is not JSON")
}

/// In-memory mailer that records every send and fails for listed recipients.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub failing: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().push(recipient.to_string());
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.to.clone()).collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, LaunchpadError> {
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(LaunchpadError::UpstreamStatus(
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("msg_{}", sent.len()))
    }
}
