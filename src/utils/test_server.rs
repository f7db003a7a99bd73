//! Loopback upstream for exercising outbound HTTP clients in unit tests.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("captured body is not JSON")
    }
}

/// Answers every request with the next scripted response; the last one repeats.
#[derive(Clone)]
pub(crate) struct ScriptedUpstream {
    responses: Arc<Vec<(StatusCode, &'static str, String)>>,
    reqs: Arc<Mutex<Vec<Captured>>>,
}

impl ScriptedUpstream {
    pub fn requests(&self) -> Vec<Captured> {
        self.reqs.lock().unwrap().clone()
    }
}

async fn respond(
    State(upstream): State<ScriptedUpstream>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let idx = {
        let mut reqs = upstream.reqs.lock().unwrap();
        let idx = reqs.len().min(upstream.responses.len() - 1);
        reqs.push(Captured {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body: body.to_vec(),
        });
        idx
    };
    let (status, content_type, body) = upstream.responses[idx].clone();
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Serve `responses` on an ephemeral port and return its base URL.
pub(crate) async fn spawn_upstream(
    responses: Vec<(StatusCode, &'static str, String)>,
) -> (Url, ScriptedUpstream) {
    assert!(!responses.is_empty(), "at least one scripted response");
    let upstream = ScriptedUpstream {
        responses: Arc::new(responses),
        reqs: Arc::default(),
    };
    let app = Router::new()
        .fallback(respond)
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{addr}/")).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (base, upstream)
}

pub(crate) const JSON: &str = "application/json";
pub(crate) const SSE: &str = "text/event-stream";
pub(crate) const TEXT: &str = "text/plain";
