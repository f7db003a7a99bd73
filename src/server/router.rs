use crate::campaigns::CampaignRunner;
use crate::config::Config;
use crate::db::DbActorHandle;
use crate::email::{Mailer, ResendMailer, Templates};
use crate::integrations::{ChangelogService, ChatProxy};
use crate::server::ratelimit::ClientRateLimiter;
use crate::server::routes::{admin, cron, public};

use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use axum_extra::extract::cookie::Key;
use base64::Engine as _;
use rand::RngCore;
use std::time::Instant;
use std::{sync::Arc, time::Duration};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const USER_AGENT_VALUE: &str = concat!("launchpad/", env!("CARGO_PKG_VERSION"));

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

fn build_client(proxy: Option<url::Url>, timeout: Duration) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT_VALUE)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout);

    if let Some(proxy_url) = proxy {
        let proxy =
            reqwest::Proxy::all(proxy_url.as_str()).expect("invalid proxy url for reqwest client");
        builder = builder.proxy(proxy);
    }

    builder.build().expect("failed to build reqwest client")
}

#[derive(Clone)]
pub struct LaunchpadState {
    pub cfg: Arc<Config>,
    pub db: DbActorHandle,
    /// `None` when no email API key is configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub templates: Templates,
    /// `None` when no chat API key is configured.
    pub chat: Option<Arc<ChatProxy>>,
    pub changelog: ChangelogService,
    pub limiter: ClientRateLimiter,
    pub admin_key: Arc<str>,
    /// Shared by every campaign runner built from this state.
    campaign_lock: Arc<tokio::sync::Mutex<()>>,
    cookie_key: Key,
}

impl LaunchpadState {
    pub fn new(cfg: Arc<Config>, db: DbActorHandle) -> Self {
        let proxy = cfg.basic.proxy.clone();
        let client = build_client(proxy.clone(), Duration::from_secs(30));
        // Chat streams stay open far longer than a regular request.
        let chat_client = build_client(proxy, Duration::from_secs(10 * 60));

        let mailer: Option<Arc<dyn Mailer>> = match cfg.email.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                let built = ResendMailer::new(
                    client.clone(),
                    cfg.email.api_url.clone(),
                    key.trim(),
                    cfg.email.from.clone(),
                );
                match built {
                    Ok(m) => Some(Arc::new(m)),
                    Err(e) => {
                        error!(error = %e, "Email disabled: invalid configuration");
                        None
                    }
                }
            }
            _ => None,
        };

        let cookie_key = match cfg.basic.cookie_secret.as_deref() {
            Some(secret) if secret.len() >= 32 => Key::derive_from(secret.as_bytes()),
            _ => {
                warn!("basic.cookie_secret unset or too short; admin sessions will not survive restarts");
                Key::generate()
            }
        };

        Self {
            templates: Templates::new(cfg.email.site_url.clone()),
            chat: ChatProxy::new(&cfg.chat, chat_client).map(Arc::new),
            changelog: ChangelogService::new(&cfg.changelog, client),
            limiter: ClientRateLimiter::new(&cfg.rate_limit),
            admin_key: Arc::from(cfg.basic.admin_key.as_str()),
            campaign_lock: Arc::new(tokio::sync::Mutex::new(())),
            cookie_key,
            mailer,
            db,
            cfg,
        }
    }

    /// Replace the email transport.
    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn campaign_runner(&self) -> Option<CampaignRunner> {
        let mailer = self.mailer.clone()?;
        Some(
            CampaignRunner::new(
                self.db.clone(),
                mailer,
                self.templates.clone(),
                Duration::from_millis(self.cfg.email.send_delay_ms),
            )
            .with_run_lock(self.campaign_lock.clone()),
        )
    }
}

impl FromRef<LaunchpadState> for Key {
    fn from_ref(state: &LaunchpadState) -> Self {
        state.cookie_key.clone()
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn healthz() -> &'static str {
    "ok"
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let path = uri.path();
    let protocol = format_http_version(version);

    // For SSE responses `latency_ms` is time-to-first-byte, not the stream duration.
    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

/// Empty `allowed_origins` mirrors the caller's origin without credentials;
/// cookies are only allowed cross-origin for an explicit list.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o.trim_end_matches('/')).ok())
        .collect();
    let (allow_origin, allow_credentials) = if origins.is_empty() {
        (AllowOrigin::mirror_request(), false)
    } else {
        (AllowOrigin::list(origins), true)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(allow_credentials)
}

pub fn launchpad_router(state: LaunchpadState) -> Router {
    let cors = cors_layer(&state.cfg.basic.allowed_origins);

    Router::new()
        .route("/healthz", get(healthz))
        .merge(public::router())
        .merge(cron::router(&state))
        .nest("/admin/api", admin::router(&state))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(access_log))
}
