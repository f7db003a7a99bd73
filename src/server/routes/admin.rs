use super::cron::{run_countdown, run_drip};
use crate::db::{
    CommitmentFilter, CommitmentPatch, DbCommitment, DbEmailLog, DbMarketingEvent, DbPricingTier,
    DbWaitlistEntry, EmailLogFilter, EventFilter, PageQuery, RecordPatch, WaitlistFilter,
    WaitlistPatch,
};
use crate::error::LaunchpadError;
use crate::pricing::select_tier;
use crate::server::guards::auth::{
    ADMIN_COOKIE, ADMIN_SESSION_HOURS, RequireAdmin, keys_match, session_cookie,
};
use crate::server::ratelimit::RateLimit;
use crate::server::router::LaunchpadState;
use crate::site::{load_site_config, validate_settings_update};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};
use chrono::{Duration, Utc};
use launchpad_schema::admin::{
    CommitmentStatusPatch, LoginRequest, StatusCounts, TierUpsert, WaitlistEntryPatch,
};
use launchpad_schema::{CampaignReport, CommitmentStatus, DashboardStats, Page, TierView};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

pub fn router(state: &LaunchpadState) -> Router<LaunchpadState> {
    let guarded = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/waitlist", get(list_waitlist))
        .route(
            "/waitlist/{id}",
            get(get_waitlist).patch(patch_waitlist).delete(delete_waitlist),
        )
        .route("/commitments", get(list_commitments))
        .route(
            "/commitments/{id}",
            get(get_commitment)
                .patch(patch_commitment)
                .delete(delete_commitment),
        )
        .route("/tiers", get(list_tiers))
        .route("/tiers/{tier_number}", put(upsert_tier).delete(delete_tier))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/events", get(list_events))
        .route("/email-logs", get(list_email_logs))
        .route("/campaigns/drip", post(trigger_drip))
        .route("/campaigns/countdown", post(trigger_countdown))
        .route_layer(middleware::from_extractor_with_state::<RequireAdmin, _>(
            state.clone(),
        ));

    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .merge(guarded)
}

/// Query string shared by the listing endpoints; each reads the filters it knows.
#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    status: Option<String>,
    event_name: Option<String>,
    template: Option<String>,
}

impl ListQuery {
    fn page(&self) -> PageQuery {
        let defaults = PageQuery::default();
        PageQuery {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
        .normalized()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn page_of<T>(items: Vec<T>, page: PageQuery, total: i64) -> Json<Page<T>> {
    Json(Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    })
}

fn deleted_or(found: bool, what: &'static str) -> Result<StatusCode, LaunchpadError> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(LaunchpadError::NotFound(what))
    }
}

/// POST /admin/api/login
async fn login(
    State(state): State<LaunchpadState>,
    _limit: RateLimit,
    jar: PrivateCookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<Value>), LaunchpadError> {
    let Json(req) = payload?;
    if !keys_match(&req.key, &state.admin_key) {
        warn!("Admin login rejected");
        return Err(LaunchpadError::Unauthorized("Invalid admin key"));
    }

    let expires_at = Utc::now() + Duration::hours(ADMIN_SESSION_HOURS);
    let jar = jar.add(session_cookie(expires_at, state.cfg.basic.insecure_cookie));
    info!(%expires_at, "Admin session opened");
    Ok((jar, Json(json!({ "expires_at": expires_at }))))
}

/// POST /admin/api/logout
async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(ADMIN_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// GET /admin/api/dashboard
async fn dashboard(State(state): State<LaunchpadState>) -> Result<Json<DashboardStats>, LaunchpadError> {
    let totals = state.db.presale_totals().await?;
    let counts = state.db.dashboard_counts(Utc::now()).await?;
    let tiers = state.db.list_tiers().await?;

    Ok(Json(DashboardStats {
        signups_total: totals.signups,
        signups_24h: counts.signups_24h,
        referred_signups: counts.referred_signups,
        unsubscribed: counts.unsubscribed,
        commitments: StatusCounts {
            pending: counts.pending,
            confirmed: counts.confirmed,
            cancelled: counts.cancelled,
        },
        raised_usd: totals.raised_usd,
        committed_tokens: totals.committed_tokens,
        emails_sent: counts.emails_sent,
        emails_failed: counts.emails_failed,
        current_tier: select_tier(&tiers, totals.buyers).map(TierView::from),
    }))
}

/// GET /admin/api/waitlist
async fn list_waitlist(
    State(state): State<LaunchpadState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<DbWaitlistEntry>>, LaunchpadError> {
    let Query(query) = query?;
    let page = query.page();
    let (items, total) = state
        .db
        .list_waitlist(WaitlistFilter {
            page,
            search: non_empty(query.search),
        })
        .await?;
    Ok(page_of(items, page, total))
}

async fn get_waitlist(
    State(state): State<LaunchpadState>,
    Path(id): Path<i64>,
) -> Result<Json<DbWaitlistEntry>, LaunchpadError> {
    state
        .db
        .get_waitlist_by_id(id)
        .await?
        .map(Json)
        .ok_or(LaunchpadError::NotFound("Waitlist entry"))
}

async fn patch_waitlist(
    State(state): State<LaunchpadState>,
    Path(id): Path<i64>,
    payload: Result<Json<WaitlistEntryPatch>, JsonRejection>,
) -> Result<Json<DbWaitlistEntry>, LaunchpadError> {
    let Json(req) = payload?;
    state
        .db
        .patch(RecordPatch::Waitlist {
            id,
            patch: WaitlistPatch {
                unsubscribed: Some(req.unsubscribed),
            },
        })
        .await?;
    get_waitlist(State(state), Path(id)).await
}

async fn delete_waitlist(
    State(state): State<LaunchpadState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, LaunchpadError> {
    let found = state.db.delete_waitlist(id).await?;
    if found {
        info!(id, "Waitlist entry deleted");
    }
    deleted_or(found, "Waitlist entry")
}

/// GET /admin/api/commitments
async fn list_commitments(
    State(state): State<LaunchpadState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<DbCommitment>>, LaunchpadError> {
    let Query(query) = query?;
    let page = query.page();
    let status = non_empty(query.status)
        .map(|s| s.parse::<CommitmentStatus>())
        .transpose()
        .map_err(|e| LaunchpadError::validation("INVALID_STATUS", e))?;

    let (items, total) = state
        .db
        .list_commitments(CommitmentFilter { page, status })
        .await?;
    Ok(page_of(items, page, total))
}

async fn get_commitment(
    State(state): State<LaunchpadState>,
    Path(id): Path<i64>,
) -> Result<Json<DbCommitment>, LaunchpadError> {
    state
        .db
        .get_commitment(id)
        .await?
        .map(Json)
        .ok_or(LaunchpadError::NotFound("Commitment"))
}

async fn patch_commitment(
    State(state): State<LaunchpadState>,
    Path(id): Path<i64>,
    payload: Result<Json<CommitmentStatusPatch>, JsonRejection>,
) -> Result<Json<DbCommitment>, LaunchpadError> {
    let Json(req) = payload?;
    state
        .db
        .patch(RecordPatch::Commitment {
            id,
            patch: CommitmentPatch {
                status: Some(req.status),
            },
        })
        .await?;
    info!(id, status = %req.status, "Commitment status updated");
    get_commitment(State(state), Path(id)).await
}

async fn delete_commitment(
    State(state): State<LaunchpadState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, LaunchpadError> {
    let found = state.db.delete_commitment(id).await?;
    if found {
        info!(id, "Commitment deleted");
    }
    deleted_or(found, "Commitment")
}

/// GET /admin/api/tiers
async fn list_tiers(
    State(state): State<LaunchpadState>,
) -> Result<Json<Vec<DbPricingTier>>, LaunchpadError> {
    Ok(Json(state.db.list_tiers().await?))
}

fn validate_tier(tier: &TierUpsert) -> Result<(), LaunchpadError> {
    let invalid = |msg: &str| Err(LaunchpadError::validation("INVALID_TIER", msg));
    if tier.name.trim().is_empty() {
        return invalid("name is required.");
    }
    if tier.min_count < 0 {
        return invalid("min_count must not be negative.");
    }
    if tier.max_count.is_some_and(|max| max < tier.min_count) {
        return invalid("max_count must not be below min_count.");
    }
    if !tier.bonus_percent.is_finite() || !(0.0..=1000.0).contains(&tier.bonus_percent) {
        return invalid("bonus_percent must be between 0 and 1000.");
    }
    Ok(())
}

/// PUT /admin/api/tiers/{tier_number}
async fn upsert_tier(
    State(state): State<LaunchpadState>,
    Path(tier_number): Path<i64>,
    payload: Result<Json<TierUpsert>, JsonRejection>,
) -> Result<Json<DbPricingTier>, LaunchpadError> {
    let Json(mut tier) = payload?;
    tier.name = tier.name.trim().to_string();
    validate_tier(&tier)?;
    let row = state.db.upsert_tier(tier_number, tier).await?;
    info!(tier_number, "Pricing tier saved");
    Ok(Json(row))
}

/// DELETE /admin/api/tiers/{tier_number}
async fn delete_tier(
    State(state): State<LaunchpadState>,
    Path(tier_number): Path<i64>,
) -> Result<StatusCode, LaunchpadError> {
    let tiers = state.db.list_tiers().await?;
    if tiers.len() == 1 && tiers[0].tier_number == tier_number {
        return Err(LaunchpadError::Conflict {
            code: "LAST_TIER",
            message: "At least one pricing tier must remain.".to_string(),
        });
    }
    let found = state.db.delete_tier(tier_number).await?;
    if found {
        info!(tier_number, "Pricing tier deleted");
    }
    deleted_or(found, "Pricing tier")
}

/// GET /admin/api/settings
async fn get_settings(State(state): State<LaunchpadState>) -> Result<Json<Value>, LaunchpadError> {
    let rows = state.db.list_settings().await?;
    let stored: Map<String, Value> = rows
        .into_iter()
        .map(|row| {
            let value = serde_json::from_str(&row.value).unwrap_or(Value::String(row.value));
            (row.key, value)
        })
        .collect();
    let effective = load_site_config(&state.db, &state.cfg).await?;
    Ok(Json(json!({ "stored": stored, "effective": effective })))
}

/// PUT /admin/api/settings
async fn put_settings(
    State(state): State<LaunchpadState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Value>, LaunchpadError> {
    let Json(update) = payload?;
    let entries = validate_settings_update(update)?;
    let keys: Vec<String> = entries.iter().map(|(k, _)| k.clone()).collect();
    state.db.put_settings(entries).await?;
    info!(?keys, "Site settings updated");
    get_settings(State(state)).await
}

/// GET /admin/api/events
async fn list_events(
    State(state): State<LaunchpadState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<DbMarketingEvent>>, LaunchpadError> {
    let Query(query) = query?;
    let page = query.page();
    let (items, total) = state
        .db
        .list_events(EventFilter {
            page,
            event_name: non_empty(query.event_name),
        })
        .await?;
    Ok(page_of(items, page, total))
}

/// GET /admin/api/email-logs
async fn list_email_logs(
    State(state): State<LaunchpadState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<DbEmailLog>>, LaunchpadError> {
    let Query(query) = query?;
    let page = query.page();
    let (items, total) = state
        .db
        .list_email_logs(EmailLogFilter {
            page,
            template: non_empty(query.template),
        })
        .await?;
    Ok(page_of(items, page, total))
}

/// POST /admin/api/campaigns/drip
async fn trigger_drip(
    State(state): State<LaunchpadState>,
) -> Result<Json<CampaignReport>, LaunchpadError> {
    info!("Drip campaign triggered by admin");
    Ok(Json(run_drip(&state).await?))
}

/// POST /admin/api/campaigns/countdown
async fn trigger_countdown(
    State(state): State<LaunchpadState>,
) -> Result<Json<CampaignReport>, LaunchpadError> {
    info!("Countdown campaign triggered by admin");
    Ok(Json(run_countdown(&state).await?))
}
