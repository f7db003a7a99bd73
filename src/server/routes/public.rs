use crate::db::{
    CommitmentCreate, DbPricingTier, MarketingEventCreate, PresaleTotals, WaitlistCreate,
};
use crate::email::spawn_deliver;
use crate::error::LaunchpadError;
use crate::integrations::chat::relay_stream;
use crate::pricing::{allocate_tokens, select_tier, validate_amount};
use crate::referral::normalize_referral_code;
use crate::server::ratelimit::RateLimit;
use crate::server::router::LaunchpadState;
use crate::site::load_site_config;
use crate::utils::logging::with_pretty_json_debug;
use crate::utils::validate::{clean_optional, normalize_email};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use launchpad_schema::{
    ChangelogEntry, ChatRequest, CommitmentRequest, CommitmentResponse, MarketingEventRequest,
    PublicStats, QuoteResponse, SiteConfig, TierView, TiersResponse, WaitlistSignupRequest,
    WaitlistSignupResponse, WaitlistStatusResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

const MAX_ATTRIBUTION_LEN: usize = 256;
const MAX_EVENT_NAME_LEN: usize = 64;
const MAX_EVENT_METADATA_BYTES: usize = 4096;

pub fn router() -> Router<LaunchpadState> {
    Router::new()
        .route("/api/waitlist", post(waitlist_signup))
        .route("/api/waitlist/{referral_code}", get(waitlist_status))
        .route("/api/unsubscribe", get(unsubscribe))
        .route("/api/commitments", post(create_commitment))
        .route("/api/presale/quote", get(presale_quote))
        .route("/api/tiers", get(list_tiers))
        .route("/api/stats", get(public_stats))
        .route("/api/site", get(site_config))
        .route("/api/events", post(record_event))
        .route("/api/chat", post(chat))
        .route("/api/changelog", get(changelog))
}

/// Tier list plus the aggregates tier selection depends on.
async fn pricing_snapshot(
    state: &LaunchpadState,
) -> Result<(Vec<DbPricingTier>, PresaleTotals), LaunchpadError> {
    let tiers = state.db.list_tiers().await?;
    let totals = state.db.presale_totals().await?;
    Ok((tiers, totals))
}

fn current_tier(tiers: &[DbPricingTier], buyer_count: i64) -> Option<TierView> {
    select_tier(tiers, buyer_count).map(TierView::from)
}

/// POST /api/waitlist
async fn waitlist_signup(
    State(state): State<LaunchpadState>,
    _limit: RateLimit,
    payload: Result<Json<WaitlistSignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WaitlistSignupResponse>), LaunchpadError> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email)?;

    let create = WaitlistCreate {
        email,
        referred_by: req.referral.as_deref().and_then(normalize_referral_code),
        source: clean_optional(req.source, MAX_ATTRIBUTION_LEN),
        utm_source: clean_optional(req.utm_source, MAX_ATTRIBUTION_LEN),
        utm_medium: clean_optional(req.utm_medium, MAX_ATTRIBUTION_LEN),
        utm_campaign: clean_optional(req.utm_campaign, MAX_ATTRIBUTION_LEN),
    };

    let entry = state.db.create_signup(create).await?;
    let position = state.db.waitlist_position(entry.id).await?;
    info!(id = entry.id, position, "Waitlist signup");

    if let Some(mailer) = state.mailer.clone() {
        let email = state.templates.welcome(&entry, position);
        spawn_deliver(mailer, state.db.clone(), entry.email.clone(), email);
    }

    Ok((
        StatusCode::CREATED,
        Json(WaitlistSignupResponse {
            position,
            referral_code: entry.referral_code,
        }),
    ))
}

/// GET /api/waitlist/{referral_code}
async fn waitlist_status(
    State(state): State<LaunchpadState>,
    Path(referral_code): Path<String>,
) -> Result<Json<WaitlistStatusResponse>, LaunchpadError> {
    let code =
        normalize_referral_code(&referral_code).ok_or(LaunchpadError::NotFound("Waitlist entry"))?;
    let entry = state
        .db
        .get_waitlist_by_code(code)
        .await?
        .ok_or(LaunchpadError::NotFound("Waitlist entry"))?;
    let position = state.db.waitlist_position(entry.id).await?;

    Ok(Json(WaitlistStatusResponse {
        position,
        referral_code: entry.referral_code,
        referral_count: entry.referral_count,
    }))
}

#[derive(Debug, Deserialize)]
struct UnsubscribeQuery {
    token: String,
}

/// GET /api/unsubscribe?token=
async fn unsubscribe(
    State(state): State<LaunchpadState>,
    query: Result<Query<UnsubscribeQuery>, QueryRejection>,
) -> Result<Json<Value>, LaunchpadError> {
    let Query(UnsubscribeQuery { token }) = query?;
    let token = token.trim();
    if token.is_empty() || !state.db.unsubscribe(token.to_string()).await? {
        return Err(LaunchpadError::NotFound("Subscription"));
    }
    info!("Waitlist entry unsubscribed");
    Ok(Json(json!({ "unsubscribed": true })))
}

/// POST /api/commitments
async fn create_commitment(
    State(state): State<LaunchpadState>,
    _limit: RateLimit,
    payload: Result<Json<CommitmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommitmentResponse>), LaunchpadError> {
    let Json(req) = payload?;
    let presale = &state.cfg.presale;

    let email = normalize_email(&req.email)?;
    validate_amount(
        req.amount_usd,
        presale.min_commitment_usd,
        presale.max_commitment_usd,
    )?;

    let site = load_site_config(&state.db, &state.cfg).await?;
    if !site.presale_open {
        return Err(LaunchpadError::Forbidden {
            code: "PRESALE_CLOSED",
            message: "The presale is not accepting commitments right now.".to_string(),
        });
    }

    let create = CommitmentCreate {
        email,
        wallet_address: clean_optional(req.wallet_address, MAX_ATTRIBUTION_LEN),
        amount_usd: req.amount_usd,
        token_price_usd: presale.token_price_usd,
    };
    let (commitment, tier) = state.db.create_commitment(create).await?;

    let allocation = allocate_tokens(
        commitment.amount_usd,
        presale.token_price_usd,
        tier.bonus_percent,
    );
    info!(
        id = commitment.id,
        tier = tier.tier_number,
        amount_usd = commitment.amount_usd,
        "Commitment recorded"
    );

    if let Some(mailer) = state.mailer.clone() {
        spawn_deliver(
            mailer.clone(),
            state.db.clone(),
            commitment.email.clone(),
            state.templates.commitment_confirmation(&commitment, &tier),
        );
        if let Some(admin) = state.cfg.email.admin_notify.clone() {
            spawn_deliver(
                mailer,
                state.db.clone(),
                admin,
                state.templates.admin_commitment(&commitment, &tier),
            );
        }
    }

    let body = CommitmentResponse {
        id: commitment.id,
        status: commitment.status(),
        email: commitment.email,
        amount_usd: commitment.amount_usd,
        tier: TierView::from(&tier),
        base_tokens: allocation.base_tokens,
        bonus_tokens: allocation.bonus_tokens,
        token_amount: commitment.token_amount,
    };
    with_pretty_json_debug(&body, |json| debug!("Commitment response:\n{json}"));

    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    amount_usd: f64,
}

/// GET /api/presale/quote?amount_usd=
async fn presale_quote(
    State(state): State<LaunchpadState>,
    query: Result<Query<QuoteQuery>, QueryRejection>,
) -> Result<Json<QuoteResponse>, LaunchpadError> {
    let Query(QuoteQuery { amount_usd }) = query?;
    let presale = &state.cfg.presale;
    validate_amount(
        amount_usd,
        presale.min_commitment_usd,
        presale.max_commitment_usd,
    )?;

    let (tiers, totals) = pricing_snapshot(&state).await?;
    let tier = select_tier(&tiers, totals.buyers)
        .ok_or_else(|| LaunchpadError::UnexpectedError("no pricing tiers configured".to_string()))?;
    let allocation = allocate_tokens(amount_usd, presale.token_price_usd, tier.bonus_percent);

    Ok(Json(QuoteResponse {
        amount_usd,
        token_price_usd: presale.token_price_usd,
        buyer_count: totals.buyers,
        tier: TierView::from(tier),
        base_tokens: allocation.base_tokens,
        bonus_tokens: allocation.bonus_tokens,
        total_tokens: allocation.total_tokens,
    }))
}

/// GET /api/tiers
async fn list_tiers(State(state): State<LaunchpadState>) -> Result<Json<TiersResponse>, LaunchpadError> {
    let (tiers, totals) = pricing_snapshot(&state).await?;
    Ok(Json(TiersResponse {
        current_tier: current_tier(&tiers, totals.buyers),
        buyer_count: totals.buyers,
        tiers: tiers.iter().map(TierView::from).collect(),
    }))
}

/// GET /api/stats
async fn public_stats(State(state): State<LaunchpadState>) -> Result<Json<PublicStats>, LaunchpadError> {
    let (tiers, totals) = pricing_snapshot(&state).await?;
    Ok(Json(PublicStats {
        signups: totals.signups,
        buyers: totals.buyers,
        raised_usd: totals.raised_usd,
        current_tier: current_tier(&tiers, totals.buyers),
    }))
}

/// GET /api/site
async fn site_config(State(state): State<LaunchpadState>) -> Result<Json<SiteConfig>, LaunchpadError> {
    Ok(Json(load_site_config(&state.db, &state.cfg).await?))
}

/// POST /api/events
async fn record_event(
    State(state): State<LaunchpadState>,
    limit: RateLimit,
    payload: Result<Json<MarketingEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), LaunchpadError> {
    let Json(req) = payload?;

    let event_name = req.event_name.trim().to_string();
    if event_name.is_empty() || event_name.len() > MAX_EVENT_NAME_LEN {
        return Err(LaunchpadError::validation(
            "INVALID_EVENT",
            format!("event_name must be 1 to {MAX_EVENT_NAME_LEN} characters."),
        ));
    }
    if let Some(metadata) = req.metadata.as_ref()
        && metadata.to_string().len() > MAX_EVENT_METADATA_BYTES
    {
        return Err(LaunchpadError::validation(
            "INVALID_EVENT",
            "metadata is too large.",
        ));
    }

    let id = state
        .db
        .record_event(MarketingEventCreate {
            event_name,
            source: clean_optional(req.source, MAX_ATTRIBUTION_LEN),
            utm_source: clean_optional(req.utm_source, MAX_ATTRIBUTION_LEN),
            utm_medium: clean_optional(req.utm_medium, MAX_ATTRIBUTION_LEN),
            utm_campaign: clean_optional(req.utm_campaign, MAX_ATTRIBUTION_LEN),
            referrer: clean_optional(req.referrer, MAX_ATTRIBUTION_LEN),
            metadata: req.metadata,
            client_key: Some(limit.client),
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "id": id }))))
}

/// POST /api/chat
async fn chat(
    State(state): State<LaunchpadState>,
    _limit: RateLimit,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, LaunchpadError> {
    let proxy = state.chat.clone().ok_or(LaunchpadError::Disabled("Chat"))?;
    let Json(req) = payload?;
    proxy.validate(&req.messages)?;

    debug!(messages = req.messages.len(), "Incoming chat request");
    let upstream = proxy.open_stream(req.messages).await?;
    Ok(relay_stream(upstream).into_response())
}

/// GET /api/changelog
async fn changelog(State(state): State<LaunchpadState>) -> Json<Vec<ChangelogEntry>> {
    let entries = state.changelog.recent().await;
    Json(entries.as_ref().clone())
}
