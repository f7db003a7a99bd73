use crate::error::LaunchpadError;
use crate::server::guards::auth::RequireCron;
use crate::server::router::LaunchpadState;
use crate::site::load_site_config;
use axum::{Json, Router, extract::State, middleware, routing::post};
use chrono::Utc;
use launchpad_schema::CampaignReport;

pub fn router(state: &LaunchpadState) -> Router<LaunchpadState> {
    Router::new()
        .route("/api/cron/drip", post(cron_drip))
        .route("/api/cron/countdown", post(cron_countdown))
        .route_layer(middleware::from_extractor_with_state::<RequireCron, _>(
            state.clone(),
        ))
}

/// Shared by the cron and admin triggers.
pub(super) async fn run_drip(state: &LaunchpadState) -> Result<CampaignReport, LaunchpadError> {
    let runner = state
        .campaign_runner()
        .ok_or(LaunchpadError::Disabled("Email"))?;
    runner
        .run_drip(Utc::now(), &state.cfg.email.drip_offsets_days)
        .await
}

pub(super) async fn run_countdown(state: &LaunchpadState) -> Result<CampaignReport, LaunchpadError> {
    let runner = state
        .campaign_runner()
        .ok_or(LaunchpadError::Disabled("Email"))?;
    let site = load_site_config(&state.db, &state.cfg).await?;
    runner
        .run_countdown(
            Utc::now(),
            site.launch_at,
            &state.cfg.email.countdown_offsets_hours,
        )
        .await
}

/// POST /api/cron/drip
async fn cron_drip(State(state): State<LaunchpadState>) -> Result<Json<CampaignReport>, LaunchpadError> {
    Ok(Json(run_drip(&state).await?))
}

/// POST /api/cron/countdown
async fn cron_countdown(
    State(state): State<LaunchpadState>,
) -> Result<Json<CampaignReport>, LaunchpadError> {
    Ok(Json(run_countdown(&state).await?))
}
