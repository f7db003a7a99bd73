//! Drip (days after signup) and countdown (hours before launch) email campaigns.

pub mod runner;
pub mod schedule;

pub use runner::CampaignRunner;

use crate::config::Config;
use crate::db::DbActorHandle;
use crate::site::load_site_config;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Run both campaigns every `interval` in the background.
pub fn spawn_ticker(
    runner: CampaignRunner,
    db: DbActorHandle,
    cfg: Arc<Config>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Campaign ticker started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; campaigns wait a full period after boot.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let now = Utc::now();

            if let Err(e) = runner.run_drip(now, &cfg.email.drip_offsets_days).await {
                warn!(error = %e, "Scheduled drip campaign failed");
            }

            let launch_at = match load_site_config(&db, &cfg).await {
                Ok(site) => site.launch_at,
                Err(e) => {
                    warn!(error = %e, "Failed to load site settings for countdown");
                    continue;
                }
            };
            if let Err(e) = runner
                .run_countdown(now, launch_at, &cfg.email.countdown_offsets_hours)
                .await
            {
                warn!(error = %e, "Scheduled countdown campaign failed");
            }
        }
    })
}
