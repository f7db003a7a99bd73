use crate::campaigns::schedule::{drip_window, due_countdown_offset};
use crate::db::{DbActorHandle, DbWaitlistEntry};
use crate::email::templates::{countdown_template, drip_template};
use crate::email::{Mailer, RenderedEmail, Templates, deliver};
use crate::error::LaunchpadError;
use chrono::{DateTime, Utc};
use launchpad_schema::{CampaignReport, TemplateReport};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::info;

/// Sequential campaign sender. Rows with a `sent` log for a template are never
/// selected again for it; failed rows stay eligible for the next run.
///
/// Runs sharing a run lock never overlap, so a recipient list is only read
/// after the previous run has logged its sends.
#[derive(Clone)]
pub struct CampaignRunner {
    db: DbActorHandle,
    mailer: Arc<dyn Mailer>,
    templates: Templates,
    send_delay: Duration,
    run_lock: Arc<Mutex<()>>,
}

impl CampaignRunner {
    pub fn new(
        db: DbActorHandle,
        mailer: Arc<dyn Mailer>,
        templates: Templates,
        send_delay: Duration,
    ) -> Self {
        Self {
            db,
            mailer,
            templates,
            send_delay,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Serialize runs with every other runner holding the same lock.
    #[must_use]
    pub fn with_run_lock(mut self, run_lock: Arc<Mutex<()>>) -> Self {
        self.run_lock = run_lock;
        self
    }

    pub async fn run_drip(
        &self,
        now: DateTime<Utc>,
        offsets_days: &[u32],
    ) -> Result<CampaignReport, LaunchpadError> {
        let _running = self.run_lock.lock().await;
        let mut report = CampaignReport {
            kind: "drip".to_string(),
            ran_at: now,
            templates: Vec::with_capacity(offsets_days.len()),
        };
        let mut first_send = true;

        for &day in offsets_days {
            let template = drip_template(day);
            let (from, to) = drip_window(now, day);
            let recipients = self
                .db
                .list_drip_recipients(from, to, template.clone())
                .await?;

            let result = self
                .dispatch(template, &recipients, &mut first_send, |entry| {
                    self.templates.drip(day, entry)
                })
                .await;
            report.templates.push(result);
        }

        log_report(&report);
        Ok(report)
    }

    /// Sends the one due countdown template, if `launch_at` is set and an offset is due.
    pub async fn run_countdown(
        &self,
        now: DateTime<Utc>,
        launch_at: Option<DateTime<Utc>>,
        offsets_hours: &[u32],
    ) -> Result<CampaignReport, LaunchpadError> {
        let _running = self.run_lock.lock().await;
        let mut report = CampaignReport {
            kind: "countdown".to_string(),
            ran_at: now,
            templates: Vec::new(),
        };

        let Some(launch_at) = launch_at else {
            info!("Countdown skipped: no launch date configured");
            return Ok(report);
        };
        let Some(hours) = due_countdown_offset(now, launch_at, offsets_hours) else {
            info!(%launch_at, "Countdown skipped: no offset due");
            return Ok(report);
        };

        let template = countdown_template(hours);
        let recipients = self.db.list_countdown_recipients(template.clone()).await?;
        let mut first_send = true;
        let result = self
            .dispatch(template, &recipients, &mut first_send, |entry| {
                self.templates.countdown(hours, entry, launch_at)
            })
            .await;
        report.templates.push(result);

        log_report(&report);
        Ok(report)
    }

    async fn dispatch<F>(
        &self,
        template: String,
        recipients: &[DbWaitlistEntry],
        first_send: &mut bool,
        render: F,
    ) -> TemplateReport
    where
        F: Fn(&DbWaitlistEntry) -> RenderedEmail,
    {
        let mut result = TemplateReport {
            template,
            eligible: recipients.len(),
            ..TemplateReport::default()
        };

        for entry in recipients {
            if !*first_send && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            *first_send = false;

            if deliver(self.mailer.as_ref(), &self.db, &entry.email, render(entry)).await {
                result.sent += 1;
            } else {
                result.failed += 1;
            }
        }
        result
    }
}

fn log_report(report: &CampaignReport) {
    info!(
        kind = %report.kind,
        templates = report.templates.len(),
        sent = report.total_sent(),
        failed = report.total_failed(),
        "Campaign run finished"
    );
}
