use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::presale::{CommitmentStatus, TierView};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitmentStatusPatch {
    pub status: CommitmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistEntryPatch {
    pub unsubscribed: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TierUpsert {
    pub name: String,
    pub min_count: i64,
    #[serde(default)]
    pub max_count: Option<i64>,
    pub bonus_percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardStats {
    pub signups_total: i64,
    pub signups_24h: i64,
    pub referred_signups: i64,
    pub unsubscribed: i64,
    pub commitments: StatusCounts,
    pub raised_usd: f64,
    pub committed_tokens: f64,
    pub emails_sent: i64,
    pub emails_failed: i64,
    pub current_tier: Option<TierView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateReport {
    pub template: String,
    pub eligible: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampaignReport {
    pub kind: String,
    pub ran_at: DateTime<Utc>,
    pub templates: Vec<TemplateReport>,
}

impl CampaignReport {
    pub fn total_sent(&self) -> usize {
        self.templates.iter().map(|t| t.sent).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.templates.iter().map(|t| t.failed).sum()
    }
}
