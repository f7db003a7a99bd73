use chrono::{DateTime, Utc};
use launchpad_schema::{CommitmentStatus, TierView};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbWaitlistEntry {
    pub id: i64,
    pub email: String,
    pub referral_code: String,
    /// Referral code of the referrer, when the signup carried a known one.
    pub referred_by: Option<String>,
    pub referral_count: i64,
    pub source: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub unsubscribe_token: String,
    pub unsubscribed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbCommitment {
    pub id: i64,
    pub waitlist_id: Option<i64>,
    pub email: String,
    pub wallet_address: Option<String>,
    pub amount_usd: f64,
    pub tier_number: i64,
    pub bonus_percent: f64,
    pub token_amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbCommitment {
    /// Unknown values (hand-edited rows) read as `pending`.
    pub fn status(&self) -> CommitmentStatus {
        self.status.parse().unwrap_or(CommitmentStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbPricingTier {
    pub tier_number: i64,
    pub name: String,
    pub min_count: i64,
    pub max_count: Option<i64>,
    pub bonus_percent: f64,
}

impl From<&DbPricingTier> for TierView {
    fn from(t: &DbPricingTier) -> Self {
        TierView {
            tier_number: t.tier_number,
            name: t.name.clone(),
            min_count: t.min_count,
            max_count: t.max_count,
            bonus_percent: t.bonus_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbSiteSetting {
    pub key: String,
    /// JSON text.
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbMarketingEvent {
    pub id: i64,
    pub event_name: String,
    pub source: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub referrer: Option<String>,
    pub metadata: Option<String>,
    pub client_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbEmailLog {
    pub id: i64,
    pub recipient: String,
    pub template: String,
    pub status: String,
    pub provider_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates behind the public stats and tier endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct PresaleTotals {
    pub signups: i64,
    pub buyers: i64,
    pub raised_usd: f64,
    pub committed_tokens: f64,
}

/// Extra counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct DashboardCounts {
    pub signups_24h: i64,
    pub referred_signups: i64,
    pub unsubscribed: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub emails_sent: i64,
    pub emails_failed: i64,
}
