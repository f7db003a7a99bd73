use serde::{Deserialize, Serialize};
use serde_json::Value;

// Re-export patch payload/envelope types from the neutral crate-private module.
pub use crate::patches::{CommitmentPatch, RecordPatch, WaitlistPatch};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitlistCreate {
    /// Already normalized (trimmed, lowercased).
    pub email: String,
    /// Referral code as supplied by the visitor; unknown codes are dropped.
    pub referred_by: Option<String>,
    pub source: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentCreate {
    /// Already normalized (trimmed, lowercased).
    pub email: String,
    pub wallet_address: Option<String>,
    pub amount_usd: f64,
    pub token_price_usd: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketingEventCreate {
    pub event_name: String,
    pub source: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub referrer: Option<String>,
    pub metadata: Option<Value>,
    pub client_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailLogStatus {
    Sent,
    Failed,
}

impl EmailLogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailLogStatus::Sent => "sent",
            EmailLogStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLogCreate {
    pub recipient: String,
    pub template: String,
    pub status: EmailLogStatus,
    pub provider_id: Option<String>,
    pub error: Option<String>,
}

impl EmailLogCreate {
    pub fn sent(recipient: &str, template: &str, provider_id: Option<String>) -> Self {
        Self {
            recipient: recipient.to_string(),
            template: template.to_string(),
            status: EmailLogStatus::Sent,
            provider_id,
            error: None,
        }
    }

    pub fn failed(recipient: &str, template: &str, error: String) -> Self {
        Self {
            recipient: recipient.to_string(),
            template: template.to_string(),
            status: EmailLogStatus::Failed,
            provider_id: None,
            error: Some(error),
        }
    }
}
