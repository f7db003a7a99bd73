use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/events`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarketingEventRequest {
    #[serde(alias = "eventName", alias = "event")]
    pub event_name: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, alias = "utmSource")]
    pub utm_source: Option<String>,
    #[serde(default, alias = "utmMedium")]
    pub utm_medium: Option<String>,
    #[serde(default, alias = "utmCampaign")]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}
