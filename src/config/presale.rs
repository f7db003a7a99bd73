use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presale pricing and limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PresaleConfig {
    /// Fixed token price in USD.
    /// TOML: `presale.token_price_usd`. Default: `0.025`.
    #[serde(default = "default_token_price_usd")]
    pub token_price_usd: f64,

    /// Smallest accepted commitment (inclusive).
    /// TOML: `presale.min_commitment_usd`. Default: `100`.
    #[serde(default = "default_min_commitment_usd")]
    pub min_commitment_usd: f64,

    /// Largest accepted commitment (inclusive).
    /// TOML: `presale.max_commitment_usd`. Default: `10000`.
    #[serde(default = "default_max_commitment_usd")]
    pub max_commitment_usd: f64,

    /// Launch instant used by the countdown campaign and the public site config.
    /// The `launch_at` site setting overrides this at runtime.
    /// TOML: `presale.launch_at` (RFC 3339).
    #[serde(default)]
    pub launch_at: Option<DateTime<Utc>>,
}

impl Default for PresaleConfig {
    fn default() -> Self {
        Self {
            token_price_usd: default_token_price_usd(),
            min_commitment_usd: default_min_commitment_usd(),
            max_commitment_usd: default_max_commitment_usd(),
            launch_at: None,
        }
    }
}

fn default_token_price_usd() -> f64 {
    0.025
}

fn default_min_commitment_usd() -> f64 {
    100.0
}

fn default_max_commitment_usd() -> f64 {
    10_000.0
}
