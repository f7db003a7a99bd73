use serde::{Deserialize, Serialize};
use url::Url;

/// Transactional email and campaign settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// API key for the email provider. Unset disables every outbound email.
    /// TOML: `email.api_key`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Send endpoint (Resend-compatible).
    /// TOML: `email.api_url`. Default: `https://api.resend.com/emails`.
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// Sender, e.g. `Launchpad <hello@example.com>`.
    /// TOML: `email.from`.
    #[serde(default = "default_from")]
    pub from: String,

    /// Where new-commitment notifications go. Unset => no notification.
    /// TOML: `email.admin_notify`.
    #[serde(default)]
    pub admin_notify: Option<String>,

    /// Public site URL used for links inside emails.
    /// TOML: `email.site_url`.
    #[serde(default = "default_site_url")]
    pub site_url: Url,

    /// Pause between consecutive campaign sends, in milliseconds.
    /// TOML: `email.send_delay_ms`. Default: `600`.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// Days-after-signup offsets of the drip campaign.
    /// TOML: `email.drip_offsets_days`. Default: `[1, 3, 7, 14]`.
    #[serde(default = "default_drip_offsets_days")]
    pub drip_offsets_days: Vec<u32>,

    /// Hours-before-launch offsets of the countdown campaign.
    /// TOML: `email.countdown_offsets_hours`. Default: `[72, 24, 1]`.
    #[serde(default = "default_countdown_offsets_hours")]
    pub countdown_offsets_hours: Vec<u32>,

    /// Run both campaigns in-process at this interval. Unset => only the cron endpoints trigger them.
    /// TOML: `email.campaign_interval_secs`.
    #[serde(default)]
    pub campaign_interval_secs: Option<u64>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            from: default_from(),
            admin_notify: None,
            site_url: default_site_url(),
            send_delay_ms: default_send_delay_ms(),
            drip_offsets_days: default_drip_offsets_days(),
            countdown_offsets_hours: default_countdown_offsets_hours(),
            campaign_interval_secs: None,
        }
    }
}

fn default_api_url() -> Url {
    Url::parse("https://api.resend.com/emails").expect("valid email API URL")
}

fn default_from() -> String {
    "Launchpad <hello@example.com>".to_string()
}

fn default_site_url() -> Url {
    Url::parse("http://localhost:3000/").expect("valid site URL")
}

fn default_send_delay_ms() -> u64 {
    600
}

fn default_drip_offsets_days() -> Vec<u32> {
    vec![1, 3, 7, 14]
}

fn default_countdown_offsets_hours() -> Vec<u32> {
    vec![72, 24, 1]
}
