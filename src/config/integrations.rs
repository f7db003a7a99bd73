use serde::{Deserialize, Serialize};
use url::Url;

/// Chat assistant upstream (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// TOML: `chat.api_key`. Unset disables `/api/chat`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// TOML: `chat.api_url`. Default: `https://api.openai.com/v1/chat/completions`.
    #[serde(default = "default_chat_api_url")]
    pub api_url: Url,

    /// TOML: `chat.model`. Default: `gpt-4o-mini`.
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Prepended as the `system` message of every conversation.
    /// TOML: `chat.system_prompt`.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// TOML: `chat.max_messages`. Default: `20`.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Per-message character cap. TOML: `chat.max_message_chars`. Default: `4000`.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// TOML: `chat.max_tokens`.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Max retry attempts when the upstream answers 5xx before streaming.
    /// TOML: `chat.retry_max_times`. Default: `2`.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_chat_api_url(),
            model: default_chat_model(),
            system_prompt: default_system_prompt(),
            max_messages: default_max_messages(),
            max_message_chars: default_max_message_chars(),
            max_tokens: None,
            retry_max_times: default_retry_max_times(),
        }
    }
}

/// Public changelog source (code-hosting REST API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChangelogConfig {
    /// TOML: `changelog.api_base`. Default: `https://api.github.com/`.
    #[serde(default = "default_changelog_api_base")]
    pub api_base: Url,

    /// TOML: `changelog.owner`.
    #[serde(default)]
    pub owner: String,

    /// TOML: `changelog.repo`.
    #[serde(default)]
    pub repo: String,

    /// Optional token, raises the unauthenticated rate limit.
    /// TOML: `changelog.token`.
    #[serde(default)]
    pub token: Option<String>,

    /// TOML: `changelog.per_page`. Default: `20`.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// TOML: `changelog.cache_ttl_secs`. Default: `600`.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            api_base: default_changelog_api_base(),
            owner: String::new(),
            repo: String::new(),
            token: None,
            per_page: default_per_page(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Inbound rate limiting on the public write endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Sustained requests per minute per client.
    /// TOML: `rate_limit.per_minute`. Default: `10`.
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,

    /// Burst allowance per client.
    /// TOML: `rate_limit.burst`. Default: `5`.
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            burst: default_burst(),
        }
    }
}

/// Advertising pixel ids handed to the landing site.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PixelsConfig {
    /// TOML: `pixels.meta_pixel_id`.
    #[serde(default)]
    pub meta_pixel_id: Option<String>,

    /// TOML: `pixels.tiktok_pixel_id`.
    #[serde(default)]
    pub tiktok_pixel_id: Option<String>,
}

fn default_chat_api_url() -> Url {
    Url::parse("https://api.openai.com/v1/chat/completions").expect("valid chat completions URL")
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt() -> String {
    "You are the support assistant for a self-custody crypto wallet presale. \
     Answer questions about the wallet, the waitlist and the presale tiers. \
     Never give financial advice."
        .to_string()
}

fn default_max_messages() -> usize {
    20
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_retry_max_times() -> usize {
    2
}

fn default_changelog_api_base() -> Url {
    Url::parse("https://api.github.com/").expect("valid code-hosting API URL")
}

fn default_per_page() -> u32 {
    20
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_per_minute() -> u32 {
    10
}

fn default_burst() -> u32 {
    5
}
