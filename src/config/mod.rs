mod basic;
mod email;
mod integrations;
mod presale;

pub use basic::BasicConfig;
pub use email::EmailConfig;
pub use integrations::{ChangelogConfig, ChatConfig, PixelsConfig, RateLimitConfig};
pub use presale::PresaleConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Pricing constants and commitment bounds.
    #[serde(default)]
    pub presale: PresaleConfig,

    /// Email provider and campaign schedule.
    #[serde(default)]
    pub email: EmailConfig,

    /// Chat assistant upstream.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Public changelog source.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub pixels: PixelsConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    ///
    /// Note: this does **not** validate required fields like `basic.admin_key`. Binaries should
    /// call `Config::from_toml()` instead (or validate explicitly) to avoid running with insecure
    /// defaults.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Loads configuration from the TOML file (with defaults) and validates required fields.
    pub fn from_toml() -> Self {
        if !PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            panic!("config file not found: {}", DEFAULT_CONFIG_FILE);
        }
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!(
                "failed to extract configuration from {}: {err}",
                DEFAULT_CONFIG_FILE
            )
        });
        if let Err(reason) = cfg.validate() {
            panic!("{reason}");
        }
        cfg
    }

    /// Checks invariants the rest of the service relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.basic.admin_key.trim().is_empty() {
            return Err("basic.admin_key must be set and non-empty".to_string());
        }
        if let Some(secret) = self.basic.cookie_secret.as_deref()
            && secret.len() < 32
        {
            return Err("basic.cookie_secret must be at least 32 bytes".to_string());
        }
        let p = &self.presale;
        if !(p.token_price_usd > 0.0) {
            return Err("presale.token_price_usd must be positive".to_string());
        }
        if p.min_commitment_usd > p.max_commitment_usd {
            return Err(
                "presale.min_commitment_usd must not exceed presale.max_commitment_usd".to_string(),
            );
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fail_validation_without_admin_key() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                admin_key = 12345

                [presale]
                min_commitment_usd = 50

                [email]
                drip_offsets_days = [2, 5]
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(cfg.basic.admin_key, "12345");
        assert_eq!(cfg.presale.min_commitment_usd, 50.0);
        assert_eq!(cfg.presale.max_commitment_usd, 10_000.0);
        assert_eq!(cfg.email.drip_offsets_days, vec![2, 5]);
        assert_eq!(cfg.email.countdown_offsets_hours, vec![72, 24, 1]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn short_cookie_secret_is_rejected() {
        let mut cfg = Config::default();
        cfg.basic.admin_key = "k".to_string();
        cfg.basic.cookie_secret = Some("too-short".to_string());
        assert!(cfg.validate().is_err());
    }
}
