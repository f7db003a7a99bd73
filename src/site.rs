//! Runtime site settings stored as JSON values in `site_settings`, layered over config.

use crate::config::Config;
use crate::db::{DbActorHandle, DbSiteSetting};
use crate::error::LaunchpadError;
use chrono::{DateTime, Utc};
use launchpad_schema::SiteConfig;
use serde_json::{Map, Value};
use tracing::warn;

pub const PRESALE_OPEN: &str = "presale_open";
pub const LAUNCH_AT: &str = "launch_at";
pub const META_PIXEL_ID: &str = "meta_pixel_id";
pub const TIKTOK_PIXEL_ID: &str = "tiktok_pixel_id";
pub const ANNOUNCEMENT: &str = "announcement";

const KNOWN_KEYS: [&str; 5] = [
    PRESALE_OPEN,
    LAUNCH_AT,
    META_PIXEL_ID,
    TIKTOK_PIXEL_ID,
    ANNOUNCEMENT,
];

pub async fn load_site_config(db: &DbActorHandle, cfg: &Config) -> Result<SiteConfig, LaunchpadError> {
    let rows = db.list_settings().await?;
    Ok(merge_settings(&rows, cfg))
}

/// Stored settings win over config values; a stored JSON `null` clears the value.
pub fn merge_settings(rows: &[DbSiteSetting], cfg: &Config) -> SiteConfig {
    let mut site = SiteConfig {
        presale_open: true,
        launch_at: cfg.presale.launch_at,
        meta_pixel_id: cfg.pixels.meta_pixel_id.clone(),
        tiktok_pixel_id: cfg.pixels.tiktok_pixel_id.clone(),
        announcement: None,
    };

    for row in rows {
        let value: Value = match serde_json::from_str(&row.value) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = %row.key, error = %e, "Ignoring malformed site setting");
                continue;
            }
        };
        match row.key.as_str() {
            PRESALE_OPEN => {
                if let Some(open) = value.as_bool() {
                    site.presale_open = open;
                }
            }
            LAUNCH_AT => site.launch_at = parse_launch_at(&value),
            META_PIXEL_ID => site.meta_pixel_id = value.as_str().map(str::to_string),
            TIKTOK_PIXEL_ID => site.tiktok_pixel_id = value.as_str().map(str::to_string),
            ANNOUNCEMENT => site.announcement = value.as_str().map(str::to_string),
            _ => {}
        }
    }
    site
}

fn parse_launch_at(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Validate an admin settings update and turn it into `(key, json)` pairs.
pub fn validate_settings_update(
    update: Map<String, Value>,
) -> Result<Vec<(String, String)>, LaunchpadError> {
    let mut entries = Vec::with_capacity(update.len());
    for (key, value) in update {
        let ok = match key.as_str() {
            PRESALE_OPEN => value.is_boolean(),
            LAUNCH_AT => value.is_null() || parse_launch_at(&value).is_some(),
            META_PIXEL_ID | TIKTOK_PIXEL_ID | ANNOUNCEMENT => value.is_null() || value.is_string(),
            _ => {
                return Err(LaunchpadError::validation(
                    "UNKNOWN_SETTING",
                    format!("Unknown setting '{key}'. Known: {}", KNOWN_KEYS.join(", ")),
                ));
            }
        };
        if !ok {
            return Err(LaunchpadError::validation(
                "INVALID_SETTING",
                format!("Invalid value for setting '{key}'"),
            ));
        }
        entries.push((key, value.to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(key: &str, value: Value) -> DbSiteSetting {
        DbSiteSetting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn settings_override_config() {
        let mut cfg = Config::default();
        cfg.pixels.meta_pixel_id = Some("cfg-meta".to_string());

        let site = merge_settings(&[], &cfg);
        assert!(site.presale_open);
        assert_eq!(site.meta_pixel_id.as_deref(), Some("cfg-meta"));

        let rows = [
            row(PRESALE_OPEN, json!(false)),
            row(META_PIXEL_ID, Value::Null),
            row(LAUNCH_AT, json!("2026-12-01T12:00:00Z")),
        ];
        let site = merge_settings(&rows, &cfg);
        assert!(!site.presale_open);
        assert_eq!(site.meta_pixel_id, None);
        assert_eq!(
            site.launch_at.map(|d| d.to_rfc3339()).as_deref(),
            Some("2026-12-01T12:00:00+00:00")
        );
    }

    #[test]
    fn update_rejects_unknown_and_mistyped_keys() {
        let update = |v: Value| validate_settings_update(v.as_object().unwrap().clone());

        assert!(update(json!({"presale_open": false, "launch_at": null})).is_ok());
        assert!(matches!(
            update(json!({"nope": 1})),
            Err(LaunchpadError::Validation { code: "UNKNOWN_SETTING", .. })
        ));
        assert!(matches!(
            update(json!({"presale_open": "yes"})),
            Err(LaunchpadError::Validation { code: "INVALID_SETTING", .. })
        ));
        assert!(update(json!({"launch_at": "tomorrow"})).is_err());
    }
}
