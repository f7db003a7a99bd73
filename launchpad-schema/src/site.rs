use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public configuration consumed by the landing site.
///
/// Pixel ids are only handed out; whether the scripts load is decided
/// client-side by the stored consent flag.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub presale_open: bool,
    pub launch_at: Option<DateTime<Utc>>,
    pub meta_pixel_id: Option<String>,
    pub tiktok_pixel_id: Option<String>,
    pub announcement: Option<String>,
}
