//! Crate-private patch types shared across the DB actor and the admin routes.
//!
//! The `db` module re-exports these so external paths remain stable
//! (e.g. `launchpad::db::RecordPatch`).

use async_trait::async_trait;
use launchpad_schema::CommitmentStatus;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Abstraction for applying a patch payload/envelope to the database.
#[async_trait]
pub trait DbPatchable {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<(), crate::error::LaunchpadError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitmentPatch {
    /// `None` => do not change; `Some(v)` => update
    pub status: Option<CommitmentStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitlistPatch {
    /// `None` => do not change; `Some(v)` => update
    pub unsubscribed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum RecordPatch {
    Commitment { id: i64, patch: CommitmentPatch },
    Waitlist { id: i64, patch: WaitlistPatch },
}
