//! RecordPatch -> DbPatchable implementation.
//!
//! This sits in the `db` module because it contains SQL/table knowledge.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::LaunchpadError;
use crate::patches::{CommitmentPatch, DbPatchable, RecordPatch, WaitlistPatch};

#[async_trait]
impl DbPatchable for RecordPatch {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<(), LaunchpadError> {
        match self {
            RecordPatch::Commitment { id, patch } => {
                let id = *id;
                let CommitmentPatch { status } = patch.clone();

                let status_set = status.is_some();
                let updated_at = Utc::now();

                let res = sqlx::query(
                    r#"
                    UPDATE commitments
                    SET
                        status = COALESCE(?, status),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(status.map(|s| s.as_str()))
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                let affected = res.rows_affected();
                debug!(
                    table = "commitments",
                    id,
                    affected,
                    updated_at = %updated_at,
                    status_set,
                    "db patch applied"
                );

                if affected == 0 {
                    return Err(LaunchpadError::NotFound("Commitment"));
                }

                Ok(())
            }

            RecordPatch::Waitlist { id, patch } => {
                let id = *id;
                let WaitlistPatch { unsubscribed } = patch.clone();

                let res = sqlx::query(
                    r#"
                    UPDATE waitlist
                    SET unsubscribed = COALESCE(?, unsubscribed)
                    WHERE id = ?
                    "#,
                )
                .bind(unsubscribed)
                .bind(id)
                .execute(pool)
                .await?;

                let affected = res.rows_affected();
                debug!(
                    table = "waitlist",
                    id,
                    affected,
                    unsubscribed_set = unsubscribed.is_some(),
                    "db patch applied"
                );

                if affected == 0 {
                    return Err(LaunchpadError::NotFound("Waitlist entry"));
                }

                Ok(())
            }
        }
    }
}
