use crate::db::models::{
    DashboardCounts, DbCommitment, DbEmailLog, DbMarketingEvent, DbPricingTier, DbSiteSetting,
    DbWaitlistEntry, PresaleTotals,
};
use crate::db::patch::{
    CommitmentCreate, EmailLogCreate, MarketingEventCreate, RecordPatch, WaitlistCreate,
};
use crate::db::query::{CommitmentFilter, EmailLogFilter, EventFilter, WaitlistFilter, like_pattern};
use crate::db::schema::SQLITE_INIT;
use crate::error::{LaunchpadError, is_unique_violation};
use crate::patches::DbPatchable;
use crate::pricing;
use crate::referral::generate_referral_code;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use launchpad_schema::admin::TierUpsert;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info, warn};

const REFERRAL_CODE_ATTEMPTS: usize = 5;

const WAITLIST_COLUMNS: &str = "id, email, referral_code, referred_by, referral_count, source, \
    utm_source, utm_medium, utm_campaign, unsubscribe_token, unsubscribed, created_at";

const COMMITMENT_COLUMNS: &str = "id, waitlist_id, email, wallet_address, amount_usd, tier_number, \
    bonus_percent, token_amount, status, created_at, updated_at";

type Reply<T> = RpcReplyPort<Result<T, LaunchpadError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert a waitlist signup (credits the referrer) and return the row.
    CreateSignup(WaitlistCreate, Reply<DbWaitlistEntry>),

    GetWaitlistById(i64, Reply<Option<DbWaitlistEntry>>),

    GetWaitlistByCode(String, Reply<Option<DbWaitlistEntry>>),

    /// 1-based position of a signup in creation order.
    WaitlistPosition(i64, Reply<i64>),

    ListWaitlist(WaitlistFilter, Reply<(Vec<DbWaitlistEntry>, i64)>),

    DeleteWaitlist(i64, Reply<bool>),

    /// Unsubscribe by token; `false` when no row carries it.
    Unsubscribe(String, Reply<bool>),

    /// Subscribed rows created in `[from, to)` without a `sent` log for `template`.
    ListDripRecipients {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        template: String,
        reply: Reply<Vec<DbWaitlistEntry>>,
    },

    /// All subscribed rows without a `sent` log for `template`.
    ListCountdownRecipients(String, Reply<Vec<DbWaitlistEntry>>),

    /// Price against the current buyer count and insert, atomically.
    CreateCommitment(CommitmentCreate, Reply<(DbCommitment, DbPricingTier)>),

    GetCommitment(i64, Reply<Option<DbCommitment>>),

    ListCommitments(CommitmentFilter, Reply<(Vec<DbCommitment>, i64)>),

    DeleteCommitment(i64, Reply<bool>),

    /// Patch a record by id.
    Patch(RecordPatch, Reply<()>),

    /// Tiers ordered by `min_count`.
    ListTiers(Reply<Vec<DbPricingTier>>),

    UpsertTier(i64, TierUpsert, Reply<DbPricingTier>),

    DeleteTier(i64, Reply<bool>),

    ListSettings(Reply<Vec<DbSiteSetting>>),

    /// Upsert `(key, json)` pairs.
    PutSettings(Vec<(String, String)>, Reply<()>),

    RecordEvent(MarketingEventCreate, Reply<i64>),

    ListEvents(EventFilter, Reply<(Vec<DbMarketingEvent>, i64)>),

    RecordEmail(EmailLogCreate, Reply<i64>),

    ListEmailLogs(EmailLogFilter, Reply<(Vec<DbEmailLog>, i64)>),

    PresaleTotals(Reply<PresaleTotals>),

    DashboardCounts(DateTime<Utc>, Reply<DashboardCounts>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

fn rpc_error(op: &str, e: impl std::fmt::Display) -> LaunchpadError {
    LaunchpadError::RactorError(format!("DbActor {op} RPC failed: {e}"))
}

impl DbActorHandle {
    pub async fn create_signup(&self, create: WaitlistCreate) -> Result<DbWaitlistEntry, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::CreateSignup, create)
            .map_err(|e| rpc_error("CreateSignup", e))?
    }

    pub async fn get_waitlist_by_id(&self, id: i64) -> Result<Option<DbWaitlistEntry>, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::GetWaitlistById, id)
            .map_err(|e| rpc_error("GetWaitlistById", e))?
    }

    pub async fn get_waitlist_by_code(
        &self,
        code: String,
    ) -> Result<Option<DbWaitlistEntry>, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::GetWaitlistByCode, code)
            .map_err(|e| rpc_error("GetWaitlistByCode", e))?
    }

    pub async fn waitlist_position(&self, id: i64) -> Result<i64, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::WaitlistPosition, id)
            .map_err(|e| rpc_error("WaitlistPosition", e))?
    }

    pub async fn list_waitlist(
        &self,
        filter: WaitlistFilter,
    ) -> Result<(Vec<DbWaitlistEntry>, i64), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListWaitlist, filter)
            .map_err(|e| rpc_error("ListWaitlist", e))?
    }

    pub async fn delete_waitlist(&self, id: i64) -> Result<bool, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::DeleteWaitlist, id)
            .map_err(|e| rpc_error("DeleteWaitlist", e))?
    }

    pub async fn unsubscribe(&self, token: String) -> Result<bool, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::Unsubscribe, token)
            .map_err(|e| rpc_error("Unsubscribe", e))?
    }

    pub async fn list_drip_recipients(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        template: String,
    ) -> Result<Vec<DbWaitlistEntry>, LaunchpadError> {
        ractor::call!(self.actor, |reply| DbActorMessage::ListDripRecipients {
            from,
            to,
            template,
            reply,
        })
        .map_err(|e| rpc_error("ListDripRecipients", e))?
    }

    pub async fn list_countdown_recipients(
        &self,
        template: String,
    ) -> Result<Vec<DbWaitlistEntry>, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListCountdownRecipients, template)
            .map_err(|e| rpc_error("ListCountdownRecipients", e))?
    }

    pub async fn create_commitment(
        &self,
        create: CommitmentCreate,
    ) -> Result<(DbCommitment, DbPricingTier), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::CreateCommitment, create)
            .map_err(|e| rpc_error("CreateCommitment", e))?
    }

    pub async fn get_commitment(&self, id: i64) -> Result<Option<DbCommitment>, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::GetCommitment, id)
            .map_err(|e| rpc_error("GetCommitment", e))?
    }

    pub async fn list_commitments(
        &self,
        filter: CommitmentFilter,
    ) -> Result<(Vec<DbCommitment>, i64), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListCommitments, filter)
            .map_err(|e| rpc_error("ListCommitments", e))?
    }

    pub async fn delete_commitment(&self, id: i64) -> Result<bool, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::DeleteCommitment, id)
            .map_err(|e| rpc_error("DeleteCommitment", e))?
    }

    pub async fn patch(&self, patch: RecordPatch) -> Result<(), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::Patch, patch).map_err(|e| rpc_error("Patch", e))?
    }

    pub async fn list_tiers(&self) -> Result<Vec<DbPricingTier>, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListTiers).map_err(|e| rpc_error("ListTiers", e))?
    }

    pub async fn upsert_tier(
        &self,
        tier_number: i64,
        tier: TierUpsert,
    ) -> Result<DbPricingTier, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::UpsertTier, tier_number, tier)
            .map_err(|e| rpc_error("UpsertTier", e))?
    }

    pub async fn delete_tier(&self, tier_number: i64) -> Result<bool, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::DeleteTier, tier_number)
            .map_err(|e| rpc_error("DeleteTier", e))?
    }

    pub async fn list_settings(&self) -> Result<Vec<DbSiteSetting>, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListSettings)
            .map_err(|e| rpc_error("ListSettings", e))?
    }

    pub async fn put_settings(&self, entries: Vec<(String, String)>) -> Result<(), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::PutSettings, entries)
            .map_err(|e| rpc_error("PutSettings", e))?
    }

    pub async fn record_event(&self, event: MarketingEventCreate) -> Result<i64, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::RecordEvent, event)
            .map_err(|e| rpc_error("RecordEvent", e))?
    }

    pub async fn list_events(
        &self,
        filter: EventFilter,
    ) -> Result<(Vec<DbMarketingEvent>, i64), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListEvents, filter)
            .map_err(|e| rpc_error("ListEvents", e))?
    }

    pub async fn record_email(&self, log: EmailLogCreate) -> Result<i64, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::RecordEmail, log)
            .map_err(|e| rpc_error("RecordEmail", e))?
    }

    pub async fn list_email_logs(
        &self,
        filter: EmailLogFilter,
    ) -> Result<(Vec<DbEmailLog>, i64), LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::ListEmailLogs, filter)
            .map_err(|e| rpc_error("ListEmailLogs", e))?
    }

    pub async fn presale_totals(&self) -> Result<PresaleTotals, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::PresaleTotals)
            .map_err(|e| rpc_error("PresaleTotals", e))?
    }

    pub async fn dashboard_counts(&self, now: DateTime<Utc>) -> Result<DashboardCounts, LaunchpadError> {
        ractor::call!(self.actor, DbActorMessage::DashboardCounts, now)
            .map_err(|e| rpc_error("DashboardCounts", e))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        seed_default_tiers(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db tier seed failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::CreateSignup(create, reply) => {
                let _ = reply.send(self.create_signup(pool, create).await);
            }
            DbActorMessage::GetWaitlistById(id, reply) => {
                let _ = reply.send(self.get_waitlist_by_id(pool, id).await);
            }
            DbActorMessage::GetWaitlistByCode(code, reply) => {
                let _ = reply.send(self.get_waitlist_by_code(pool, &code).await);
            }
            DbActorMessage::WaitlistPosition(id, reply) => {
                let _ = reply.send(self.waitlist_position(pool, id).await);
            }
            DbActorMessage::ListWaitlist(filter, reply) => {
                let _ = reply.send(self.list_waitlist(pool, filter).await);
            }
            DbActorMessage::DeleteWaitlist(id, reply) => {
                let _ = reply.send(delete_by_id(pool, "waitlist", id).await);
            }
            DbActorMessage::Unsubscribe(token, reply) => {
                let _ = reply.send(self.unsubscribe(pool, &token).await);
            }
            DbActorMessage::ListDripRecipients {
                from,
                to,
                template,
                reply,
            } => {
                let _ = reply.send(self.list_drip_recipients(pool, from, to, &template).await);
            }
            DbActorMessage::ListCountdownRecipients(template, reply) => {
                let _ = reply.send(self.list_countdown_recipients(pool, &template).await);
            }
            DbActorMessage::CreateCommitment(create, reply) => {
                let _ = reply.send(self.create_commitment(pool, create).await);
            }
            DbActorMessage::GetCommitment(id, reply) => {
                let _ = reply.send(self.get_commitment(pool, id).await);
            }
            DbActorMessage::ListCommitments(filter, reply) => {
                let _ = reply.send(self.list_commitments(pool, filter).await);
            }
            DbActorMessage::DeleteCommitment(id, reply) => {
                let _ = reply.send(delete_by_id(pool, "commitments", id).await);
            }
            DbActorMessage::Patch(patch, reply) => {
                let _ = reply.send(patch.apply_patch(pool).await);
            }
            DbActorMessage::ListTiers(reply) => {
                let _ = reply.send(list_tiers(pool).await);
            }
            DbActorMessage::UpsertTier(tier_number, tier, reply) => {
                let _ = reply.send(self.upsert_tier(pool, tier_number, tier).await);
            }
            DbActorMessage::DeleteTier(tier_number, reply) => {
                let _ = reply.send(self.delete_tier(pool, tier_number).await);
            }
            DbActorMessage::ListSettings(reply) => {
                let _ = reply.send(self.list_settings(pool).await);
            }
            DbActorMessage::PutSettings(entries, reply) => {
                let _ = reply.send(self.put_settings(pool, entries).await);
            }
            DbActorMessage::RecordEvent(event, reply) => {
                let _ = reply.send(self.record_event(pool, event).await);
            }
            DbActorMessage::ListEvents(filter, reply) => {
                let _ = reply.send(self.list_events(pool, filter).await);
            }
            DbActorMessage::RecordEmail(log, reply) => {
                let _ = reply.send(self.record_email(pool, log).await);
            }
            DbActorMessage::ListEmailLogs(filter, reply) => {
                let _ = reply.send(self.list_email_logs(pool, filter).await);
            }
            DbActorMessage::PresaleTotals(reply) => {
                let _ = reply.send(presale_totals(pool).await);
            }
            DbActorMessage::DashboardCounts(now, reply) => {
                let _ = reply.send(self.dashboard_counts(pool, now).await);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn create_signup(
        &self,
        pool: &SqlitePool,
        create: WaitlistCreate,
    ) -> Result<DbWaitlistEntry, LaunchpadError> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM waitlist WHERE email = ?")
            .bind(&create.email)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            return Err(LaunchpadError::already_registered());
        }

        let mut tx = pool.begin().await?;

        // Unknown referral codes are dropped rather than stored.
        let referred_by = match create.referred_by.as_deref() {
            Some(code) => {
                let res = sqlx::query(
                    "UPDATE waitlist SET referral_count = referral_count + 1 WHERE referral_code = ?",
                )
                .bind(code)
                .execute(&mut *tx)
                .await?;
                (res.rows_affected() > 0).then(|| code.to_string())
            }
            None => None,
        };

        let now = Utc::now();
        let unsubscribe_token = uuid::Uuid::new_v4().simple().to_string();
        let sql = format!(
            r#"
            INSERT INTO waitlist (
                email, referral_code, referred_by, referral_count, source,
                utm_source, utm_medium, utm_campaign, unsubscribe_token, unsubscribed, created_at
            )
            VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?, 0, ?)
            RETURNING {WAITLIST_COLUMNS}
            "#
        );

        let mut attempt = 0;
        let row = loop {
            attempt += 1;
            let code = generate_referral_code();
            let res = sqlx::query_as::<_, DbWaitlistEntry>(&sql)
                .bind(&create.email)
                .bind(&code)
                .bind(&referred_by)
                .bind(&create.source)
                .bind(&create.utm_source)
                .bind(&create.utm_medium)
                .bind(&create.utm_campaign)
                .bind(&unsubscribe_token)
                .bind(now)
                .fetch_one(&mut *tx)
                .await;

            match res {
                Ok(row) => break row,
                Err(e) if is_unique_violation(&e) && e.to_string().contains("waitlist.email") => {
                    return Err(LaunchpadError::already_registered());
                }
                Err(e) if is_unique_violation(&e) && attempt < REFERRAL_CODE_ATTEMPTS => {
                    warn!(attempt, error = %e, "Referral code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        };

        tx.commit().await?;

        debug!(
            id = row.id,
            referral_code = %row.referral_code,
            referred = row.referred_by.is_some(),
            "Waitlist signup stored"
        );
        Ok(row)
    }

    async fn get_waitlist_by_id(
        &self,
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<DbWaitlistEntry>, LaunchpadError> {
        let row = sqlx::query_as::<_, DbWaitlistEntry>(&format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    async fn get_waitlist_by_code(
        &self,
        pool: &SqlitePool,
        code: &str,
    ) -> Result<Option<DbWaitlistEntry>, LaunchpadError> {
        let row = sqlx::query_as::<_, DbWaitlistEntry>(&format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist WHERE referral_code = ?"
        ))
        .bind(code)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    async fn waitlist_position(&self, pool: &SqlitePool, id: i64) -> Result<i64, LaunchpadError> {
        let position: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist WHERE id <= ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(position)
    }

    async fn list_waitlist(
        &self,
        pool: &SqlitePool,
        filter: WaitlistFilter,
    ) -> Result<(Vec<DbWaitlistEntry>, i64), LaunchpadError> {
        let page = filter.page.normalized();
        let pattern = filter.search.as_deref().map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM waitlist WHERE (?1 IS NULL OR email LIKE ?1 ESCAPE '\')",
        )
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

        let rows = sqlx::query_as::<_, DbWaitlistEntry>(&format!(
            r"
            SELECT {WAITLIST_COLUMNS}
            FROM waitlist
            WHERE (?1 IS NULL OR email LIKE ?1 ESCAPE '\')
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "
        ))
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

        Ok((rows, total))
    }

    async fn unsubscribe(&self, pool: &SqlitePool, token: &str) -> Result<bool, LaunchpadError> {
        let res = sqlx::query("UPDATE waitlist SET unsubscribed = 1 WHERE unsubscribe_token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_drip_recipients(
        &self,
        pool: &SqlitePool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        template: &str,
    ) -> Result<Vec<DbWaitlistEntry>, LaunchpadError> {
        let rows = sqlx::query_as::<_, DbWaitlistEntry>(&format!(
            r#"
            SELECT {WAITLIST_COLUMNS}
            FROM waitlist w
            WHERE w.unsubscribed = 0
              AND w.created_at >= ?
              AND w.created_at < ?
              AND NOT EXISTS (
                  SELECT 1 FROM email_logs l
                  WHERE l.recipient = w.email AND l.template = ? AND l.status = 'sent'
              )
            ORDER BY w.id
            "#
        ))
        .bind(from)
        .bind(to)
        .bind(template)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn list_countdown_recipients(
        &self,
        pool: &SqlitePool,
        template: &str,
    ) -> Result<Vec<DbWaitlistEntry>, LaunchpadError> {
        let rows = sqlx::query_as::<_, DbWaitlistEntry>(&format!(
            r#"
            SELECT {WAITLIST_COLUMNS}
            FROM waitlist w
            WHERE w.unsubscribed = 0
              AND NOT EXISTS (
                  SELECT 1 FROM email_logs l
                  WHERE l.recipient = w.email AND l.template = ? AND l.status = 'sent'
              )
            ORDER BY w.id
            "#
        ))
        .bind(template)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn create_commitment(
        &self,
        pool: &SqlitePool,
        create: CommitmentCreate,
    ) -> Result<(DbCommitment, DbPricingTier), LaunchpadError> {
        let mut tx = pool.begin().await?;

        let tiers = sqlx::query_as::<_, DbPricingTier>(
            "SELECT tier_number, name, min_count, max_count, bonus_percent FROM pricing_tiers ORDER BY min_count",
        )
        .fetch_all(&mut *tx)
        .await?;

        let buyer_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM commitments WHERE status != 'cancelled'",
        )
        .fetch_one(&mut *tx)
        .await?;

        let tier = pricing::select_tier(&tiers, buyer_count)
            .cloned()
            .ok_or_else(|| LaunchpadError::UnexpectedError("no pricing tiers configured".to_string()))?;

        let allocation =
            pricing::allocate_tokens(create.amount_usd, create.token_price_usd, tier.bonus_percent);

        let waitlist_id: Option<i64> = sqlx::query_scalar("SELECT id FROM waitlist WHERE email = ?")
            .bind(&create.email)
            .fetch_optional(&mut *tx)
            .await?;

        let now = Utc::now();
        let row = sqlx::query_as::<_, DbCommitment>(&format!(
            r#"
            INSERT INTO commitments (
                waitlist_id, email, wallet_address, amount_usd, tier_number,
                bonus_percent, token_amount, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
            RETURNING {COMMITMENT_COLUMNS}
            "#
        ))
        .bind(waitlist_id)
        .bind(&create.email)
        .bind(&create.wallet_address)
        .bind(create.amount_usd)
        .bind(tier.tier_number)
        .bind(tier.bonus_percent)
        .bind(allocation.total_tokens)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            id = row.id,
            buyer_count,
            tier = tier.tier_number,
            amount_usd = row.amount_usd,
            token_amount = row.token_amount,
            "Commitment stored"
        );
        Ok((row, tier))
    }

    async fn get_commitment(
        &self,
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<DbCommitment>, LaunchpadError> {
        let row = sqlx::query_as::<_, DbCommitment>(&format!(
            "SELECT {COMMITMENT_COLUMNS} FROM commitments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    async fn list_commitments(
        &self,
        pool: &SqlitePool,
        filter: CommitmentFilter,
    ) -> Result<(Vec<DbCommitment>, i64), LaunchpadError> {
        let page = filter.page.normalized();
        let status = filter.status.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM commitments WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(pool)
                .await?;

        let rows = sqlx::query_as::<_, DbCommitment>(&format!(
            r#"
            SELECT {COMMITMENT_COLUMNS}
            FROM commitments
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

        Ok((rows, total))
    }

    async fn upsert_tier(
        &self,
        pool: &SqlitePool,
        tier_number: i64,
        tier: TierUpsert,
    ) -> Result<DbPricingTier, LaunchpadError> {
        let row = sqlx::query_as::<_, DbPricingTier>(
            r#"
            INSERT INTO pricing_tiers (tier_number, name, min_count, max_count, bonus_percent)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(tier_number) DO UPDATE SET
                name = excluded.name,
                min_count = excluded.min_count,
                max_count = excluded.max_count,
                bonus_percent = excluded.bonus_percent
            RETURNING tier_number, name, min_count, max_count, bonus_percent
            "#,
        )
        .bind(tier_number)
        .bind(tier.name)
        .bind(tier.min_count)
        .bind(tier.max_count)
        .bind(tier.bonus_percent)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    async fn delete_tier(&self, pool: &SqlitePool, tier_number: i64) -> Result<bool, LaunchpadError> {
        let res = sqlx::query("DELETE FROM pricing_tiers WHERE tier_number = ?")
            .bind(tier_number)
            .execute(pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_settings(&self, pool: &SqlitePool) -> Result<Vec<DbSiteSetting>, LaunchpadError> {
        let rows = sqlx::query_as::<_, DbSiteSetting>(
            "SELECT key, value, updated_at FROM site_settings ORDER BY key",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn put_settings(
        &self,
        pool: &SqlitePool,
        entries: Vec<(String, String)>,
    ) -> Result<(), LaunchpadError> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO site_settings (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn record_event(
        &self,
        pool: &SqlitePool,
        event: MarketingEventCreate,
    ) -> Result<i64, LaunchpadError> {
        let metadata = event.metadata.as_ref().map(serde_json::Value::to_string);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO marketing_events (
                event_name, source, utm_source, utm_medium, utm_campaign, referrer, metadata, client_key, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(event.event_name)
        .bind(event.source)
        .bind(event.utm_source)
        .bind(event.utm_medium)
        .bind(event.utm_campaign)
        .bind(event.referrer)
        .bind(metadata)
        .bind(event.client_key)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    async fn list_events(
        &self,
        pool: &SqlitePool,
        filter: EventFilter,
    ) -> Result<(Vec<DbMarketingEvent>, i64), LaunchpadError> {
        let page = filter.page.normalized();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM marketing_events WHERE (?1 IS NULL OR event_name = ?1)",
        )
        .bind(&filter.event_name)
        .fetch_one(pool)
        .await?;

        let rows = sqlx::query_as::<_, DbMarketingEvent>(
            r#"
            SELECT id, event_name, source, utm_source, utm_medium, utm_campaign, referrer, metadata, client_key, created_at
            FROM marketing_events
            WHERE (?1 IS NULL OR event_name = ?1)
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&filter.event_name)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

        Ok((rows, total))
    }

    async fn record_email(&self, pool: &SqlitePool, log: EmailLogCreate) -> Result<i64, LaunchpadError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO email_logs (recipient, template, status, provider_id, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(log.recipient)
        .bind(log.template)
        .bind(log.status.as_str())
        .bind(log.provider_id)
        .bind(log.error)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    async fn list_email_logs(
        &self,
        pool: &SqlitePool,
        filter: EmailLogFilter,
    ) -> Result<(Vec<DbEmailLog>, i64), LaunchpadError> {
        let page = filter.page.normalized();

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM email_logs WHERE (?1 IS NULL OR template = ?1)")
                .bind(&filter.template)
                .fetch_one(pool)
                .await?;

        let rows = sqlx::query_as::<_, DbEmailLog>(
            r#"
            SELECT id, recipient, template, status, provider_id, error, created_at
            FROM email_logs
            WHERE (?1 IS NULL OR template = ?1)
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&filter.template)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

        Ok((rows, total))
    }

    async fn dashboard_counts(
        &self,
        pool: &SqlitePool,
        now: DateTime<Utc>,
    ) -> Result<DashboardCounts, LaunchpadError> {
        let since = now - ChronoDuration::hours(24);
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM waitlist WHERE created_at >= ?) AS signups_24h,
                (SELECT COUNT(*) FROM waitlist WHERE referred_by IS NOT NULL) AS referred_signups,
                (SELECT COUNT(*) FROM waitlist WHERE unsubscribed = 1) AS unsubscribed,
                (SELECT COUNT(*) FROM commitments WHERE status = 'pending') AS pending,
                (SELECT COUNT(*) FROM commitments WHERE status = 'confirmed') AS confirmed,
                (SELECT COUNT(*) FROM commitments WHERE status = 'cancelled') AS cancelled,
                (SELECT COUNT(*) FROM email_logs WHERE status = 'sent') AS emails_sent,
                (SELECT COUNT(*) FROM email_logs WHERE status = 'failed') AS emails_failed
            "#,
        )
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(counts)
    }
}

async fn list_tiers(pool: &SqlitePool) -> Result<Vec<DbPricingTier>, LaunchpadError> {
    let rows = sqlx::query_as::<_, DbPricingTier>(
        "SELECT tier_number, name, min_count, max_count, bonus_percent FROM pricing_tiers ORDER BY min_count",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn presale_totals(pool: &SqlitePool) -> Result<PresaleTotals, LaunchpadError> {
    let totals = sqlx::query_as::<_, PresaleTotals>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM waitlist) AS signups,
            (SELECT COUNT(*) FROM commitments WHERE status != 'cancelled') AS buyers,
            (SELECT COALESCE(SUM(amount_usd), 0.0) FROM commitments WHERE status != 'cancelled') AS raised_usd,
            (SELECT COALESCE(SUM(token_amount), 0.0) FROM commitments WHERE status != 'cancelled') AS committed_tokens
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(totals)
}

/// `table` is always a literal from this module.
async fn delete_by_id(pool: &SqlitePool, table: &'static str, id: i64) -> Result<bool, LaunchpadError> {
    let res = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Spawn the database actor and return a cloneable handle.
///
/// The actor is unnamed so several databases can live in one process.
pub async fn spawn(database_url: &str) -> DbActorHandle {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .expect("failed to spawn DbActor");

    DbActorHandle { actor }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), LaunchpadError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

/// Write the default tiers only when the table is empty, so admin edits survive restarts.
async fn seed_default_tiers(pool: &SqlitePool) -> Result<(), LaunchpadError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pricing_tiers")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let tiers = pricing::default_tiers();
    let mut tx = pool.begin().await?;
    for tier in &tiers {
        sqlx::query(
            "INSERT INTO pricing_tiers (tier_number, name, min_count, max_count, bonus_percent) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tier.tier_number)
        .bind(&tier.name)
        .bind(tier.min_count)
        .bind(tier.max_count)
        .bind(tier.bonus_percent)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    info!(count = tiers.len(), "Seeded default pricing tiers");
    Ok(())
}
