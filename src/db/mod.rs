//! Database module: actor, models and schema for persistent storage.
//!
//! Layout:
//! - `actor.rs`: the single-writer `DbActor` and its cloneable handle
//! - `models.rs`: Rust structs mirroring DB rows
//! - `patch.rs`: create/patch payloads sent to the actor
//! - `query.rs`: pagination and listing filters
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)

pub mod actor;
pub mod models;
pub mod patch;
pub mod query;
pub mod schema;

mod patch_impl;

pub use models::{
    DashboardCounts, DbCommitment, DbEmailLog, DbMarketingEvent, DbPricingTier, DbSiteSetting,
    DbWaitlistEntry, PresaleTotals,
};
pub use patch::{
    CommitmentCreate, CommitmentPatch, EmailLogCreate, EmailLogStatus, MarketingEventCreate,
    RecordPatch, WaitlistCreate, WaitlistPatch,
};
pub use query::{CommitmentFilter, EmailLogFilter, EventFilter, PageQuery, WaitlistFilter};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};
