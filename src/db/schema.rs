//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `waitlist` table (one row per email; referral and unsubscribe codes)
/// - `commitments` table (non-binding purchase intents)
/// - `pricing_tiers` table (bonus brackets keyed by tier number)
/// - `site_settings` table (JSON values keyed by name)
/// - `marketing_events` table (append-only)
/// - `email_logs` table (one row per send attempt)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Waitlist signups
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS waitlist (
    id INTEGER PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    referral_code TEXT NOT NULL UNIQUE,
    referred_by TEXT NULL,
    referral_count INTEGER NOT NULL DEFAULT 0,
    source TEXT NULL,
    utm_source TEXT NULL,
    utm_medium TEXT NULL,
    utm_campaign TEXT NULL,
    unsubscribe_token TEXT NOT NULL UNIQUE,
    unsubscribed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_waitlist_created_at ON waitlist(created_at);

-- ---------------------------------------------------------------------------
-- Purchase-intent commitments
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS commitments (
    id INTEGER PRIMARY KEY NOT NULL,
    waitlist_id INTEGER NULL,
    email TEXT NOT NULL,
    wallet_address TEXT NULL,
    amount_usd REAL NOT NULL,
    tier_number INTEGER NOT NULL,
    bonus_percent REAL NOT NULL,
    token_amount REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_commitments_status ON commitments(status);
CREATE INDEX IF NOT EXISTS idx_commitments_email ON commitments(email);

-- ---------------------------------------------------------------------------
-- Pricing tiers
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pricing_tiers (
    tier_number INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    min_count INTEGER NOT NULL,
    max_count INTEGER NULL,
    bonus_percent REAL NOT NULL
);

-- ---------------------------------------------------------------------------
-- Site settings
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS site_settings (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL, -- JSON
    updated_at TEXT NOT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Marketing events
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS marketing_events (
    id INTEGER PRIMARY KEY NOT NULL,
    event_name TEXT NOT NULL,
    source TEXT NULL,
    utm_source TEXT NULL,
    utm_medium TEXT NULL,
    utm_campaign TEXT NULL,
    referrer TEXT NULL,
    metadata TEXT NULL, -- JSON
    client_key TEXT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_marketing_events_name ON marketing_events(event_name);

-- ---------------------------------------------------------------------------
-- Email send log
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS email_logs (
    id INTEGER PRIMARY KEY NOT NULL,
    recipient TEXT NOT NULL,
    template TEXT NOT NULL,
    status TEXT NOT NULL, -- 'sent' | 'failed'
    provider_id TEXT NULL,
    error TEXT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_email_logs_recipient_template ON email_logs(recipient, template, status);
"#;
