//! SQL schema for the subtrack SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subscriptions (
    id            TEXT PRIMARY KEY,
    service_name  TEXT NOT NULL CHECK (service_name <> ''),
    price         INTEGER NOT NULL CHECK (price >= 0),
    user_id       TEXT NOT NULL,
    start_date    TEXT NOT NULL,   -- YYYY-MM-01
    end_date      TEXT,            -- YYYY-MM-01 or NULL (open-ended)
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC, nanosecond precision
    updated_at    TEXT NOT NULL,
    CHECK (end_date IS NULL OR end_date >= start_date)
);

CREATE INDEX IF NOT EXISTS subscriptions_user_idx    ON subscriptions(user_id);
CREATE INDEX IF NOT EXISTS subscriptions_service_idx ON subscriptions(service_name);
CREATE INDEX IF NOT EXISTS subscriptions_created_idx ON subscriptions(created_at);

PRAGMA user_version = 1;
";
