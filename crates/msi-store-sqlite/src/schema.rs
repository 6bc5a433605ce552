//! SQL schema for the MSI SQLite store.
//!
//! Executed at every connection startup; `PRAGMA user_version` records the
//! layout for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    email     TEXT PRIMARY KEY,
    password  TEXT NOT NULL,             -- argon2 PHC string or legacy sha256 hex
    is_admin  INTEGER NOT NULL DEFAULT 0
);

-- Rows are insert-only. Status changes happen outside this service.
CREATE TABLE IF NOT EXISTS enrollments (
    id                   TEXT PRIMARY KEY,
    enrollment_id        TEXT NOT NULL UNIQUE,
    first_name           TEXT NOT NULL,
    surname              TEXT NOT NULL,
    phone_number         TEXT NOT NULL,
    channel              TEXT NOT NULL,   -- 'PSS' | 'LA'
    region               TEXT NOT NULL,
    state                TEXT NOT NULL,
    lga                  TEXT NOT NULL,
    cost_centre          TEXT NOT NULL,
    facility_type        TEXT NOT NULL,
    provider_cadre       TEXT NOT NULL,
    provider_gender      TEXT NOT NULL,
    training_type        TEXT NOT NULL,
    training_date        TEXT NOT NULL,   -- YYYY-MM-DD
    email                TEXT NOT NULL,   -- submitting user
    status               TEXT NOT NULL,
    created_at           TEXT NOT NULL,   -- RFC 3339 UTC
    supporting_documents TEXT NOT NULL DEFAULT '[]'
);

-- Object store: one row per uploaded document.
CREATE TABLE IF NOT EXISTS objects (
    bucket       TEXT NOT NULL,
    path         TEXT NOT NULL,
    content_type TEXT NOT NULL,
    bytes        BLOB NOT NULL,
    uploaded_at  TEXT NOT NULL,
    PRIMARY KEY (bucket, path)
);

CREATE INDEX IF NOT EXISTS enrollments_email_idx   ON enrollments(email);
CREATE INDEX IF NOT EXISTS enrollments_created_idx ON enrollments(created_at);

PRAGMA user_version = 1;
";
