//! SQL DDL for initializing storage.

/// SQLite schema with:
/// - `kv_store`: single-value-per-key table; holds the rotating `refresh_token`
/// - `leads`: one row per positive classification, `email_id` UNIQUE for dedup
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email_id TEXT NOT NULL UNIQUE,
    received_date TEXT NULL, -- RFC3339
    created_at TEXT NOT NULL, -- RFC3339
    lead_name TEXT NULL,
    lead_email TEXT NULL,
    lead_phone TEXT NULL,
    wedding_venue TEXT NULL,
    inquiry_details TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_leads_received_date ON leads(received_date);
"#;

/// Key under which the rotating refresh token is stored.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
