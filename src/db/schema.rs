/// Schema for locally persisted client state.
pub const SCHEMA: &str = r#"
-- Small key/value records (current session)
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Accounts usable for login while the backend is unreachable
CREATE TABLE IF NOT EXISTS offline_accounts (
    contact TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    password_digest TEXT NOT NULL,
    role TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_offline_accounts_role ON offline_accounts(role);
"#;
