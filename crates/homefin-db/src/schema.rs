//! Table creation and column reconciliation.
//!
//! Every table is created with `IF NOT EXISTS` on startup. Columns that
//! later releases introduced are detected through `PRAGMA table_info` and
//! added with `ALTER TABLE`, so databases written by older releases keep
//! working without a separate migration step.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use crate::error::Result;

const TABLES: [&str; 8] = [
    r"CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY,
        password_hash BLOB NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    r"CREATE TABLE IF NOT EXISTS corporation (
        id INTEGER PRIMARY KEY,
        company_name TEXT,
        recipient TEXT,
        street TEXT,
        city TEXT,
        state TEXT,
        zip_code TEXT,
        phone_number TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS bill_to (
        id INTEGER PRIMARY KEY,
        recipient TEXT,
        company_name TEXT,
        street TEXT,
        city TEXT,
        state TEXT,
        zip_code TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS ship_to (
        id INTEGER PRIMARY KEY,
        recipient TEXT,
        company_name TEXT,
        street TEXT,
        city TEXT,
        state TEXT,
        zip_code TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS time_entries (
        date DATE PRIMARY KEY,
        hours REAL,
        hourly_rate REAL,
        hours_inputted INTEGER DEFAULT 0,
        rate_inputted INTEGER DEFAULT 0
    )",
    r"CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS email_settings (
        id INTEGER PRIMARY KEY,
        gmail_account TEXT,
        from_email TEXT,
        to_email TEXT,
        cc_email TEXT,
        gmail_app_password TEXT
    )",
];

/// Columns that did not exist in the first shipped schema.
const LATE_COLUMNS: [(&str, &str, &str); 4] = [
    ("email_settings", "gmail_account", "TEXT"),
    ("email_settings", "email_subject", "TEXT"),
    ("time_entries", "hours_inputted", "INTEGER DEFAULT 0"),
    ("time_entries", "rate_inputted", "INTEGER DEFAULT 0"),
];

/// Creates missing tables and adds late columns to pre-existing ones.
///
/// # Errors
///
/// Returns an error when a DDL statement fails.
pub(crate) async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for ddl in TABLES {
        let _ = sqlx::query(ddl).execute(pool).await?;
    }
    for (table, column, definition) in LATE_COLUMNS {
        if !has_column(pool, table, column).await? {
            let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {definition}");
            let _ = sqlx::query(&sql).execute(pool).await?;
            tracing::debug!(table, column, "added missing column");
        }
    }
    Ok(())
}

// PRAGMA arguments cannot be bound; `table` only ever comes from the
// compile-time constants above.
async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await?;
    for row in rows {
        let name: String = row.try_get("name")?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
