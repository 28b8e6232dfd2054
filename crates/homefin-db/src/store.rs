//! SQLite-backed store for every persistent record the server keeps.
//!
//! One [`Store`] wraps a connection pool and exposes typed accessors for
//! users, sessions, the three invoice addresses, daily time entries, loose
//! key/value settings, and the email configuration. Address and entry types
//! come from `homefin-common`; everything SQL stays inside this module.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use homefin_common::types::{Address, TimeEntry};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::error::{Error, Result};
use crate::schema;

/// Timestamp format used in the sessions table; matches SQLite's
/// `datetime('now')` output so expiry comparisons can happen in SQL.
const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SMTP credentials and addressing for the monthly invoice email.
///
/// Every field maps to a nullable column; `None` means the user has not
/// filled that field in yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSettings {
    /// Gmail account used for SMTP authentication.
    pub gmail_account: Option<String>,
    /// From address shown to recipients, possibly an alias.
    pub from_email: Option<String>,
    /// Primary recipient.
    pub to_email: Option<String>,
    /// Comma-separated CC addresses.
    pub cc_email: Option<String>,
    /// Stored subject override; not settable through the API.
    pub email_subject: Option<String>,
    /// Gmail app password.
    pub gmail_app_password: Option<String>,
}

/// Handle to the application database. Cheap to clone; all clones share one
/// pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if necessary) the database file at `path` and brings
    /// its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error when the parent directory cannot be created, the
    /// file cannot be opened, or the schema statements fail.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| Error::CreateDir {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        schema::ensure_schema(&pool).await?;
        tracing::debug!(path = %path.display(), "database ready");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection or schema setup fails.
    pub async fn open_in_memory() -> Result<Self> {
        // A pool of one keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;
        schema::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns the stored corporation address, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn corporation(&self) -> Result<Option<Address>> {
        let row = sqlx::query(
            "SELECT company_name, recipient, street, city, state, zip_code, phone_number
               FROM corporation WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| address_with_phone(&row)).transpose()
    }

    /// Saves the corporation address, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_corporation(&self, address: &Address) -> Result<()> {
        let _ = sqlx::query(
            "INSERT OR REPLACE INTO corporation
                 (id, company_name, recipient, street, city, state, zip_code, phone_number)
             VALUES (1, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&address.company_name)
        .bind(&address.recipient)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.phone_number)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the stored bill-to address, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn bill_to(&self) -> Result<Option<Address>> {
        self.six_field_address(
            "SELECT recipient, company_name, street, city, state, zip_code
               FROM bill_to WHERE id = 1",
        )
        .await
    }

    /// Saves the bill-to address, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_bill_to(&self, address: &Address) -> Result<()> {
        self.save_six_field_address(
            "INSERT OR REPLACE INTO bill_to
                 (id, recipient, company_name, street, city, state, zip_code)
             VALUES (1, ?, ?, ?, ?, ?, ?)",
            address,
        )
        .await
    }

    /// Returns the stored ship-to address, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn ship_to(&self) -> Result<Option<Address>> {
        self.six_field_address(
            "SELECT recipient, company_name, street, city, state, zip_code
               FROM ship_to WHERE id = 1",
        )
        .await
    }

    /// Saves the ship-to address, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_ship_to(&self, address: &Address) -> Result<()> {
        self.save_six_field_address(
            "INSERT OR REPLACE INTO ship_to
                 (id, recipient, company_name, street, city, state, zip_code)
             VALUES (1, ?, ?, ?, ?, ?, ?)",
            address,
        )
        .await
    }

    async fn six_field_address(&self, sql: &'static str) -> Result<Option<Address>> {
        let row = sqlx::query(sql).fetch_optional(&self.pool).await?;
        row.map(|row| {
            Ok(Address {
                recipient: text(&row, "recipient")?,
                company_name: text(&row, "company_name")?,
                street: text(&row, "street")?,
                city: text(&row, "city")?,
                state: text(&row, "state")?,
                zip_code: text(&row, "zip_code")?,
                phone_number: String::new(),
            })
        })
        .transpose()
    }

    async fn save_six_field_address(&self, sql: &'static str, address: &Address) -> Result<()> {
        let _ = sqlx::query(sql)
            .bind(&address.recipient)
            .bind(&address.company_name)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.zip_code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns the time entries with dates in `[start, end]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails or a stored date is malformed.
    pub async fn time_entries(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<TimeEntry>> {
        let rows = sqlx::query(
            "SELECT date, hours, hourly_rate, hours_inputted, rate_inputted
               FROM time_entries
              WHERE date BETWEEN ? AND ?
              ORDER BY date",
        )
        .bind(start.format(DATE_FORMAT).to_string())
        .bind(end.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let value: String = row.try_get("date")?;
            let date = NaiveDate::parse_from_str(&value, DATE_FORMAT)
                .map_err(|_| Error::MalformedDate { value })?;
            entries.push(TimeEntry {
                date,
                hours: row.try_get::<Option<f64>, _>("hours")?.unwrap_or_default(),
                hourly_rate: row
                    .try_get::<Option<f64>, _>("hourly_rate")?
                    .unwrap_or_default(),
                hours_inputted: row
                    .try_get::<Option<bool>, _>("hours_inputted")?
                    .unwrap_or_default(),
                rate_inputted: row
                    .try_get::<Option<bool>, _>("rate_inputted")?
                    .unwrap_or_default(),
            });
        }
        Ok(entries)
    }

    /// Inserts or replaces the entry for its date.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_time_entry(&self, entry: &TimeEntry) -> Result<()> {
        let _ = sqlx::query(
            "INSERT OR REPLACE INTO time_entries
                 (date, hours, hourly_rate, hours_inputted, rate_inputted)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.date.format(DATE_FORMAT).to_string())
        .bind(entry.hours)
        .bind(entry.hourly_rate)
        .bind(entry.hours_inputted)
        .bind(entry.rate_inputted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| Ok(row.try_get::<Option<String>, _>("value")?.unwrap_or_default()))
            .transpose()
    }

    /// Inserts or replaces a setting.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_setting(&self, key: &str, value: &str) -> Result<()> {
        let _ = sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a session token for `username` expiring at `expires_at` (UTC).
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_session(
        &self,
        token: &str,
        username: &str,
        expires_at: NaiveDateTime,
    ) -> Result<()> {
        let _ = sqlx::query(
            "INSERT OR REPLACE INTO sessions (token, username, created_at, expires_at)
             VALUES (?, ?, datetime('now'), ?)",
        )
        .bind(token)
        .bind(username)
        .bind(expires_at.format(SQL_DATETIME_FORMAT).to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the username behind a live session token. Expired sessions
    /// are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn session_username(&self, token: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT username FROM sessions
              WHERE token = ? AND expires_at > datetime('now')",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("username")?)),
            None => Ok(None),
        }
    }

    /// Deletes one session token.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn delete_session(&self, token: &str) -> Result<()> {
        let _ = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes sessions whose expiry has passed and returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Returns the stored email settings, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn email_settings(&self) -> Result<Option<EmailSettings>> {
        let row = sqlx::query(
            "SELECT gmail_account, from_email, to_email, cc_email, email_subject,
                    gmail_app_password
               FROM email_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(EmailSettings {
                gmail_account: row.try_get("gmail_account")?,
                from_email: row.try_get("from_email")?,
                to_email: row.try_get("to_email")?,
                cc_email: row.try_get("cc_email")?,
                email_subject: row.try_get("email_subject")?,
                gmail_app_password: row.try_get("gmail_app_password")?,
            })
        })
        .transpose()
    }

    /// Saves the email settings, replacing any previous row.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_email_settings(&self, settings: &EmailSettings) -> Result<()> {
        let _ = sqlx::query(
            "INSERT OR REPLACE INTO email_settings
                 (id, gmail_account, from_email, to_email, cc_email, email_subject,
                  gmail_app_password)
             VALUES (1, ?, ?, ?, ?, ?, ?)",
        )
        .bind(settings.gmail_account.as_deref())
        .bind(settings.from_email.as_deref())
        .bind(settings.to_email.as_deref())
        .bind(settings.cc_email.as_deref())
        .bind(settings.email_subject.as_deref())
        .bind(settings.gmail_app_password.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the bcrypt hash stored for `username`.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn user_password_hash(&self, username: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("password_hash")?)),
            None => Ok(None),
        }
    }

    /// Inserts or replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn save_user(&self, username: &str, password_hash: &[u8]) -> Result<()> {
        let _ = sqlx::query(
            "INSERT OR REPLACE INTO users (username, password_hash, updated_at)
             VALUES (?, ?, datetime('now'))",
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns every username with its stored password hash.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn all_users(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let rows = sqlx::query("SELECT username, password_hash FROM users")
            .fetch_all(&self.pool)
            .await?;
        let mut users = BTreeMap::new();
        for row in rows {
            let username: String = row.try_get("username")?;
            let hash: Vec<u8> = row.try_get("password_hash")?;
            let _ = users.insert(username, hash);
        }
        Ok(users)
    }
}

fn text(row: &SqliteRow, column: &str) -> Result<String> {
    Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
}

fn address_with_phone(row: &SqliteRow) -> Result<Address> {
    Ok(Address {
        company_name: text(row, "company_name")?,
        recipient: text(row, "recipient")?,
        street: text(row, "street")?,
        city: text(row, "city")?,
        state: text(row, "state")?,
        zip_code: text(row, "zip_code")?,
        phone_number: text(row, "phone_number")?,
    })
}
