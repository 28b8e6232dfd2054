//! Session tokens, password hashing, and the request-auth extractor.
//!
//! Passwords live in the config file in plain text; at startup each
//! configured user that the database has never seen is hashed with bcrypt
//! and stored. Existing rows keep their stored hash, so changing a password
//! means deleting the user row and restarting.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use homefin_common::constants::{AUTH_TOKEN_HEADER, SESSION_TOKEN_BYTES, SESSION_TTL_DAYS};
use homefin_db::Store;
use rand::RngCore;

use crate::error::ApiError;
use crate::state::AppState;

/// Returns a fresh random session token as lowercase hex.
#[must_use]
pub fn generate_session_token() -> String {
    let mut bytes = [0_u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Checks `password` against a stored bcrypt hash. A hash that is not valid
/// UTF-8 or not a bcrypt string counts as a mismatch.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &[u8]) -> bool {
    std::str::from_utf8(stored_hash)
        .ok()
        .and_then(|hash| bcrypt::verify(password, hash).ok())
        .unwrap_or(false)
}

/// Syncs `allowed_users` from the config file into the database and returns
/// the full username-to-hash table.
///
/// New usernames are hashed and inserted; usernames already present keep
/// their stored hash even when the config password changed.
///
/// # Errors
///
/// Returns an error when hashing or a database write fails.
pub async fn sync_users(
    store: &Store,
    allowed_users: &BTreeMap<String, String>,
) -> anyhow::Result<BTreeMap<String, Vec<u8>>> {
    let mut users = store.all_users().await?;
    for (username, password) in allowed_users {
        if users.contains_key(username) {
            tracing::debug!(username, "user already in database, keeping stored hash");
            continue;
        }
        tracing::info!(username, "new user in config, hashing and storing");
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?.into_bytes();
        store.save_user(username, &hash).await?;
        let _ = users.insert(username.clone(), hash);
    }
    tracing::info!(count = users.len(), "users loaded");
    Ok(users)
}

/// Computes the expiry timestamp for a session issued now.
#[must_use]
pub fn session_expiry() -> chrono::NaiveDateTime {
    Utc::now().naive_utc() + Duration::days(SESSION_TTL_DAYS)
}

/// Extractor asserting the request carries a live session token.
///
/// Reads the `X-Auth-Token` header and resolves it against the sessions
/// table; expired or unknown tokens answer 403.
pub struct CurrentUser {
    /// Username behind the presented token.
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthenticated)?;
        let username = state
            .store
            .session_username(token)
            .await?
            .ok_or(ApiError::Unauthenticated)?;
        Ok(Self { username })
    }
}
