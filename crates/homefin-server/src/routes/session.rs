//! Login and logout.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use homefin_common::constants::AUTH_TOKEN_HEADER;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::{self, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Credentials presented at login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username from the config file.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Session token to present in `X-Auth-Token`.
    pub token: String,
    /// Authenticated username, echoed back.
    pub username: String,
}

/// `POST /api/login` — verifies credentials and issues a session token.
///
/// Rate limited to 5 attempts per minute per client address.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if state.login_limiter.check_key(&addr.ip()).is_err() {
        tracing::warn!(client = %addr.ip(), "login rate limit hit");
        return Err(ApiError::RateLimited);
    }

    tracing::info!(username = %request.username, "login attempt");
    let hash = state
        .users
        .get(&request.username)
        .ok_or(ApiError::InvalidCredentials)?;
    if !auth::verify_password(&request.password, hash) {
        tracing::warn!(username = %request.username, "password verification failed");
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::generate_session_token();
    state
        .store
        .save_session(&token, &request.username, auth::session_expiry())
        .await?;
    tracing::info!(username = %request.username, "session created");
    Ok(Json(LoginResponse {
        token,
        username: request.username,
    }))
}

/// `POST /api/logout` — deletes the presented session token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    if let Some(token) = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        state.store.delete_session(token).await?;
    }
    Ok(Json(json!({ "status": "success" })))
}
