//! The three singleton invoice addresses.
//!
//! An address that has never been saved answers with all-empty strings, a
//! shape the web UI fills its form from.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use homefin_common::types::Address;
use serde_json::{Value, json};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/corporation`
pub async fn get_corporation(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<Address>> {
    Ok(Json(state.store.corporation().await?.unwrap_or_default()))
}

/// `POST /api/corporation`
pub async fn save_corporation(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(address): Json<Address>,
) -> ApiResult<Json<Value>> {
    state.store.save_corporation(&address).await?;
    Ok(Json(json!({ "status": "success" })))
}

/// `GET /api/bill_to`
pub async fn get_bill_to(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<Address>> {
    Ok(Json(state.store.bill_to().await?.unwrap_or_default()))
}

/// `POST /api/bill_to`
pub async fn save_bill_to(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(address): Json<Address>,
) -> ApiResult<Json<Value>> {
    state.store.save_bill_to(&address).await?;
    Ok(Json(json!({ "status": "success" })))
}

/// `GET /api/ship_to`
pub async fn get_ship_to(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<Address>> {
    Ok(Json(state.store.ship_to().await?.unwrap_or_default()))
}

/// `POST /api/ship_to`
pub async fn save_ship_to(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(address): Json<Address>,
) -> ApiResult<Json<Value>> {
    state.store.save_ship_to(&address).await?;
    Ok(Json(json!({ "status": "success" })))
}
