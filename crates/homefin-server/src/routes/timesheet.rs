//! Daily time entries and loose key/value settings.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use homefin_common::types::TimeEntry;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Inclusive date range for listing entries.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// First day, `YYYY-MM-DD`.
    pub start_date: NaiveDate,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: NaiveDate,
}

/// One setting key/value pair.
#[derive(Debug, Deserialize)]
pub struct SettingData {
    /// Setting name.
    pub key: String,
    /// Setting value, stored verbatim.
    pub value: String,
}

/// `GET /api/time_entries?start_date&end_date`
pub async fn list_time_entries(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<Vec<TimeEntry>>> {
    let entries = state
        .store
        .time_entries(range.start_date, range.end_date)
        .await?;
    Ok(Json(entries))
}

/// `POST /api/time_entries` — upserts the entry for its date.
pub async fn save_time_entry(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(entry): Json<TimeEntry>,
) -> ApiResult<Json<Value>> {
    state.store.save_time_entry(&entry).await?;
    Ok(Json(json!({ "status": "success" })))
}

/// `GET /api/settings/{key}` — value is null when the key has never been set.
pub async fn get_setting(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let value = state.store.setting(&key).await?;
    Ok(Json(json!({ "key": key, "value": value })))
}

/// `POST /api/settings` — upserts one setting.
pub async fn save_setting(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(data): Json<SettingData>,
) -> ApiResult<Json<Value>> {
    state.store.save_setting(&data.key, &data.value).await?;
    Ok(Json(json!({ "status": "success" })))
}
