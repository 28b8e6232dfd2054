//! API route handlers, grouped by surface.

pub mod addresses;
pub mod email;
pub mod invoice;
pub mod session;
pub mod timesheet;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Builds the `/api` router over the shared state.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        .route(
            "/api/corporation",
            get(addresses::get_corporation).post(addresses::save_corporation),
        )
        .route(
            "/api/bill_to",
            get(addresses::get_bill_to).post(addresses::save_bill_to),
        )
        .route(
            "/api/ship_to",
            get(addresses::get_ship_to).post(addresses::save_ship_to),
        )
        .route(
            "/api/time_entries",
            get(timesheet::list_time_entries).post(timesheet::save_time_entry),
        )
        .route("/api/settings/{key}", get(timesheet::get_setting))
        .route("/api/settings", post(timesheet::save_setting))
        .route("/api/generate", post(invoice::generate))
        .route("/api/email_settings/get", post(email::get_email_settings))
        .route("/api/email_settings/set", post(email::save_email_settings))
        .route("/api/send_email", post(email::send_monthly_email))
}
