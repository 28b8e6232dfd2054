//! On-demand invoice PDF generation.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{Days, NaiveDate};
use homefin_common::types::TimeEntry;
use homefin_invoice::{invoice_filename, render_invoice, week_bills};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Payload for `POST /api/generate`. The entries come from the client so a
/// half-edited timesheet can be previewed without saving it first.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Number printed on the invoice.
    pub invoice_number: i64,
    /// First day of the billing period.
    pub start_date: NaiveDate,
    /// Last day of the billing period; defaults to the latest entry's date.
    pub end_date: Option<NaiveDate>,
    /// Entries to bill.
    pub entries: Vec<TimeEntry>,
}

/// `POST /api/generate` — renders one invoice PDF over the posted entries
/// and returns it as an attachment download.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Response> {
    let (corporation, bill_to) = match (
        state.store.corporation().await?,
        state.store.bill_to().await?,
    ) {
        (Some(corporation), Some(bill_to)) => (corporation, bill_to),
        _ => {
            return Err(ApiError::bad_request("Corporation or Bill To info missing"));
        }
    };

    let mut entries = request.entries;
    entries.sort_by_key(|entry| entry.date);
    let last_entry_date = entries
        .last()
        .map(|entry| entry.date)
        .ok_or_else(|| ApiError::bad_request("No time entries provided"))?;
    let end_date = request.end_date.unwrap_or(last_entry_date);

    let bills = week_bills(&entries, request.start_date, end_date);
    if bills.is_empty() {
        return Err(ApiError::bad_request(
            "No billable hours found in specified range",
        ));
    }

    let invoice_date = end_date.checked_add_days(Days::new(1)).unwrap_or(end_date);
    let pdf = render_invoice(
        &corporation,
        &bill_to,
        &bills,
        request.invoice_number,
        invoice_date,
    )?;
    let filename = invoice_filename(&corporation.company_name, request.invoice_number, end_date);
    tracing::info!(
        invoice = request.invoice_number,
        items = bills.len(),
        %filename,
        "invoice generated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                "Content-Disposition".to_owned(),
            ),
        ],
        pdf,
    )
        .into_response())
}
