//! Email settings and the monthly invoice send.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::NaiveDate;
use homefin_common::constants::NEXT_INVOICE_NUMBER_KEY;
use homefin_common::types::{Address, TimeEntry};
use homefin_db::EmailSettings;
use homefin_invoice::{invoice_filename, render_invoice, week_bills};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::CurrentUser;
use crate::email::{InvoiceMail, send_invoice_mail};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Email settings as the API exposes them. The app password never leaves
/// the server; `has_password` says whether one is stored.
#[derive(Debug, Serialize)]
pub struct EmailSettingsResponse {
    /// Gmail account used for SMTP login.
    pub gmail_account: String,
    /// From address shown to recipients.
    pub from_email: String,
    /// Primary recipient.
    pub to_email: String,
    /// Comma-separated CC addresses.
    pub cc_email: String,
    /// Whether a Gmail app password is on file.
    pub has_password: bool,
}

/// Payload for `POST /api/email_settings/set`.
#[derive(Debug, Deserialize)]
pub struct EmailSettingsRequest {
    /// Gmail account used for SMTP login.
    pub gmail_account: String,
    /// From address shown to recipients; may be an alias.
    pub from_email: String,
    /// Primary recipient.
    pub to_email: String,
    /// Comma-separated CC addresses.
    #[serde(default)]
    pub cc_email: Option<String>,
    /// New app password; empty or absent keeps the stored one.
    #[serde(default)]
    pub gmail_app_password: Option<String>,
}

/// Payload for `POST /api/send_email`.
#[derive(Debug, Deserialize)]
pub struct SendMonthlyEmailRequest {
    /// Number for the first of the two invoices.
    pub invoice_number: i64,
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
}

/// Outcome of a monthly send.
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    /// Always `"success"`; failures answer with an error status instead.
    pub status: String,
    /// Human-readable confirmation.
    pub message: String,
    /// Invoice number to use next.
    pub new_invoice_number: i64,
}

/// `POST /api/email_settings/get`
pub async fn get_email_settings(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<EmailSettingsResponse>> {
    let stored = state.store.email_settings().await?.unwrap_or_default();
    Ok(Json(EmailSettingsResponse {
        gmail_account: stored.gmail_account.unwrap_or_default(),
        from_email: stored.from_email.unwrap_or_default(),
        to_email: stored.to_email.unwrap_or_default(),
        cc_email: stored.cc_email.unwrap_or_default(),
        has_password: stored
            .gmail_app_password
            .is_some_and(|password| !password.is_empty()),
    }))
}

/// `POST /api/email_settings/set` — upserts the settings; an empty password
/// in the payload preserves the stored one.
pub async fn save_email_settings(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(request): Json<EmailSettingsRequest>,
) -> ApiResult<Json<Value>> {
    let password = match request.gmail_app_password.filter(|p| !p.is_empty()) {
        Some(password) => Some(password),
        None => state
            .store
            .email_settings()
            .await?
            .and_then(|existing| existing.gmail_app_password),
    };
    let settings = EmailSettings {
        gmail_account: Some(request.gmail_account),
        from_email: Some(request.from_email),
        to_email: Some(request.to_email),
        cc_email: request.cc_email,
        email_subject: None,
        gmail_app_password: password,
    };
    state.store.save_email_settings(&settings).await?;
    Ok(Json(json!({ "status": "success" })))
}

/// `POST /api/send_email` — renders the month's two half-month invoices and
/// mails them in one message.
pub async fn send_monthly_email(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(request): Json<SendMonthlyEmailRequest>,
) -> ApiResult<Json<SendEmailResponse>> {
    tracing::info!(
        invoice = request.invoice_number,
        month = request.month,
        year = request.year,
        "monthly invoice send requested"
    );

    let settings = state.store.email_settings().await?.unwrap_or_default();
    let app_password = settings
        .gmail_app_password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("Email settings not configured. Please set Gmail app password.")
        })?;
    let gmail_account = settings
        .gmail_account
        .filter(|account| !account.is_empty())
        .ok_or_else(|| ApiError::bad_request("Gmail account not configured for SMTP login."))?;
    let to_email = settings
        .to_email
        .filter(|to| !to.is_empty())
        .ok_or_else(|| ApiError::bad_request("Recipient email not configured."))?;

    let (corporation, bill_to) = match (
        state.store.corporation().await?,
        state.store.bill_to().await?,
    ) {
        (Some(corporation), Some(bill_to)) => (corporation, bill_to),
        _ => {
            return Err(ApiError::bad_request("Corporation or Bill To info missing"));
        }
    };

    let (first_half, second_half) = homefin_invoice::month_halves(request.year, request.month)
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "Invalid month: {}-{:02}",
                request.year, request.month
            ))
        })?;

    let mut attachments = Vec::with_capacity(2);
    let mut invoice_number = request.invoice_number;
    for (start, end) in [first_half, second_half] {
        let entries: Vec<TimeEntry> = state
            .store
            .time_entries(start, end)
            .await?
            .into_iter()
            .filter(|entry| entry.hours > 0.0)
            .collect();
        attachments.push(build_invoice_attachment(
            &corporation,
            &bill_to,
            &entries,
            start,
            end,
            invoice_number,
        )?);
        invoice_number += 1;
    }

    let month_name = first_half.0.format("%B %Y").to_string();
    let mail = InvoiceMail {
        from_email: settings
            .from_email
            .filter(|from| !from.is_empty())
            .unwrap_or_else(|| gmail_account.clone()),
        gmail_account,
        app_password,
        to_email: to_email.clone(),
        cc_email: settings.cc_email.unwrap_or_default(),
        subject: format!("Invoices for {month_name}"),
        body: format!("Please find attached invoices for {month_name}."),
        attachments,
    };
    // SMTP is synchronous in lettre's blocking transport; keep it off the
    // async executor.
    tokio::task::spawn_blocking(move || send_invoice_mail(&mail))
        .await
        .map_err(|join_error| ApiError::Internal {
            cause: join_error.into(),
        })?
        .map_err(|cause| ApiError::Internal { cause })?;

    state
        .store
        .save_setting(NEXT_INVOICE_NUMBER_KEY, &invoice_number.to_string())
        .await?;
    tracing::info!(next_invoice = invoice_number, "monthly invoices sent");

    Ok(Json(SendEmailResponse {
        status: "success".to_owned(),
        message: format!("Invoices sent to {to_email}"),
        new_invoice_number: invoice_number,
    }))
}

/// Renders one half-month invoice and returns it as a mail attachment.
fn build_invoice_attachment(
    corporation: &Address,
    bill_to: &Address,
    entries: &[TimeEntry],
    start: NaiveDate,
    end: NaiveDate,
    invoice_number: i64,
) -> ApiResult<(String, Vec<u8>)> {
    let bills = week_bills(entries, start, end);
    let invoice_date = end
        .checked_add_days(chrono::Days::new(1))
        .unwrap_or(end);
    let pdf = render_invoice(corporation, bill_to, &bills, invoice_number, invoice_date)?;
    let filename = invoice_filename(&corporation.company_name, invoice_number, end);
    Ok((filename, pdf))
}
