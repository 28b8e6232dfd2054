//! Outbound invoice mail over Gmail SMTP.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

const SMTP_RELAY: &str = "smtp.gmail.com";

/// One invoice message: addressing, subject, body, and PDF attachments.
pub struct InvoiceMail {
    /// Gmail account used for SMTP login.
    pub gmail_account: String,
    /// Gmail app password.
    pub app_password: String,
    /// From address shown to recipients; may be a Gmail alias.
    pub from_email: String,
    /// Primary recipient.
    pub to_email: String,
    /// Comma-separated CC addresses, possibly empty.
    pub cc_email: String,
    /// Message subject.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// PDF attachments as (filename, bytes).
    pub attachments: Vec<(String, Vec<u8>)>,
}

/// Builds and sends the message through `smtp.gmail.com:587` with STARTTLS.
///
/// Blocking; callers on the async executor must run this on the blocking
/// pool.
///
/// # Errors
///
/// Returns an error when an address fails to parse, the message cannot be
/// assembled, or the SMTP conversation fails.
pub fn send_invoice_mail(mail: &InvoiceMail) -> anyhow::Result<()> {
    let from: Mailbox = mail.from_email.parse()?;
    let to: Mailbox = mail.to_email.parse()?;

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.clone());
    for cc in split_addresses(&mail.cc_email) {
        builder = builder.cc(cc.parse()?);
    }

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
    for (filename, bytes) in &mail.attachments {
        tracing::debug!(filename, size = bytes.len(), "attaching invoice");
        parts = parts.singlepart(
            Attachment::new(filename.clone()).body(bytes.clone(), ContentType::parse("application/pdf")?),
        );
    }
    let message = builder.multipart(parts)?;

    let mailer = SmtpTransport::starttls_relay(SMTP_RELAY)?
        .credentials(Credentials::new(
            mail.gmail_account.clone(),
            mail.app_password.clone(),
        ))
        .build();
    tracing::info!(to = %mail.to_email, relay = SMTP_RELAY, "sending invoice mail");
    let _ = mailer.send(&message)?;
    Ok(())
}

/// Splits a comma-separated address list, dropping empty items.
fn split_addresses(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|addr| !addr.is_empty())
}
