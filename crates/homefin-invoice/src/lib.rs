//! # homefin-invoice
//!
//! Billing computations and invoice PDF rendering.
//!
//! The billing side turns daily time entries into per-week line items split
//! on rate changes; the rendering side lays those items out as a printable
//! invoice using the built-in PDF Helvetica fonts.

pub mod billing;
pub mod metrics;
pub mod naming;
pub mod pdf;

pub use billing::{SegmentSpec, WeekBill, consecutive_bills, month_halves, week_bills};
pub use naming::{company_slug, invoice_filename};
pub use pdf::{RenderError, format_money, render_invoice};
