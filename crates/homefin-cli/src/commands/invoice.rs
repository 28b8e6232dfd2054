//! `homefin invoice` — offline invoice generation.
//!
//! Each positional `DAYS:HOURS[:RATE]` segment bills a run of consecutive
//! days; segments follow each other back to back starting at `--start-date`.
//! The corporation and bill-to addresses come from the same database the
//! server uses.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use chrono::{Local, NaiveDate};
use clap::Args;
use homefin_common::config::Config;
use homefin_common::constants::{DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use homefin_db::Store;
use homefin_invoice::{SegmentSpec, consecutive_bills, invoice_filename, render_invoice};

/// Hourly rate used when a segment does not name one.
const DEFAULT_RATE: f64 = 192.75;

/// Arguments for the `invoice` command.
#[derive(Args, Debug)]
pub struct InvoiceArgs {
    /// Path to the server configuration file (for the database location).
    #[arg(short = 'c', long, env = ENV_CONFIG_PATH, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// First billed day, YYYY-MM-DD. Defaults to today.
    #[arg(short = 's', long)]
    pub start_date: Option<NaiveDate>,

    /// Number printed on the invoice.
    #[arg(short = 'i', long, default_value_t = 1)]
    pub invoice_number: i64,

    /// Directory the PDF is written into.
    #[arg(short = 'o', long, default_value = ".")]
    pub directory: PathBuf,

    /// Hourly rate for segments that do not name one.
    #[arg(short = 'r', long, default_value_t = DEFAULT_RATE)]
    pub rate: f64,

    /// Billing segments, DAYS:HOURS or DAYS:HOURS:RATE.
    #[arg(value_name = "DAYS:HOURS[:RATE]", required = true)]
    pub segments: Vec<String>,
}

/// Executes the `invoice` command.
///
/// # Errors
///
/// Returns an error when a segment is malformed, the output directory does
/// not exist, the store has no corporation or bill-to address, or the PDF
/// cannot be written.
pub async fn execute(args: InvoiceArgs) -> anyhow::Result<()> {
    if !args.directory.is_dir() {
        bail!("not a directory: {}", args.directory.display());
    }
    let segments = args
        .segments
        .iter()
        .map(|raw| parse_segment(raw, args.rate))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = Config::load(&args.config)?;
    let store = Store::open(&config.database.path).await?;
    let corporation = store
        .corporation()
        .await?
        .context("no corporation address stored; save one through the web UI first")?;
    let bill_to = store
        .bill_to()
        .await?
        .context("no bill-to address stored; save one through the web UI first")?;

    let start_date = args
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());
    let bills = consecutive_bills(start_date, &segments);
    let period_end = bills
        .last()
        .map(|bill| bill.end_date)
        .context("at least one segment is required")?;
    let invoice_date = period_end
        .checked_add_days(chrono::Days::new(1))
        .unwrap_or(period_end);

    let pdf = render_invoice(
        &corporation,
        &bill_to,
        &bills,
        args.invoice_number,
        invoice_date,
    )?;
    let path = args.directory.join(invoice_filename(
        &corporation.company_name,
        args.invoice_number,
        period_end,
    ));
    std::fs::write(&path, pdf)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(invoice = args.invoice_number, items = bills.len(), "invoice written");
    println!("{}", path.display());
    Ok(())
}

/// Parses one `DAYS:HOURS[:RATE]` segment.
fn parse_segment(raw: &str, default_rate: f64) -> anyhow::Result<SegmentSpec> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (days_part, hours_part, rate_part) = match parts.as_slice() {
        [days, hours] => (*days, *hours, None),
        [days, hours, rate] => (*days, *hours, Some(*rate)),
        _ => bail!("segment must be DAYS:HOURS or DAYS:HOURS:RATE, got {raw:?}"),
    };

    let days: u32 = days_part
        .parse()
        .with_context(|| format!("invalid day count in segment {raw:?}"))?;
    if days == 0 {
        bail!("segment {raw:?} covers zero days");
    }
    let hours: f64 = hours_part
        .parse()
        .with_context(|| format!("invalid hours in segment {raw:?}"))?;
    let rate = match rate_part {
        Some(rate) => rate
            .parse()
            .with_context(|| format!("invalid rate in segment {raw:?}"))?,
        None => default_rate,
    };
    Ok(SegmentSpec { days, hours, rate })
}
