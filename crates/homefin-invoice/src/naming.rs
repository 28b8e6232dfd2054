//! Invoice file naming.

use chrono::{Days, NaiveDate};

/// Lowercases a company name and collapses every non-alphanumeric run into
/// a single underscore, trimming underscores from both ends.
#[must_use]
pub fn company_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Derives the download filename for an invoice covering a period ending on
/// `period_end`. The embedded date is the day after the period, matching the
/// printed invoice date.
#[must_use]
pub fn invoice_filename(company_name: &str, invoice_number: i64, period_end: NaiveDate) -> String {
    let stamp_date = period_end
        .checked_add_days(Days::new(1))
        .unwrap_or(period_end);
    format!(
        "{}_invoice_{}_{}.pdf",
        company_slug(company_name),
        invoice_number,
        stamp_date.format("%Y%m%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_punctuation_runs() {
        assert_eq!(company_slug("Acme, Inc."), "acme_inc");
        assert_eq!(company_slug("  Spaced   Out  "), "spaced_out");
        assert_eq!(company_slug("UPPER-case_99"), "upper_case_99");
    }

    #[test]
    fn slug_of_empty_or_symbol_only_names_is_empty() {
        assert_eq!(company_slug(""), "");
        assert_eq!(company_slug("!!!"), "");
    }

    #[test]
    fn filename_uses_the_day_after_the_period() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date");
        assert_eq!(
            invoice_filename("Acme, Inc.", 42, end),
            "acme_inc_invoice_42_20240316.pdf"
        );
    }

    #[test]
    fn filename_rolls_over_month_boundaries() {
        let end = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
        assert_eq!(
            invoice_filename("Acme", 1, end),
            "acme_invoice_1_20240301.pdf"
        );
    }
}
