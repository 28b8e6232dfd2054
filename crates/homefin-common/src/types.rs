//! Domain primitive types used across the homefin workspace.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Postal and contact details printed on invoices.
///
/// The same shape backs the corporation, bill-to, and ship-to records; all
/// fields are plain strings and may be empty when nothing has been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Legal or trading name of the company.
    pub company_name: String,
    /// Contact person receiving the invoice.
    pub recipient: String,
    /// Street address line.
    pub street: String,
    /// City name.
    pub city: String,
    /// State or province abbreviation.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Contact phone number. Only the corporation record carries one; the
    /// bill-to and ship-to payloads omit it.
    #[serde(default)]
    pub phone_number: String,
}

impl Address {
    /// Returns the combined `city, state zip` line used on printed invoices.
    #[must_use]
    pub fn city_line(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip_code)
    }

    /// Returns `true` when no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.company_name.is_empty()
            && self.recipient.is_empty()
            && self.street.is_empty()
            && self.city.is_empty()
            && self.state.is_empty()
            && self.zip_code.is_empty()
            && self.phone_number.is_empty()
    }
}

/// One day of recorded work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Calendar day the work happened on.
    pub date: NaiveDate,
    /// Hours worked that day.
    pub hours: f64,
    /// Rate charged per hour on that day.
    pub hourly_rate: f64,
    /// Whether the hours were typed in by the user rather than derived.
    #[serde(default)]
    pub hours_inputted: bool,
    /// Whether the rate was typed in by the user rather than derived.
    #[serde(default)]
    pub rate_inputted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_line_joins_components() {
        let addr = Address {
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62704".into(),
            ..Address::default()
        };
        assert_eq!(addr.city_line(), "Springfield, IL 62704");
    }

    #[test]
    fn default_address_is_empty() {
        assert!(Address::default().is_empty());
        let addr = Address {
            company_name: "Acme".into(),
            ..Address::default()
        };
        assert!(!addr.is_empty());
    }

    #[test]
    fn time_entry_dates_serialize_as_iso_strings() {
        let entry = TimeEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
            hours: 8.0,
            hourly_rate: 150.0,
            hours_inputted: true,
            rate_inputted: false,
        };
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["date"], "2024-03-04");
        let back: TimeEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn address_accepts_payloads_without_a_phone_number() {
        let addr: Address = serde_json::from_str(
            r#"{"recipient": "Jane", "company_name": "Acme", "street": "12 Main St",
                "city": "Springfield", "state": "IL", "zip_code": "62704"}"#,
        )
        .expect("deserialize");
        assert_eq!(addr.phone_number, "");
    }

    #[test]
    fn inputted_flags_default_to_false() {
        let entry: TimeEntry = serde_json::from_str(
            r#"{"date": "2024-03-04", "hours": 8, "hourly_rate": 150.0}"#,
        )
        .expect("deserialize");
        assert!(!entry.hours_inputted);
        assert!(!entry.rate_inputted);
    }
}
