//! Client-side validation rules shared by the record types.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("invalid phone regex"));

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid identifier regex"));

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid date regex"));

/// A record failed local validation; no request was issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// User-facing description.
    pub message: String,
}

impl ValidationError {
    /// Build an error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reject blank (empty or whitespace-only) values.
pub fn required(field: &'static str, label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{label} is required")));
    }
    Ok(())
}

/// Require letters, digits, underscores or hyphens only.
pub fn identifier(field: &'static str, label: &str, value: &str) -> Result<(), ValidationError> {
    if !IDENTIFIER_RE.is_match(value) {
        return Err(ValidationError::new(
            field,
            format!("{label} may only contain letters, digits, underscores or hyphens"),
        ));
    }
    Ok(())
}

/// E.164-style phone number: optional `+`, no leading zero, 2 to 15 digits.
pub fn phone(field: &'static str, label: &str, value: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(value) {
        return Err(ValidationError::new(
            field,
            format!("{label} is not a valid phone number"),
        ));
    }
    Ok(())
}

/// Zero-padded `YYYY-MM-DD` that also names a real calendar day.
pub fn iso_date(field: &'static str, label: &str, value: &str) -> Result<(), ValidationError> {
    let well_formed = ISO_DATE_RE.is_match(value)
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(ValidationError::new(
            field,
            format!("{label} must use the YYYY-MM-DD format"),
        ));
    }
    Ok(())
}

/// Strictly positive integer.
pub fn positive_int(field: &'static str, label: &str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(
            field,
            format!("{label} must be a positive number"),
        ));
    }
    Ok(())
}

/// Strictly positive, finite amount.
pub fn positive_amount(
    field: &'static str,
    label: &str,
    value: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(
            field,
            format!("{label} must be a positive number"),
        ));
    }
    Ok(())
}

/// Parse a form input as an integer.
pub fn parse_int(field: &'static str, label: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new(field, format!("{label} must be a whole number")))
}

/// Parse a form input as a decimal amount.
pub fn parse_amount(field: &'static str, label: &str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::new(field, format!("{label} must be a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_e164_numbers() {
        assert!(phone("contact", "Contact", "+84901234567").is_ok());
        assert!(phone("contact", "Contact", "12").is_ok());
        assert!(phone("contact", "Contact", "abc").is_err());
        assert!(phone("contact", "Contact", "0123456").is_err());
        assert!(phone("contact", "Contact", "1234567890123456").is_err());
    }

    #[test]
    fn identifier_rejects_spaces_and_slashes() {
        assert!(identifier("licNo", "License number", "LIC-01_a").is_ok());
        assert!(identifier("licNo", "License number", "LIC 01").is_err());
        assert!(identifier("licNo", "License number", "a/b").is_err());
        assert!(identifier("licNo", "License number", "").is_err());
    }

    #[test]
    fn iso_date_requires_zero_padding_and_real_days() {
        assert!(iso_date("date", "Date", "2025-06-09").is_ok());
        assert!(iso_date("date", "Date", "2025-6-9").is_err());
        assert!(iso_date("date", "Date", "2025-02-30").is_err());
        assert!(iso_date("date", "Date", "").is_err());
    }

    #[test]
    fn amounts_must_be_positive_and_finite() {
        assert!(positive_amount("cost", "Cost", 0.01).is_ok());
        assert!(positive_amount("cost", "Cost", 0.0).is_err());
        assert!(positive_amount("cost", "Cost", -3.0).is_err());
        assert!(positive_amount("cost", "Cost", f64::NAN).is_err());
    }

    #[test]
    fn parse_helpers_report_field() {
        let err = parse_int("rno", "Race number", "12a").unwrap_err();
        assert_eq!(err.field, "rno");
        assert_eq!(parse_amount("cost", "Cost", " 12.5 ").unwrap(), 12.5);
    }
}
