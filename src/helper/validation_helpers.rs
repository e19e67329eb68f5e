use crate::error::ApiError;
use chrono::NaiveTime;
use uuid::Uuid;

pub const DEFAULT_PUBLIC_PAGE_SIZE: usize = 20;
pub const MAX_PUBLIC_PAGE_SIZE: usize = 100;
pub const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

/// Emails are the identity key; compare them trimmed and lowercased everywhere.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn require_email(field: &str, raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ApiError::InvalidInput(format!("'{}' must be a valid email address.", field))),
    }
}

pub fn require_text(field: &str, raw: &str) -> Result<String, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::InvalidInput(format!("'{}' is required and cannot be empty.", field)));
    }
    Ok(value.to_string())
}

/// A field that may be omitted, but not sent empty.
pub fn optional_text(field: &str, raw: Option<String>) -> Result<Option<String>, ApiError> {
    raw.map(|value| require_text(field, &value)).transpose()
}

pub fn parse_record_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::InvalidInput(format!("'{}' is not a valid identifier.", raw)))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn normalize_donation_time(raw: &str) -> Result<String, ApiError> {
    let value = raw.trim();
    let valid = NaiveTime::parse_from_str(value, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(value, "%H:%M:%S").is_ok();
    if valid {
        Ok(value.to_string())
    } else {
        Err(ApiError::InvalidInput(
            "'donationTime' must be formatted as HH:MM or HH:MM:SS.".to_string(),
        ))
    }
}

/// Converts a major-unit amount to minor units (cents).
pub fn amount_to_minor_units(amount: f64) -> Result<i64, ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::InvalidInput("'amount' must be greater than zero.".to_string()));
    }
    if amount > MAX_PAYMENT_AMOUNT {
        return Err(ApiError::InvalidInput(format!(
            "'amount' cannot exceed {}.",
            MAX_PAYMENT_AMOUNT
        )));
    }
    let scaled = amount * 100.0;
    let minor_units = scaled.round();
    if (scaled - minor_units).abs() > 1e-6 {
        return Err(ApiError::InvalidInput(
            "'amount' cannot have more than two decimal places.".to_string(),
        ));
    }
    Ok(minor_units as i64)
}

pub fn public_page_size(limit: Option<usize>) -> usize {
    match limit {
        Some(0) | None => DEFAULT_PUBLIC_PAGE_SIZE,
        Some(limit) => limit.min(MAX_PUBLIC_PAGE_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized_and_checked() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
        assert_eq!(require_email("donorEmail", "B@x.COM").unwrap(), "b@x.com");
        for bad in ["", "abc", "@x.com", "a@", "a@x", "a@b@c.com"] {
            assert!(require_email("donorEmail", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn required_text_rejects_blank_values() {
        assert_eq!(require_text("name", "  Ana ").unwrap(), "Ana");
        assert!(require_text("name", "   ").is_err());
        assert_eq!(optional_text("name", None).unwrap(), None);
        assert!(optional_text("name", Some(" ".into())).is_err());
    }

    #[test]
    fn malformed_ids_fail_fast() {
        assert!(parse_record_id("not-an-id").is_err());
        assert!(parse_record_id("").is_err());
        let id = Uuid::now_v7();
        assert_eq!(parse_record_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn donation_time_formats() {
        assert_eq!(normalize_donation_time("09:30").unwrap(), "09:30");
        assert_eq!(normalize_donation_time("23:59:59").unwrap(), "23:59:59");
        assert!(normalize_donation_time("25:00").is_err());
        assert!(normalize_donation_time("9am").is_err());
    }

    #[test]
    fn amounts_convert_to_cents() {
        assert_eq!(amount_to_minor_units(10.0).unwrap(), 1000);
        assert_eq!(amount_to_minor_units(19.99).unwrap(), 1999);
        assert_eq!(amount_to_minor_units(0.1).unwrap(), 10);
        assert!(amount_to_minor_units(0.0).is_err());
        assert!(amount_to_minor_units(-5.0).is_err());
        assert!(amount_to_minor_units(1.234).is_err());
        assert!(amount_to_minor_units(f64::NAN).is_err());
        assert!(amount_to_minor_units(1_000_000.01).is_err());
    }

    #[test]
    fn public_pages_are_capped() {
        assert_eq!(public_page_size(None), DEFAULT_PUBLIC_PAGE_SIZE);
        assert_eq!(public_page_size(Some(0)), DEFAULT_PUBLIC_PAGE_SIZE);
        assert_eq!(public_page_size(Some(5)), 5);
        assert_eq!(public_page_size(Some(10_000)), MAX_PUBLIC_PAGE_SIZE);
    }
}
