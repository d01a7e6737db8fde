//! Small field validators shared by the domain modules.

use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidateEmail, ValidateUrl};

use crate::error::CoreError;

/// Lowercase kebab-case identifiers used for catalogue keys (document ids,
/// service ids, checklist step ids).
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex"));

/// Exactly four ASCII digits.
static LAST4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid regex"));

/// Reject empty or whitespace-only values.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("'{field}' is required")));
    }
    Ok(())
}

/// Reject values longer than `max` characters.
pub fn require_max_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "'{field}' must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate a syntactically plausible email address.
pub fn validate_email(value: &str) -> Result<(), CoreError> {
    require_non_blank("email", value)?;
    if !value.trim().validate_email() {
        return Err(CoreError::Validation(format!(
            "'{value}' is not a valid email address"
        )));
    }
    Ok(())
}

/// Validate an absolute `http://` or `https://` URL.
pub fn validate_http_url(field: &str, value: &str) -> Result<(), CoreError> {
    let lower = value.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) || !value.validate_url() {
        return Err(CoreError::Validation(format!(
            "'{field}' must be an http(s) URL"
        )));
    }
    Ok(())
}

/// Returns `true` if `value` is a lowercase kebab-case slug.
pub fn is_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

/// Validate the last four digits of a card or bank account number.
pub fn validate_last4(value: &str) -> Result<(), CoreError> {
    if !LAST4_RE.is_match(value) {
        return Err(CoreError::Validation(
            "'last4' must be exactly four digits".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_rejected() {
        assert!(require_non_blank("name", "").is_err());
        assert!(require_non_blank("name", "   ").is_err());
        assert!(require_non_blank("name", "Jane").is_ok());
    }

    #[test]
    fn max_len_counts_characters() {
        assert!(require_max_len("name", "abc", 3).is_ok());
        assert!(require_max_len("name", "abcd", 3).is_err());
        assert!(require_max_len("name", "ééé", 3).is_ok());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn url_validation_requires_http_scheme() {
        assert!(validate_http_url("api_url", "https://api.karbonhq.com/v3").is_ok());
        assert!(validate_http_url("api_url", "http://localhost:8080").is_ok());
        assert!(validate_http_url("api_url", "ftp://files.example.com").is_err());
        assert!(validate_http_url("api_url", "not a url").is_err());
    }

    #[test]
    fn slug_detection() {
        assert!(is_slug("prior-returns"));
        assert!(is_slug("501c3-letter"));
        assert!(!is_slug("Prior Returns"));
        assert!(!is_slug("../etc"));
        assert!(!is_slug(""));
    }

    #[test]
    fn last4_validation() {
        assert!(validate_last4("4242").is_ok());
        assert!(validate_last4("424").is_err());
        assert!(validate_last4("42a2").is_err());
    }
}
