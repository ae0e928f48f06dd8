//! Input validation for job requests
//!
//! Identifiers arrive in free-form notation (`00.022.244/0001-75`). They are
//! sanitized to their digits first and only then checked for length, so a
//! malformed input is rejected instead of being truncated or padded.

use crate::constants::IDENTIFIER_LENGTH;
use crate::error::ValidationError;

/// Remove every character that is not an ASCII digit
pub fn sanitize_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Check that a value is made of exactly `length` ASCII digits
pub fn validate_digits(value: &str, field_name: &str, length: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field_name, "value is empty"));
    }

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(field_name, "value must contain only digits"));
    }

    if value.len() != length {
        return Err(ValidationError::new(
            field_name,
            format!("expected {length} digits, got {}", value.len()),
        ));
    }

    Ok(())
}

/// Sanitize then validate a raw identifier, returning its canonical form
pub fn normalize_identifier(raw: &str) -> Result<String, ValidationError> {
    let sanitized = sanitize_digits(raw);
    validate_digits(&sanitized, "identifier", IDENTIFIER_LENGTH)?;
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_formatted_identifier() {
        assert_eq!(
            normalize_identifier("00.022.244/0001-75").unwrap(),
            "00022244000175"
        );
    }

    #[test]
    fn test_normalize_rejects_short_identifier() {
        let err = normalize_identifier("123").unwrap_err();
        assert_eq!(err.field, "identifier");
        assert!(err.reason.contains("got 3"));
    }

    #[test]
    fn test_normalize_rejects_long_identifier() {
        assert!(normalize_identifier("000222440001750").is_err());
    }

    #[test]
    fn test_normalize_rejects_no_digits() {
        let err = normalize_identifier("abc-/.").unwrap_err();
        assert_eq!(err.reason, "value is empty");
    }

    #[test]
    fn test_validate_digits_rejects_non_digits() {
        assert!(validate_digits("0002224400017a", "identifier", 14).is_err());
    }

    proptest! {
        #[test]
        fn prop_sanitize_keeps_only_digits(raw in ".{0,40}") {
            let sanitized = sanitize_digits(&raw);
            prop_assert!(sanitized.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn prop_fourteen_digits_survive_any_punctuation(
            digits in "[0-9]{14}",
            noise in "[./ -]{0,6}",
        ) {
            let raw = format!("{noise}{}{noise}{}", &digits[..7], &digits[7..]);
            prop_assert_eq!(normalize_identifier(&raw).unwrap(), digits);
        }

        #[test]
        fn prop_other_lengths_are_rejected(digits in "[0-9]{0,30}") {
            prop_assume!(digits.len() != 14);
            prop_assert!(normalize_identifier(&digits).is_err());
        }
    }
}
