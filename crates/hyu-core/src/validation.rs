//! Validation utilities.

use crate::{FieldError, HyuError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `HyuError` on failure.
    ///
    /// # Errors
    ///
    /// Returns `HyuError::Validation` describing every failed field.
    fn validate_request(&self) -> Result<(), HyuError> {
        self.validate().map_err(|e| validation_errors_to_hyu_error(&e))
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator` errors into field errors.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect()
}

/// Converts `validator::ValidationErrors` to `HyuError`.
#[must_use]
pub fn validation_errors_to_hyu_error(errors: &ValidationErrors) -> HyuError {
    let message = field_errors(errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    HyuError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    ///
    /// # Errors
    ///
    /// Returns `not_blank` when the value is whitespace only.
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates a 24h `HH:mm` time of day.
    ///
    /// # Errors
    ///
    /// Returns `time_format` for anything else.
    pub fn hh_mm(value: &str) -> Result<(), ValidationError> {
        chrono::NaiveTime::parse_from_str(value, "%H:%M")
            .ok()
            .filter(|_| value.len() == 5)
            .map(|_| ())
            .ok_or_else(|| ValidationError::new("time_format"))
    }

    /// Validates a two-letter lowercase language code.
    ///
    /// # Errors
    ///
    /// Returns `language_code` for anything else.
    pub fn language_code(value: &str) -> Result<(), ValidationError> {
        if value.len() == 2 && value.chars().all(|c| c.is_ascii_lowercase()) {
            Ok(())
        } else {
            Err(ValidationError::new("language_code"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(email(message = "must be a valid email"))]
        email: String,
        #[validate(length(min = 8, message = "too short"))]
        password: String,
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_hh_mm() {
        assert!(hh_mm("09:30").is_ok());
        assert!(hh_mm("23:59").is_ok());
        assert!(hh_mm("24:00").is_err());
        assert!(hh_mm("9:30").is_err());
        assert!(hh_mm("morning").is_err());
    }

    #[test]
    fn test_language_code() {
        assert!(language_code("ko").is_ok());
        assert!(language_code("KO").is_err());
        assert!(language_code("kor").is_err());
    }

    #[test]
    fn test_validate_request_collects_fields() {
        let req = Signup {
            email: "nope".to_string(),
            password: "short".to_string(),
        };
        let err = req.validate_request().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("email"));
        assert!(message.contains("password"));
    }
}
