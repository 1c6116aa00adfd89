//! Validated JSON extractor for automatic request validation.
//!
//! `ValidatedJson<T>` deserializes JSON and validates it with the
//! `validator` crate. Malformed bodies and failed checks are both answered
//! with 400 `VALIDATION_ERROR`; failed checks carry field-level details.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hyu_core::{ErrorResponse, FieldError};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

const VALIDATION_ERROR: &str = "VALIDATION_ERROR";

/// JSON extractor that validates the deserialized value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated JSON extraction.
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// JSON parsing/deserialization error.
    JsonError(JsonRejection),
    /// Validation error with field-level details.
    ValidationError(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let body = match self {
            Self::JsonError(rejection) => ErrorResponse {
                error: VALIDATION_ERROR.to_string(),
                message: format!("Invalid JSON: {}", rejection.body_text()),
                details: None,
                trace_id: None,
            },
            Self::ValidationError(errors) => ErrorResponse {
                error: VALIDATION_ERROR.to_string(),
                message: "Request validation failed".to_string(),
                details: Some(convert_validation_errors(&errors)),
                trace_id: None,
            },
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Convert validator errors to field errors, nested structs and lists included.
fn convert_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut field_errors = Vec::new();

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    field_errors.push(FieldError {
                        field: field.to_string(),
                        message: err
                            .message
                            .as_ref()
                            .map_or_else(|| format!("Validation failed for field '{field}'"), ToString::to_string),
                        code: err.code.to_string(),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                for nested_err in convert_validation_errors(nested) {
                    field_errors.push(FieldError {
                        field: format!("{field}.{}", nested_err.field),
                        ..nested_err
                    });
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, item_errors) in items {
                    for nested_err in convert_validation_errors(item_errors) {
                        field_errors.push(FieldError {
                            field: format!("{field}[{index}].{}", nested_err.field),
                            ..nested_err
                        });
                    }
                }
            }
        }
    }

    field_errors
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value.validate().map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct GoalInput {
        #[validate(length(min = 1, max = 5, message = "Title must be 1-5 characters"))]
        title: String,
        #[validate(range(min = 1, max = 5))]
        mood: i32,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Wrapper {
        #[validate(length(min = 1))]
        label: String,
        #[validate(nested)]
        goal: GoalInput,
    }

    #[test]
    fn test_field_messages() {
        let input = GoalInput {
            title: "too long title".to_string(),
            mood: 3,
        };
        let errors = convert_validation_errors(&input.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[0].message, "Title must be 1-5 characters");
    }

    #[test]
    fn test_nested_fields_are_prefixed() {
        let input = Wrapper {
            label: "ok".to_string(),
            goal: GoalInput {
                title: "walk".to_string(),
                mood: 9,
            },
        };
        let errors = convert_validation_errors(&input.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "goal.mood");
        assert_eq!(errors[0].code, "range");
    }
}
