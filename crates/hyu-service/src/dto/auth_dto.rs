//! Authentication DTOs.

use hyu_domain::{Role, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Signup request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 255, message = "Password must be 8-255 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Nickname is required"))]
    pub nickname: String,
}

/// Created account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub role: Role,
}

impl From<User> for SignupResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            nickname: user.nickname,
            role: user.role,
        }
    }
}

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Access token returned to the client. The refresh token travels in a cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl TokenResponse {
    #[must_use]
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Result of a login or a refresh rotation.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub response: TokenResponse,
    pub refresh_token: String,
    pub refresh_ttl_secs: u64,
}

/// Password reset confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirmRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 8, max = 255, message = "New password must be 8-255 characters"))]
    pub new_password: String,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_valid() {
        let request = SignupRequest {
            email: "mind@example.com".to_string(),
            password: "password123".to_string(),
            name: "Kim".to_string(),
            nickname: "kim".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_signup_request_short_password() {
        let request = SignupRequest {
            email: "mind@example.com".to_string(),
            password: "short".to_string(),
            name: "Kim".to_string(),
            nickname: "kim".to_string(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_token_response_serializes_camel_case() {
        let json = serde_json::to_value(TokenResponse::bearer("abc".to_string(), 3600)).unwrap();
        assert_eq!(json["accessToken"], "abc");
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["expiresIn"], 3600);
    }
}
