//! Configuration validation.
//!
//! Collects every problem in one pass so a bad deployment fails with the
//! full list instead of one error at a time.

use crate::AppConfig;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// A single invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("JWT secret too short: {actual} bytes (minimum {minimum})")]
    JwtSecretTooShort { actual: usize, minimum: usize },

    #[error("Invalid port for {name}: {value} (must be 1-65535)")]
    InvalidPort { name: String, value: u16 },

    #[error("Invalid pool size: min ({min}) cannot be greater than max ({max})")]
    InvalidPoolSize { min: u32, max: u32 },

    #[error("Invalid {url_type} URL: {message}")]
    InvalidUrl { url_type: String, message: String },

    #[error("Timeout '{name}' must be positive")]
    NonPositiveTimeout { name: String },

    #[error("Invalid cron expression for {name}: {message}")]
    InvalidCron { name: String, message: String },

    #[error("Invalid log level: '{value}' (valid: trace, debug, info, warn, error)")]
    InvalidLogLevel { value: String },
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    const MIN_JWT_SECRET_LENGTH: usize = 32;
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// # Errors
    ///
    /// Returns every validation error found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_security(config, &mut errors);
        Self::validate_server(config, &mut errors);
        Self::validate_database(config, &mut errors);
        Self::validate_redis(config, &mut errors);
        Self::validate_ai(config, &mut errors);
        Self::validate_scheduler(config, &mut errors);
        Self::validate_observability(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_security(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let security = &config.security;
        // development keeps working with short throwaway secrets
        if config.app.is_production() && security.jwt_secret.len() < Self::MIN_JWT_SECRET_LENGTH {
            errors.push(ConfigValidationError::JwtSecretTooShort {
                actual: security.jwt_secret.len(),
                minimum: Self::MIN_JWT_SECRET_LENGTH,
            });
        }
        if security.jwt_access_expiration_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "security.jwt_access_expiration_secs".to_string(),
            });
        }
        if security.jwt_refresh_expiration_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "security.jwt_refresh_expiration_secs".to_string(),
            });
        }
        if Url::parse(&security.reset_link_base_url).is_err() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "reset link".to_string(),
                message: security.reset_link_base_url.clone(),
            });
        }
    }

    fn validate_server(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.server.port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: 0,
            });
        }
        if config.server.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "server.request_timeout_secs".to_string(),
            });
        }
    }

    fn validate_database(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let db = &config.database;
        if db.url.is_empty() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !db.url.starts_with("mysql://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with mysql://".to_string(),
            });
        }
        if db.min_connections > db.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: db.min_connections,
                max: db.max_connections,
            });
        }
        if db.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
            });
        }
    }

    fn validate_redis(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        if !config.redis.enabled {
            return;
        }
        if !config.redis.url.starts_with("redis://") && !config.redis.url.starts_with("rediss://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }
    }

    fn validate_ai(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        if let Err(e) = Url::parse(&config.ai.base_url) {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "ai".to_string(),
                message: e.to_string(),
            });
        }
        if config.ai.timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "ai.timeout_secs".to_string(),
            });
        }
    }

    fn validate_scheduler(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let crons = [
            ("scheduler.missed_goal_cron", &config.scheduler.missed_goal_cron),
            ("scheduler.metrics_cron", &config.scheduler.metrics_cron),
            ("scheduler.weekly_summary_cron", &config.scheduler.weekly_summary_cron),
        ];
        for (name, expr) in crons {
            if let Err(e) = cron::Schedule::from_str(expr) {
                errors.push(ConfigValidationError::InvalidCron {
                    name: name.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn validate_observability(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let level = config.observability.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.observability.log_level.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_short_secret_rejected_in_production() {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "short".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());

        config.app.environment = "production".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(errors[0], ConfigValidationError::JwtSecretTooShort { actual: 5, .. }));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.database.min_connections = 50;
        config.database.max_connections = 10;
        config.scheduler.metrics_cron = "every day".to_string();
        config.observability.log_level = "loud".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| matches!(e, ConfigValidationError::InvalidCron { .. })));
    }

    #[test]
    fn test_weekly_summary_cron_is_checked() {
        let mut config = AppConfig::default();
        config.scheduler.weekly_summary_cron = "mondays at nine".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(
            &errors[0],
            ConfigValidationError::InvalidCron { name, .. } if name == "scheduler.weekly_summary_cron"
        ));
    }

    #[test]
    fn test_database_scheme() {
        let mut config = AppConfig::default();
        config.database.url = "postgres://localhost/hyu".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors[0].to_string().contains("mysql://"));
    }
}
