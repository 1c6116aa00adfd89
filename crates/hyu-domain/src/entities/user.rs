//! User account entity and account-state rules.

use chrono::{DateTime, Duration, Utc};
use hyu_core::{HyuError, HyuResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::RiskLevel;

db_enum! {
    /// Authorization role.
    #[derive(Default)]
    pub enum Role {
        #[default]
        User => "USER",
        Admin => "ADMIN",
    }
}

impl Role {
    /// Authority string carried in access tokens.
    #[must_use]
    pub const fn authority(&self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    /// Parses either `ADMIN` or `ROLE_ADMIN`.
    ///
    /// # Errors
    ///
    /// Returns a bad request error for unknown roles.
    pub fn from_authority(value: &str) -> HyuResult<Self> {
        Self::from_str(value.trim().trim_start_matches("ROLE_"))
    }
}

db_enum! {
    /// Account lifecycle state.
    #[derive(Default)]
    pub enum UserState {
        #[default]
        Active => "ACTIVE",
        Suspended => "SUSPENDED",
        Withdrawn => "WITHDRAWN",
    }
}

db_enum! {
    /// Moderation handling applied to risk signals from a user.
    pub enum RiskMode {
        Warn => "WARN",
        Exempt => "EXEMPT",
    }
}

/// Lifetime of an issued password-reset token.
pub const RESET_TOKEN_TTL_SECS: i64 = 30 * 60;
/// Minimum spacing between two reset issuances for one user.
pub const RESET_COOLDOWN_SECS: i64 = 5 * 60;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub nickname: String,
    pub role: Role,
    pub state: UserState,
    pub suspend_until: Option<DateTime<Utc>>,
    pub risk_mode: Option<RiskMode>,
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
    pub need_password_reset: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True when the account is suspended and the suspension is still running.
    ///
    /// A suspension without an end date never lapses.
    #[must_use]
    pub fn is_suspended_at(&self, now: DateTime<Utc>) -> bool {
        self.state == UserState::Suspended && self.suspend_until.map_or(true, |until| until > now)
    }

    /// Rejects requests from withdrawn or actively suspended accounts.
    ///
    /// # Errors
    ///
    /// `AccountWithdrawn` or `AccountSuspended`.
    pub fn ensure_can_access(&self, now: DateTime<Utc>) -> HyuResult<()> {
        if self.state == UserState::Withdrawn {
            return Err(HyuError::AccountWithdrawn);
        }
        if self.is_suspended_at(now) {
            return Err(HyuError::AccountSuspended);
        }
        Ok(())
    }

    /// Checks whether an admin may issue a new password-reset token now.
    ///
    /// # Errors
    ///
    /// Conflict errors carrying `ACCOUNT_WITHDRAWN`, `ACCOUNT_SUSPENDED`,
    /// `RESET_ALREADY_ISSUED:<secs>` or `TOO_FREQUENT_RESET_REQUEST:<secs>`.
    pub fn ensure_reset_issuable(&self, now: DateTime<Utc>) -> HyuResult<()> {
        if self.state == UserState::Withdrawn {
            return Err(HyuError::conflict("ACCOUNT_WITHDRAWN"));
        }
        if self.is_suspended_at(now) {
            return Err(HyuError::conflict("ACCOUNT_SUSPENDED"));
        }

        if let Some(expires_at) = self.reset_expires_at {
            if self.need_password_reset && expires_at > now {
                let left = (expires_at - now).num_seconds();
                return Err(HyuError::conflict(format!("RESET_ALREADY_ISSUED:{left}")));
            }

            let issued_at = expires_at - Duration::seconds(RESET_TOKEN_TTL_SECS);
            let since = (now - issued_at).num_seconds();
            if (0..RESET_COOLDOWN_SECS).contains(&since) {
                let wait = RESET_COOLDOWN_SECS - since;
                return Err(HyuError::conflict(format!("TOO_FREQUENT_RESET_REQUEST:{wait}")));
            }
        }

        Ok(())
    }
}

/// Fields required to register an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub nickname: String,
    pub role: Role,
}

/// Length of an admin-imposed suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionPeriod {
    OneWeek,
    TwoWeeks,
    OneMonth,
    HundredYears,
    Indefinite,
}

impl SuspensionPeriod {
    /// Parses an ISO-like period code. Blank input means no end date.
    ///
    /// # Errors
    ///
    /// `INVALID_PERIOD` for any other code.
    pub fn parse(value: Option<&str>) -> HyuResult<Self> {
        match value.map(str::trim).unwrap_or_default() {
            "" => Ok(Self::Indefinite),
            "P1W" => Ok(Self::OneWeek),
            "P2W" => Ok(Self::TwoWeeks),
            "P1M" => Ok(Self::OneMonth),
            "P100Y" => Ok(Self::HundredYears),
            _ => Err(HyuError::bad_request("INVALID_PERIOD")),
        }
    }

    /// End of the suspension when it starts at `now`.
    #[must_use]
    pub fn until(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Self::OneWeek => 7,
            Self::TwoWeeks => 14,
            Self::OneMonth => 30,
            Self::HundredYears => 36_500,
            Self::Indefinite => return None,
        };
        Some(now + Duration::days(days))
    }
}

/// A successful login, kept for auditing.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub user_id: i64,
    pub ip_address: Option<String>,
    pub logged_in_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_user() -> User {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        User {
            id: 1,
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Kim".to_string(),
            nickname: "kim".to_string(),
            role: Role::User,
            state: UserState::Active,
            suspend_until: None,
            risk_mode: None,
            risk_level: None,
            reset_token_hash: None,
            reset_expires_at: None,
            need_password_reset: false,
            created_at: at,
            updated_at: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::from_authority("ROLE_USER").unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
    }

    #[test]
    fn test_state_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&UserState::Suspended).unwrap(), "\"SUSPENDED\"");
        let err = "frozen".parse::<UserState>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid UserState: frozen");
    }

    #[test]
    fn test_access_rules() {
        let mut user = sample_user();
        assert!(user.ensure_can_access(now()).is_ok());

        user.state = UserState::Suspended;
        assert!(matches!(user.ensure_can_access(now()), Err(HyuError::AccountSuspended)));

        user.suspend_until = Some(now() - Duration::hours(1));
        assert!(user.ensure_can_access(now()).is_ok());

        user.state = UserState::Withdrawn;
        assert!(matches!(user.ensure_can_access(now()), Err(HyuError::AccountWithdrawn)));
    }

    #[test]
    fn test_reset_already_issued() {
        let mut user = sample_user();
        user.need_password_reset = true;
        user.reset_expires_at = Some(now() + Duration::seconds(600));
        let err = user.ensure_reset_issuable(now()).unwrap_err();
        assert_eq!(err.to_string(), "RESET_ALREADY_ISSUED:600");
    }

    #[test]
    fn test_reset_cooldown() {
        let mut user = sample_user();
        // issued 2 minutes ago and already consumed
        user.need_password_reset = false;
        user.reset_expires_at = Some(now() + Duration::seconds(RESET_TOKEN_TTL_SECS - 120));
        let err = user.ensure_reset_issuable(now()).unwrap_err();
        assert_eq!(err.to_string(), "TOO_FREQUENT_RESET_REQUEST:180");

        user.reset_expires_at = Some(now() - Duration::hours(1));
        assert!(user.ensure_reset_issuable(now()).is_ok());
    }

    #[test]
    fn test_reset_blocked_for_inactive_accounts() {
        let mut user = sample_user();
        user.state = UserState::Withdrawn;
        assert_eq!(user.ensure_reset_issuable(now()).unwrap_err().to_string(), "ACCOUNT_WITHDRAWN");
        user.state = UserState::Suspended;
        assert_eq!(user.ensure_reset_issuable(now()).unwrap_err().to_string(), "ACCOUNT_SUSPENDED");
    }

    #[test]
    fn test_suspension_period() {
        let start = now();
        assert_eq!(SuspensionPeriod::parse(Some("P1W")).unwrap().until(start), Some(start + Duration::days(7)));
        assert_eq!(SuspensionPeriod::parse(Some("P1M")).unwrap().until(start), Some(start + Duration::days(30)));
        assert_eq!(SuspensionPeriod::parse(None).unwrap().until(start), None);
        assert_eq!(SuspensionPeriod::parse(Some(" ")).unwrap(), SuspensionPeriod::Indefinite);
        assert_eq!(SuspensionPeriod::parse(Some("P3D")).unwrap_err().to_string(), "INVALID_PERIOD");
    }
}
