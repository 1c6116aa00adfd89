//! Admin user-management DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use hyu_domain::{RiskLevel, Role, User, UserState};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AdminUserParams {
    pub q: Option<String>,
    pub role: Option<String>,
    pub state: Option<String>,
    pub risk_level: Option<String>,
    /// KST date, inclusive.
    pub joined_from: Option<NaiveDate>,
    /// KST date, inclusive.
    pub joined_to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserItem {
    pub id: i64,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub role: Role,
    pub state: UserState,
    pub risk_level: Option<RiskLevel>,
    pub joined_at: DateTime<Utc>,
}

impl From<User> for AdminUserItem {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            nickname: user.nickname,
            email: user.email,
            role: user.role,
            state: user.state,
            risk_level: user.risk_level,
            joined_at: user.created_at,
        }
    }
}

/// State change. `period` applies to `SUSPENDED` only: `P1W`, `P2W`, `P1M`,
/// `P100Y`, or blank for no end.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStateRequest {
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,

    #[validate(length(max = 500))]
    pub reason: Option<String>,

    pub period: Option<String>,

    pub risk_mode: Option<String>,
}
