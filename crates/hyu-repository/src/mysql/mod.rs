//! MySQL repository implementations.

mod assessment_repository;
mod chat_repository;
mod checkin_repository;
mod content_repository;
mod event_repository;
mod goal_repository;
mod metrics_repository;
mod notification_repository;
mod profile_repository;
mod report_repository;
mod submission_repository;
mod user_repository;
mod weekly_summary_repository;

pub use assessment_repository::MySqlAssessmentRepository;
pub use chat_repository::MySqlChatRepository;
pub use checkin_repository::MySqlCheckinRepository;
pub use content_repository::MySqlContentRepository;
pub use event_repository::MySqlEventRepository;
pub use goal_repository::MySqlGoalRepository;
pub use metrics_repository::MySqlMetricsRepository;
pub use notification_repository::MySqlNotificationRepository;
pub use profile_repository::MySqlProfileRepository;
pub use report_repository::MySqlReportRepository;
pub use submission_repository::MySqlSubmissionRepository;
pub use user_repository::MySqlUserRepository;
pub use weekly_summary_repository::MySqlWeeklySummaryRepository;

use hyu_core::{HyuError, HyuResult};
use std::str::FromStr;

/// Parses an enum-backed text column.
fn parse_column<T>(column: &str, value: &str) -> HyuResult<T>
where
    T: FromStr<Err = HyuError>,
{
    value
        .parse()
        .map_err(|_| HyuError::Internal(format!("Invalid {column} in database: {value}")))
}

fn parse_optional_column<T>(column: &str, value: Option<&str>) -> HyuResult<Option<T>>
where
    T: FromStr<Err = HyuError>,
{
    value.map(|v| parse_column(column, v)).transpose()
}

/// `%term%` for LIKE searches, with wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

/// Converts rows into domain values, failing on the first bad row.
fn convert_all<R, T>(rows: Vec<R>) -> HyuResult<Vec<T>>
where
    T: TryFrom<R, Error = HyuError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyu_domain::Role;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a%b_c"), "%a\\%b\\_c%");
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(parse_column::<Role>("role", "ADMIN").unwrap(), Role::Admin);
        let err = parse_column::<Role>("role", "ROOT").unwrap_err();
        assert!(matches!(err, HyuError::Internal(_)));
        assert_eq!(parse_optional_column::<Role>("role", None).unwrap(), None);
    }
}
