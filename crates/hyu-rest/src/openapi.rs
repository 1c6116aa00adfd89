//! OpenAPI documentation configuration.

use crate::controllers::{
    admin_user_controller, ai_controller, assessment_admin_controller, assessment_controller, auth_controller,
    chat_controller, checkin_controller, content_admin_controller, content_controller, event_controller,
    goal_controller, health_controller, job_controller, metrics_controller, notification_controller, profile_controller,
    report_controller,
};
use hyu_core::{ErrorResponse, FieldError};
use hyu_service::{
    AdminUserItem, AnalyzeSmokeRequest, AnswerItem, AnswerRequest, AssessmentResponse, BulkReviewRequest,
    ChangeStateRequest, ChatSmokeRequest, CheckinRequest, CheckinResponse, CheckinStatsResponse, CountResponse,
    CountsDto, CreateAssessmentRequest, CreateContentRequest, CreateGoalRequest, CreateReportRequest,
    DailyMetricsResponse, EventAck, EventRequest, FeedItem, FeedResponse, GoalCheckinResponse, GoalResponse,
    HistoryItem, LoginRequest, MessageDto, MessageResponse, MonthlyMetricsResponse, NotificationDto,
    PasswordResetConfirmRequest, ProfileResponse, QuestionRequest, QuestionResponse, QuestionSetResponse,
    RangeRequest, RangeResponse, ReportCreatedResponse, ReportDetailResponse, ReportListItem, ReporterView,
    RetentionMatrixRow, RetentionResponse, ReviewRequest, RiskTimelinePoint, SendMessageRequest, SessionDto,
    SessionPreview, SignupRequest, SignupResponse, SubmitRequest, SubmitResponse, SummaryResponse, TargetView,
    TodayResponse, TokenResponse, UpdateAssessmentRequest, UpdateContentRequest, UpdateGoalRequest,
    UpdateProfileRequest, UpdatedResponse, YearlyMetricsResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the Hyu API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hyu API",
        version = "1.0.0",
        description = "Mental wellness backend: check-ins, self-assessments, healing content, goals and chat"
    ),
    paths(
        auth_controller::signup,
        auth_controller::login,
        auth_controller::refresh,
        auth_controller::logout,
        auth_controller::confirm_password_reset,
        checkin_controller::today,
        checkin_controller::check_in,
        checkin_controller::stats,
        checkin_controller::month_stats,
        assessment_admin_controller::create,
        assessment_admin_controller::update,
        assessment_admin_controller::list,
        assessment_admin_controller::list_all,
        assessment_admin_controller::get_one,
        assessment_admin_controller::get_any,
        assessment_admin_controller::delete,
        assessment_admin_controller::restore,
        assessment_admin_controller::questions,
        assessment_admin_controller::replace_questions,
        assessment_admin_controller::ranges,
        assessment_admin_controller::replace_ranges,
        assessment_controller::list,
        assessment_controller::by_code,
        assessment_controller::questions,
        assessment_controller::answer,
        assessment_controller::submit,
        assessment_controller::latest_result,
        assessment_controller::history,
        content_admin_controller::create,
        content_admin_controller::get_one,
        content_admin_controller::search,
        content_admin_controller::update,
        content_admin_controller::set_visibility,
        content_admin_controller::delete,
        content_controller::feed,
        content_controller::get_one,
        admin_user_controller::search,
        admin_user_controller::change_state,
        admin_user_controller::issue_password_reset,
        report_controller::create,
        report_controller::search,
        report_controller::detail,
        report_controller::review,
        report_controller::bulk_review,
        chat_controller::create_session,
        chat_controller::sessions,
        chat_controller::messages,
        chat_controller::send,
        ai_controller::chat_smoke,
        ai_controller::analyze_smoke,
        goal_controller::create,
        goal_controller::list,
        goal_controller::get_one,
        goal_controller::update,
        goal_controller::delete,
        goal_controller::set_alert,
        goal_controller::check_in,
        goal_controller::uncheck,
        goal_controller::checkins,
        notification_controller::list,
        notification_controller::unread_count,
        notification_controller::mark_read,
        notification_controller::mark_all_read,
        event_controller::ingest,
        metrics_controller::daily,
        metrics_controller::monthly,
        metrics_controller::yearly,
        metrics_controller::risk_timeline,
        metrics_controller::retention,
        metrics_controller::retention_matrix,
        metrics_controller::summary,
        metrics_controller::recompute_daily,
        metrics_controller::recompute_monthly,
        metrics_controller::recompute_yearly,
        job_controller::list,
        job_controller::toggle,
        job_controller::run,
        profile_controller::get_profile,
        profile_controller::update_profile,
        profile_controller::recent_chat,
        profile_controller::chat_sessions,
        health_controller::health_check,
        health_controller::readiness_check,
        health_controller::liveness_check,
    ),
    components(
        schemas(
            ErrorResponse,
            FieldError,
            SignupRequest,
            SignupResponse,
            LoginRequest,
            TokenResponse,
            PasswordResetConfirmRequest,
            MessageResponse,
            CheckinRequest,
            CheckinResponse,
            TodayResponse,
            CheckinStatsResponse,
            CreateAssessmentRequest,
            UpdateAssessmentRequest,
            AssessmentResponse,
            QuestionRequest,
            QuestionResponse,
            RangeRequest,
            RangeResponse,
            QuestionSetResponse,
            AnswerRequest,
            AnswerItem,
            SubmitRequest,
            SubmitResponse,
            HistoryItem,
            CreateContentRequest,
            UpdateContentRequest,
            FeedItem,
            FeedResponse,
            AdminUserItem,
            ChangeStateRequest,
            CreateReportRequest,
            ReportCreatedResponse,
            ReporterView,
            TargetView,
            ReportListItem,
            ReportDetailResponse,
            ReviewRequest,
            BulkReviewRequest,
            UpdatedResponse,
            SessionDto,
            MessageDto,
            SendMessageRequest,
            ChatSmokeRequest,
            AnalyzeSmokeRequest,
            CreateGoalRequest,
            UpdateGoalRequest,
            GoalResponse,
            GoalCheckinResponse,
            NotificationDto,
            CountResponse,
            EventRequest,
            EventAck,
            CountsDto,
            DailyMetricsResponse,
            MonthlyMetricsResponse,
            YearlyMetricsResponse,
            RiskTimelinePoint,
            RetentionResponse,
            RetentionMatrixRow,
            SummaryResponse,
            ProfileResponse,
            UpdateProfileRequest,
            SessionPreview,
            job_controller::JobResponse,
            job_controller::SchedulerResponse,
            job_controller::ToggleJobRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login and token rotation"),
        (name = "checkins", description = "Daily mood check-ins"),
        (name = "assessments", description = "Self-assessment flow"),
        (name = "contents", description = "Healing content feed"),
        (name = "reports", description = "Content reports"),
        (name = "chat", description = "Chat sessions"),
        (name = "ai", description = "AI service pass-through"),
        (name = "goals", description = "Personal goals"),
        (name = "notifications", description = "In-app notifications"),
        (name = "events", description = "KPI event ingestion"),
        (name = "profile", description = "The caller's profile"),
        (name = "admin-assessments", description = "Assessment CMS"),
        (name = "admin-contents", description = "Content CMS"),
        (name = "admin-users", description = "User management"),
        (name = "admin-reports", description = "Report moderation"),
        (name = "admin-metrics", description = "KPI dashboards"),
        (name = "admin-jobs", description = "Scheduled job control"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Security addon for JWT Bearer authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/admin/metrics/retention/matrix"));
        assert!(doc.paths.paths.contains_key("/api/admin/jobs/{name}/run"));
        assert!(doc.paths.paths.contains_key("/health"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
