//! Application state for Axum handlers.

use hyu_config::SecurityConfig;
use hyu_jobs::Scheduler;
use hyu_repository::DatabasePoolInterface;
use hyu_service::{
    AdminUserService, AiProxyService, AssessmentAdminService, AssessmentService, AuthService, ChatService,
    CheckinService, ContentService, EventService, GoalService, MetricsService, NotificationService, ProfileService,
    ReportService,
};
use shaku::{HasComponent, Module};
use std::sync::Arc;

/// Settings for the refresh-token cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub domain: Option<String>,
    pub max_age_secs: u64,
}

impl CookieSettings {
    #[must_use]
    pub fn from_security(config: &SecurityConfig) -> Self {
        Self {
            name: config.refresh_cookie_name.clone(),
            secure: config.refresh_cookie_secure,
            domain: config.refresh_cookie_domain.clone().filter(|d| !d.trim().is_empty()),
            max_age_secs: config.jwt_refresh_expiration_secs,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self::from_security(&SecurityConfig::default())
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub checkin_service: Arc<dyn CheckinService>,
    pub assessment_admin_service: Arc<dyn AssessmentAdminService>,
    pub assessment_service: Arc<dyn AssessmentService>,
    pub content_service: Arc<dyn ContentService>,
    pub admin_user_service: Arc<dyn AdminUserService>,
    pub report_service: Arc<dyn ReportService>,
    pub chat_service: Arc<dyn ChatService>,
    pub ai_service: Arc<dyn AiProxyService>,
    pub goal_service: Arc<dyn GoalService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub event_service: Arc<dyn EventService>,
    pub metrics_service: Arc<dyn MetricsService>,
    pub profile_service: Arc<dyn ProfileService>,
    /// Checked by `/ready`; `None` reports not ready.
    pub database: Option<Arc<dyn DatabasePoolInterface>>,
    /// Backs `/api/admin/jobs`; `None` when scheduling is disabled.
    pub scheduler: Option<Arc<Scheduler>>,
    pub cookies: CookieSettings,
}

/// Every component the router resolves from the container.
pub trait ApiModule:
    Module
    + HasComponent<dyn AuthService>
    + HasComponent<dyn CheckinService>
    + HasComponent<dyn AssessmentAdminService>
    + HasComponent<dyn AssessmentService>
    + HasComponent<dyn ContentService>
    + HasComponent<dyn AdminUserService>
    + HasComponent<dyn ReportService>
    + HasComponent<dyn ChatService>
    + HasComponent<dyn AiProxyService>
    + HasComponent<dyn GoalService>
    + HasComponent<dyn NotificationService>
    + HasComponent<dyn EventService>
    + HasComponent<dyn MetricsService>
    + HasComponent<dyn ProfileService>
    + HasComponent<dyn DatabasePoolInterface>
{
}

impl<M> ApiModule for M where
    M: Module
        + HasComponent<dyn AuthService>
        + HasComponent<dyn CheckinService>
        + HasComponent<dyn AssessmentAdminService>
        + HasComponent<dyn AssessmentService>
        + HasComponent<dyn ContentService>
        + HasComponent<dyn AdminUserService>
        + HasComponent<dyn ReportService>
        + HasComponent<dyn ChatService>
        + HasComponent<dyn AiProxyService>
        + HasComponent<dyn GoalService>
        + HasComponent<dyn NotificationService>
        + HasComponent<dyn EventService>
        + HasComponent<dyn MetricsService>
        + HasComponent<dyn ProfileService>
        + HasComponent<dyn DatabasePoolInterface>
{
}

impl AppState {
    /// Creates application state by resolving services from a Shaku module.
    pub fn from_module<M: ApiModule>(module: &M, cookies: CookieSettings) -> Self {
        Self {
            auth_service: module.resolve(),
            checkin_service: module.resolve(),
            assessment_admin_service: module.resolve(),
            assessment_service: module.resolve(),
            content_service: module.resolve(),
            admin_user_service: module.resolve(),
            report_service: module.resolve(),
            chat_service: module.resolve(),
            ai_service: module.resolve(),
            goal_service: module.resolve(),
            notification_service: module.resolve(),
            event_service: module.resolve(),
            metrics_service: module.resolve(),
            profile_service: module.resolve(),
            database: Some(module.resolve()),
            scheduler: None,
            cookies,
        }
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Option<Arc<Scheduler>>) -> Self {
        self.scheduler = scheduler;
        self
    }
}
