//! REST API controllers.

pub mod admin_user_controller;
pub mod ai_controller;
pub mod assessment_admin_controller;
pub mod assessment_controller;
pub mod auth_controller;
pub mod chat_controller;
pub mod checkin_controller;
pub mod content_admin_controller;
pub mod content_controller;
pub mod event_controller;
pub mod goal_controller;
pub mod health_controller;
pub mod job_controller;
pub mod metrics_controller;
pub mod notification_controller;
pub mod profile_controller;
pub mod report_controller;
