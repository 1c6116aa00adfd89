//! # Hyu Service
//!
//! Application services for the Hyu backend. Each service is a trait plus a
//! `shaku` component that wires repositories, outbound clients and the clock.

pub mod clients;
pub mod dto;
pub mod event_recorder;

pub mod admin_user_service;
pub mod ai_service;
pub mod assessment_admin_service;
pub mod assessment_service;
pub mod auth_service;
pub mod chat_service;
pub mod checkin_service;
pub mod content_service;
pub mod event_service;
pub mod goal_service;
pub mod metrics_service;
pub mod notification_service;
pub mod profile_service;
pub mod report_service;
pub mod weekly_summary_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use clients::*;
pub use dto::*;
pub use event_recorder::*;

pub use admin_user_service::*;
pub use ai_service::*;
pub use assessment_admin_service::*;
pub use assessment_service::*;
pub use auth_service::*;
pub use chat_service::*;
pub use checkin_service::*;
pub use content_service::*;
pub use event_service::*;
pub use goal_service::*;
pub use metrics_service::*;
pub use notification_service::*;
pub use profile_service::*;
pub use report_service::*;
pub use weekly_summary_service::*;
