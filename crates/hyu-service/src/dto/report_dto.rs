//! Report DTOs for reporters and moderators.

use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::text::mask_email;
use hyu_domain::{Report, ReportReason, ReportStatus, ReportTargetType, User};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target_type: ReportTargetType,

    pub target_id: i64,

    pub reason: ReportReason,

    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 1000, message = "Attachment URL cannot exceed 1000 characters"))]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreatedResponse {
    pub report_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportListParams {
    pub q: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    /// KST date, inclusive.
    pub from: Option<NaiveDate>,
    /// KST date, inclusive.
    pub to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReporterView {
    pub id: i64,
    pub nickname: Option<String>,
    pub email_masked: Option<String>,
}

impl ReporterView {
    #[must_use]
    pub fn of(reporter_id: i64, user: Option<&User>) -> Self {
        Self {
            id: reporter_id,
            nickname: user.map(|u| u.nickname.clone()),
            email_masked: user.map(|u| mask_email(&u.email)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TargetView {
    #[serde(rename = "type")]
    pub target_type: ReportTargetType,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub reporter: ReporterView,
    pub target: TargetView,
    pub reason: ReportReason,
    pub status: ReportStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ReportListItem {
    #[must_use]
    pub fn new(report: Report, reporter: Option<&User>) -> Self {
        Self {
            id: report.id,
            created_at: report.reported_at,
            reporter: ReporterView::of(report.reporter_id, reporter),
            target: TargetView {
                target_type: report.target_type,
                id: report.target_id,
            },
            reason: report.reason,
            status: report.status,
            reviewed_at: report.last_reviewed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub reporter: ReporterView,
    pub target: TargetView,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    pub status: ReportStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_note: Option<String>,
    pub handled_by_admin_id: Option<i64>,
}

impl ReportDetailResponse {
    #[must_use]
    pub fn new(report: Report, reporter: Option<&User>) -> Self {
        Self {
            id: report.id,
            created_at: report.reported_at,
            reporter: ReporterView::of(report.reporter_id, reporter),
            target: TargetView {
                target_type: report.target_type,
                id: report.target_id,
            },
            reason: report.reason,
            description: report.description,
            attachment_url: report.attachment_url,
            status: report.status,
            reviewed_at: report.last_reviewed_at,
            admin_note: report.admin_note,
            handled_by_admin_id: report.handled_by_admin_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkReviewRequest {
    #[validate(length(min = 1, message = "ids must not be empty"))]
    pub ids: Vec<i64>,
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdatedResponse {
    pub updated: u64,
}
