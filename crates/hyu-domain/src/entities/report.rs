//! User reports for moderation.

use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult};
use serde::{Deserialize, Serialize};

/// Window within which the same reporter may not report a target twice.
pub const DUPLICATE_REPORT_WINDOW_HOURS: i64 = 24;

db_enum! {
    pub enum ReportTargetType {
        Post => "POST",
        Comment => "COMMENT",
        Content => "CONTENT",
        User => "USER",
    }
}

db_enum! {
    pub enum ReportReason {
        Spam => "SPAM",
        Abuse => "ABUSE",
        Suicide => "SUICIDE",
        Violence => "VIOLENCE",
        Other => "OTHER",
    }
}

db_enum! {
    #[derive(Default)]
    pub enum ReportStatus {
        #[default]
        Pending => "PENDING",
        Reviewed => "REVIEWED",
        ActionTaken => "ACTION_TAKEN",
    }
}

impl ReportStatus {
    /// Parses an admin-supplied status.
    ///
    /// # Errors
    ///
    /// `INVALID_STATUS` for unknown values.
    pub fn parse_admin(value: &str) -> HyuResult<Self> {
        value
            .parse()
            .map_err(|_| HyuError::bad_request("INVALID_STATUS"))
    }

    /// Whether moving to this status counts as an admin review.
    #[must_use]
    pub const fn is_review(&self) -> bool {
        matches!(self, Self::Reviewed | Self::ActionTaken)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub reporter_id: i64,
    pub target_type: ReportTargetType,
    pub target_id: i64,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    pub status: ReportStatus,
    pub reported_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub admin_note: Option<String>,
    pub handled_by_admin_id: Option<i64>,
}

impl Report {
    /// Applies an admin status change and optional note.
    pub fn apply_review(&mut self, status: Option<ReportStatus>, note: Option<String>, admin_id: i64, now: DateTime<Utc>) {
        if let Some(status) = status {
            self.status = status;
            if status.is_review() {
                self.last_reviewed_at = Some(now);
                self.handled_by_admin_id = Some(admin_id);
            }
        }
        if let Some(note) = note {
            self.admin_note = Some(note);
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: i64,
    pub target_type: ReportTargetType,
    pub target_id: i64,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
}
