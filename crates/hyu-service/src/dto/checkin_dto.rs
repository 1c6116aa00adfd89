//! Daily check-in DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Check-in body. Scores are clamped to 1..=5, not rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    pub mood: Option<i32>,
    pub energy: Option<i32>,
    pub stress: Option<i32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    pub checked: bool,
    pub should_prompt: bool,
    pub date: NaiveDate,
    pub streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinResponse {
    pub created: bool,
    pub date: NaiveDate,
    pub streak: u32,
}

/// Per-day check-in flags over an inclusive range.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinStatsResponse {
    pub streak: u32,
    pub total_days: u32,
    pub checked_days: u32,
    /// Ordered by date.
    pub days: BTreeMap<NaiveDate, bool>,
}
