//! Assessment DTOs for the CMS and the user flow.

use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult};
use hyu_domain::{Assessment, AssessmentStatus, NewQuestion, NewScoreRange, Question, RiskLevel, ScoreRange};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 50, message = "Code must be 1-50 characters"))]
    pub code: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    pub description: Option<String>,

    pub status: Option<AssessmentStatus>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    pub description: Option<String>,

    pub status: Option<AssessmentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub status: AssessmentStatus,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Assessment> for AssessmentResponse {
    fn from(a: Assessment) -> Self {
        Self {
            id: a.id,
            code: a.code,
            name: a.name,
            category: a.category,
            description: a.description,
            status: a.status,
            deleted: a.deleted,
            deleted_at: a.deleted_at,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub order_no: Option<i32>,
    pub text: String,
    #[serde(default)]
    pub reverse_score: bool,
}

impl TryFrom<QuestionRequest> for NewQuestion {
    type Error = HyuError;

    fn try_from(q: QuestionRequest) -> HyuResult<Self> {
        let order_no = q.order_no.ok_or_else(|| HyuError::bad_request("orderNo is required"))?;
        Ok(Self {
            order_no,
            text: q.text,
            reverse_score: q.reverse_score,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: i64,
    pub order_no: i32,
    pub text: String,
    pub reverse_score: bool,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            order_no: q.order_no,
            text: q.text,
            reverse_score: q.reverse_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RangeRequest {
    pub min: i32,
    pub max: i32,
    pub level: Option<RiskLevel>,
    pub label_ko: Option<String>,
    pub summary_ko: Option<String>,
    pub advice_ko: Option<String>,
}

impl TryFrom<RangeRequest> for NewScoreRange {
    type Error = HyuError;

    fn try_from(r: RangeRequest) -> HyuResult<Self> {
        let level = r.level.ok_or_else(|| HyuError::bad_request("level is required"))?;
        Ok(Self {
            min_score: r.min,
            max_score: r.max,
            level,
            label_ko: r.label_ko.unwrap_or_default(),
            summary_ko: r.summary_ko.unwrap_or_default(),
            advice_ko: r.advice_ko.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RangeResponse {
    pub id: i64,
    pub min: i32,
    pub max: i32,
    pub level: RiskLevel,
    pub label_ko: String,
    pub summary_ko: String,
    pub advice_ko: String,
}

impl From<ScoreRange> for RangeResponse {
    fn from(r: ScoreRange) -> Self {
        Self {
            id: r.id,
            min: r.min_score,
            max: r.max_score,
            level: r.level,
            label_ko: r.label_ko,
            summary_ko: r.summary_ko,
            advice_ko: r.advice_ko,
        }
    }
}

/// Questions of an active assessment, as shown to a respondent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetResponse {
    pub assessment_id: i64,
    pub code: String,
    pub name: String,
    pub questions: Vec<QuestionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub submission_id: Option<i64>,
    pub question_id: i64,
    pub value: i32,
    pub guest_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerItem {
    pub question_id: i64,
    pub value: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub assessment_id: Option<i64>,
    pub submission_id: Option<i64>,
    pub guest_key: Option<String>,
    pub answers: Option<Vec<AnswerItem>>,
}

/// Scored submission with its band texts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub submission_id: i64,
    pub assessment_id: i64,
    pub total_score: i32,
    pub level: Option<RiskLevel>,
    pub label_ko: Option<String>,
    pub summary_ko: Option<String>,
    pub advice_ko: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub submission_id: i64,
    pub submitted_at: Option<DateTime<Utc>>,
    pub level: Option<RiskLevel>,
}
