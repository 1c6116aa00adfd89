//! MySQL assessment submission repository.

use super::{convert_all, parse_column, parse_optional_column};
use crate::{traits::SubmissionRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{Answer, RiskLevel, Submission, SubmissionOwner, SubmissionStatus};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const SUBMISSION_COLUMNS: &str =
    "id, assessment_id, user_id, guest_key, status, total_score, risk, submitted_at, created_at";

#[derive(Component, Clone)]
#[shaku(interface = SubmissionRepository)]
pub struct MySqlSubmissionRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlSubmissionRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: i64,
    assessment_id: i64,
    user_id: Option<i64>,
    guest_key: Option<String>,
    status: String,
    total_score: Option<i32>,
    risk: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = HyuError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            assessment_id: row.assessment_id,
            user_id: row.user_id,
            guest_key: row.guest_key,
            status: parse_column("status", &row.status)?,
            total_score: row.total_score,
            risk: parse_optional_column("risk", row.risk.as_deref())?,
            submitted_at: row.submitted_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AnswerRow {
    id: i64,
    submission_id: i64,
    question_id: i64,
    value: i16,
}

#[async_trait]
impl SubmissionRepository for MySqlSubmissionRepository {
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Submission>> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM assessment_submissions WHERE id = ?");
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Submission::try_from).transpose()
    }

    async fn find_latest_draft(&self, assessment_id: i64, owner: &SubmissionOwner) -> HyuResult<Option<Submission>> {
        let owner_filter = match owner {
            SubmissionOwner::User(_) => "user_id = ?",
            SubmissionOwner::Guest(_) => "user_id IS NULL AND guest_key = ?",
        };
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM assessment_submissions \
             WHERE assessment_id = ? AND status = 'DRAFT' AND {owner_filter} \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let query = sqlx::query_as::<_, SubmissionRow>(&sql).bind(assessment_id);
        let query = match owner {
            SubmissionOwner::User(id) => query.bind(*id),
            SubmissionOwner::Guest(key) => query.bind(key.clone()),
        };

        let row = query.fetch_optional(self.pool.inner()).await?;
        row.map(Submission::try_from).transpose()
    }

    async fn create_draft(&self, assessment_id: i64, owner: &SubmissionOwner) -> HyuResult<Submission> {
        debug!("Creating draft submission for assessment {}", assessment_id);

        let result = sqlx::query(
            "INSERT INTO assessment_submissions (assessment_id, user_id, guest_key, status) VALUES (?, ?, ?, ?)",
        )
        .bind(assessment_id)
        .bind(owner.user_id())
        .bind(owner.guest_key())
        .bind(SubmissionStatus::Draft.as_str())
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Submission id out of range".to_string()))?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::Internal("Failed to fetch inserted submission".to_string()))
    }

    async fn upsert_answer(&self, submission_id: i64, question_id: i64, value: i16) -> HyuResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assessment_answers (submission_id, question_id, value)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE value = VALUES(value)
            "#,
        )
        .bind(submission_id)
        .bind(question_id)
        .bind(value)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }

    async fn answers(&self, submission_id: i64) -> HyuResult<Vec<Answer>> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            "SELECT id, submission_id, question_id, value FROM assessment_answers WHERE submission_id = ? ORDER BY id",
        )
        .bind(submission_id)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Answer {
                id: r.id,
                submission_id: r.submission_id,
                question_id: r.question_id,
                value: r.value,
            })
            .collect())
    }

    async fn mark_submitted(
        &self,
        id: i64,
        total_score: i32,
        risk: RiskLevel,
        submitted_at: DateTime<Utc>,
    ) -> HyuResult<Submission> {
        debug!("Submitting submission {} with score {}", id, total_score);

        sqlx::query(
            r#"
            UPDATE assessment_submissions
            SET status = ?, total_score = ?, risk = ?, submitted_at = ?
            WHERE id = ?
            "#,
        )
        .bind(SubmissionStatus::Submitted.as_str())
        .bind(total_score)
        .bind(risk.as_str())
        .bind(submitted_at)
        .bind(id)
        .execute(self.pool.inner())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::not_found("Submission", id))
    }

    async fn find_latest_submitted(&self, assessment_id: i64, user_id: i64) -> HyuResult<Option<Submission>> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM assessment_submissions \
             WHERE assessment_id = ? AND user_id = ? AND status = 'SUBMITTED' \
             ORDER BY submitted_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(assessment_id)
            .bind(user_id)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Submission::try_from).transpose()
    }

    async fn submitted_history(&self, assessment_id: i64, user_id: i64, page: PageRequest) -> HyuResult<Page<Submission>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assessment_submissions WHERE assessment_id = ? AND user_id = ? AND status = 'SUBMITTED'",
        )
        .bind(assessment_id)
        .bind(user_id)
        .fetch_one(self.pool.inner())
        .await?;

        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM assessment_submissions \
             WHERE assessment_id = ? AND user_id = ? AND status = 'SUBMITTED' \
             ORDER BY submitted_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(assessment_id)
            .bind(user_id)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }
}

impl std::fmt::Debug for MySqlSubmissionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSubmissionRepository").finish_non_exhaustive()
    }
}
