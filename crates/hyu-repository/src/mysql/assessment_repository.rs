//! MySQL assessment repository: definitions, questions and score ranges.

use super::{convert_all, parse_column};
use crate::query::AssessmentScope;
use crate::{traits::AssessmentRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{Assessment, AssessmentDraft, NewQuestion, NewScoreRange, Question, ScoreRange};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const ASSESSMENT_COLUMNS: &str =
    "id, code, name, category, description, status, deleted, deleted_at, created_at, updated_at";

#[derive(Component, Clone)]
#[shaku(interface = AssessmentRepository)]
pub struct MySqlAssessmentRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlAssessmentRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    const fn scope_filter(scope: AssessmentScope) -> &'static str {
        match scope {
            AssessmentScope::All => "1 = 1",
            AssessmentScope::NotDeleted => "deleted = FALSE",
            AssessmentScope::Available => "deleted = FALSE AND status = 'ACTIVE'",
        }
    }
}

#[derive(Debug, FromRow)]
struct AssessmentRow {
    id: i64,
    code: String,
    name: String,
    category: Option<String>,
    description: Option<String>,
    status: String,
    deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssessmentRow> for Assessment {
    type Error = HyuError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            code: row.code,
            name: row.name,
            category: row.category,
            description: row.description,
            status: parse_column("status", &row.status)?,
            deleted: row.deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    assessment_id: i64,
    order_no: i32,
    text: String,
    reverse_score: bool,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            assessment_id: row.assessment_id,
            order_no: row.order_no,
            text: row.text,
            reverse_score: row.reverse_score,
        }
    }
}

#[derive(Debug, FromRow)]
struct RangeRow {
    id: i64,
    assessment_id: i64,
    min_score: i32,
    max_score: i32,
    level: String,
    label_ko: String,
    summary_ko: String,
    advice_ko: String,
}

impl TryFrom<RangeRow> for ScoreRange {
    type Error = HyuError;

    fn try_from(row: RangeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            assessment_id: row.assessment_id,
            min_score: row.min_score,
            max_score: row.max_score,
            level: parse_column("level", &row.level)?,
            label_ko: row.label_ko,
            summary_ko: row.summary_ko,
            advice_ko: row.advice_ko,
        })
    }
}

#[async_trait]
impl AssessmentRepository for MySqlAssessmentRepository {
    async fn create(&self, draft: AssessmentDraft) -> HyuResult<Assessment> {
        debug!("Creating assessment: {}", draft.code);

        let result = sqlx::query(
            r#"
            INSERT INTO assessments (code, name, category, description, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.code)
        .bind(&draft.name)
        .bind(&draft.category)
        .bind(&draft.description)
        .bind(draft.status.as_str())
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Assessment id out of range".to_string()))?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::Internal("Failed to fetch inserted assessment".to_string()))
    }

    async fn update(&self, assessment: &Assessment) -> HyuResult<Assessment> {
        debug!("Updating assessment: {}", assessment.id);

        sqlx::query(
            r#"
            UPDATE assessments
            SET code = ?, name = ?, category = ?, description = ?, status = ?,
                deleted = ?, deleted_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&assessment.code)
        .bind(&assessment.name)
        .bind(&assessment.category)
        .bind(&assessment.description)
        .bind(assessment.status.as_str())
        .bind(assessment.deleted)
        .bind(assessment.deleted_at)
        .bind(assessment.id)
        .execute(self.pool.inner())
        .await?;

        self.find_by_id(assessment.id)
            .await?
            .ok_or_else(|| HyuError::not_found("Assessment", assessment.id))
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Assessment>> {
        let sql = format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE id = ?");
        let row = sqlx::query_as::<_, AssessmentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Assessment::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> HyuResult<Option<Assessment>> {
        let sql = format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE code = ?");
        let row = sqlx::query_as::<_, AssessmentRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Assessment::try_from).transpose()
    }

    async fn list(&self, scope: AssessmentScope, page: PageRequest) -> HyuResult<Page<Assessment>> {
        debug!("Listing assessments ({:?}), page: {}, size: {}", scope, page.page, page.size);

        let filter = Self::scope_filter(scope);
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM assessments WHERE {filter}"))
            .fetch_one(self.pool.inner())
            .await?;

        let sql = format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE {filter} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, AssessmentRow>(&sql)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }

    async fn replace_questions(&self, assessment_id: i64, questions: Vec<NewQuestion>) -> HyuResult<Vec<Question>> {
        debug!("Replacing {} questions of assessment {}", questions.len(), assessment_id);

        let mut tx = self.pool.inner().begin().await?;
        sqlx::query("DELETE FROM assessment_questions WHERE assessment_id = ?")
            .bind(assessment_id)
            .execute(&mut *tx)
            .await?;
        for question in &questions {
            sqlx::query(
                r#"
                INSERT INTO assessment_questions (assessment_id, order_no, text, reverse_score)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(assessment_id)
            .bind(question.order_no)
            .bind(&question.text)
            .bind(question.reverse_score)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.questions(assessment_id).await
    }

    async fn questions(&self, assessment_id: i64) -> HyuResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, assessment_id, order_no, text, reverse_score
            FROM assessment_questions
            WHERE assessment_id = ?
            ORDER BY order_no
            "#,
        )
        .bind(assessment_id)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn replace_ranges(&self, assessment_id: i64, ranges: Vec<NewScoreRange>) -> HyuResult<Vec<ScoreRange>> {
        debug!("Replacing {} score ranges of assessment {}", ranges.len(), assessment_id);

        let mut tx = self.pool.inner().begin().await?;
        sqlx::query("DELETE FROM assessment_score_ranges WHERE assessment_id = ?")
            .bind(assessment_id)
            .execute(&mut *tx)
            .await?;
        for range in &ranges {
            sqlx::query(
                r#"
                INSERT INTO assessment_score_ranges
                    (assessment_id, min_score, max_score, level, label_ko, summary_ko, advice_ko)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(assessment_id)
            .bind(range.min_score)
            .bind(range.max_score)
            .bind(range.level.as_str())
            .bind(&range.label_ko)
            .bind(&range.summary_ko)
            .bind(&range.advice_ko)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.ranges(assessment_id).await
    }

    async fn ranges(&self, assessment_id: i64) -> HyuResult<Vec<ScoreRange>> {
        let rows = sqlx::query_as::<_, RangeRow>(
            r#"
            SELECT id, assessment_id, min_score, max_score, level, label_ko, summary_ko, advice_ko
            FROM assessment_score_ranges
            WHERE assessment_id = ?
            ORDER BY min_score
            "#,
        )
        .bind(assessment_id)
        .fetch_all(self.pool.inner())
        .await?;

        convert_all(rows)
    }
}

impl std::fmt::Debug for MySqlAssessmentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAssessmentRepository").finish_non_exhaustive()
    }
}
