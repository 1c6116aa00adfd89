//! MySQL moderation report repository.

use super::{convert_all, like_pattern, parse_column};
use crate::query::ReportSearch;
use crate::{traits::ReportRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{NewReport, Report, ReportStatus};
use shaku::Component;
use sqlx::{FromRow, MySql, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

const REPORT_COLUMNS: &str = "id, reporter_id, target_type, target_id, reason, description, attachment_url, \
     status, reported_at, last_reviewed_at, admin_note, handled_by_admin_id";

#[derive(Component, Clone)]
#[shaku(interface = ReportRepository)]
pub struct MySqlReportRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlReportRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, MySql>, search: &ReportSearch) {
        builder.push(" WHERE 1 = 1");
        if let Some(q) = &search.q {
            builder.push(" AND description LIKE ").push_bind(like_pattern(q));
        }
        if let Some(status) = search.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(reason) = search.reason {
            builder.push(" AND reason = ").push_bind(reason.as_str());
        }
        if let Some(target_type) = search.target_type {
            builder.push(" AND target_type = ").push_bind(target_type.as_str());
        }
        if let Some(target_id) = search.target_id {
            builder.push(" AND target_id = ").push_bind(target_id);
        }
        if let Some(from) = search.from {
            builder.push(" AND reported_at >= ").push_bind(from);
        }
        if let Some(until) = search.until {
            builder.push(" AND reported_at < ").push_bind(until);
        }
    }
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: i64,
    reporter_id: i64,
    target_type: String,
    target_id: i64,
    reason: String,
    description: Option<String>,
    attachment_url: Option<String>,
    status: String,
    reported_at: DateTime<Utc>,
    last_reviewed_at: Option<DateTime<Utc>>,
    admin_note: Option<String>,
    handled_by_admin_id: Option<i64>,
}

impl TryFrom<ReportRow> for Report {
    type Error = HyuError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            reporter_id: row.reporter_id,
            target_type: parse_column("target_type", &row.target_type)?,
            target_id: row.target_id,
            reason: parse_column("reason", &row.reason)?,
            description: row.description,
            attachment_url: row.attachment_url,
            status: parse_column("status", &row.status)?,
            reported_at: row.reported_at,
            last_reviewed_at: row.last_reviewed_at,
            admin_note: row.admin_note,
            handled_by_admin_id: row.handled_by_admin_id,
        })
    }
}

#[async_trait]
impl ReportRepository for MySqlReportRepository {
    async fn create(&self, report: NewReport, reported_at: DateTime<Utc>) -> HyuResult<Report> {
        debug!("Creating report by user {} on {} {}", report.reporter_id, report.target_type, report.target_id);

        let result = sqlx::query(
            r#"
            INSERT INTO reports
                (reporter_id, target_type, target_id, reason, description, attachment_url, status, reported_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.reporter_id)
        .bind(report.target_type.as_str())
        .bind(report.target_id)
        .bind(report.reason.as_str())
        .bind(&report.description)
        .bind(&report.attachment_url)
        .bind(ReportStatus::Pending.as_str())
        .bind(reported_at)
        .execute(self.pool.inner())
        .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| HyuError::Internal("Report id out of range".to_string()))?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::Internal("Failed to fetch inserted report".to_string()))
    }

    async fn exists_since(&self, report: &NewReport, since: DateTime<Utc>) -> HyuResult<bool> {
        let result: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM reports
            WHERE reporter_id = ? AND target_type = ? AND target_id = ? AND reported_at >= ?
            LIMIT 1
            "#,
        )
        .bind(report.reporter_id)
        .bind(report.target_type.as_str())
        .bind(report.target_id)
        .bind(since)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(result.is_some())
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?");
        let row = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Report::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[i64]) -> HyuResult<Vec<Report>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder.build_query_as::<ReportRow>().fetch_all(self.pool.inner()).await?;
        convert_all(rows)
    }

    async fn search(&self, search: &ReportSearch, page: PageRequest) -> HyuResult<Page<Report>> {
        debug!("Searching reports: {:?}", search);

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM reports");
        Self::push_filters(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool.inner()).await?;

        let mut select = QueryBuilder::<MySql>::new(format!("SELECT {REPORT_COLUMNS} FROM reports"));
        Self::push_filters(&mut select, search);
        select
            .push(" ORDER BY reported_at DESC, id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = select.build_query_as::<ReportRow>().fetch_all(self.pool.inner()).await?;

        Ok(Page::new(convert_all(rows)?, page.page, page.size, total as u64))
    }

    async fn update(&self, report: &Report) -> HyuResult<()> {
        sqlx::query(
            r#"
            UPDATE reports
            SET status = ?, last_reviewed_at = ?, admin_note = ?, handled_by_admin_id = ?
            WHERE id = ?
            "#,
        )
        .bind(report.status.as_str())
        .bind(report.last_reviewed_at)
        .bind(&report.admin_note)
        .bind(report.handled_by_admin_id)
        .bind(report.id)
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for MySqlReportRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlReportRepository").finish_non_exhaustive()
    }
}
