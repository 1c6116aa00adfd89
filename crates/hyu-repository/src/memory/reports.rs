use super::{contains_ci, paginate};
use crate::query::ReportSearch;
use crate::traits::ReportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest};
use hyu_domain::{NewReport, Report, ReportStatus};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rows: BTreeMap<i64, Report>,
}

#[derive(Debug, Default)]
pub struct InMemoryReportRepository {
    state: Mutex<State>,
}

impl InMemoryReportRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn create(&self, report: NewReport, reported_at: DateTime<Utc>) -> HyuResult<Report> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let stored = Report {
            id: state.next_id,
            reporter_id: report.reporter_id,
            target_type: report.target_type,
            target_id: report.target_id,
            reason: report.reason,
            description: report.description,
            attachment_url: report.attachment_url,
            status: ReportStatus::Pending,
            reported_at,
            last_reviewed_at: None,
            admin_note: None,
            handled_by_admin_id: None,
        };
        state.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn exists_since(&self, report: &NewReport, since: DateTime<Utc>) -> HyuResult<bool> {
        Ok(self.state.lock().rows.values().any(|r| {
            r.reporter_id == report.reporter_id
                && r.target_type == report.target_type
                && r.target_id == report.target_id
                && r.reported_at >= since
        }))
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Report>> {
        Ok(self.state.lock().rows.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> HyuResult<Vec<Report>> {
        let state = self.state.lock();
        Ok(ids.iter().filter_map(|id| state.rows.get(id).cloned()).collect())
    }

    async fn search(&self, search: &ReportSearch, page: PageRequest) -> HyuResult<Page<Report>> {
        let mut rows: Vec<Report> = self
            .state
            .lock()
            .rows
            .values()
            .filter(|r| {
                search
                    .q
                    .as_deref()
                    .map_or(true, |q| r.description.as_deref().is_some_and(|d| contains_ci(d, q)))
                    && search.status.map_or(true, |s| r.status == s)
                    && search.reason.map_or(true, |reason| r.reason == reason)
                    && search.target_type.map_or(true, |t| r.target_type == t)
                    && search.target_id.map_or(true, |id| r.target_id == id)
                    && search.from.map_or(true, |from| r.reported_at >= from)
                    && search.until.map_or(true, |until| r.reported_at < until)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, page))
    }

    async fn update(&self, report: &Report) -> HyuResult<()> {
        let mut state = self.state.lock();
        let stored = state
            .rows
            .get_mut(&report.id)
            .ok_or_else(|| HyuError::not_found("Report", report.id))?;
        *stored = report.clone();
        Ok(())
    }
}
