//! User reports and their moderation.

use crate::dto::{
    parse_filter, BulkReviewRequest, CreateReportRequest, ReportCreatedResponse, ReportDetailResponse,
    ReportListItem, ReportListParams, ReviewRequest, UpdatedResponse,
};
use async_trait::async_trait;
use chrono::Duration;
use hyu_core::text::blank_to_none;
use hyu_core::{kst_start_of_day, HyuError, HyuResult, Interface, Page, PageRequest, SharedClock, ValidateExt};
use hyu_domain::{NewReport, Report, ReportStatus, User, DUPLICATE_REPORT_WINDOW_HOURS};
use hyu_repository::{ReportRepository, ReportSearch, UserRepository};
use shaku::Component;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

pub const REPORT_PAGE_SIZE: usize = 20;
pub const ADMIN_NOTE_MAX_CHARS: usize = 1000;

#[async_trait]
pub trait ReportService: Interface + Send + Sync {
    async fn create(&self, reporter_id: i64, request: CreateReportRequest) -> HyuResult<ReportCreatedResponse>;

    async fn search(&self, params: ReportListParams) -> HyuResult<Page<ReportListItem>>;

    async fn detail(&self, id: i64) -> HyuResult<ReportDetailResponse>;

    async fn review(&self, admin_id: i64, id: i64, request: ReviewRequest) -> HyuResult<ReportDetailResponse>;

    /// Applies one review to many reports; unknown ids are skipped.
    async fn bulk_review(&self, admin_id: i64, request: BulkReviewRequest) -> HyuResult<UpdatedResponse>;
}

#[derive(Component)]
#[shaku(interface = ReportService)]
pub struct ReportServiceImpl {
    #[shaku(inject)]
    reports: Arc<dyn ReportRepository>,
    #[shaku(inject)]
    users: Arc<dyn UserRepository>,
    clock: SharedClock,
}

/// Parsed review input shared by the single and bulk paths.
struct Review {
    status: Option<ReportStatus>,
    note: Option<String>,
}

impl Review {
    fn parse(status: Option<&str>, note: Option<&str>) -> HyuResult<Self> {
        let status = blank_to_none(status)
            .map(|s| ReportStatus::parse_admin(&s))
            .transpose()?;
        let note = blank_to_none(note);
        if note.as_ref().is_some_and(|n| n.chars().count() > ADMIN_NOTE_MAX_CHARS) {
            return Err(HyuError::bad_request("note must be at most 1000 characters"));
        }
        Ok(Self { status, note })
    }
}

impl ReportServiceImpl {
    pub fn new(reports: Arc<dyn ReportRepository>, users: Arc<dyn UserRepository>, clock: SharedClock) -> Self {
        Self { reports, users, clock }
    }

    async fn load(&self, id: i64) -> HyuResult<Report> {
        self.reports
            .find_by_id(id)
            .await?
            .ok_or(HyuError::Missing("REPORT_NOT_FOUND"))
    }

    async fn detail_of(&self, report: Report) -> HyuResult<ReportDetailResponse> {
        let reporter = self.users.find_by_id(report.reporter_id).await?;
        Ok(ReportDetailResponse::new(report, reporter.as_ref()))
    }
}

#[async_trait]
impl ReportService for ReportServiceImpl {
    async fn create(&self, reporter_id: i64, request: CreateReportRequest) -> HyuResult<ReportCreatedResponse> {
        request.validate_request()?;
        let report = NewReport {
            reporter_id,
            target_type: request.target_type,
            target_id: request.target_id,
            reason: request.reason,
            description: blank_to_none(request.description.as_deref()),
            attachment_url: blank_to_none(request.attachment_url.as_deref()),
        };

        let now = self.clock.now();
        let since = now - Duration::hours(DUPLICATE_REPORT_WINDOW_HOURS);
        if self.reports.exists_since(&report, since).await? {
            debug!(
                "Duplicate report by {} on {} {}",
                reporter_id, report.target_type, report.target_id
            );
            return Err(HyuError::conflict("DUPLICATE_REPORT_RECENTLY"));
        }

        let created = self.reports.create(report, now).await?;
        info!(
            "Report {} filed by user {} against {} {} ({})",
            created.id, reporter_id, created.target_type, created.target_id, created.reason
        );
        Ok(ReportCreatedResponse { report_id: created.id })
    }

    async fn search(&self, params: ReportListParams) -> HyuResult<Page<ReportListItem>> {
        let search = ReportSearch {
            q: blank_to_none(params.q.as_deref()),
            status: parse_filter(params.status.as_deref())?,
            reason: parse_filter(params.reason.as_deref())?,
            target_type: parse_filter(params.target_type.as_deref())?,
            target_id: params.target_id,
            from: params.from.map(kst_start_of_day),
            until: params.to.and_then(|d| d.succ_opt()).map(kst_start_of_day),
        };
        let page = PageRequest::with_default(params.page, params.size, REPORT_PAGE_SIZE);
        let reports = self.reports.search(&search, page).await?;

        let reporter_ids: Vec<i64> = reports
            .content
            .iter()
            .map(|r| r.reporter_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let reporters: HashMap<i64, User> = self
            .users
            .find_by_ids(&reporter_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(reports.map(|r| {
            let reporter = reporters.get(&r.reporter_id);
            ReportListItem::new(r, reporter)
        }))
    }

    async fn detail(&self, id: i64) -> HyuResult<ReportDetailResponse> {
        let report = self.load(id).await?;
        self.detail_of(report).await
    }

    async fn review(&self, admin_id: i64, id: i64, request: ReviewRequest) -> HyuResult<ReportDetailResponse> {
        let review = Review::parse(request.status.as_deref(), request.note.as_deref())?;
        let mut report = self.load(id).await?;

        report.apply_review(review.status, review.note, admin_id, self.clock.now());
        self.reports.update(&report).await?;
        info!("Report {} reviewed by admin {}: {}", id, admin_id, report.status);
        self.detail_of(report).await
    }

    async fn bulk_review(&self, admin_id: i64, request: BulkReviewRequest) -> HyuResult<UpdatedResponse> {
        request.validate_request()?;
        let review = Review::parse(Some(&request.status), request.note.as_deref())?;
        if review.status.is_none() {
            return Err(HyuError::bad_request("INVALID_STATUS"));
        }

        let ids: Vec<i64> = request.ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let now = self.clock.now();
        let mut updated = 0u64;
        for mut report in self.reports.find_by_ids(&ids).await? {
            report.apply_review(review.status, review.note.clone(), admin_id, now);
            self.reports.update(&report).await?;
            updated += 1;
        }

        info!("Admin {} bulk-reviewed {} of {} reports", admin_id, updated, ids.len());
        Ok(UpdatedResponse { updated })
    }
}

impl std::fmt::Debug for ReportServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, date, now, user};
    use hyu_domain::{ReportReason, ReportTargetType};
    use hyu_repository::memory::{InMemoryReportRepository, InMemoryUserRepository};

    fn service_at(clock: SharedClock, reports: Arc<InMemoryReportRepository>) -> ReportServiceImpl {
        let users = Arc::new(InMemoryUserRepository::new(clock.clone()));
        users.insert(user(1, "reporter@example.com"));
        ReportServiceImpl::new(reports, users, clock)
    }

    fn service() -> ReportServiceImpl {
        service_at(clock(), Arc::new(InMemoryReportRepository::new()))
    }

    fn request(target_id: i64) -> CreateReportRequest {
        CreateReportRequest {
            target_type: ReportTargetType::Content,
            target_id,
            reason: ReportReason::Spam,
            description: Some("buy now".to_string()),
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_within_a_day_conflicts() {
        let reports = Arc::new(InMemoryReportRepository::new());
        let service = service_at(clock(), reports.clone());
        service.create(1, request(10)).await.unwrap();

        let err = service.create(1, request(10)).await.unwrap_err();
        assert_eq!(err.to_string(), "DUPLICATE_REPORT_RECENTLY");
        service.create(1, request(11)).await.unwrap();

        let later = service_at(
            SharedClock::fixed(now() + Duration::hours(25)),
            reports,
        );
        later.create(1, request(10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_masks_reporter() {
        let service = service();
        service.create(1, request(10)).await.unwrap();
        service.create(2, request(12)).await.unwrap();

        let page = service.search(ReportListParams::default()).await.unwrap();
        assert_eq!(page.len(), 2);
        let mine = page.content.iter().find(|i| i.reporter.id == 1).unwrap();
        assert_eq!(mine.reporter.email_masked.as_deref(), Some("r***@example.com"));
        let unknown = page.content.iter().find(|i| i.reporter.id == 2).unwrap();
        assert_eq!(unknown.reporter.nickname, None);

        let page = service
            .search(ReportListParams {
                from: Some(date(2024, 5, 16)),
                ..ReportListParams::default()
            })
            .await
            .unwrap();
        assert!(page.is_empty());

        let err = service
            .search(ReportListParams {
                status: Some("OPEN".to_string()),
                ..ReportListParams::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_review_sets_handler() {
        let service = service();
        let id = service.create(1, request(10)).await.unwrap().report_id;

        let reviewed = service
            .review(
                7,
                id,
                ReviewRequest {
                    status: Some("ACTION_TAKEN".to_string()),
                    note: Some("  hidden  ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(reviewed.status, ReportStatus::ActionTaken);
        assert_eq!(reviewed.handled_by_admin_id, Some(7));
        assert_eq!(reviewed.reviewed_at, Some(now()));
        assert_eq!(reviewed.admin_note.as_deref(), Some("hidden"));

        let reverted = service
            .review(
                8,
                id,
                ReviewRequest {
                    status: Some("PENDING".to_string()),
                    note: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(reverted.status, ReportStatus::Pending);
        assert_eq!(reverted.handled_by_admin_id, Some(7));
        assert_eq!(reverted.admin_note.as_deref(), Some("hidden"));
    }

    #[tokio::test]
    async fn test_review_validation() {
        let service = service();
        let id = service.create(1, request(10)).await.unwrap().report_id;

        let err = service
            .review(
                7,
                id,
                ReviewRequest {
                    status: Some("CLOSED".to_string()),
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "INVALID_STATUS");

        let err = service
            .review(
                7,
                id,
                ReviewRequest {
                    status: None,
                    note: Some("x".repeat(1001)),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

    }

    #[tokio::test]
    async fn test_missing_report_has_dedicated_code() {
        let service = service();
        let err = service.detail(999).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "REPORT_NOT_FOUND");

        let err = service
            .review(
                7,
                999,
                ReviewRequest {
                    status: Some("REVIEWED".to_string()),
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "REPORT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bulk_review_counts_existing() {
        let service = service();
        let a = service.create(1, request(10)).await.unwrap().report_id;
        let b = service.create(1, request(11)).await.unwrap().report_id;

        let response = service
            .bulk_review(
                7,
                BulkReviewRequest {
                    ids: vec![a, b, b, 999],
                    status: "REVIEWED".to_string(),
                    note: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.updated, 2);
        assert_eq!(service.detail(b).await.unwrap().status, ReportStatus::Reviewed);
    }
}
