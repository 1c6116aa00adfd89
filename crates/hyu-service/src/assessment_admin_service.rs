//! CMS management of assessments, their questions and score bands.

use crate::dto::{
    AssessmentResponse, CreateAssessmentRequest, QuestionRequest, QuestionResponse, RangeRequest, RangeResponse,
    UpdateAssessmentRequest,
};
use async_trait::async_trait;
use hyu_core::text::blank_to_none;
use hyu_core::{HyuError, HyuResult, Interface, Page, PageRequest, SharedClock, ValidateExt};
use hyu_domain::{
    validate_questions, validate_ranges, Assessment, AssessmentDraft, AssessmentStatus, NewQuestion, NewScoreRange,
};
use hyu_repository::{AssessmentRepository, AssessmentScope};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait AssessmentAdminService: Interface + Send + Sync {
    async fn create(&self, request: CreateAssessmentRequest) -> HyuResult<AssessmentResponse>;

    async fn update(&self, id: i64, request: UpdateAssessmentRequest) -> HyuResult<AssessmentResponse>;

    /// Assessments that are not soft-deleted.
    async fn list(&self, page: PageRequest) -> HyuResult<Page<AssessmentResponse>>;

    /// Every assessment, deleted ones included.
    async fn list_all(&self, page: PageRequest) -> HyuResult<Page<AssessmentResponse>>;

    async fn get(&self, id: i64) -> HyuResult<AssessmentResponse>;

    /// Lookup that also returns soft-deleted rows.
    async fn get_any(&self, id: i64) -> HyuResult<AssessmentResponse>;

    async fn delete(&self, id: i64) -> HyuResult<()>;

    async fn restore(&self, id: i64) -> HyuResult<AssessmentResponse>;

    async fn replace_questions(&self, id: i64, questions: Vec<QuestionRequest>) -> HyuResult<Vec<QuestionResponse>>;

    async fn questions(&self, id: i64) -> HyuResult<Vec<QuestionResponse>>;

    async fn replace_ranges(&self, id: i64, ranges: Vec<RangeRequest>) -> HyuResult<Vec<RangeResponse>>;

    async fn ranges(&self, id: i64) -> HyuResult<Vec<RangeResponse>>;
}

#[derive(Component)]
#[shaku(interface = AssessmentAdminService)]
pub struct AssessmentAdminServiceImpl {
    #[shaku(inject)]
    assessments: Arc<dyn AssessmentRepository>,
    clock: SharedClock,
}

impl AssessmentAdminServiceImpl {
    pub fn new(assessments: Arc<dyn AssessmentRepository>, clock: SharedClock) -> Self {
        Self { assessments, clock }
    }

    async fn load_any(&self, id: i64) -> HyuResult<Assessment> {
        self.assessments
            .find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::not_found("Assessment", id))
    }

    async fn load_live(&self, id: i64) -> HyuResult<Assessment> {
        let assessment = self.load_any(id).await?;
        if assessment.deleted {
            return Err(HyuError::not_found("Assessment", id));
        }
        Ok(assessment)
    }

    async fn ensure_code_free(&self, code: &str, except: Option<i64>) -> HyuResult<()> {
        match self.assessments.find_by_code(code).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(HyuError::conflict(format!("Assessment code already exists: {code}")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AssessmentAdminService for AssessmentAdminServiceImpl {
    async fn create(&self, request: CreateAssessmentRequest) -> HyuResult<AssessmentResponse> {
        request.validate_request()?;
        let code = request.code.trim().to_string();
        debug!("Creating assessment {}", code);

        self.ensure_code_free(&code, None).await?;
        let assessment = self
            .assessments
            .create(AssessmentDraft {
                code,
                name: request.name.trim().to_string(),
                category: blank_to_none(request.category.as_deref()),
                description: blank_to_none(request.description.as_deref()),
                status: request.status.unwrap_or_default(),
            })
            .await?;

        info!("Assessment created: {} ({})", assessment.code, assessment.id);
        Ok(assessment.into())
    }

    async fn update(&self, id: i64, request: UpdateAssessmentRequest) -> HyuResult<AssessmentResponse> {
        request.validate_request()?;
        let mut assessment = self.load_live(id).await?;

        if let Some(code) = request.code.as_deref().map(str::trim) {
            if code != assessment.code {
                self.ensure_code_free(code, Some(id)).await?;
                assessment.code = code.to_string();
            }
        }
        if let Some(name) = request.name {
            assessment.name = name.trim().to_string();
        }
        if request.category.is_some() {
            assessment.category = blank_to_none(request.category.as_deref());
        }
        if request.description.is_some() {
            assessment.description = blank_to_none(request.description.as_deref());
        }
        if let Some(status) = request.status {
            assessment.status = status;
        }

        let updated = self.assessments.update(&assessment).await?;
        info!("Assessment updated: {}", id);
        Ok(updated.into())
    }

    async fn list(&self, page: PageRequest) -> HyuResult<Page<AssessmentResponse>> {
        Ok(self
            .assessments
            .list(AssessmentScope::NotDeleted, page)
            .await?
            .map(AssessmentResponse::from))
    }

    async fn list_all(&self, page: PageRequest) -> HyuResult<Page<AssessmentResponse>> {
        Ok(self
            .assessments
            .list(AssessmentScope::All, page)
            .await?
            .map(AssessmentResponse::from))
    }

    async fn get(&self, id: i64) -> HyuResult<AssessmentResponse> {
        Ok(self.load_live(id).await?.into())
    }

    async fn get_any(&self, id: i64) -> HyuResult<AssessmentResponse> {
        Ok(self.load_any(id).await?.into())
    }

    async fn delete(&self, id: i64) -> HyuResult<()> {
        let mut assessment = self.load_any(id).await?;
        if assessment.deleted {
            return Ok(());
        }
        assessment.deleted = true;
        assessment.deleted_at = Some(self.clock.now());
        assessment.status = AssessmentStatus::Archived;
        self.assessments.update(&assessment).await?;
        info!("Assessment soft-deleted: {}", id);
        Ok(())
    }

    async fn restore(&self, id: i64) -> HyuResult<AssessmentResponse> {
        let mut assessment = self.load_any(id).await?;
        if !assessment.deleted && assessment.status == AssessmentStatus::Active {
            return Ok(assessment.into());
        }
        assessment.deleted = false;
        assessment.deleted_at = None;
        assessment.status = AssessmentStatus::Active;
        let restored = self.assessments.update(&assessment).await?;
        info!("Assessment restored: {}", id);
        Ok(restored.into())
    }

    async fn replace_questions(&self, id: i64, questions: Vec<QuestionRequest>) -> HyuResult<Vec<QuestionResponse>> {
        self.load_live(id).await?;
        let questions = questions
            .into_iter()
            .map(NewQuestion::try_from)
            .collect::<HyuResult<Vec<_>>>()?;
        let questions = validate_questions(questions)?;

        let stored = self.assessments.replace_questions(id, questions).await?;
        info!("Replaced questions of assessment {} ({} items)", id, stored.len());
        Ok(stored.into_iter().map(QuestionResponse::from).collect())
    }

    async fn questions(&self, id: i64) -> HyuResult<Vec<QuestionResponse>> {
        self.load_any(id).await?;
        let questions = self.assessments.questions(id).await?;
        Ok(questions.into_iter().map(QuestionResponse::from).collect())
    }

    async fn replace_ranges(&self, id: i64, ranges: Vec<RangeRequest>) -> HyuResult<Vec<RangeResponse>> {
        self.load_live(id).await?;
        let ranges = ranges
            .into_iter()
            .map(NewScoreRange::try_from)
            .collect::<HyuResult<Vec<_>>>()?;
        let ranges = validate_ranges(ranges)?;

        let stored = self.assessments.replace_ranges(id, ranges).await?;
        info!("Replaced score ranges of assessment {} ({} items)", id, stored.len());
        Ok(stored.into_iter().map(RangeResponse::from).collect())
    }

    async fn ranges(&self, id: i64) -> HyuResult<Vec<RangeResponse>> {
        self.load_any(id).await?;
        let ranges = self.assessments.ranges(id).await?;
        Ok(ranges.into_iter().map(RangeResponse::from).collect())
    }
}

impl std::fmt::Debug for AssessmentAdminServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentAdminServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::clock;
    use hyu_domain::RiskLevel;
    use hyu_repository::memory::InMemoryAssessmentRepository;

    fn service() -> AssessmentAdminServiceImpl {
        let clock = clock();
        AssessmentAdminServiceImpl::new(Arc::new(InMemoryAssessmentRepository::new(clock.clone())), clock)
    }

    fn create_request(code: &str) -> CreateAssessmentRequest {
        CreateAssessmentRequest {
            code: code.to_string(),
            name: "Mood check".to_string(),
            category: Some("  ".to_string()),
            description: None,
            status: None,
        }
    }

    fn question(order_no: Option<i32>, text: &str) -> QuestionRequest {
        QuestionRequest {
            order_no,
            text: text.to_string(),
            reverse_score: false,
        }
    }

    fn range(min: i32, max: i32, level: Option<RiskLevel>) -> RangeRequest {
        RangeRequest {
            min,
            max,
            level,
            label_ko: Some("라벨".to_string()),
            summary_ko: Some("요약".to_string()),
            advice_ko: Some("조언".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_active() {
        let service = service();
        let created = service.create(create_request("PHQ9")).await.unwrap();

        assert_eq!(created.status, AssessmentStatus::Active);
        assert_eq!(created.category, None);
        assert!(!created.deleted);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let service = service();
        let first = service.create(create_request("PHQ9")).await.unwrap();
        let other = service.create(create_request("GAD7")).await.unwrap();

        let err = service.create(create_request("PHQ9")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        let err = service
            .update(
                other.id,
                UpdateAssessmentRequest {
                    code: Some("PHQ9".to_string()),
                    ..UpdateAssessmentRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        // Keeping its own code is not a conflict.
        let same = service
            .update(
                first.id,
                UpdateAssessmentRequest {
                    code: Some("PHQ9".to_string()),
                    name: Some("Renamed".to_string()),
                    ..UpdateAssessmentRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.name, "Renamed");
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore_are_idempotent() {
        let service = service();
        let created = service.create(create_request("PHQ9")).await.unwrap();

        service.delete(created.id).await.unwrap();
        service.delete(created.id).await.unwrap();

        assert_eq!(service.get(created.id).await.unwrap_err().status_code(), 404);
        let any = service.get_any(created.id).await.unwrap();
        assert!(any.deleted);
        assert_eq!(any.status, AssessmentStatus::Archived);
        assert!(any.deleted_at.is_some());

        assert!(service.list(PageRequest::first()).await.unwrap().is_empty());
        assert_eq!(service.list_all(PageRequest::first()).await.unwrap().len(), 1);

        let restored = service.restore(created.id).await.unwrap();
        let again = service.restore(created.id).await.unwrap();
        assert!(!restored.deleted);
        assert_eq!(again.status, AssessmentStatus::Active);
        assert_eq!(again.deleted_at, None);
    }

    #[tokio::test]
    async fn test_replace_questions_validates_and_orders() {
        let service = service();
        let id = service.create(create_request("PHQ9")).await.unwrap().id;

        let stored = service
            .replace_questions(id, vec![question(Some(2), " second "), question(Some(1), "first")])
            .await
            .unwrap();
        assert_eq!(
            stored.iter().map(|q| (q.order_no, q.text.as_str())).collect::<Vec<_>>(),
            vec![(1, "first"), (2, "second")]
        );

        for bad in [
            vec![],
            vec![question(None, "x")],
            vec![question(Some(0), "x")],
            vec![question(Some(1), "x"), question(Some(1), "y")],
            vec![question(Some(1), "   ")],
        ] {
            let err = service.replace_questions(id, bad).await.unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
        assert_eq!(service.questions(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_ranges_rejects_overlap() {
        let service = service();
        let id = service.create(create_request("PHQ9")).await.unwrap().id;

        let stored = service
            .replace_ranges(
                id,
                vec![
                    range(5, 9, Some(RiskLevel::Moderate)),
                    range(0, 4, Some(RiskLevel::Mild)),
                ],
            )
            .await
            .unwrap();
        assert_eq!(stored[0].min, 0);
        assert_eq!(stored[1].level, RiskLevel::Moderate);

        let err = service
            .replace_ranges(
                id,
                vec![
                    range(0, 5, Some(RiskLevel::Mild)),
                    range(5, 9, Some(RiskLevel::Moderate)),
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "overlapping ranges");

        let err = service.replace_ranges(id, vec![range(3, 1, Some(RiskLevel::Mild))]).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service.replace_ranges(id, vec![range(0, 1, None)]).await.unwrap_err();
        assert_eq!(err.to_string(), "level is required");

        assert_eq!(service.ranges(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_assessment_is_not_found() {
        let service = service();
        assert_eq!(service.get_any(99).await.unwrap_err().status_code(), 404);
        assert_eq!(service.delete(99).await.unwrap_err().status_code(), 404);
    }
}
