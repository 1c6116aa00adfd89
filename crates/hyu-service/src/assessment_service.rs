//! Self-assessment flow for users and guests: drafts, answers, scoring.

use crate::dto::{
    AnswerItem, AnswerRequest, AssessmentResponse, HistoryItem, QuestionResponse, QuestionSetResponse, SubmitRequest,
    SubmitResponse,
};
use crate::event_recorder::EventRecorder;
use async_trait::async_trait;
use hyu_core::{HyuError, HyuResult, Interface, Page, PageRequest, SharedClock};
use hyu_domain::{
    find_band, names, score_answers, validate_answer_value, Assessment, NewEvent, Question, ScoreRange, Submission,
    SubmissionOwner, SubmissionStatus,
};
use hyu_repository::{AssessmentRepository, AssessmentScope, SubmissionRepository, UserRepository};
use serde_json::json;
use shaku::Component;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Who is answering: the bearer user, or a guest key from the body or the
/// `X-Guest-Key` header.
#[derive(Debug, Clone, Default)]
pub struct Respondent {
    pub user_id: Option<i64>,
    pub header_guest_key: Option<String>,
}

impl Respondent {
    #[must_use]
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            header_guest_key: None,
        }
    }

    #[must_use]
    pub fn guest(key: impl Into<String>) -> Self {
        Self {
            user_id: None,
            header_guest_key: Some(key.into()),
        }
    }

    fn owner(&self, body_guest_key: Option<String>) -> HyuResult<SubmissionOwner> {
        SubmissionOwner::resolve(self.user_id, body_guest_key.or_else(|| self.header_guest_key.clone()))
    }
}

#[async_trait]
pub trait AssessmentService: Interface + Send + Sync {
    /// Active, not-deleted assessments.
    async fn list(&self, page: PageRequest) -> HyuResult<Page<AssessmentResponse>>;

    async fn by_code(&self, code: &str) -> HyuResult<AssessmentResponse>;

    async fn questions(&self, assessment_id: i64) -> HyuResult<QuestionSetResponse>;

    /// Saves one answer into the respondent's draft.
    async fn answer(&self, assessment_id: i64, respondent: Respondent, request: AnswerRequest) -> HyuResult<()>;

    /// Scores the draft and records the outcome.
    async fn submit(&self, assessment_id: i64, respondent: Respondent, request: SubmitRequest)
        -> HyuResult<SubmitResponse>;

    /// Latest submitted result, banded with the current ranges.
    async fn latest_result(&self, assessment_id: i64, user_id: i64) -> HyuResult<SubmitResponse>;

    async fn history(&self, assessment_id: i64, user_id: i64, page: PageRequest) -> HyuResult<Page<HistoryItem>>;
}

#[derive(Component)]
#[shaku(interface = AssessmentService)]
pub struct AssessmentServiceImpl {
    #[shaku(inject)]
    assessments: Arc<dyn AssessmentRepository>,
    #[shaku(inject)]
    submissions: Arc<dyn SubmissionRepository>,
    #[shaku(inject)]
    users: Arc<dyn UserRepository>,
    #[shaku(inject)]
    events: Arc<dyn EventRecorder>,
    clock: SharedClock,
}

impl AssessmentServiceImpl {
    pub fn new(
        assessments: Arc<dyn AssessmentRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRecorder>,
        clock: SharedClock,
    ) -> Self {
        Self {
            assessments,
            submissions,
            users,
            events,
            clock,
        }
    }

    async fn load_available(&self, id: i64) -> HyuResult<Assessment> {
        self.assessments
            .find_by_id(id)
            .await?
            .filter(Assessment::is_available)
            .ok_or_else(|| HyuError::not_found("Assessment", id))
    }

    /// Picks the submission a write goes to, creating a draft when needed.
    async fn resolve_draft(
        &self,
        assessment_id: i64,
        submission_id: Option<i64>,
        owner: &SubmissionOwner,
    ) -> HyuResult<Submission> {
        if let Some(id) = submission_id {
            let submission = self
                .submissions
                .find_by_id(id)
                .await?
                .filter(|s| s.assessment_id == assessment_id)
                .ok_or_else(|| HyuError::not_found("Submission", id))?;
            if !submission.is_owned_by(owner) {
                return Err(HyuError::forbidden("not the owner of this submission"));
            }
            if submission.status == SubmissionStatus::Submitted {
                return Err(HyuError::conflict("submission already submitted"));
            }
            return Ok(submission);
        }

        match self.submissions.find_latest_draft(assessment_id, owner).await? {
            Some(draft) => Ok(draft),
            None => {
                debug!("Opening draft for assessment {}", assessment_id);
                self.submissions.create_draft(assessment_id, owner).await
            }
        }
    }

    async fn save_answer(&self, submission_id: i64, questions: &[Question], item: &AnswerItem) -> HyuResult<()> {
        let value = validate_answer_value(item.value)?;
        if !questions.iter().any(|q| q.id == item.question_id) {
            return Err(HyuError::bad_request(format!(
                "question {} does not belong to this assessment",
                item.question_id
            )));
        }
        self.submissions.upsert_answer(submission_id, item.question_id, value).await
    }

    async fn record_outcome(&self, submission: &Submission, band: &ScoreRange, score: i32) {
        let at = submission.submitted_at.unwrap_or_else(|| self.clock.now());
        self.events
            .record(
                NewEvent::ok(submission.user_id, names::SELF_ASSESSMENT_COMPLETED, at).with_meta(json!({
                    "assessmentId": submission.assessment_id,
                    "submissionId": submission.id,
                })),
            )
            .await;
        self.events
            .record(
                NewEvent::ok(submission.user_id, names::RISK_DETECTED, at)
                    .with_level(band.level.event_level())
                    .with_meta(json!({
                        "assessmentId": submission.assessment_id,
                        "score": score,
                        "source": "assessment",
                    })),
            )
            .await;
    }
}

fn result_response(submission: &Submission, band: Option<&ScoreRange>) -> SubmitResponse {
    SubmitResponse {
        submission_id: submission.id,
        assessment_id: submission.assessment_id,
        total_score: submission.total_score.unwrap_or_default(),
        level: band.map(|b| b.level).or(submission.risk),
        label_ko: band.map(|b| b.label_ko.clone()),
        summary_ko: band.map(|b| b.summary_ko.clone()),
        advice_ko: band.map(|b| b.advice_ko.clone()),
        submitted_at: submission.submitted_at,
    }
}

#[async_trait]
impl AssessmentService for AssessmentServiceImpl {
    async fn list(&self, page: PageRequest) -> HyuResult<Page<AssessmentResponse>> {
        Ok(self
            .assessments
            .list(AssessmentScope::Available, page)
            .await?
            .map(AssessmentResponse::from))
    }

    async fn by_code(&self, code: &str) -> HyuResult<AssessmentResponse> {
        self.assessments
            .find_by_code(code.trim())
            .await?
            .filter(Assessment::is_available)
            .map(AssessmentResponse::from)
            .ok_or_else(|| HyuError::not_found("Assessment", code))
    }

    async fn questions(&self, assessment_id: i64) -> HyuResult<QuestionSetResponse> {
        let assessment = self.load_available(assessment_id).await?;
        let questions = self.assessments.questions(assessment_id).await?;
        Ok(QuestionSetResponse {
            assessment_id: assessment.id,
            code: assessment.code,
            name: assessment.name,
            questions: questions.into_iter().map(QuestionResponse::from).collect(),
        })
    }

    async fn answer(&self, assessment_id: i64, respondent: Respondent, request: AnswerRequest) -> HyuResult<()> {
        let owner = respondent.owner(request.guest_key)?;
        self.load_available(assessment_id).await?;
        let draft = self.resolve_draft(assessment_id, request.submission_id, &owner).await?;
        let questions = self.assessments.questions(assessment_id).await?;

        let item = AnswerItem {
            question_id: request.question_id,
            value: request.value,
        };
        self.save_answer(draft.id, &questions, &item).await
    }

    async fn submit(
        &self,
        assessment_id: i64,
        respondent: Respondent,
        request: SubmitRequest,
    ) -> HyuResult<SubmitResponse> {
        if request.assessment_id.is_some_and(|id| id != assessment_id) {
            return Err(HyuError::bad_request("assessmentId does not match the path"));
        }
        let owner = respondent.owner(request.guest_key)?;
        self.load_available(assessment_id).await?;
        let draft = self.resolve_draft(assessment_id, request.submission_id, &owner).await?;
        let questions = self.assessments.questions(assessment_id).await?;

        for item in request.answers.unwrap_or_default() {
            self.save_answer(draft.id, &questions, &item).await?;
        }

        let ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();
        let answers: Vec<_> = self
            .submissions
            .answers(draft.id)
            .await?
            .into_iter()
            .filter(|a| ids.contains(&a.question_id))
            .collect();
        if questions.is_empty() || answers.len() != questions.len() {
            return Err(HyuError::bad_request(format!(
                "all questions must be answered ({}/{})",
                answers.len(),
                questions.len()
            )));
        }

        let score = score_answers(&questions, &answers);
        let ranges = self.assessments.ranges(assessment_id).await?;
        let band = find_band(&ranges, score).ok_or_else(|| HyuError::bad_request("score band not defined"))?;

        let submitted = self
            .submissions
            .mark_submitted(draft.id, score, band.level, self.clock.now())
            .await?;
        info!(
            "Submission {} scored {} ({}) for assessment {}",
            submitted.id, score, band.level, assessment_id
        );

        self.record_outcome(&submitted, band, score).await;
        if let Some(user_id) = owner.user_id() {
            if let Err(e) = self.users.update_risk_level(user_id, band.level).await {
                warn!("Failed to update risk level of user {}: {}", user_id, e);
            }
        }

        Ok(result_response(&submitted, Some(band)))
    }

    async fn latest_result(&self, assessment_id: i64, user_id: i64) -> HyuResult<SubmitResponse> {
        let submission = self
            .submissions
            .find_latest_submitted(assessment_id, user_id)
            .await?
            .ok_or_else(|| HyuError::not_found("Submission", format!("assessment {assessment_id}")))?;
        let ranges = self.assessments.ranges(assessment_id).await?;
        let band = submission.total_score.and_then(|score| find_band(&ranges, score));
        Ok(result_response(&submission, band))
    }

    async fn history(&self, assessment_id: i64, user_id: i64, page: PageRequest) -> HyuResult<Page<HistoryItem>> {
        Ok(self
            .submissions
            .submitted_history(assessment_id, user_id, page)
            .await?
            .map(|s| HistoryItem {
                submission_id: s.id,
                submitted_at: s.submitted_at,
                level: s.risk,
            }))
    }
}

impl std::fmt::Debug for AssessmentServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_recorder::{MockEventRecorder, RepositoryEventRecorder};
    use crate::test_support::{clock, user};
    use hyu_domain::{AssessmentDraft, AssessmentStatus, NewQuestion, NewScoreRange, RiskLevel};
    use hyu_repository::memory::{
        InMemoryAssessmentRepository, InMemoryEventRepository, InMemorySubmissionRepository, InMemoryUserRepository,
    };

    struct Fixture {
        assessments: Arc<InMemoryAssessmentRepository>,
        users: Arc<InMemoryUserRepository>,
        events: Arc<InMemoryEventRepository>,
        service: AssessmentServiceImpl,
        assessment_id: i64,
        question_ids: Vec<i64>,
    }

    fn range(min: i32, max: i32, level: RiskLevel) -> NewScoreRange {
        NewScoreRange {
            min_score: min,
            max_score: max,
            level,
            label_ko: format!("{level}"),
            summary_ko: "요약".to_string(),
            advice_ko: "조언".to_string(),
        }
    }

    async fn fixture() -> Fixture {
        let clock = clock();
        let assessments = Arc::new(InMemoryAssessmentRepository::new(clock.clone()));
        let submissions = Arc::new(InMemorySubmissionRepository::new(clock.clone()));
        let users = Arc::new(InMemoryUserRepository::new(clock.clone()));
        let events = Arc::new(InMemoryEventRepository::new());
        users.insert(user(1, "a@example.com"));

        let assessment = assessments
            .create(AssessmentDraft {
                code: "PHQ2".to_string(),
                name: "Mood".to_string(),
                category: None,
                description: None,
                status: AssessmentStatus::Active,
            })
            .await
            .unwrap();
        let questions = assessments
            .replace_questions(
                assessment.id,
                vec![
                    NewQuestion {
                        order_no: 1,
                        text: "down".to_string(),
                        reverse_score: false,
                    },
                    NewQuestion {
                        order_no: 2,
                        text: "hopeful".to_string(),
                        reverse_score: true,
                    },
                ],
            )
            .await
            .unwrap();
        assessments
            .replace_ranges(
                assessment.id,
                vec![range(0, 2, RiskLevel::Mild), range(3, 4, RiskLevel::Moderate)],
            )
            .await
            .unwrap();

        let recorder = Arc::new(RepositoryEventRecorder::new(events.clone(), clock.clone()));
        let service = AssessmentServiceImpl::new(assessments.clone(), submissions, users.clone(), recorder, clock);
        Fixture {
            assessments,
            users,
            events,
            service,
            assessment_id: assessment.id,
            question_ids: questions.iter().map(|q| q.id).collect(),
        }
    }

    fn answers(ids: &[i64], values: &[i32]) -> Option<Vec<AnswerItem>> {
        Some(
            ids.iter()
                .zip(values)
                .map(|(id, v)| AnswerItem {
                    question_id: *id,
                    value: *v,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_submit_scores_and_records_events() {
        let f = fixture().await;
        let result = f
            .service
            .submit(
                f.assessment_id,
                Respondent::user(1),
                SubmitRequest {
                    answers: answers(&f.question_ids, &[3, 2]),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap();

        // 3 + (3 - 2)
        assert_eq!(result.total_score, 4);
        assert_eq!(result.level, Some(RiskLevel::Moderate));
        assert_eq!(result.label_ko.as_deref(), Some("MODERATE"));
        assert!(result.submitted_at.is_some());

        assert_eq!(
            f.events.names(),
            vec![names::SELF_ASSESSMENT_COMPLETED, names::RISK_DETECTED]
        );
        let risk = &f.events.all()[1];
        assert_eq!(risk.level.as_deref(), Some("moderate"));
        assert_eq!(risk.meta.as_ref().unwrap()["source"], "assessment");
        assert_eq!(risk.meta.as_ref().unwrap()["score"], 4);

        let stored = f.users.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.risk_level, Some(RiskLevel::Moderate));
    }

    #[tokio::test]
    async fn test_guest_answers_then_submits() {
        let f = fixture().await;
        let guest = Respondent::guest("guest-1");
        for (id, value) in f.question_ids.iter().zip([0, 3]) {
            f.service
                .answer(
                    f.assessment_id,
                    guest.clone(),
                    AnswerRequest {
                        submission_id: None,
                        question_id: *id,
                        value,
                        guest_key: None,
                    },
                )
                .await
                .unwrap();
        }

        let result = f
            .service
            .submit(f.assessment_id, guest, SubmitRequest::default())
            .await
            .unwrap();
        assert_eq!(result.total_score, 0);
        assert_eq!(result.level, Some(RiskLevel::Mild));
        assert_eq!(f.events.all()[0].user_id, None);
    }

    #[tokio::test]
    async fn test_anonymous_without_guest_key_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .submit(f.assessment_id, Respondent::default(), SubmitRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_answer_value_and_question_are_checked() {
        let f = fixture().await;
        let request = |question_id, value| AnswerRequest {
            submission_id: None,
            question_id,
            value,
            guest_key: None,
        };

        let err = f
            .service
            .answer(f.assessment_id, Respondent::user(1), request(f.question_ids[0], 4))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = f
            .service
            .answer(f.assessment_id, Respondent::user(1), request(999, 1))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_incomplete_submission_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .submit(
                f.assessment_id,
                Respondent::user(1),
                SubmitRequest {
                    answers: answers(&f.question_ids[..1], &[1]),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(f.events.all().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_assessment_id_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .submit(
                f.assessment_id,
                Respondent::user(1),
                SubmitRequest {
                    assessment_id: Some(f.assessment_id + 1),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_missing_band_is_rejected() {
        let f = fixture().await;
        f.assessments
            .replace_ranges(f.assessment_id, vec![range(0, 1, RiskLevel::Mild)])
            .await
            .unwrap();
        let err = f
            .service
            .submit(
                f.assessment_id,
                Respondent::user(1),
                SubmitRequest {
                    answers: answers(&f.question_ids, &[3, 0]),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "score band not defined");
    }

    #[tokio::test]
    async fn test_foreign_and_submitted_drafts() {
        let f = fixture().await;
        let submitted = f
            .service
            .submit(
                f.assessment_id,
                Respondent::user(1),
                SubmitRequest {
                    answers: answers(&f.question_ids, &[0, 3]),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap();

        let request = AnswerRequest {
            submission_id: Some(submitted.submission_id),
            question_id: f.question_ids[0],
            value: 1,
            guest_key: None,
        };
        let err = f
            .service
            .answer(f.assessment_id, Respondent::user(2), request.clone())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = f
            .service
            .answer(f.assessment_id, Respondent::user(1), request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_latest_result_uses_current_ranges() {
        let f = fixture().await;
        assert_eq!(
            f.service.latest_result(f.assessment_id, 1).await.unwrap_err().status_code(),
            404
        );

        f.service
            .submit(
                f.assessment_id,
                Respondent::user(1),
                SubmitRequest {
                    answers: answers(&f.question_ids, &[2, 3]),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap();
        f.assessments
            .replace_ranges(f.assessment_id, vec![range(0, 6, RiskLevel::Risk)])
            .await
            .unwrap();

        let latest = f.service.latest_result(f.assessment_id, 1).await.unwrap();
        assert_eq!(latest.total_score, 2);
        assert_eq!(latest.level, Some(RiskLevel::Risk));

        let history = f
            .service
            .history(f.assessment_id, 1, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.content[0].level, Some(RiskLevel::Mild));
    }

    #[tokio::test]
    async fn test_inactive_assessment_is_hidden() {
        let f = fixture().await;
        let mut archived = f.assessments.find_by_id(f.assessment_id).await.unwrap().unwrap();
        archived.status = AssessmentStatus::Archived;
        f.assessments.update(&archived).await.unwrap();

        assert_eq!(f.service.by_code("PHQ2").await.unwrap_err().status_code(), 404);
        assert_eq!(
            f.service.questions(f.assessment_id).await.unwrap_err().status_code(),
            404
        );
        assert!(f.service.list(PageRequest::first()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_events_go_through_recorder() {
        let f = fixture().await;
        let mut recorder = MockEventRecorder::new();
        recorder.expect_record().times(2).return_const(());
        let service = AssessmentServiceImpl::new(
            f.assessments.clone(),
            Arc::new(InMemorySubmissionRepository::new(clock())),
            f.users.clone(),
            Arc::new(recorder),
            clock(),
        );

        service
            .submit(
                f.assessment_id,
                Respondent::guest("g"),
                SubmitRequest {
                    answers: answers(&f.question_ids, &[1, 1]),
                    ..SubmitRequest::default()
                },
            )
            .await
            .unwrap();
    }
}
