use super::paginate;
use crate::query::AssessmentScope;
use crate::traits::{AssessmentRepository, SubmissionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult, Page, PageRequest, SharedClock};
use hyu_domain::{
    Answer, Assessment, AssessmentDraft, NewQuestion, NewScoreRange, Question, RiskLevel, ScoreRange, Submission,
    SubmissionOwner, SubmissionStatus,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct AssessmentState {
    next_id: i64,
    next_child_id: i64,
    assessments: BTreeMap<i64, Assessment>,
    questions: BTreeMap<i64, Vec<Question>>,
    ranges: BTreeMap<i64, Vec<ScoreRange>>,
}

/// Assessment definitions. Codes are unique across deleted rows too.
#[derive(Debug, Default)]
pub struct InMemoryAssessmentRepository {
    state: Mutex<AssessmentState>,
    clock: SharedClock,
}

impl InMemoryAssessmentRepository {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Mutex::default(),
            clock,
        }
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn create(&self, draft: AssessmentDraft) -> HyuResult<Assessment> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.assessments.values().any(|a| a.code == draft.code) {
            return Err(HyuError::conflict("Duplicate entry for code"));
        }
        state.next_id += 1;
        let assessment = Assessment {
            id: state.next_id,
            code: draft.code,
            name: draft.name,
            category: draft.category,
            description: draft.description,
            status: draft.status,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        state.assessments.insert(assessment.id, assessment.clone());
        Ok(assessment)
    }

    async fn update(&self, assessment: &Assessment) -> HyuResult<Assessment> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state
            .assessments
            .values()
            .any(|a| a.id != assessment.id && a.code == assessment.code)
        {
            return Err(HyuError::conflict("Duplicate entry for code"));
        }
        let stored = state
            .assessments
            .get_mut(&assessment.id)
            .ok_or_else(|| HyuError::not_found("Assessment", assessment.id))?;
        *stored = Assessment {
            updated_at: now,
            created_at: stored.created_at,
            ..assessment.clone()
        };
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Assessment>> {
        Ok(self.state.lock().assessments.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> HyuResult<Option<Assessment>> {
        Ok(self.state.lock().assessments.values().find(|a| a.code == code).cloned())
    }

    async fn list(&self, scope: AssessmentScope, page: PageRequest) -> HyuResult<Page<Assessment>> {
        let mut rows: Vec<Assessment> = self
            .state
            .lock()
            .assessments
            .values()
            .filter(|a| match scope {
                AssessmentScope::All => true,
                AssessmentScope::NotDeleted => !a.deleted,
                AssessmentScope::Available => a.is_available(),
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, page))
    }

    async fn replace_questions(&self, assessment_id: i64, questions: Vec<NewQuestion>) -> HyuResult<Vec<Question>> {
        let mut state = self.state.lock();
        let mut stored = Vec::with_capacity(questions.len());
        for q in questions {
            state.next_child_id += 1;
            stored.push(Question {
                id: state.next_child_id,
                assessment_id,
                order_no: q.order_no,
                text: q.text,
                reverse_score: q.reverse_score,
            });
        }
        stored.sort_by_key(|q| q.order_no);
        state.questions.insert(assessment_id, stored.clone());
        Ok(stored)
    }

    async fn questions(&self, assessment_id: i64) -> HyuResult<Vec<Question>> {
        Ok(self.state.lock().questions.get(&assessment_id).cloned().unwrap_or_default())
    }

    async fn replace_ranges(&self, assessment_id: i64, ranges: Vec<NewScoreRange>) -> HyuResult<Vec<ScoreRange>> {
        let mut state = self.state.lock();
        let mut stored = Vec::with_capacity(ranges.len());
        for r in ranges {
            state.next_child_id += 1;
            stored.push(ScoreRange {
                id: state.next_child_id,
                assessment_id,
                min_score: r.min_score,
                max_score: r.max_score,
                level: r.level,
                label_ko: r.label_ko,
                summary_ko: r.summary_ko,
                advice_ko: r.advice_ko,
            });
        }
        stored.sort_by_key(|r| r.min_score);
        state.ranges.insert(assessment_id, stored.clone());
        Ok(stored)
    }

    async fn ranges(&self, assessment_id: i64) -> HyuResult<Vec<ScoreRange>> {
        Ok(self.state.lock().ranges.get(&assessment_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct SubmissionState {
    next_id: i64,
    next_answer_id: i64,
    submissions: BTreeMap<i64, Submission>,
    /// `(submission, question)` → answer.
    answers: BTreeMap<(i64, i64), Answer>,
}

/// Submissions and their answers.
#[derive(Debug, Default)]
pub struct InMemorySubmissionRepository {
    state: Mutex<SubmissionState>,
    clock: SharedClock,
}

impl InMemorySubmissionRepository {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Mutex::default(),
            clock,
        }
    }

    fn submitted_for(state: &SubmissionState, assessment_id: i64, user_id: i64) -> Vec<Submission> {
        let mut rows: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| {
                s.assessment_id == assessment_id && s.user_id == Some(user_id) && s.status == SubmissionStatus::Submitted
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        rows
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Submission>> {
        Ok(self.state.lock().submissions.get(&id).cloned())
    }

    async fn find_latest_draft(&self, assessment_id: i64, owner: &SubmissionOwner) -> HyuResult<Option<Submission>> {
        Ok(self
            .state
            .lock()
            .submissions
            .values()
            .filter(|s| s.assessment_id == assessment_id && s.status == SubmissionStatus::Draft && s.is_owned_by(owner))
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn create_draft(&self, assessment_id: i64, owner: &SubmissionOwner) -> HyuResult<Submission> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.next_id += 1;
        let submission = Submission {
            id: state.next_id,
            assessment_id,
            user_id: owner.user_id(),
            guest_key: owner.guest_key().map(str::to_string),
            status: SubmissionStatus::Draft,
            total_score: None,
            risk: None,
            submitted_at: None,
            created_at: now,
        };
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn upsert_answer(&self, submission_id: i64, question_id: i64, value: i16) -> HyuResult<()> {
        let mut state = self.state.lock();
        if let Some(answer) = state.answers.get_mut(&(submission_id, question_id)) {
            answer.value = value;
            return Ok(());
        }
        state.next_answer_id += 1;
        let answer = Answer {
            id: state.next_answer_id,
            submission_id,
            question_id,
            value,
        };
        state.answers.insert((submission_id, question_id), answer);
        Ok(())
    }

    async fn answers(&self, submission_id: i64) -> HyuResult<Vec<Answer>> {
        let mut answers: Vec<Answer> = self
            .state
            .lock()
            .answers
            .range((submission_id, i64::MIN)..=(submission_id, i64::MAX))
            .map(|(_, a)| a.clone())
            .collect();
        answers.sort_by_key(|a| a.id);
        Ok(answers)
    }

    async fn mark_submitted(
        &self,
        id: i64,
        total_score: i32,
        risk: RiskLevel,
        submitted_at: DateTime<Utc>,
    ) -> HyuResult<Submission> {
        let mut state = self.state.lock();
        let submission = state
            .submissions
            .get_mut(&id)
            .ok_or_else(|| HyuError::not_found("Submission", id))?;
        submission.status = SubmissionStatus::Submitted;
        submission.total_score = Some(total_score);
        submission.risk = Some(risk);
        submission.submitted_at = Some(submitted_at);
        Ok(submission.clone())
    }

    async fn find_latest_submitted(&self, assessment_id: i64, user_id: i64) -> HyuResult<Option<Submission>> {
        let state = self.state.lock();
        Ok(Self::submitted_for(&state, assessment_id, user_id).into_iter().next())
    }

    async fn submitted_history(&self, assessment_id: i64, user_id: i64, page: PageRequest) -> HyuResult<Page<Submission>> {
        let state = self.state.lock();
        Ok(paginate(Self::submitted_for(&state, assessment_id, user_id), page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyu_domain::AssessmentStatus;

    fn draft(code: &str) -> AssessmentDraft {
        AssessmentDraft {
            code: code.to_string(),
            name: "PHQ-9".to_string(),
            category: None,
            description: None,
            status: AssessmentStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let repo = InMemoryAssessmentRepository::default();
        repo.create(draft("PHQ9")).await.unwrap();
        let err = repo.create(draft("PHQ9")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_drafts_are_scoped_by_owner() {
        let repo = InMemorySubmissionRepository::default();
        let guest = SubmissionOwner::Guest("g-1".to_string());
        let created = repo.create_draft(7, &guest).await.unwrap();

        let found = repo.find_latest_draft(7, &guest).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_latest_draft(7, &SubmissionOwner::User(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_answer_overwrites() {
        let repo = InMemorySubmissionRepository::default();
        repo.upsert_answer(1, 10, 2).await.unwrap();
        repo.upsert_answer(1, 10, 4).await.unwrap();
        repo.upsert_answer(2, 10, 1).await.unwrap();

        let answers = repo.answers(1).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].value, 4);
    }
}
