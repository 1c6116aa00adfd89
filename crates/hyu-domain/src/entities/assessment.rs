//! Self-assessment quizzes: definitions, submissions and scoring.
//!
//! Every answer is worth 0..=3 points. Reverse-scored questions count
//! `3 - value`. The total is bucketed into the assessment's score ranges,
//! which must be non-overlapping inclusive intervals.

use chrono::{DateTime, Utc};
use hyu_core::{HyuError, HyuResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Highest value a single answer may carry.
pub const ANSWER_MAX: i16 = 3;

db_enum! {
    /// Publication state of an assessment.
    #[derive(Default)]
    pub enum AssessmentStatus {
        #[default]
        Active => "ACTIVE",
        Archived => "ARCHIVED",
    }
}

db_enum! {
    /// Severity band an assessment score falls into.
    pub enum RiskLevel {
        Mild => "MILD",
        Moderate => "MODERATE",
        Risk => "RISK",
        HighRisk => "HIGH_RISK",
    }
}

impl RiskLevel {
    /// Event-level spelling (`mild`, `high_risk`, ...).
    #[must_use]
    pub fn event_level(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

db_enum! {
    /// Progress of a submission.
    pub enum SubmissionStatus {
        Draft => "DRAFT",
        Submitted => "SUBMITTED",
    }
}

/// A quiz definition managed through the admin CMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
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

impl Assessment {
    /// Visible to end users.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == AssessmentStatus::Active && !self.deleted
    }
}

/// Fields for creating or rewriting an assessment header.
#[derive(Debug, Clone)]
pub struct AssessmentDraft {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub status: AssessmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub assessment_id: i64,
    pub order_no: i32,
    pub text: String,
    pub reverse_score: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub order_no: i32,
    pub text: String,
    pub reverse_score: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRange {
    pub id: i64,
    pub assessment_id: i64,
    pub min_score: i32,
    pub max_score: i32,
    pub level: RiskLevel,
    pub label_ko: String,
    pub summary_ko: String,
    pub advice_ko: String,
}

impl ScoreRange {
    #[must_use]
    pub const fn contains(&self, score: i32) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScoreRange {
    pub min_score: i32,
    pub max_score: i32,
    pub level: RiskLevel,
    pub label_ko: String,
    pub summary_ko: String,
    pub advice_ko: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub assessment_id: i64,
    pub user_id: Option<i64>,
    pub guest_key: Option<String>,
    pub status: SubmissionStatus,
    pub total_score: Option<i32>,
    pub risk: Option<RiskLevel>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// True when `owner` is the one who started the submission.
    #[must_use]
    pub fn is_owned_by(&self, owner: &SubmissionOwner) -> bool {
        match owner {
            SubmissionOwner::User(id) => self.user_id == Some(*id),
            SubmissionOwner::Guest(key) => self.user_id.is_none() && self.guest_key.as_deref() == Some(key.as_str()),
        }
    }
}

/// Identity a draft submission belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOwner {
    User(i64),
    Guest(String),
}

impl SubmissionOwner {
    /// Resolves the caller: a logged-in user wins over any guest key.
    ///
    /// # Errors
    ///
    /// Bad request when neither identity is present.
    pub fn resolve(user_id: Option<i64>, guest_key: Option<String>) -> HyuResult<Self> {
        if let Some(id) = user_id {
            return Ok(Self::User(id));
        }
        guest_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Self::Guest)
            .ok_or_else(|| HyuError::bad_request("guestKey is required for anonymous submissions"))
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<i64> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    #[must_use]
    pub fn guest_key(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Guest(key) => Some(key),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    pub value: i16,
}

/// Validates a single answer value.
///
/// # Errors
///
/// Bad request when outside 0..=3.
pub fn validate_answer_value(value: i32) -> HyuResult<i16> {
    i16::try_from(value)
        .ok()
        .filter(|v| (0..=ANSWER_MAX).contains(v))
        .ok_or_else(|| HyuError::bad_request("answer value must be between 0 and 3"))
}

/// Sums answers, applying reverse scoring.
///
/// Answers to questions not in `questions` are ignored.
#[must_use]
pub fn score_answers(questions: &[Question], answers: &[Answer]) -> i32 {
    let reverse: HashMap<i64, bool> = questions.iter().map(|q| (q.id, q.reverse_score)).collect();
    answers
        .iter()
        .filter_map(|a| {
            reverse.get(&a.question_id).map(|rev| {
                let v = i32::from(a.value);
                if *rev {
                    i32::from(ANSWER_MAX) - v
                } else {
                    v
                }
            })
        })
        .sum()
}

/// Finds the range containing `score`.
#[must_use]
pub fn find_band(ranges: &[ScoreRange], score: i32) -> Option<&ScoreRange> {
    ranges.iter().find(|r| r.contains(score))
}

/// Validates a question set before it replaces the current one.
///
/// Returns the questions ordered by `order_no`.
///
/// # Errors
///
/// Bad request for an empty list, a missing/non-positive or duplicated
/// order number, or blank text.
pub fn validate_questions(mut questions: Vec<NewQuestion>) -> HyuResult<Vec<NewQuestion>> {
    if questions.is_empty() {
        return Err(HyuError::bad_request("questions must not be empty"));
    }
    let mut seen = HashSet::new();
    for q in &mut questions {
        if q.order_no < 1 {
            return Err(HyuError::bad_request("orderNo must be >= 1"));
        }
        if !seen.insert(q.order_no) {
            return Err(HyuError::bad_request(format!("duplicate orderNo: {}", q.order_no)));
        }
        q.text = q.text.trim().to_string();
        if q.text.is_empty() {
            return Err(HyuError::bad_request("question text must not be blank"));
        }
    }
    questions.sort_by_key(|q| q.order_no);
    Ok(questions)
}

/// Validates a score-range set before it replaces the current one.
///
/// Returns the ranges ordered by `min_score`.
///
/// # Errors
///
/// Bad request for blank texts, `min > max`, or overlapping ranges.
pub fn validate_ranges(mut ranges: Vec<NewScoreRange>) -> HyuResult<Vec<NewScoreRange>> {
    ranges.sort_by_key(|r| r.min_score);
    let mut prev_max: Option<i32> = None;
    for r in &mut ranges {
        r.label_ko = r.label_ko.trim().to_string();
        r.summary_ko = r.summary_ko.trim().to_string();
        r.advice_ko = r.advice_ko.trim().to_string();
        if r.label_ko.is_empty() || r.summary_ko.is_empty() || r.advice_ko.is_empty() {
            return Err(HyuError::bad_request("labelKo, summaryKo and adviceKo are required"));
        }
        if r.min_score > r.max_score {
            return Err(HyuError::bad_request(format!(
                "invalid range: min {} > max {}",
                r.min_score, r.max_score
            )));
        }
        if let Some(prev) = prev_max {
            if r.min_score <= prev {
                return Err(HyuError::bad_request("overlapping ranges"));
            }
        }
        prev_max = Some(r.max_score);
    }
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, reverse: bool) -> Question {
        Question {
            id,
            assessment_id: 1,
            order_no: i32::try_from(id).unwrap(),
            text: format!("q{id}"),
            reverse_score: reverse,
        }
    }

    fn answer(question_id: i64, value: i16) -> Answer {
        Answer {
            id: question_id,
            submission_id: 1,
            question_id,
            value,
        }
    }

    fn range(min: i32, max: i32, level: RiskLevel) -> NewScoreRange {
        NewScoreRange {
            min_score: min,
            max_score: max,
            level,
            label_ko: "label".to_string(),
            summary_ko: "summary".to_string(),
            advice_ko: "advice".to_string(),
        }
    }

    fn stored(r: &NewScoreRange) -> ScoreRange {
        ScoreRange {
            id: 0,
            assessment_id: 1,
            min_score: r.min_score,
            max_score: r.max_score,
            level: r.level,
            label_ko: r.label_ko.clone(),
            summary_ko: r.summary_ko.clone(),
            advice_ko: r.advice_ko.clone(),
        }
    }

    #[test]
    fn test_score_with_reverse_questions() {
        let questions = vec![question(1, false), question(2, true), question(3, false)];
        let answers = vec![answer(1, 3), answer(2, 0), answer(3, 1)];
        // 3 + (3 - 0) + 1
        assert_eq!(score_answers(&questions, &answers), 7);
    }

    #[test]
    fn test_find_band_inclusive_bounds() {
        let ranges: Vec<ScoreRange> = [
            range(0, 4, RiskLevel::Mild),
            range(5, 9, RiskLevel::Moderate),
            range(10, 27, RiskLevel::HighRisk),
        ]
        .iter()
        .map(stored)
        .collect();

        assert_eq!(find_band(&ranges, 4).unwrap().level, RiskLevel::Mild);
        assert_eq!(find_band(&ranges, 5).unwrap().level, RiskLevel::Moderate);
        assert_eq!(find_band(&ranges, 27).unwrap().level, RiskLevel::HighRisk);
        assert!(find_band(&ranges, 28).is_none());
    }

    #[test]
    fn test_validate_ranges_sorts_and_rejects_overlap() {
        let sorted = validate_ranges(vec![range(5, 9, RiskLevel::Moderate), range(0, 4, RiskLevel::Mild)]).unwrap();
        assert_eq!(sorted[0].min_score, 0);

        let err = validate_ranges(vec![range(0, 5, RiskLevel::Mild), range(5, 9, RiskLevel::Moderate)]).unwrap_err();
        assert_eq!(err.to_string(), "overlapping ranges");

        assert!(validate_ranges(vec![range(6, 2, RiskLevel::Mild)]).is_err());

        let mut blank = range(0, 3, RiskLevel::Mild);
        blank.advice_ko = "  ".to_string();
        assert!(validate_ranges(vec![blank]).is_err());
    }

    #[test]
    fn test_validate_questions() {
        let q = |order_no: i32, text: &str| NewQuestion {
            order_no,
            text: text.to_string(),
            reverse_score: false,
        };
        let ordered = validate_questions(vec![q(2, "b"), q(1, " a ")]).unwrap();
        assert_eq!(ordered[0].order_no, 1);
        assert_eq!(ordered[0].text, "a");

        assert!(validate_questions(vec![]).is_err());
        assert!(validate_questions(vec![q(0, "a")]).is_err());
        assert!(validate_questions(vec![q(1, "a"), q(1, "b")]).is_err());
        assert!(validate_questions(vec![q(1, " ")]).is_err());
    }

    #[test]
    fn test_answer_value_bounds() {
        assert_eq!(validate_answer_value(0).unwrap(), 0);
        assert_eq!(validate_answer_value(3).unwrap(), 3);
        assert!(validate_answer_value(4).is_err());
        assert!(validate_answer_value(-1).is_err());
    }

    #[test]
    fn test_owner_resolution() {
        assert_eq!(SubmissionOwner::resolve(Some(3), Some("g".into())).unwrap(), SubmissionOwner::User(3));
        assert_eq!(
            SubmissionOwner::resolve(None, Some(" g-1 ".into())).unwrap(),
            SubmissionOwner::Guest("g-1".into())
        );
        assert!(SubmissionOwner::resolve(None, Some("  ".into())).is_err());
        assert!(SubmissionOwner::resolve(None, None).is_err());
    }

    #[test]
    fn test_risk_level_event_spelling() {
        assert_eq!(RiskLevel::HighRisk.event_level(), "high_risk");
    }
}
