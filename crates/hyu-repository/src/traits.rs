//! Repository trait definitions.

use crate::query::{AssessmentScope, ContentSearch, FeedQuery, ReportSearch, UserSearch};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hyu_core::{HyuResult, Interface, Page, PageRequest, Slice};
use hyu_domain::{
    Answer, Assessment, AssessmentDraft, ChatMessage, ChatSession, Checkin, CheckinValues, CmsContent,
    ContentDraft, DailyMetrics, Event, Goal, GoalDraft, LoginRecord, MessageRole, MetricsSummary, MonthlyMetrics,
    NewEvent, NewNotification, NewQuestion, NewReport, NewScoreRange, NewUser, NewWeeklySummary, Notification,
    PeriodCounts, Profile, Question, Report, RetentionRow, RiskLevel, RiskMode, ScoreRange, Submission,
    SubmissionOwner, User, UserState, WeeklySummary, YearlyMetrics,
};
use uuid::Uuid;

/// User accounts.
#[async_trait]
pub trait UserRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<User>>;

    async fn find_by_ids(&self, ids: &[i64]) -> HyuResult<Vec<User>>;

    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> HyuResult<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> HyuResult<bool>;

    /// Inserts a new account. A duplicate email surfaces as `Conflict`.
    async fn create(&self, user: NewUser) -> HyuResult<User>;

    async fn search(&self, search: &UserSearch, page: PageRequest) -> HyuResult<Page<User>>;

    /// Sets state, suspension end and optionally the risk mode.
    async fn update_state(
        &self,
        id: i64,
        state: UserState,
        suspend_until: Option<DateTime<Utc>>,
        risk_mode: Option<RiskMode>,
    ) -> HyuResult<()>;

    async fn update_risk_level(&self, id: i64, level: RiskLevel) -> HyuResult<()>;

    /// Stores a pending reset and flags the account.
    async fn set_reset_token(&self, id: i64, digest: &str, expires_at: DateTime<Utc>) -> HyuResult<()>;

    /// Drops a pending reset that was never delivered.
    async fn clear_reset_token(&self, id: i64) -> HyuResult<()>;

    async fn find_by_reset_digest(&self, digest: &str) -> HyuResult<Option<User>>;

    /// Replaces the password hash and clears every reset field.
    async fn complete_password_reset(&self, id: i64, password_hash: &str) -> HyuResult<()>;

    async fn record_login(&self, record: LoginRecord) -> HyuResult<()>;
}

/// Daily check-ins.
#[async_trait]
pub trait CheckinRepository: Interface + Send + Sync {
    async fn find(&self, user_id: i64, date: NaiveDate) -> HyuResult<Option<Checkin>>;

    /// Inserts or updates the row for `(user, date)`. Returns `true` when inserted.
    async fn upsert(&self, user_id: i64, date: NaiveDate, values: &CheckinValues) -> HyuResult<bool>;

    /// Checked dates within `from..=to`, ascending.
    async fn dates_between(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<NaiveDate>>;
}

/// Assessment definitions with their questions and score ranges.
#[async_trait]
pub trait AssessmentRepository: Interface + Send + Sync {
    async fn create(&self, draft: AssessmentDraft) -> HyuResult<Assessment>;

    async fn update(&self, assessment: &Assessment) -> HyuResult<Assessment>;

    /// Lookup including soft-deleted rows.
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Assessment>>;

    /// Lookup including soft-deleted rows.
    async fn find_by_code(&self, code: &str) -> HyuResult<Option<Assessment>>;

    async fn list(&self, scope: AssessmentScope, page: PageRequest) -> HyuResult<Page<Assessment>>;

    /// Replaces every question of an assessment in one transaction.
    async fn replace_questions(&self, assessment_id: i64, questions: Vec<NewQuestion>) -> HyuResult<Vec<Question>>;

    /// Questions ordered by `order_no`.
    async fn questions(&self, assessment_id: i64) -> HyuResult<Vec<Question>>;

    /// Replaces every score range of an assessment in one transaction.
    async fn replace_ranges(&self, assessment_id: i64, ranges: Vec<NewScoreRange>) -> HyuResult<Vec<ScoreRange>>;

    /// Ranges ordered by `min_score`.
    async fn ranges(&self, assessment_id: i64) -> HyuResult<Vec<ScoreRange>>;
}

/// Assessment submissions and answers.
#[async_trait]
pub trait SubmissionRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Submission>>;

    async fn find_latest_draft(&self, assessment_id: i64, owner: &SubmissionOwner) -> HyuResult<Option<Submission>>;

    async fn create_draft(&self, assessment_id: i64, owner: &SubmissionOwner) -> HyuResult<Submission>;

    /// Inserts or overwrites the answer to one question.
    async fn upsert_answer(&self, submission_id: i64, question_id: i64, value: i16) -> HyuResult<()>;

    async fn answers(&self, submission_id: i64) -> HyuResult<Vec<Answer>>;

    async fn mark_submitted(
        &self,
        id: i64,
        total_score: i32,
        risk: RiskLevel,
        submitted_at: DateTime<Utc>,
    ) -> HyuResult<Submission>;

    async fn find_latest_submitted(&self, assessment_id: i64, user_id: i64) -> HyuResult<Option<Submission>>;

    /// Submitted rows, newest first.
    async fn submitted_history(&self, assessment_id: i64, user_id: i64, page: PageRequest) -> HyuResult<Page<Submission>>;
}

/// CMS contents.
#[async_trait]
pub trait ContentRepository: Interface + Send + Sync {
    async fn create(&self, draft: ContentDraft) -> HyuResult<CmsContent>;

    async fn update(&self, content: &CmsContent) -> HyuResult<CmsContent>;

    /// Lookup including soft-deleted rows.
    async fn find_by_id(&self, id: i64) -> HyuResult<Option<CmsContent>>;

    async fn search(&self, search: &ContentSearch, page: PageRequest) -> HyuResult<Page<CmsContent>>;

    /// Visible rows ordered by `COALESCE(published_at, created_at) DESC, id DESC`.
    async fn feed(&self, query: &FeedQuery) -> HyuResult<Vec<CmsContent>>;
}

/// Moderation reports.
#[async_trait]
pub trait ReportRepository: Interface + Send + Sync {
    async fn create(&self, report: NewReport, reported_at: DateTime<Utc>) -> HyuResult<Report>;

    /// Whether the reporter already reported the target at or after `since`.
    async fn exists_since(&self, report: &NewReport, since: DateTime<Utc>) -> HyuResult<bool>;

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Report>>;

    async fn find_by_ids(&self, ids: &[i64]) -> HyuResult<Vec<Report>>;

    /// Newest first.
    async fn search(&self, search: &ReportSearch, page: PageRequest) -> HyuResult<Page<Report>>;

    async fn update(&self, report: &Report) -> HyuResult<()>;
}

/// Chat sessions and messages.
#[async_trait]
pub trait ChatRepository: Interface + Send + Sync {
    async fn create_session(&self, user_id: i64, title: Option<String>, at: DateTime<Utc>) -> HyuResult<ChatSession>;

    async fn find_session(&self, id: Uuid) -> HyuResult<Option<ChatSession>>;

    /// A user's sessions, most recently updated first.
    async fn sessions_for_user(&self, user_id: i64, page: PageRequest) -> HyuResult<Page<ChatSession>>;

    async fn touch_session(&self, id: Uuid, at: DateTime<Utc>) -> HyuResult<()>;

    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
        at: DateTime<Utc>,
    ) -> HyuResult<ChatMessage>;

    /// Messages in chronological order.
    async fn messages(&self, session_id: Uuid, page: PageRequest) -> HyuResult<Page<ChatMessage>>;

    /// The latest `limit` non-system messages, in chronological order.
    async fn recent_history(&self, session_id: Uuid, limit: usize) -> HyuResult<Vec<ChatMessage>>;

    /// The first system message of a session.
    async fn system_message(&self, session_id: Uuid) -> HyuResult<Option<ChatMessage>>;

    /// A user's latest USER and ASSISTANT messages across sessions, newest first.
    async fn recent_for_user(&self, user_id: i64, limit: usize) -> HyuResult<Vec<ChatMessage>>;

    /// Every session of a user with its latest message, most recently updated first.
    async fn session_previews(&self, user_id: i64) -> HyuResult<Vec<(ChatSession, Option<ChatMessage>)>>;
}

/// Goals and goal check-ins.
#[async_trait]
pub trait GoalRepository: Interface + Send + Sync {
    async fn create(&self, user_id: i64, draft: GoalDraft, at: DateTime<Utc>) -> HyuResult<Goal>;

    /// A live goal owned by `user_id`.
    async fn find_owned(&self, id: i64, user_id: i64) -> HyuResult<Option<Goal>>;

    async fn update(&self, goal: &Goal) -> HyuResult<()>;

    /// All live goals of a user, unordered.
    async fn list_for_user(&self, user_id: i64) -> HyuResult<Vec<Goal>>;

    /// Ids of the user's goals checked on `day`.
    async fn checked_goal_ids(&self, user_id: i64, day: NaiveDate) -> HyuResult<Vec<i64>>;

    /// Returns `true` when a new check-in row was written.
    async fn add_checkin(&self, goal_id: i64, day: NaiveDate) -> HyuResult<bool>;

    async fn remove_checkin(&self, goal_id: i64, day: NaiveDate) -> HyuResult<bool>;

    /// Checked dates within `from..=to`, ascending.
    async fn checkin_dates(&self, goal_id: i64, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<NaiveDate>>;

    /// Live, alert-enabled goals running on `day` without a check-in that day.
    async fn find_missed(&self, day: NaiveDate) -> HyuResult<Vec<Goal>>;
}

/// In-app notifications.
#[async_trait]
pub trait NotificationRepository: Interface + Send + Sync {
    /// Inserts unless `(user, goal, type, eventDate)` already exists.
    async fn insert_if_absent(&self, notification: NewNotification, at: DateTime<Utc>) -> HyuResult<Option<Notification>>;

    /// Newest first.
    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<Notification>>;

    async fn unread_count(&self, user_id: i64) -> HyuResult<i64>;

    async fn find_by_id(&self, id: i64) -> HyuResult<Option<Notification>>;

    async fn mark_read(&self, id: i64) -> HyuResult<()>;

    /// Marks at most `limit` of the newest unread notifications as read.
    async fn mark_all_read(&self, user_id: i64, limit: usize) -> HyuResult<u64>;
}

/// Analytics events.
#[async_trait]
pub trait EventRepository: Interface + Send + Sync {
    async fn insert(&self, event: NewEvent, at: DateTime<Utc>) -> HyuResult<Event>;

    async fn find_by_idempotency_key(&self, key: &str) -> HyuResult<Option<Event>>;
}

/// KPI aggregation and rollup tables.
#[async_trait]
pub trait MetricsRepository: Interface + Send + Sync {
    /// Aggregates events and signups over `[from, until)`.
    async fn aggregate(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<PeriodCounts>;

    /// Cohort size and returned users: accounts created in `cohort` that
    /// logged an ok event during `target`. Both are half-open intervals.
    async fn cohort_return(
        &self,
        cohort: (DateTime<Utc>, DateTime<Utc>),
        target: (DateTime<Utc>, DateTime<Utc>),
    ) -> HyuResult<(i64, i64)>;

    async fn upsert_daily(&self, row: &DailyMetrics) -> HyuResult<()>;

    async fn upsert_monthly(&self, row: &MonthlyMetrics) -> HyuResult<()>;

    async fn upsert_yearly(&self, row: &YearlyMetrics) -> HyuResult<()>;

    async fn upsert_retention(&self, row: &RetentionRow) -> HyuResult<()>;

    async fn daily_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<DailyMetrics>>;

    /// Month rows whose first day lies within `from..=to`.
    async fn monthly_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<MonthlyMetrics>>;

    async fn yearly_between(&self, from: i32, to: i32) -> HyuResult<Vec<YearlyMetrics>>;

    /// Retention rows for cohorts within `from..=to`, unordered.
    async fn retention_between(&self, from: NaiveDate, to: NaiveDate) -> HyuResult<Vec<RetentionRow>>;

    async fn summary(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HyuResult<MetricsSummary>;
}

/// User profiles.
#[async_trait]
pub trait ProfileRepository: Interface + Send + Sync {
    async fn find(&self, user_id: i64) -> HyuResult<Option<Profile>>;

    /// Inserts or replaces the profile, lists included.
    async fn save(&self, profile: &Profile) -> HyuResult<Profile>;

    /// Users who opted in to the weekly summary, ascending.
    async fn weekly_summary_subscribers(&self) -> HyuResult<Vec<i64>>;
}

/// Weekly check-in summaries, one per user and week.
#[async_trait]
pub trait WeeklySummaryRepository: Interface + Send + Sync {
    async fn exists(&self, user_id: i64, week_start: NaiveDate) -> HyuResult<bool>;

    /// Stores a summary. A second row for the same week is a `Conflict`.
    async fn insert(&self, summary: NewWeeklySummary, at: DateTime<Utc>) -> HyuResult<WeeklySummary>;
}
