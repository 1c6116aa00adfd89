//! Personal goals and their daily check-ins.

use crate::dto::{CreateGoalRequest, GoalCheckinResponse, GoalResponse, UpdateGoalRequest};
use async_trait::async_trait;
use chrono::NaiveDate;
use hyu_core::{HyuError, HyuResult, Interface, PageRequest, SharedClock, Slice, ValidateExt};
use hyu_domain::{compare_for_listing, validate_period, Goal, GoalDraft};
use hyu_repository::GoalRepository;
use shaku::Component;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub const GOAL_PAGE_SIZE: usize = 10;

#[async_trait]
pub trait GoalService: Interface + Send + Sync {
    async fn create(&self, user_id: i64, request: CreateGoalRequest) -> HyuResult<GoalResponse>;

    /// Goals to act on today first, then checked ones, then inactive ones.
    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<GoalResponse>>;

    async fn get(&self, user_id: i64, goal_id: i64) -> HyuResult<GoalResponse>;

    async fn update(&self, user_id: i64, goal_id: i64, request: UpdateGoalRequest) -> HyuResult<GoalResponse>;

    async fn delete(&self, user_id: i64, goal_id: i64) -> HyuResult<()>;

    async fn set_alert(&self, user_id: i64, goal_id: i64, enabled: bool) -> HyuResult<GoalResponse>;

    /// Checks the goal for today (KST). Repeating is a no-op.
    async fn check_in(&self, user_id: i64, goal_id: i64) -> HyuResult<GoalCheckinResponse>;

    async fn uncheck(&self, user_id: i64, goal_id: i64) -> HyuResult<()>;

    /// Checked dates, defaulting to the goal's whole period.
    async fn checkins(
        &self,
        user_id: i64,
        goal_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> HyuResult<Vec<NaiveDate>>;
}

#[derive(Component)]
#[shaku(interface = GoalService)]
pub struct GoalServiceImpl {
    #[shaku(inject)]
    goals: Arc<dyn GoalRepository>,
    clock: SharedClock,
}

impl GoalServiceImpl {
    pub fn new(goals: Arc<dyn GoalRepository>, clock: SharedClock) -> Self {
        Self { goals, clock }
    }

    async fn load(&self, user_id: i64, goal_id: i64) -> HyuResult<Goal> {
        self.goals
            .find_owned(goal_id, user_id)
            .await?
            .ok_or_else(|| HyuError::not_found("Goal", goal_id))
    }

    async fn respond(&self, goal: Goal) -> HyuResult<GoalResponse> {
        let today = self.clock.today();
        let checked = self.goals.checked_goal_ids(goal.user_id, today).await?.contains(&goal.id);
        Ok(GoalResponse::new(goal, checked))
    }
}

#[async_trait]
impl GoalService for GoalServiceImpl {
    async fn create(&self, user_id: i64, request: CreateGoalRequest) -> HyuResult<GoalResponse> {
        request.validate_request()?;
        validate_period(request.start_date, request.end_date)?;

        let goal = self
            .goals
            .create(
                user_id,
                GoalDraft {
                    title: request.title.trim().to_string(),
                    start_date: request.start_date,
                    end_date: request.end_date,
                    alert_enabled: request.alert_enabled.unwrap_or(true),
                },
                self.clock.now(),
            )
            .await?;

        info!("Goal {} created for user {}", goal.id, user_id);
        Ok(GoalResponse::new(goal, false))
    }

    async fn list(&self, user_id: i64, page: PageRequest) -> HyuResult<Slice<GoalResponse>> {
        let today = self.clock.today();
        let checked: HashSet<i64> = self
            .goals
            .checked_goal_ids(user_id, today)
            .await?
            .into_iter()
            .collect();

        let mut rows: Vec<(Goal, bool)> = self
            .goals
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|g| {
                let is_checked = checked.contains(&g.id);
                (g, is_checked)
            })
            .collect();
        rows.sort_by(|(a, a_checked), (b, b_checked)| {
            compare_for_listing((a, a.bucket(today, *a_checked)), (b, b.bucket(today, *b_checked)))
        });

        let window: Vec<GoalResponse> = rows
            .into_iter()
            .skip(page.offset())
            .take(page.limit() + 1)
            .map(|(g, is_checked)| GoalResponse::new(g, is_checked))
            .collect();
        Ok(Slice::from_overfetch(window, page))
    }

    async fn get(&self, user_id: i64, goal_id: i64) -> HyuResult<GoalResponse> {
        let goal = self.load(user_id, goal_id).await?;
        self.respond(goal).await
    }

    async fn update(&self, user_id: i64, goal_id: i64, request: UpdateGoalRequest) -> HyuResult<GoalResponse> {
        request.validate_request()?;
        let mut goal = self.load(user_id, goal_id).await?;

        if let Some(title) = request.title {
            goal.title = title.trim().to_string();
        }
        if let Some(start) = request.start_date {
            goal.start_date = start;
        }
        if let Some(end) = request.end_date {
            goal.end_date = end;
        }
        if let Some(alert) = request.alert_enabled {
            goal.alert_enabled = alert;
        }
        validate_period(goal.start_date, goal.end_date)?;
        goal.updated_at = self.clock.now();

        self.goals.update(&goal).await?;
        debug!("Goal {} updated", goal_id);
        self.respond(goal).await
    }

    async fn delete(&self, user_id: i64, goal_id: i64) -> HyuResult<()> {
        let mut goal = self.load(user_id, goal_id).await?;
        goal.deleted = true;
        goal.updated_at = self.clock.now();
        self.goals.update(&goal).await?;
        info!("Goal {} deleted by user {}", goal_id, user_id);
        Ok(())
    }

    async fn set_alert(&self, user_id: i64, goal_id: i64, enabled: bool) -> HyuResult<GoalResponse> {
        let mut goal = self.load(user_id, goal_id).await?;
        goal.alert_enabled = enabled;
        goal.updated_at = self.clock.now();
        self.goals.update(&goal).await?;
        self.respond(goal).await
    }

    async fn check_in(&self, user_id: i64, goal_id: i64) -> HyuResult<GoalCheckinResponse> {
        let goal = self.load(user_id, goal_id).await?;
        let today = self.clock.today();
        goal.ensure_checkable(today)?;

        let created = self.goals.add_checkin(goal.id, today).await?;
        if created {
            debug!("Goal {} checked for {}", goal.id, today);
        }
        Ok(GoalCheckinResponse {
            goal_id: goal.id,
            date: today,
            created,
        })
    }

    async fn uncheck(&self, user_id: i64, goal_id: i64) -> HyuResult<()> {
        let goal = self.load(user_id, goal_id).await?;
        self.goals.remove_checkin(goal.id, self.clock.today()).await?;
        Ok(())
    }

    async fn checkins(
        &self,
        user_id: i64,
        goal_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> HyuResult<Vec<NaiveDate>> {
        let goal = self.load(user_id, goal_id).await?;
        let from = from.unwrap_or(goal.start_date);
        let to = to.unwrap_or(goal.end_date);
        if from > to {
            return Err(HyuError::bad_request("from must not be after to"));
        }
        self.goals.checkin_dates(goal.id, from, to).await
    }
}

impl std::fmt::Debug for GoalServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoalServiceImpl").finish_non_exhaustive()
    }
}
