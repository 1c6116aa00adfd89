//! Admin user management: search, state changes and password-reset issuance.

use crate::clients::MailSender;
use crate::dto::{parse_filter, AdminUserItem, AdminUserParams, ChangeStateRequest, MessageResponse};
use async_trait::async_trait;
use chrono::Duration;
use hyu_core::text::{blank_to_none, mask_email};
use hyu_core::{kst_start_of_day, HyuError, HyuResult, Interface, Page, PageRequest, SharedClock, ValidateExt};
use hyu_domain::{RiskMode, SuspensionPeriod, User, UserState, RESET_TOKEN_TTL_SECS};
use hyu_repository::{UserRepository, UserSearch};
use hyu_security::{random_token, sha256_b64url, TokenStore};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ADMIN_USER_PAGE_SIZE: usize = 20;

/// Raw bytes of a reset token before encoding.
const RESET_TOKEN_BYTES: usize = 48;

#[async_trait]
pub trait AdminUserService: Interface + Send + Sync {
    async fn search(&self, params: AdminUserParams) -> HyuResult<Page<AdminUserItem>>;

    /// Suspends or reactivates an account. Suspension revokes every refresh token.
    async fn change_state(&self, admin_id: i64, user_id: i64, request: ChangeStateRequest)
        -> HyuResult<AdminUserItem>;

    /// Issues a one-time reset link and mails it to the user.
    async fn issue_password_reset(&self, admin_id: i64, user_id: i64) -> HyuResult<MessageResponse>;
}

#[derive(Component)]
#[shaku(interface = AdminUserService)]
pub struct AdminUserServiceImpl {
    #[shaku(inject)]
    users: Arc<dyn UserRepository>,
    #[shaku(inject)]
    token_store: Arc<dyn TokenStore>,
    #[shaku(inject)]
    mail: Arc<dyn MailSender>,
    reset_link_base_url: String,
    clock: SharedClock,
}

impl AdminUserServiceImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        token_store: Arc<dyn TokenStore>,
        mail: Arc<dyn MailSender>,
        reset_link_base_url: impl Into<String>,
        clock: SharedClock,
    ) -> Self {
        Self {
            users,
            token_store,
            mail,
            reset_link_base_url: reset_link_base_url.into(),
            clock,
        }
    }

    #[must_use]
    pub fn parameters(reset_link_base_url: impl Into<String>) -> AdminUserServiceImplParameters {
        AdminUserServiceImplParameters {
            reset_link_base_url: reset_link_base_url.into(),
            clock: SharedClock::default(),
        }
    }

    async fn load(&self, id: i64) -> HyuResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| HyuError::not_found("User", id))
    }

    fn reset_link(&self, token: &str) -> String {
        let sep = if self.reset_link_base_url.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.reset_link_base_url, sep, token)
    }
}

#[async_trait]
impl AdminUserService for AdminUserServiceImpl {
    async fn search(&self, params: AdminUserParams) -> HyuResult<Page<AdminUserItem>> {
        let search = UserSearch {
            q: blank_to_none(params.q.as_deref()),
            role: parse_filter(params.role.as_deref())?,
            state: parse_filter(params.state.as_deref())?,
            risk_level: parse_filter(params.risk_level.as_deref())?,
            joined_from: params.joined_from.map(kst_start_of_day),
            joined_until: params
                .joined_to
                .and_then(|d| d.succ_opt())
                .map(kst_start_of_day),
        };
        let page = PageRequest::with_default(params.page, params.size, ADMIN_USER_PAGE_SIZE);
        Ok(self.users.search(&search, page).await?.map(AdminUserItem::from))
    }

    async fn change_state(
        &self,
        admin_id: i64,
        user_id: i64,
        request: ChangeStateRequest,
    ) -> HyuResult<AdminUserItem> {
        request.validate_request()?;
        let requested: UserState = request.state.trim().parse()?;
        let risk_mode: Option<RiskMode> = parse_filter(request.risk_mode.as_deref())?;
        self.load(user_id).await?;

        let (state, until) = if requested == UserState::Suspended {
            let period = SuspensionPeriod::parse(request.period.as_deref())?;
            (UserState::Suspended, period.until(self.clock.now()))
        } else {
            (UserState::Active, None)
        };
        debug!("Admin {} sets user {} to {}", admin_id, user_id, state);

        self.users.update_state(user_id, state, until, risk_mode).await?;
        if state == UserState::Suspended {
            let revoked = self.token_store.revoke_all_for_user(user_id).await?;
            info!(
                "User {} suspended by admin {} until {:?} ({} sessions revoked), reason: {}",
                user_id,
                admin_id,
                until,
                revoked,
                request.reason.as_deref().unwrap_or("-")
            );
        } else {
            info!("User {} activated by admin {}", user_id, admin_id);
        }

        Ok(self.load(user_id).await?.into())
    }

    async fn issue_password_reset(&self, admin_id: i64, user_id: i64) -> HyuResult<MessageResponse> {
        let user = self.load(user_id).await?;
        let now = self.clock.now();
        user.ensure_reset_issuable(now)?;

        let token = random_token(RESET_TOKEN_BYTES);
        let expires_at = now + Duration::seconds(RESET_TOKEN_TTL_SECS);
        self.users.set_reset_token(user.id, &sha256_b64url(&token), expires_at).await?;

        let body = format!(
            "A password reset was requested for your account.\n\nReset link (valid for 30 minutes): {}",
            self.reset_link(&token)
        );
        if let Err(e) = self.mail.send(&user.email, "Password reset", &body).await {
            warn!("Reset mail to user {} failed, discarding token: {}", user.id, e);
            self.users.clear_reset_token(user.id).await?;
            return Err(e);
        }

        info!(
            "Password reset issued for user {} ({}) by admin {}",
            user.id,
            mask_email(&user.email),
            admin_id
        );
        Ok(MessageResponse::new("Password reset link sent"))
    }
}

impl std::fmt::Debug for AdminUserServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserServiceImpl")
            .field("reset_link_base_url", &self.reset_link_base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockMailSender;
    use crate::test_support::{clock, date, now, user};
    use hyu_domain::{RiskLevel, Role};
    use hyu_repository::memory::InMemoryUserRepository;
    use hyu_security::{RefreshSession, TokenStoreService};
    use mockall::predicate::eq;
    use std::sync::Mutex;

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        store: Arc<TokenStoreService>,
        service: AdminUserServiceImpl,
    }

    fn fixture(mail: MockMailSender) -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new(clock()));
        let store = Arc::new(TokenStoreService::in_memory());
        users.insert(user(1, "kim@example.com"));
        let service = AdminUserServiceImpl::new(
            users.clone(),
            store.clone(),
            Arc::new(mail),
            "https://app.example.com/reset",
            clock(),
        );
        Fixture { users, store, service }
    }

    fn state_request(state: &str, period: Option<&str>) -> ChangeStateRequest {
        ChangeStateRequest {
            state: state.to_string(),
            reason: Some("abuse".to_string()),
            period: period.map(str::to_string),
            risk_mode: None,
        }
    }

    #[tokio::test]
    async fn test_suspend_revokes_sessions() {
        let f = fixture(MockMailSender::new());
        let session = RefreshSession {
            user_id: 1,
            role: Role::User,
            email: "kim@example.com".to_string(),
        };
        f.store.store_refresh("rt-1", &session, 3600).await.unwrap();

        let item = f
            .service
            .change_state(9, 1, state_request("SUSPENDED", Some("P1W")))
            .await
            .unwrap();
        assert_eq!(item.state, UserState::Suspended);

        let stored = f.users.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.suspend_until, Some(now() + Duration::days(7)));
        assert!(f.store.find_refresh("rt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_states_reactivate() {
        let f = fixture(MockMailSender::new());
        f.service
            .change_state(9, 1, state_request("SUSPENDED", None))
            .await
            .unwrap();
        assert_eq!(f.users.find_by_id(1).await.unwrap().unwrap().suspend_until, None);

        let mut request = state_request("withdrawn", None);
        request.risk_mode = Some("EXEMPT".to_string());
        let item = f.service.change_state(9, 1, request).await.unwrap();
        assert_eq!(item.state, UserState::Active);

        let stored = f.users.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.suspend_until, None);
        assert_eq!(stored.risk_mode, Some(RiskMode::Exempt));
    }

    #[tokio::test]
    async fn test_change_state_rejects_bad_values() {
        let f = fixture(MockMailSender::new());
        let err = f
            .service
            .change_state(9, 1, state_request("BANNED", None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = f
            .service
            .change_state(9, 1, state_request("SUSPENDED", Some("P3D")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "INVALID_PERIOD");

        let err = f
            .service
            .change_state(9, 404, state_request("ACTIVE", None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_password_reset_mails_link_and_stores_digest() {
        let sent = Arc::new(Mutex::new(String::new()));
        let captured = sent.clone();
        let mut mail = MockMailSender::new();
        mail.expect_send()
            .with(eq("kim@example.com"), eq("Password reset"), mockall::predicate::always())
            .times(1)
            .returning(move |_, _, body| {
                *captured.lock().unwrap() = body.to_string();
                Ok(())
            });
        let f = fixture(mail);

        let response = f.service.issue_password_reset(9, 1).await.unwrap();
        assert_eq!(response.message, "Password reset link sent");

        let body = sent.lock().unwrap().clone();
        let token = body
            .split("?token=")
            .nth(1)
            .unwrap()
            .trim()
            .to_string();
        let stored = f.users.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.reset_token_hash, Some(sha256_b64url(&token)));
        assert!(stored.need_password_reset);
        assert_eq!(stored.reset_expires_at, Some(now() + Duration::minutes(30)));

        let err = f.service.issue_password_reset(9, 1).await.unwrap_err();
        assert!(err.to_string().starts_with("RESET_ALREADY_ISSUED:"));
    }

    #[tokio::test]
    async fn test_failed_reset_mail_leaves_no_pending_token() {
        let mut mail = MockMailSender::new();
        mail.expect_send()
            .times(2)
            .returning(|_, _, _| Err(HyuError::external("mail", "smtp down")));
        let f = fixture(mail);

        let err = f.service.issue_password_reset(9, 1).await.unwrap_err();
        assert!(err.to_string().contains("smtp down"));

        let stored = f.users.find_by_id(1).await.unwrap().unwrap();
        assert!(!stored.need_password_reset);
        assert_eq!(stored.reset_token_hash, None);
        assert_eq!(stored.reset_expires_at, None);

        let err = f.service.issue_password_reset(9, 1).await.unwrap_err();
        assert!(!err.to_string().starts_with("RESET_ALREADY_ISSUED"));
    }

    #[tokio::test]
    async fn test_password_reset_refused_for_withdrawn() {
        let f = fixture(MockMailSender::new());
        let mut withdrawn = user(2, "gone@example.com");
        withdrawn.state = UserState::Withdrawn;
        f.users.insert(withdrawn);

        let err = f.service.issue_password_reset(9, 2).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "ACCOUNT_WITHDRAWN");
    }

    #[tokio::test]
    async fn test_search_filters_by_state_and_join_date() {
        let f = fixture(MockMailSender::new());
        let mut risky = user(2, "lee@example.com");
        risky.risk_level = Some(RiskLevel::HighRisk);
        f.users.insert(risky);

        let page = f
            .service
            .search(AdminUserParams {
                risk_level: Some("high_risk".to_string()),
                ..AdminUserParams::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.content[0].email, "lee@example.com");
        assert_eq!(page.info.size, ADMIN_USER_PAGE_SIZE);

        let page = f
            .service
            .search(AdminUserParams {
                joined_from: Some(date(2024, 5, 15)),
                joined_to: Some(date(2024, 5, 15)),
                ..AdminUserParams::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let page = f
            .service
            .search(AdminUserParams {
                joined_to: Some(date(2024, 5, 14)),
                ..AdminUserParams::default()
            })
            .await
            .unwrap();
        assert!(page.is_empty());

        let err = f
            .service
            .search(AdminUserParams {
                role: Some("ROOT".to_string()),
                ..AdminUserParams::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
