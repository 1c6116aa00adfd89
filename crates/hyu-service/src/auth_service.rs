//! Authentication: signup, login, refresh rotation, logout and password reset.

use crate::dto::{
    IssuedTokens, LoginRequest, MessageResponse, PasswordResetConfirmRequest, SignupRequest, SignupResponse,
    TokenResponse,
};
use async_trait::async_trait;
use hyu_core::{HyuError, HyuResult, Interface, SharedClock, ValidateExt};
use hyu_domain::{LoginRecord, NewUser, Role, User};
use hyu_repository::UserRepository;
use hyu_security::{
    new_refresh_token, sha256_b64url, Claims, PasswordHasherInterface, RefreshSession, TokenProviderInterface,
    TokenStore,
};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authentication service trait.
#[async_trait]
pub trait AuthService: Interface + Send + Sync {
    /// Registers a `USER` account.
    async fn signup(&self, request: SignupRequest) -> HyuResult<SignupResponse>;

    /// Verifies credentials and issues an access/refresh pair.
    async fn login(&self, request: LoginRequest, ip_address: Option<String>) -> HyuResult<IssuedTokens>;

    /// Rotates a refresh token: the presented one is revoked and a new pair issued.
    async fn refresh(&self, refresh_token: &str) -> HyuResult<IssuedTokens>;

    /// Revokes the presented refresh token (or every token of the user) and
    /// blacklists the presented access token.
    async fn logout(&self, refresh_token: Option<String>, access: Option<Claims>, all_devices: bool) -> HyuResult<()>;

    /// Consumes an admin-issued reset token.
    async fn confirm_password_reset(&self, request: PasswordResetConfirmRequest) -> HyuResult<MessageResponse>;

    /// Validates a bearer token, rejecting blacklisted ones.
    async fn authenticate(&self, token: &str) -> HyuResult<Claims>;

    /// Rejects withdrawn and actively suspended accounts.
    async fn ensure_active(&self, user_id: i64) -> HyuResult<()>;
}

/// Authentication service implementation.
#[derive(Component)]
#[shaku(interface = AuthService)]
pub struct AuthServiceImpl {
    #[shaku(inject)]
    users: Arc<dyn UserRepository>,
    #[shaku(inject)]
    password_hasher: Arc<dyn PasswordHasherInterface>,
    #[shaku(inject)]
    token_provider: Arc<dyn TokenProviderInterface>,
    #[shaku(inject)]
    token_store: Arc<dyn TokenStore>,
    refresh_ttl_secs: u64,
    clock: SharedClock,
}

impl AuthServiceImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasherInterface>,
        token_provider: Arc<dyn TokenProviderInterface>,
        token_store: Arc<dyn TokenStore>,
        refresh_ttl_secs: u64,
    ) -> Self {
        Self {
            users,
            password_hasher,
            token_provider,
            token_store,
            refresh_ttl_secs,
            clock: SharedClock::default(),
        }
    }

    /// Shaku parameters with the system clock.
    #[must_use]
    pub fn parameters(refresh_ttl_secs: u64) -> AuthServiceImplParameters {
        AuthServiceImplParameters {
            refresh_ttl_secs,
            clock: SharedClock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    async fn issue_pair(&self, user_id: i64, role: Role, email: &str) -> HyuResult<IssuedTokens> {
        let access = self.token_provider.issue(user_id, role, email)?;
        let refresh_token = new_refresh_token();
        let session = RefreshSession {
            user_id,
            role,
            email: email.to_string(),
        };
        self.token_store
            .store_refresh(&refresh_token, &session, self.refresh_ttl_secs)
            .await?;

        Ok(IssuedTokens {
            response: TokenResponse::bearer(access.token, access.expires_in),
            refresh_token,
            refresh_ttl_secs: self.refresh_ttl_secs,
        })
    }

    async fn load_active(&self, user_id: i64) -> HyuResult<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| HyuError::unauthorized("User no longer exists"))?;
        user.ensure_can_access(self.clock.now())?;
        Ok(user)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn signup(&self, request: SignupRequest) -> HyuResult<SignupResponse> {
        request.validate_request()?;
        let email = request.email.trim().to_lowercase();
        debug!("Signing up {}", email);

        if self.users.exists_by_email(&email).await? {
            return Err(HyuError::conflict(format!("Email '{email}' already exists")));
        }

        let password_hash = self.password_hasher.hash(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                name: request.name.trim().to_string(),
                nickname: request.nickname.trim().to_string(),
                role: Role::User,
            })
            .await?;

        info!("User registered: {}", user.id);
        Ok(SignupResponse::from(user))
    }

    async fn login(&self, request: LoginRequest, ip_address: Option<String>) -> HyuResult<IssuedTokens> {
        request.validate_request()?;
        debug!("Login attempt for {}", request.email);

        let user = self.users.find_by_email(request.email.trim()).await?.ok_or_else(|| {
            warn!("Login failed: unknown email");
            HyuError::InvalidCredentials
        })?;

        if !self.password_hasher.verify(&request.password, &user.password_hash)? {
            warn!("Login failed: bad password for user {}", user.id);
            return Err(HyuError::InvalidCredentials);
        }

        let now = self.clock.now();
        user.ensure_can_access(now)?;

        let tokens = self.issue_pair(user.id, user.role, &user.email).await?;

        let record = LoginRecord {
            user_id: user.id,
            ip_address,
            logged_in_at: now,
        };
        if let Err(e) = self.users.record_login(record).await {
            warn!("Failed to record login for user {}: {}", user.id, e);
        }

        info!("User logged in: {}", user.id);
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> HyuResult<IssuedTokens> {
        let session = self
            .token_store
            .take_refresh(refresh_token)
            .await?
            .ok_or_else(|| HyuError::unauthorized("Invalid refresh token"))?;
        let user = self.load_active(session.user_id).await?;

        let tokens = self.issue_pair(user.id, user.role, &user.email).await?;

        debug!("Rotated refresh token for user {}", user.id);
        Ok(tokens)
    }

    async fn logout(&self, refresh_token: Option<String>, access: Option<Claims>, all_devices: bool) -> HyuResult<()> {
        if all_devices {
            let mut user_id = access.as_ref().and_then(|c| c.user_id().ok());
            if user_id.is_none() {
                if let Some(token) = &refresh_token {
                    user_id = self.token_store.find_refresh(token).await?.map(|s| s.user_id);
                }
            }
            if let Some(user_id) = user_id {
                let revoked = self.token_store.revoke_all_for_user(user_id).await?;
                info!("Logged out user {} from {} devices", user_id, revoked);
            }
        } else if let Some(token) = &refresh_token {
            self.token_store.revoke_refresh(token).await?;
        }

        if let Some(claims) = access {
            let ttl = claims.remaining_secs(self.clock.now());
            self.token_store.blacklist_access(&claims.jti, ttl).await?;
            debug!("Blacklisted access token {} for {}s", claims.jti, ttl);
        }
        Ok(())
    }

    async fn confirm_password_reset(&self, request: PasswordResetConfirmRequest) -> HyuResult<MessageResponse> {
        request.validate_request()?;
        let invalid = || HyuError::bad_request("TOKEN_INVALID_OR_EXPIRED");

        let digest = sha256_b64url(request.token.trim());
        let user = self.users.find_by_reset_digest(&digest).await?.ok_or_else(invalid)?;
        let now = self.clock.now();
        let live = user.need_password_reset && user.reset_expires_at.is_some_and(|at| at > now);
        if !live {
            return Err(invalid());
        }

        let password_hash = self.password_hasher.hash(&request.new_password)?;
        self.users.complete_password_reset(user.id, &password_hash).await?;
        self.token_store.revoke_all_for_user(user.id).await?;

        info!("Password reset completed for user {}", user.id);
        Ok(MessageResponse::new("Password has been reset"))
    }

    async fn authenticate(&self, token: &str) -> HyuResult<Claims> {
        let claims = self.token_provider.validate(token)?;
        if self.token_store.is_blacklisted(&claims.jti).await? {
            return Err(HyuError::InvalidToken("Token has been revoked".to_string()));
        }
        Ok(claims)
    }

    async fn ensure_active(&self, user_id: i64) -> HyuResult<()> {
        self.load_active(user_id).await.map(|_| ())
    }
}

impl std::fmt::Debug for AuthServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceImpl")
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, now, user};
    use chrono::Duration;
    use hyu_config::SecurityConfig;
    use hyu_domain::UserState;
    use hyu_repository::memory::InMemoryUserRepository;
    use hyu_security::{PasswordHasher, TokenProvider, TokenStoreService};

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        store: Arc<TokenStoreService>,
        hasher: Arc<PasswordHasher>,
        service: AuthServiceImpl,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new(clock()));
        let store = Arc::new(TokenStoreService::in_memory());
        let hasher = Arc::new(PasswordHasher::with_cost(1));
        let provider = Arc::new(TokenProvider::new(&SecurityConfig::default()));
        let service = AuthServiceImpl::new(users.clone(), hasher.clone(), provider, store.clone(), 3600)
            .with_clock(clock());
        Fixture {
            users,
            store,
            hasher,
            service,
        }
    }

    fn seed(f: &Fixture, id: i64, email: &str, password: &str) {
        let mut u = user(id, email);
        u.password_hash = f.hasher.hash(password).unwrap();
        f.users.insert(u);
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_role() {
        let f = fixture();
        let response = f
            .service
            .signup(SignupRequest {
                email: "New@Example.com".to_string(),
                password: "Password123".to_string(),
                name: "Kim".to_string(),
                nickname: "kimmy".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.email, "new@example.com");
        assert_eq!(response.role, Role::User);
        let stored = f.users.all();
        assert_ne!(stored[0].password_hash, "Password123");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_ignores_case() {
        let f = fixture();
        seed(&f, 1, "taken@example.com", "Password123");

        let err = f
            .service
            .signup(SignupRequest {
                email: "TAKEN@example.com".to_string(),
                password: "Password123".to_string(),
                name: "Kim".to_string(),
                nickname: "kimmy".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_login_issues_tokens_and_records_ip() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");

        let tokens = f
            .service
            .login(login_request("user@example.com", "Password123"), Some("10.0.0.1".to_string()))
            .await
            .unwrap();

        assert_eq!(tokens.response.token_type, "Bearer");
        assert!(tokens.refresh_token.starts_with("rt."));
        assert_eq!(tokens.refresh_ttl_secs, 3600);

        let session = f.store.find_refresh(&tokens.refresh_token).await.unwrap().unwrap();
        assert_eq!(session.user_id, 1);
        assert_eq!(f.users.logins()[0].ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_login_failures_share_one_error() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");

        let unknown = f
            .service
            .login(login_request("nobody@example.com", "Password123"), None)
            .await
            .unwrap_err();
        let wrong = f
            .service
            .login(login_request("user@example.com", "WrongPass1"), None)
            .await
            .unwrap_err();

        assert!(matches!(unknown, HyuError::InvalidCredentials));
        assert!(matches!(wrong, HyuError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_rejects_suspended_account() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");
        f.users
            .update_state(1, UserState::Suspended, Some(now() + Duration::days(7)), None)
            .await
            .unwrap();

        let err = f
            .service
            .login(login_request("user@example.com", "Password123"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HyuError::AccountSuspended));
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");
        let first = f
            .service
            .login(login_request("user@example.com", "Password123"), None)
            .await
            .unwrap();

        let second = f.service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        let err = f.service.refresh(&first.refresh_token).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(f.store.find_refresh(&second.refresh_token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_with_same_token_rotates_once() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");
        let first = f
            .service
            .login(login_request("user@example.com", "Password123"), None)
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            f.service.refresh(&first.refresh_token),
            f.service.refresh(&first.refresh_token)
        );
        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        let err = a.err().or(b.err()).unwrap();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_logout_blacklists_access_token() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");
        let tokens = f
            .service
            .login(login_request("user@example.com", "Password123"), None)
            .await
            .unwrap();
        let claims = f.service.authenticate(&tokens.response.access_token).await.unwrap();

        f.service
            .logout(Some(tokens.refresh_token.clone()), Some(claims), false)
            .await
            .unwrap();

        assert!(f.store.find_refresh(&tokens.refresh_token).await.unwrap().is_none());
        let err = f.service.authenticate(&tokens.response.access_token).await.unwrap_err();
        assert!(matches!(err, HyuError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_logout_all_devices() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");
        let a = f
            .service
            .login(login_request("user@example.com", "Password123"), None)
            .await
            .unwrap();
        let b = f
            .service
            .login(login_request("user@example.com", "Password123"), None)
            .await
            .unwrap();

        f.service.logout(Some(a.refresh_token.clone()), None, true).await.unwrap();

        assert!(f.store.find_refresh(&a.refresh_token).await.unwrap().is_none());
        assert!(f.store.find_refresh(&b.refresh_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_confirm() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "OldPassword1");
        let token = "reset-token";
        f.users
            .set_reset_token(1, &sha256_b64url(token), now() + Duration::minutes(30))
            .await
            .unwrap();

        f.service
            .confirm_password_reset(PasswordResetConfirmRequest {
                token: token.to_string(),
                new_password: "NewPassword1".to_string(),
            })
            .await
            .unwrap();

        let stored = f.users.all().remove(0);
        assert!(!stored.need_password_reset);
        assert!(f.hasher.verify("NewPassword1", &stored.password_hash).unwrap());

        let err = f
            .service
            .confirm_password_reset(PasswordResetConfirmRequest {
                token: token.to_string(),
                new_password: "NewPassword2".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "TOKEN_INVALID_OR_EXPIRED");
    }

    #[tokio::test]
    async fn test_password_reset_rejects_expired_token() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "OldPassword1");
        f.users
            .set_reset_token(1, &sha256_b64url("old"), now() - Duration::minutes(1))
            .await
            .unwrap();

        let err = f
            .service
            .confirm_password_reset(PasswordResetConfirmRequest {
                token: "old".to_string(),
                new_password: "NewPassword1".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_ensure_active() {
        let f = fixture();
        seed(&f, 1, "user@example.com", "Password123");
        assert!(f.service.ensure_active(1).await.is_ok());

        f.users.update_state(1, UserState::Withdrawn, None, None).await.unwrap();
        assert!(matches!(f.service.ensure_active(1).await, Err(HyuError::AccountWithdrawn)));

        f.users
            .update_state(1, UserState::Suspended, Some(now() - Duration::hours(1)), None)
            .await
            .unwrap();
        assert!(f.service.ensure_active(1).await.is_ok());

        assert_eq!(f.service.ensure_active(99).await.unwrap_err().status_code(), 401);
    }
}
