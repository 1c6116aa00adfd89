//! End-to-end tests of the HTTP layer over in-memory repositories.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use hyu_config::{AiConfig, SecurityConfig, ServerConfig};
use hyu_core::SharedClock;
use hyu_domain::{NewUser, Role, UserState};
use hyu_jobs::{MissedGoalJob, Scheduler};
use hyu_repository::memory::{
    InMemoryAssessmentRepository, InMemoryChatRepository, InMemoryCheckinRepository, InMemoryContentRepository,
    InMemoryEventRepository, InMemoryGoalRepository, InMemoryMetricsRepository, InMemoryNotificationRepository,
    InMemoryProfileRepository, InMemoryReportRepository, InMemorySubmissionRepository, InMemoryUserRepository,
};
use hyu_repository::UserRepository;
use hyu_rest::{build_router, AppState, CookieSettings};
use hyu_security::{PasswordHasher, PasswordHasherInterface, TokenProvider, TokenStoreService};
use hyu_service::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    users: Arc<InMemoryUserRepository>,
    hasher: Arc<PasswordHasher>,
}

fn test_app() -> TestApp {
    let clock = SharedClock::default();
    let security = SecurityConfig::default();

    let users = Arc::new(InMemoryUserRepository::new(clock.clone()));
    let events = Arc::new(InMemoryEventRepository::new());
    let assessments = Arc::new(InMemoryAssessmentRepository::new(clock.clone()));
    let submissions = Arc::new(InMemorySubmissionRepository::new(clock.clone()));
    let chats = Arc::new(InMemoryChatRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let goals = Arc::new(InMemoryGoalRepository::new());
    let hasher = Arc::new(PasswordHasher::with_cost(1));
    let token_store = Arc::new(TokenStoreService::in_memory());
    let recorder: Arc<dyn EventRecorder> = Arc::new(RepositoryEventRecorder::new(events.clone(), clock.clone()));

    let auth_service = AuthServiceImpl::new(
        users.clone(),
        hasher.clone(),
        Arc::new(TokenProvider::new(&security)),
        token_store.clone(),
        security.jwt_refresh_expiration_secs,
    )
    .with_clock(clock.clone());

    let notification_service: Arc<dyn NotificationService> = Arc::new(NotificationServiceImpl::new(
        Arc::new(InMemoryNotificationRepository::new()),
        goals.clone(),
        Arc::new(LoggingNotificationSender::default()),
        clock.clone(),
    ));
    let scheduler = Scheduler::new(clock.clone());
    scheduler
        .schedule("0 0 21 * * *", Arc::new(MissedGoalJob::new(notification_service.clone())))
        .unwrap();

    let state = AppState {
        auth_service: Arc::new(auth_service),
        checkin_service: Arc::new(CheckinServiceImpl::new(
            Arc::new(InMemoryCheckinRepository::new(clock.clone())),
            clock.clone(),
        )),
        assessment_admin_service: Arc::new(AssessmentAdminServiceImpl::new(assessments.clone(), clock.clone())),
        assessment_service: Arc::new(AssessmentServiceImpl::new(
            assessments,
            submissions,
            users.clone(),
            recorder.clone(),
            clock.clone(),
        )),
        content_service: Arc::new(ContentServiceImpl::new(
            Arc::new(InMemoryContentRepository::new(clock.clone())),
            clock.clone(),
        )),
        admin_user_service: Arc::new(AdminUserServiceImpl::new(
            users.clone(),
            token_store,
            Arc::new(LoggingMailSender::new("no-reply@hyu.app")),
            security.reset_link_base_url.clone(),
            clock.clone(),
        )),
        report_service: Arc::new(ReportServiceImpl::new(
            Arc::new(InMemoryReportRepository::new()),
            users.clone(),
            clock.clone(),
        )),
        chat_service: Arc::new(ChatServiceImpl::new(
            chats.clone(),
            profiles.clone(),
            Arc::new(RuleBasedAssistant::default()),
            recorder,
            clock.clone(),
        )),
        ai_service: Arc::new(AiProxyServiceImpl::new(Arc::new(
            HttpAiGateway::new(&AiConfig::default()).unwrap(),
        ))),
        goal_service: Arc::new(GoalServiceImpl::new(goals, clock.clone())),
        notification_service,
        event_service: Arc::new(EventServiceImpl::new(events.clone(), clock.clone())),
        metrics_service: Arc::new(MetricsServiceImpl::new(
            Arc::new(InMemoryMetricsRepository::new(events, users.clone())),
            clock.clone(),
        )),
        profile_service: Arc::new(ProfileServiceImpl::new(profiles, chats, clock)),
        database: None,
        scheduler: Some(Arc::new(scheduler)),
        cookies: CookieSettings::from_security(&security),
    };

    TestApp {
        router: build_router(state, &ServerConfig::default()),
        users,
        hasher,
    }
}

struct TestResponse {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse {
        status,
        set_cookie,
        body,
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Signs up and logs in; returns (user id, access token, refresh cookie pair).
async fn register_and_login(app: &TestApp, email: &str) -> (i64, String, String) {
    let signup = send(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({"email": email, "password": "password123", "name": "Kim", "nickname": "kim"}),
        ),
    )
    .await;
    assert_eq!(signup.status, StatusCode::CREATED);
    let id = signup.body["id"].as_i64().unwrap();

    let login = send(
        app,
        json_request("POST", "/api/auth/login", None, &json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["accessToken"].as_str().unwrap().to_string();
    let cookie = login.set_cookie.unwrap();
    let pair = cookie.split(';').next().unwrap().to_string();
    (id, token, pair)
}

async fn admin_token(app: &TestApp) -> String {
    let hash = app.hasher.hash("adminpass1").unwrap();
    app.users
        .create(NewUser {
            email: "admin@hyu.app".to_string(),
            password_hash: hash,
            name: "Admin".to_string(),
            nickname: "admin".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    let login = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({"email": "admin@hyu.app", "password": "adminpass1"}),
        ),
    )
    .await;
    login.body["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app();
    let health = send(&app, get("/health", None)).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, Value::String("OK".to_string()));

    assert_eq!(send(&app, get("/live", None)).await.status, StatusCode::OK);
    assert_eq!(send(&app, get("/ready", None)).await.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_signup_validation_and_duplicates() {
    let app = test_app();
    let invalid = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({"email": "a@hyu.app", "password": "short", "name": "A", "nickname": "a"}),
        ),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["error"], "VALIDATION_ERROR");
    assert_eq!(invalid.body["details"][0]["field"], "password");

    register_and_login(&app, "dup@hyu.app").await;
    let duplicate = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({"email": "DUP@hyu.app", "password": "password123", "name": "B", "nickname": "b"}),
        ),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_sets_refresh_cookie_and_rejects_bad_password() {
    let app = test_app();
    register_and_login(&app, "kim@hyu.app").await;

    let login = send(
        &app,
        json_request("POST", "/api/auth/login", None, &json!({"email": "kim@hyu.app", "password": "password123"})),
    )
    .await;
    assert_eq!(login.body["tokenType"], "Bearer");
    let cookie = login.set_cookie.unwrap();
    assert!(cookie.starts_with("RT=rt."));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));

    let wrong = send(
        &app,
        json_request("POST", "/api/auth/login", None, &json!({"email": "kim@hyu.app", "password": "wrongpass1"})),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = test_app();
    let (_, _, cookie) = register_and_login(&app, "rot@hyu.app").await;

    let refresh = |cookie: String| {
        Request::builder()
            .method("POST")
            .uri("/api/auth/refresh")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    };

    let rotated = send(&app, refresh(cookie.clone())).await;
    assert_eq!(rotated.status, StatusCode::OK);
    assert!(rotated.body["accessToken"].is_string());
    assert_ne!(rotated.set_cookie.unwrap().split(';').next().unwrap(), cookie);

    let replay = send(&app, refresh(cookie)).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    let missing = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/refresh")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_expires_cookie_and_blacklists_access_token() {
    let app = test_app();
    let (_, token, cookie) = register_and_login(&app, "out@hyu.app").await;

    let logout = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert!(logout.set_cookie.unwrap().contains("Max-Age=0"));

    let after = send(&app, get("/api/profiles/me", Some(&token))).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token_and_role() {
    let app = test_app();
    assert_eq!(send(&app, get("/api/checkins/today", None)).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        send(&app, get("/api/checkins/today", Some("not-a-jwt"))).await.status,
        StatusCode::UNAUTHORIZED
    );

    let (_, token, _) = register_and_login(&app, "user@hyu.app").await;
    let admin_only = send(&app, get("/api/admin/users", Some(&token))).await;
    assert_eq!(admin_only.status, StatusCode::FORBIDDEN);

    let admin = admin_token(&app).await;
    let users = send(&app, get("/api/admin/users?q=user", Some(&admin))).await;
    assert_eq!(users.status, StatusCode::OK);
    assert_eq!(users.body["content"][0]["email"], "user@hyu.app");
}

#[tokio::test]
async fn test_suspended_account_is_blocked() {
    let app = test_app();
    let (id, token, _) = register_and_login(&app, "bad@hyu.app").await;
    app.users
        .update_state(id, UserState::Suspended, None, None)
        .await
        .unwrap();

    let blocked = send(&app, get("/api/profiles/me", Some(&token))).await;
    assert_eq!(blocked.status, StatusCode::FORBIDDEN);
    assert_eq!(blocked.body["error"], "ACCOUNT_SUSPENDED");
}

#[tokio::test]
async fn test_profile_and_checkin_flow() {
    let app = test_app();
    let (id, token, _) = register_and_login(&app, "flow@hyu.app").await;

    let profile = send(&app, get("/api/profiles/me", Some(&token))).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["nickname"], format!("사용자{id}"));

    let first = send(&app, json_request("POST", "/api/checkins", Some(&token), &json!({"mood": 9}))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["created"], true);
    assert_eq!(first.body["streak"], 1);

    let second = send(&app, json_request("POST", "/api/checkins", Some(&token), &json!({"note": "  "}))).await;
    assert_eq!(second.body["created"], false);

    let today = send(&app, get("/api/checkins/today", Some(&token))).await;
    assert_eq!(today.body["checked"], true);
    assert_eq!(today.body["shouldPrompt"], false);

    let bad_month = send(&app, get("/api/checkins/stats/month?month=2024-13", Some(&token))).await;
    assert_eq!(bad_month.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_event_idempotency() {
    let app = test_app();
    let (_, token, _) = register_and_login(&app, "evt@hyu.app").await;

    let event = |key: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/events")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("X-Idempotency-Key", key)
            .body(Body::from(json!({"eventName": "app_open"}).to_string()))
            .unwrap()
    };

    let first = send(&app, event("k-1")).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["dedup"], false);

    let repeat = send(&app, event("k-1")).await;
    assert_eq!(repeat.body["dedup"], true);
    assert_eq!(repeat.body["id"], first.body["id"]);

    let risk = send(
        &app,
        json_request("POST", "/api/events", Some(&token), &json!({"eventName": "risk_detected"})),
    )
    .await;
    assert_eq!(risk.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_session_reply() {
    let app = test_app();
    let (_, token, _) = register_and_login(&app, "chat@hyu.app").await;

    let session = send(&app, json_request("POST", "/api/sessions", Some(&token), &json!({}))).await;
    assert_eq!(session.status, StatusCode::CREATED);
    let session_id = session.body["id"].as_str().unwrap().to_string();

    let reply = send(
        &app,
        json_request(
            "POST",
            &format!("/api/sessions/{session_id}/messages"),
            Some(&token),
            &json!({"content": "요즘 잠을 잘 못 자서 너무 피곤해요"}),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["role"], "ASSISTANT");

    let (_, other, _) = register_and_login(&app, "other@hyu.app").await;
    let foreign = send(&app, get(&format!("/api/sessions/{session_id}/messages"), Some(&other))).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_job_controls() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let (_, user, _) = register_and_login(&app, "jobs@hyu.app").await;

    assert_eq!(send(&app, get("/api/admin/jobs", Some(&user))).await.status, StatusCode::FORBIDDEN);

    let listed = send(&app, get("/api/admin/jobs", Some(&admin))).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["running"], false);
    assert_eq!(listed.body["jobs"][0]["name"], MissedGoalJob::NAME);
    assert_eq!(listed.body["jobs"][0]["enabled"], true);

    let path = format!("/api/admin/jobs/{}", MissedGoalJob::NAME);
    let paused = send(&app, json_request("PATCH", &path, Some(&admin), &json!({"enabled": false}))).await;
    assert_eq!(paused.status, StatusCode::OK);
    assert_eq!(paused.body["enabled"], false);

    // Paused jobs can still be run by hand.
    let run = send(&app, json_request("POST", &format!("{path}/run"), Some(&admin), &Value::Null)).await;
    assert_eq!(run.status, StatusCode::OK);

    let listed = send(&app, get("/api/admin/jobs", Some(&admin))).await;
    assert_eq!(listed.body["jobsExecuted"], 1);
    assert_eq!(listed.body["jobsFailed"], 0);
    assert_eq!(listed.body["jobs"][0]["enabled"], false);

    let unknown = send(&app, json_request("POST", "/api/admin/jobs/nope/run", Some(&admin), &Value::Null)).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    let unknown = send(
        &app,
        json_request("PATCH", "/api/admin/jobs/nope", Some(&admin), &json!({"enabled": true})),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
