//! Main application router.

use crate::{
    controllers::{
        admin_user_controller, ai_controller, assessment_admin_controller, assessment_controller, auth_controller,
        chat_controller, checkin_controller, content_admin_controller, content_controller, event_controller,
        goal_controller, health_controller, job_controller, metrics_controller, notification_controller, profile_controller,
        report_controller,
    },
    middleware::{auth_middleware, logging_middleware, AuthMiddlewareState},
    openapi::ApiDoc,
    state::{ApiModule, AppState, CookieSettings},
};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware, Router,
};
use hyu_config::{AppConfig, ServerConfig};
use hyu_jobs::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Creates the main application router from a Shaku module.
pub fn create_router<M: ApiModule>(module: &M, config: &AppConfig, scheduler: Option<Arc<Scheduler>>) -> Router {
    let state =
        AppState::from_module(module, CookieSettings::from_security(&config.security)).with_scheduler(scheduler);
    build_router(state, &config.server)
}

/// Creates the router over already resolved services.
pub fn build_router(state: AppState, server_config: &ServerConfig) -> Router {
    let auth_state = AuthMiddlewareState::new(state.auth_service.clone());

    let admin_router = Router::new()
        .nest("/assessments", assessment_admin_controller::router())
        .nest("/cms-contents", content_admin_controller::router())
        .nest("/users", admin_user_controller::router())
        .nest("/reports", report_controller::admin_router())
        .nest("/metrics", metrics_controller::router())
        .nest("/jobs", job_controller::router());

    let api_router = Router::new()
        .nest("/auth", auth_controller::router())
        .nest("/checkins", checkin_controller::router())
        .nest("/assessments", assessment_controller::router())
        .nest("/contents", content_controller::router())
        .nest("/reports", report_controller::router())
        .nest("/sessions", chat_controller::router())
        .nest("/ai", ai_controller::router())
        .nest("/goals", goal_controller::router())
        .nest("/notifications", notification_controller::router())
        .nest("/events", event_controller::router())
        .nest("/profiles/me", profile_controller::router())
        .nest("/admin", admin_router)
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let router = Router::new()
        .merge(health_controller::router())
        .nest("/api", api_router)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(server_config))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout_secs)))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

    info!("Router created with REST endpoints and Swagger UI at /swagger-ui");
    router
}

/// Creates a CORS layer based on server configuration.
///
/// A `*` origin allows any origin without credentials; explicit origins
/// also allow credentials so the refresh cookie is sent.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }
    if server_config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-guest-key"),
            HeaderName::from_static("x-refresh-token"),
            HeaderName::from_static("x-idempotency-key"),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_variants() {
        let mut config = ServerConfig::default();
        let _ = create_cors_layer(&config);

        config.cors_origins = vec!["https://hyu.app".to_string(), "bad\norigin".to_string()];
        let _ = create_cors_layer(&config);

        config.cors_enabled = false;
        let _ = create_cors_layer(&config);
    }
}
