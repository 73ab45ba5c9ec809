//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub mod http;

/// Caller identity at the boundary. Credential handling lives in an external
/// auth layer; it terminates the token and forwards the user id in the
/// `x-user-id` header. Missing or unparseable ids are rejected here, before
/// any handler runs.
pub struct AuthedUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Auth)?;
        let id = raw.parse::<Uuid>().map_err(|_| ApiError::Auth)?;
        Ok(AuthedUser(id))
    }
}

/// Build the application router with:
/// - REST API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/courses", get(http::http_courses))
        .route("/api/v1/courses/available", get(http::http_available_courses))
        .route("/api/v1/courses/my", get(http::http_my_courses))
        .route("/api/v1/courses/:course_id", get(http::http_course_with_topics))
        .route(
            "/api/v1/courses/:course_id/topics/:topic_id",
            get(http::http_topic_details),
        )
        .route(
            "/api/v1/courses/:course_id/topics/:topic_id/content",
            get(http::http_topic_content),
        )
        .route(
            "/api/v1/courses/:course_id/topics/:topic_id/quiz",
            get(http::http_quiz_data),
        )
        .route(
            "/api/v1/courses/:course_id/topics/:topic_id/progress",
            put(http::http_update_lesson_progress),
        )
        .route(
            "/api/v1/courses/:course_id/topics/:topic_id/quiz/complete",
            post(http::http_complete_quiz),
        )
        .route("/api/v1/achievements", get(http::http_achievements))
        .route(
            "/api/v1/achievements/:achievement_id/progress",
            get(http::http_achievement_progress),
        )
        .route("/api/v1/notifications", get(http::http_notifications))
        .route(
            "/api/v1/notifications/unread-count",
            get(http::http_unread_count),
        )
        .route(
            "/api/v1/notifications/read-all",
            put(http::http_mark_all_notifications_read),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            put(http::http_mark_notification_read),
        )
        .route("/api/v1/profile", get(http::http_profile))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
