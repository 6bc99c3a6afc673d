//! Meetpoint Service Library
//!
//! HTTP handlers, router and OpenAPI document for the meeting point service.
//! This library is used by both the meetpoint-service binary and integration
//! tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use meetpoint::{MeetingPlanner, SessionStore};
use utoipa::OpenApi;

/// Application state shared across handlers.
pub struct AppState {
    /// Planner shared by every request.
    pub planner: MeetingPlanner,
    /// Last plan per session.
    pub sessions: SessionStore,
}

/// OpenAPI documentation for the meetpoint service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Meetpoint Service",
        version = "0.1.0",
        description = "REST API for computing travel-distance weighted meeting points.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::post_midpoint,
        handlers::get_session,
        handlers::get_session_geojson,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::MidpointRequest,
            handlers::MidpointResponse,
            handlers::CodeFailure,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "midpoint", description = "Meeting point endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the API routes. Middleware and docs are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/midpoint", post(handlers::post_midpoint))
        .route("/sessions/:id", get(handlers::get_session))
        .route("/sessions/:id/geojson", get(handlers::get_session_geojson))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    CodeFailure, ErrorResponse, HealthResponse, MidpointRequest, MidpointResponse, StatsResponse,
};
