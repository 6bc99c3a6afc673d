//! Meetpoint Service - HTTP microservice for weighted meeting points.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MEETPOINT_API_KEY` | Google Maps API key | None (offline) |
//! | `MEETPOINT_TRAVEL_MODE` | driving, walking, bicycling, transit | driving |
//! | `MEETPOINT_TIMEOUT_SECS` | Google Maps HTTP timeout | 30 |
//! | `MEETPOINT_MAX_RETRIES` | Retries per Google Maps request | 2 |
//! | `MEETPOINT_CACHE_SIZE` | Maximum geocoded codes in cache | 1000 |
//! | `MEETPOINT_PORT` | HTTP server port | 8080 |
//! | `MEETPOINT_SESSION_CAPACITY` | Maximum live sessions | 1000 |
//! | `MEETPOINT_SESSION_TTL_SECS` | Idle seconds before a session expires | 3600 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /midpoint` - Compute a meeting point
//! - `GET /sessions/{id}` - Last plan of a session
//! - `GET /sessions/{id}/geojson` - Map data for the last plan
//! - `GET /health` - Health check
//! - `GET /stats` - Cache and session statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use meetpoint::{MeetingPlannerBuilder, SessionStore};
use meetpoint_service::{router, ApiDoc, AppState};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meetpoint=info,meetpoint_service=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Service-specific config
    let port: u16 = env_or("MEETPOINT_PORT", 8080);
    let session_capacity: u64 = env_or("MEETPOINT_SESSION_CAPACITY", 1000);
    let session_ttl = Duration::from_secs(env_or("MEETPOINT_SESSION_TTL_SECS", 3600));

    // The library handles: MEETPOINT_API_KEY, MEETPOINT_TRAVEL_MODE,
    // MEETPOINT_TIMEOUT_SECS, MEETPOINT_MAX_RETRIES, MEETPOINT_CACHE_SIZE.
    // The blocking HTTP client must not be created on a runtime thread.
    let planner =
        tokio::task::spawn_blocking(|| MeetingPlannerBuilder::from_env()?.build()).await??;

    tracing::info!(
        backend = planner.backend(),
        cache_capacity = planner.cache_capacity(),
        session_capacity = session_capacity,
        session_ttl_secs = session_ttl.as_secs(),
        port = port,
        "Starting meetpoint service"
    );

    let state = Arc::new(AppState {
        planner,
        sessions: SessionStore::new(session_capacity, session_ttl),
    });

    // Build router
    let app = router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
