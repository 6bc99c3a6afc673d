//! HTTP request handlers for the meeting point service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meetpoint::geojson::plan_to_feature_collection;
use meetpoint::{parse_codes, FailedCode, MeetingPlan, MeetpointError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

/// Body of a midpoint request.
///
/// Codes may be sent as a list, as newline-separated text, or both; list
/// entries come first.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MidpointRequest {
    /// Location codes, one per entry.
    #[serde(default)]
    pub codes: Vec<String>,
    /// Location codes, one per line.
    #[serde(default)]
    pub text: Option<String>,
    /// Session to store the plan in. A new session is started when absent
    /// or expired.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl MidpointRequest {
    /// All submitted codes, trimmed, blanks dropped.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        if let Some(text) = &self.text {
            codes.extend(parse_codes(text));
        }
        codes
    }
}

/// Successful midpoint response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MidpointResponse {
    /// Session holding this plan.
    pub session_id: String,
    /// Parsed codes, coordinates, failures, refinement and distance report.
    #[schema(value_type = Object)]
    pub plan: MeetingPlan,
}

/// A location code that could not be resolved.
#[derive(Debug, Serialize, ToSchema)]
pub struct CodeFailure {
    /// The code as submitted.
    pub code: String,
    /// Why it failed.
    pub reason: String,
}

impl From<FailedCode> for CodeFailure {
    fn from(failure: FailedCode) -> Self {
        Self {
            code: failure.code,
            reason: failure.reason,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Per-code failures, when no code resolved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CodeFailure>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            failures: Vec::new(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Geocoding and distance backend.
    pub backend: String,
}

/// Cache and session statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of geocoded codes in cache.
    pub cached_codes: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
    /// Number of live sessions.
    pub sessions: u64,
}

/// Compute a meeting point.
///
/// # Returns
///
/// - `200 OK` with the plan and its session id
/// - `400 Bad Request` if no codes were submitted
/// - `422 Unprocessable Entity` if no code resolved, with per-code failures
/// - `500 Internal Server Error` on unexpected errors
#[utoipa::path(
    post,
    path = "/midpoint",
    tag = "midpoint",
    request_body = MidpointRequest,
    responses(
        (status = 200, description = "Meeting point computed", body = MidpointResponse),
        (status = 400, description = "No location codes", body = ErrorResponse),
        (status = 422, description = "No code resolved", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn post_midpoint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MidpointRequest>,
) -> Response {
    let codes = request.codes();
    tracing::debug!(codes = codes.len(), "Midpoint request");

    if codes.is_empty() {
        return error_response(MeetpointError::EmptyInput);
    }

    // Geocoding and distance calls block on HTTP
    let planner_state = Arc::clone(&state);
    let result =
        tokio::task::spawn_blocking(move || planner_state.planner.plan_codes(codes)).await;

    let plan = match result {
        Ok(Ok(plan)) => plan,
        Ok(Err(e)) => return error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "Planner task failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Planner task failed")),
            )
                .into_response();
        }
    };

    let session_id = match request
        .session_id
        .filter(|id| state.sessions.get(id).is_some())
    {
        Some(id) => id,
        None => state.sessions.create(),
    };
    let session = state.sessions.get(&session_id).unwrap_or_default();
    state
        .sessions
        .put(session_id.clone(), session.with_plan(plan.clone()));

    tracing::info!(
        session_id = %session_id,
        midpoint = %plan.midpoint(),
        failures = plan.geocode_failures.len(),
        "Midpoint computed"
    );

    (StatusCode::OK, Json(MidpointResponse { session_id, plan })).into_response()
}

/// Get the last plan of a session.
///
/// # Returns
///
/// - `200 OK` with the retained plan
/// - `404 Not Found` if the session is unknown, expired, or has no plan
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "midpoint",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Retained plan", body = MidpointResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match session_plan(&state, &id) {
        Some(plan) => (
            StatusCode::OK,
            Json(MidpointResponse {
                session_id: id,
                plan,
            }),
        )
            .into_response(),
        None => session_not_found(&id),
    }
}

/// Get the map FeatureCollection for a session's last plan.
///
/// # Returns
///
/// - `200 OK` with a GeoJSON FeatureCollection
/// - `404 Not Found` if the session is unknown, expired, or has no plan
#[utoipa::path(
    get,
    path = "/sessions/{id}/geojson",
    tag = "midpoint",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "GeoJSON FeatureCollection"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn get_session_geojson(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match session_plan(&state, &id) {
        Some(plan) => {
            let collection = plan_to_feature_collection(&plan);
            (
                StatusCode::OK,
                Json(geojson::GeoJson::FeatureCollection(collection)),
            )
                .into_response()
        }
        None => session_not_found(&id),
    }
}

fn session_plan(state: &AppState, id: &str) -> Option<MeetingPlan> {
    state
        .sessions
        .get(id)
        .and_then(|session| session.plan().cloned())
}

fn session_not_found(id: &str) -> Response {
    tracing::debug!(session_id = id, "Session not found");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("No plan for session '{}'", id))),
    )
        .into_response()
}

/// Create an error response for a failed plan.
fn error_response(e: MeetpointError) -> Response {
    let status = match &e {
        MeetpointError::EmptyInput
        | MeetpointError::InvalidCoordinate { .. }
        | MeetpointError::InvalidPlusCode { .. }
        | MeetpointError::InvalidCodeLength { .. } => StatusCode::BAD_REQUEST,
        MeetpointError::NoValidCoordinates { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!(error = %e, status = status.as_u16(), "Midpoint request failed");

    let error = e.to_string();
    let failures = match e {
        MeetpointError::NoValidCoordinates { failures } => {
            failures.into_iter().map(CodeFailure::from).collect()
        }
        _ => Vec::new(),
    };

    (status, Json(ErrorResponse { error, failures })).into_response()
}

/// Health check endpoint.
///
/// Returns service status, version and backend.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.planner.backend().to_string(),
    })
}

/// Get cache and session statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Cache and session statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.planner.cache_stats();

    Json(StatsResponse {
        cached_codes: stats.entry_count,
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
        sessions: state.sessions.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_request_codes() {
        let json = r#"{"codes": [" A ", ""], "text": "B\n\n C \n"}"#;
        let request: MidpointRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.codes(), vec!["A", "B", "C"]);
        assert!(request.session_id.is_none());
    }

    #[test]
    fn test_midpoint_request_empty() {
        let request: MidpointRequest = serde_json::from_str("{}").unwrap();
        assert!(request.codes().is_empty());
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("No location codes")).unwrap();
        assert!(json.contains("No location codes"));
        assert!(!json.contains("failures"));
    }

    #[test]
    fn test_health_response_serialize() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            backend: "offline".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
        assert!(json.contains("offline"));
    }
}
