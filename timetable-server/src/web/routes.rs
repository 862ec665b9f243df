//! HTTP route handlers.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use futures::Stream;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::conflict::ConflictReport;
use crate::domain::{ClockTime, LocomotiveId, StationId, Train};
use crate::error::EngineError;
use crate::generation::{GenerationConfig, GenerationEvent, GenerationPreview};
use crate::repair::CapacityRepair;
use crate::service::{CallerRole, LocomotiveAvailability, TrainRequest};

use super::dto::*;
use super::state::AppState;

/// Header carrying the role granted by the authentication layer.
pub const ROLE_HEADER: &str = "x-caller-role";

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/routes/validate", get(validate_route))
        .route("/api/generation/preview", post(preview_generation))
        .route("/api/generation", post(generate))
        .route("/api/conflicts", get(check_conflicts))
        .route("/api/conflicts/resolve", post(resolve_conflicts))
        .route(
            "/api/trains",
            get(list_trains).post(create_train).delete(clear_all),
        )
        .route("/api/trains/auto", delete(clear_auto_generated))
        .route(
            "/api/locomotives/:id/availability",
            get(locomotive_availability),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The caller's role. Requests without the header are read-only.
fn caller_role(headers: &HeaderMap) -> Result<CallerRole, AppError> {
    let Some(value) = headers.get(ROLE_HEADER) else {
        return Ok(CallerRole::Viewer);
    };
    let value = value.to_str().map_err(|_| AppError::BadRequest {
        message: format!("{ROLE_HEADER} is not valid text"),
    })?;
    CallerRole::parse(value).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

fn station(param: &str, value: &str) -> Result<StationId, AppError> {
    StationId::parse_normalized(value).map_err(|e| AppError::BadRequest {
        message: format!("Invalid {param} station: {e}"),
    })
}

/// Find the route between two stations.
async fn validate_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<RouteQuery>,
) -> Result<Json<RouteResponse>, AppError> {
    let role = caller_role(&headers)?;
    let from = station("from", &req.from)?;
    let to = station("to", &req.to)?;

    let route = state.dispatcher.validate_route(role, from, to).await?;
    Ok(Json(RouteResponse::from_route(&route)))
}

/// Estimate a generation run.
async fn preview_generation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerationConfig>,
) -> Result<Json<GenerationPreview>, AppError> {
    let role = caller_role(&headers)?;
    Ok(Json(state.dispatcher.preview_generation(role, req).await?))
}

/// Run generation, streaming each outcome as a server-sent event.
///
/// Closing the connection cancels the remaining attempts.
async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerationConfig>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let role = caller_role(&headers)?;
    let mut events = state.dispatcher.generate(role, req).await?;

    let stream = async_stream::stream! {
        while let Some(event) = events.recv().await {
            let name = match &event {
                GenerationEvent::Progress { .. } => "progress",
                GenerationEvent::Finished { .. } => "finished",
            };
            match Event::default().event(name).json_data(&event) {
                Ok(sse) => {
                    yield Ok(sse);
                }
                Err(e) => warn!(error = %e, "failed to encode generation event"),
            }
        }
        debug!("generation stream closed");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}

/// Audit the timetable.
async fn check_conflicts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConflictReport>, AppError> {
    let role = caller_role(&headers)?;
    Ok(Json(state.dispatcher.check_conflicts(role).await?))
}

/// Remove trains from over-full stations.
async fn resolve_conflicts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CapacityRepair>, AppError> {
    let role = caller_role(&headers)?;
    Ok(Json(state.dispatcher.resolve_conflicts(role).await?))
}

async fn list_trains(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TrainListResponse>, AppError> {
    let role = caller_role(&headers)?;
    let trains = state.dispatcher.list_trains(role).await?;
    Ok(Json(TrainListResponse {
        trains: trains.iter().map(TrainSummary::from_train).collect(),
    }))
}

/// Create a single train.
async fn create_train(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TrainRequest>,
) -> Result<(StatusCode, Json<Train>), AppError> {
    let role = caller_role(&headers)?;
    let train = state.dispatcher.create_train(role, req).await?;
    Ok((StatusCode::CREATED, Json(train)))
}

async fn clear_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeletedResponse>, AppError> {
    let role = caller_role(&headers)?;
    let deleted = state.dispatcher.clear_all(role).await?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn clear_auto_generated(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeletedResponse>, AppError> {
    let role = caller_role(&headers)?;
    let deleted = state.dispatcher.clear_auto_generated(role).await?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn locomotive_availability(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Query(req): Query<AvailabilityQuery>,
) -> Result<Json<LocomotiveAvailability>, AppError> {
    let role = caller_role(&headers)?;
    let time = ClockTime::parse_hhmm(&req.time).map_err(|e| AppError::BadRequest {
        message: format!("Invalid time: {e}"),
    })?;

    let availability = state
        .dispatcher
        .locomotive_availability(role, LocomotiveId(id), time)
        .await?;
    Ok(Json(availability))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Engine(EngineError),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) | EngineError::ResourceUnavailable(_) => StatusCode::CONFLICT,
        EngineError::Forbidden { .. } => StatusCode::FORBIDDEN,
        EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    kind: "validation",
                    error: message,
                    conflicts: None,
                },
            ),
            AppError::Engine(e) => {
                let status = status_for(&e);
                if let EngineError::Persistence(source) = &e {
                    error!(error = %source, "request failed in the store");
                }
                let kind = e.kind();
                let error = e.to_string();
                let conflicts = match e {
                    EngineError::Conflict(conflicts) => Some(conflicts),
                    _ => None,
                };
                (
                    status,
                    ErrorResponse {
                        kind,
                        error,
                        conflicts,
                    },
                )
            }
        };

        debug!(%status, kind = body.kind, error = %body.error, "request rejected");
        (status, Json(body)).into_response()
    }
}
