//! Session endpoints: parameters, clock, field data and antenna mesh

use crate::error::AppError;
use crate::state::AppState;
use antenna_field::{
    build_antenna, default_grid, render::field_svg, ParameterUpdate, Session, SessionSummary,
    SimulationParameters, SpatialSample,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const SESSION_HEADER: &str = "x-session-id";

const FRAME_WIDTH: u32 = 800;
const FRAME_HEIGHT: u32 = 400;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametersResponse {
    pub session_id: String,
    pub parameters: SimulationParameters,
}

#[derive(Debug, Deserialize)]
pub struct TimeRequest {
    pub time: f64,
}

#[derive(Debug, Serialize)]
pub struct TimeResponse {
    pub time: f64,
    pub amplitude: f64,
    pub current: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct FieldRequest {
    #[serde(default)]
    pub points: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    pub time: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub time: f64,
    pub amplitude: f64,
    pub current: f64,
    pub vectors: Vec<[f64; 3]>,
}

/// Copy of a session for evaluation off the store lock
async fn snapshot(state: &AppState, id: &str) -> Result<Session, AppError> {
    state
        .sessions
        .snapshot(id)
        .await
        .ok_or_else(|| AppError::session_not_found(id))
}

/// POST /update-parameters
///
/// With an `X-Session-Id` header the update applies to that session;
/// without one a fresh session is created from the defaults plus the update.
pub async fn update_parameters(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ParameterUpdate>, JsonRejection>,
) -> Result<Json<ParametersResponse>, AppError> {
    let Json(update) = payload?;

    let (session_id, parameters) = match headers.get(SESSION_HEADER) {
        Some(value) => {
            let id = value
                .to_str()
                .map_err(|_| AppError::bad_request("Malformed session id header"))?
                .to_string();
            let parameters = state
                .sessions
                .write(&id, |s| s.update_parameters(&update).copied())
                .await
                .ok_or_else(|| AppError::session_not_found(&id))??;
            (id, parameters)
        }
        None => {
            let mut session = Session::new();
            let parameters = *session.update_parameters(&update)?;
            (state.sessions.insert(session).await, parameters)
        }
    };

    Ok(Json(ParametersResponse {
        session_id,
        parameters,
    }))
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    state
        .sessions
        .read(&id, Session::summary)
        .await
        .map(Json)
        .ok_or_else(|| AppError::session_not_found(&id))
}

/// DELETE /sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::session_not_found(&id))
    }
}

/// POST /sessions/:id/time
pub async fn set_time(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<TimeRequest>, JsonRejection>,
) -> Result<Json<TimeResponse>, AppError> {
    let Json(request) = payload?;
    state
        .sessions
        .write(&id, |s| {
            let time = s.set_time(request.time);
            TimeResponse {
                time,
                amplitude: s.amplitude(),
                current: s.drive_current(),
            }
        })
        .await
        .map(Json)
        .ok_or_else(|| AppError::session_not_found(&id))
}

/// POST /sessions/:id/field
///
/// Evaluates caller-supplied points (default grid when omitted) at the
/// clock time, or at `time` without moving the clock. The batch runs on a
/// blocking thread against a snapshot of the session.
pub async fn evaluate_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<FieldRequest>, JsonRejection>,
) -> Result<Json<FieldResponse>, AppError> {
    let Json(request) = payload?;
    let points: Vec<SpatialSample> = match request.points {
        Some(points) => points
            .into_iter()
            .map(|[x, y, z]| SpatialSample::new(x, y, z))
            .collect(),
        None => default_grid(),
    };

    let session = snapshot(&state, &id).await?;
    let frame = tokio::task::spawn_blocking(move || {
        let time = request.time.unwrap_or(session.current_time());
        session.evaluate_at(&points, time)
    })
    .await??;

    Ok(Json(FieldResponse {
        time: frame.time,
        amplitude: frame.amplitude,
        current: frame.current,
        vectors: frame.vectors.iter().map(|v| [v.x, v.y, v.z]).collect(),
    }))
}

/// GET /sessions/:id/field: binary frame over the default grid at the clock time
pub async fn field_binary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = snapshot(&state, &id).await?;
    let frame = tokio::task::spawn_blocking(move || session.frame(&default_grid())).await??;

    let binary = frame.to_binary();
    info!("Field frame: {} points, {} bytes", frame.points.len(), binary.len());
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], binary))
}

/// GET /sessions/:id/frame.svg
pub async fn frame_svg(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = snapshot(&state, &id).await?;
    let svg = tokio::task::spawn_blocking(move || -> Result<String, AppError> {
        let frame = session.frame(&antenna_field::preview_grid())?;
        Ok(field_svg(&frame, session.parameters(), FRAME_WIDTH, FRAME_HEIGHT)?)
    })
    .await??;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// GET /sessions/:id/antenna: binary display mesh for the session's antenna
pub async fn antenna_mesh(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let params = state
        .sessions
        .read(&id, |s| *s.parameters())
        .await
        .ok_or_else(|| AppError::session_not_found(&id))?;

    let mesh = build_antenna(&params);
    info!(
        "Antenna mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], mesh.to_binary()))
}
