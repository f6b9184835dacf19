//! Routes for session management.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::{Json, Router, routing::get, routing::post};
use serde::Serialize;
use storyhall_memory::campaign::CampaignSnapshot;
use storyhall_session::application::query_handlers::SessionView;
use storyhall_session::domain::aggregates::SessionId;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /session/create.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// The new session's identifier.
    pub session_id: SessionId,
    /// Link participants open to join.
    pub join_url: String,
    /// `join_url` as a QR image data URL.
    pub qr_code: String,
}

/// Response body for GET /session/{id}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    /// The session identifier.
    pub session_id: SessionId,
    /// Participants on the roster.
    pub player_count: usize,
    /// Whether participants may join.
    pub is_active: bool,
}

impl From<SessionView> for SessionInfoResponse {
    fn from(view: SessionView) -> Self {
        Self {
            session_id: view.session_id,
            player_count: view.player_count,
            is_active: view.is_active,
        }
    }
}

fn join_base(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.public_base_url {
        return base.clone();
    }
    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map_or_else(|| state.local_base_url.clone(), |host| format!("http://{host}"))
}

/// POST /session/create
#[instrument(skip(state, headers))]
async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let session_id = SessionId::from(Uuid::new_v4());
    let join_url = format!("{}/join/{session_id}", join_base(&state, &headers));
    let qr_code = state.qr.render(&join_url)?;

    state.router.create_session(session_id.clone())?;
    info!(%session_id, %join_url, "session created over HTTP");

    Ok(Json(CreateSessionResponse {
        session_id,
        join_url,
        qr_code,
    }))
}

/// GET /session/{id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionInfoResponse>, ApiError> {
    let view = state.router.session(&session_id)?;
    Ok(Json(view.into()))
}

/// GET /session/{id}/campaign
#[instrument(skip(state))]
async fn get_campaign(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CampaignSnapshot>, ApiError> {
    Ok(Json(state.router.campaign(&session_id)?))
}

/// DELETE /session/{id}
#[instrument(skip(state))]
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.router.delete_session(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /sessions
async fn list_sessions(State(state): State<AppState>) -> Result<Json<Vec<SessionView>>, ApiError> {
    Ok(Json(state.router.sessions()?))
}

/// Returns the router for session management.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session/create", post(create_session))
        .route("/session/{id}", get(get_session).delete(delete_session))
        .route("/session/{id}/campaign", get(get_campaign))
        .route("/sessions", get(list_sessions))
}
