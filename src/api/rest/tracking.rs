use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::tracking::session::{TrackingSession, load_route};
use crate::tracking::view::TrackingView;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tracking/:order_id",
            post(open_session).get(get_session).delete(close_session),
        )
        .route("/tracking/:order_id/route", post(retry_route))
        .route("/tracking/:order_id/simulation", post(start_simulation))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSimulationRequest {
    /// Identity sent with the terminal status update. Falls back to the
    /// configured `ACTOR_ID`.
    pub actor_id: Option<Uuid>,
}

fn session_not_found(order_id: u64) -> AppError {
    AppError::NotFound(format!("no tracking session for order {order_id}"))
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
) -> Result<Json<TrackingView>, AppError> {
    if state.sessions.contains_key(&order_id) {
        return Err(AppError::Conflict(format!(
            "order {order_id} is already being tracked"
        )));
    }

    let session = TrackingSession::open(&state.tracking, order_id).await?;
    let view = session.view();

    match state.sessions.entry(order_id) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "order {order_id} is already being tracked"
            )));
        }
        Entry::Vacant(slot) => {
            slot.insert(session);
        }
    }

    if let Err(err) = load_route(&state.tracking, &view).await {
        debug!(order_id, error = %err, "session opened without a route");
    }

    let snapshot = view.borrow().clone();
    Ok(Json(snapshot))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
) -> Result<Json<TrackingView>, AppError> {
    let session = state
        .sessions
        .get(&order_id)
        .ok_or_else(|| session_not_found(order_id))?;

    Ok(Json(session.snapshot()))
}

async fn retry_route(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
) -> Result<Json<TrackingView>, AppError> {
    let view = state
        .sessions
        .get(&order_id)
        .map(|session| session.view())
        .ok_or_else(|| session_not_found(order_id))?;

    load_route(&state.tracking, &view).await?;

    let snapshot = view.borrow().clone();
    Ok(Json(snapshot))
}

async fn start_simulation(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
    payload: Result<Json<StartSimulationRequest>, JsonRejection>,
) -> Result<Json<TrackingView>, AppError> {
    // A bodiless start is allowed; anything sent as JSON must parse.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => StartSimulationRequest::default(),
        Err(rejection) => {
            return Err(AppError::BadRequest(format!(
                "invalid start request: {}",
                rejection.body_text()
            )));
        }
    };
    let actor_id = request.actor_id.unwrap_or(state.tracking.actor_id);

    let mut session = state
        .sessions
        .get_mut(&order_id)
        .ok_or_else(|| session_not_found(order_id))?;

    session.start_simulation(&state.tracking, actor_id)?;

    Ok(Json(session.snapshot()))
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(&order_id)
        .ok_or_else(|| session_not_found(order_id))?;

    Ok(StatusCode::NO_CONTENT)
}
