use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{validate_event, EventRequest};
use crate::{
    auth::{
        extractors::{require_auth, AuthUser},
        repo_types::User,
    },
    error::ApiError,
    events::repo_types::Event,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/:id", get(get_event))
}

pub fn write_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/:id", put(update_event).delete(delete_event))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Load an event the caller is about to change: 404 if absent, 403 if the policy refuses.
pub(crate) async fn load_for_change(state: &AppState, actor: &User, id: i64) -> Result<Event, ApiError> {
    let event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".into()))?;
    if !state.policy.can_modify(actor, &event) {
        warn!(user_id = actor.id, event_id = id, owner_id = event.owner_id, "event change refused");
        return Err(ApiError::Forbidden("not allowed to modify this event".into()));
    }
    Ok(event)
}

#[instrument(skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.events.list().await?))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Event>, ApiError> {
    let Path(id) = id?;
    state
        .events
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("event not found".into()))
}

#[instrument(skip(state, user, body))]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let Json(body) = body?;
    validate_event(&body)?;

    let event = state.events.create(user.id, &body).await?;
    info!(event_id = event.id, owner_id = user.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(skip(state, user, body))]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    validate_event(&body)?;

    load_for_change(&state, &user, id).await?;
    let event = state
        .events
        .update(id, &body)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".into()))?;
    info!(event_id = id, user_id = user.id, "event updated");
    Ok(Json(event))
}

#[instrument(skip(state, user))]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    load_for_change(&state, &user, id).await?;
    if !state.events.delete(id).await? {
        return Err(ApiError::NotFound("event not found".into()));
    }
    info!(event_id = id, user_id = user.id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
