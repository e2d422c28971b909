use axum::{
    extract::{rejection::PathRejection, FromRef, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    attendees::{repo_types::Attendee, services::AttendanceManager},
    auth::{
        dto::PublicUser,
        extractors::{require_auth, AuthUser},
    },
    error::ApiError,
    events::{handlers::load_for_change, repo_types::Event},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/events/:id/attendees", get(list_attendees))
        .route("/attendees/:id/events", get(list_events_for_attendee))
}

pub fn write_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/events/:id/attendees/:user_id",
            post(add_attendee).delete(remove_attendee),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[instrument(skip(state, actor))]
pub async fn add_attendee(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<(StatusCode, Json<Attendee>), ApiError> {
    let Path((event_id, user_id)) = ids?;
    // A missing event falls through to the manager's own not-found check.
    match load_for_change(&state, &actor, event_id).await {
        Ok(_) | Err(ApiError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let attendee = AttendanceManager::from_ref(&state)
        .add_attendee(event_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(attendee)))
}

#[instrument(skip(state, actor))]
pub async fn remove_attendee(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((event_id, user_id)) = ids?;
    match load_for_change(&state, &actor, event_id).await {
        Ok(_) | Err(ApiError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    AttendanceManager::from_ref(&state)
        .remove_attendee(user_id, event_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_attendees(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let Path(event_id) = id?;
    let users = AttendanceManager::from_ref(&state)
        .list_attendees_for_event(event_id)
        .await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_events_for_attendee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let Path(user_id) = id?;
    let events = AttendanceManager::from_ref(&state)
        .list_events_for_user(user_id)
        .await?;
    Ok(Json(events))
}
