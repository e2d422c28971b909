use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest},
        extractors::{require_auth, AuthUser},
        jwt::JwtKeys,
        services::{is_valid_email, normalize_email, CredentialStore},
    },
    error::ApiError,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn validate_register(payload: &RegisterRequest) -> Result<(), ApiError> {
    if !is_valid_email(&normalize_email(&payload.email)) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if payload.name.trim().chars().count() < MIN_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "name must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let Json(payload) = payload?;
    if let Err(e) = validate_register(&payload) {
        warn!(error = %e, "registration rejected");
        return Err(e);
    }

    let creds = CredentialStore::from_ref(&state);
    let user = creds
        .register(&payload.email, &payload.name, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    if !is_valid_email(&normalize_email(&payload.email)) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    let creds = CredentialStore::from_ref(&state);
    let user = creds.authenticate(&payload.email, &payload.password).await?;

    let token = JwtKeys::from_ref(&state).issue(user.id)?;
    Ok(Json(LoginResponse { token }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}
