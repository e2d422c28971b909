use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    auth::{repo_types::User, services::CredentialStore},
    error::ApiError,
    state::AppState,
};

/// Identity resolved by [`require_auth`], stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Gate for protected routes: bearer token → verified subject → existing user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("authorization header is required".into()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("bearer token is required".into()))?;

    let user_id = state.jwt.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        ApiError::from(e)
    })?;

    let creds = CredentialStore::from_ref(&state);
    let user = creds.find_user(user_id).await?.ok_or_else(|| {
        warn!(user_id, "token subject no longer exists");
        ApiError::Unauthorized("unauthorized access".into())
    })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// The authenticated caller; only available behind [`require_auth`].
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|CurrentUser(user)| AuthUser(user.clone()))
            .ok_or_else(|| ApiError::Unauthorized("unauthorized access".into()))
    }
}
