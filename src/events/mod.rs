use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod policy;
pub mod repo;
pub mod repo_types;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes(state))
}
