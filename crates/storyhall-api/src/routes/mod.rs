//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod session;
pub mod ws;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(ws::router())
        .nest("/api", session::router())
        .with_state(state)
}
