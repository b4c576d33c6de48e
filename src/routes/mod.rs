//! Route modules for the Elpriser server

pub mod admin;
pub mod annotations;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/annotations", annotations::router())
        .nest("/admin", admin::router())
        .with_state(state)
}
