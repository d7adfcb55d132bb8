pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;

pub use state::AppState;

/// Create the application router over `state`
pub fn create_application(state: AppState) -> Router {
    routes::create_app(state)
}
