use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use ayuu_domain::auth::authorize::require_any_role;
use ayuu_domain::auth::{auth_middleware, configure_security};
use ayuu_domain::entities::Role;

use crate::api::handlers::{appointments, auth, health, notifications, patients, vitals};
use crate::api::state::AppState;
use crate::openapi::configure_swagger_routes;

const FRONT_DESK: &[Role] = &[Role::Staff, Role::Admin];
const CLINICAL: &[Role] = &[Role::Staff, Role::Doctor, Role::Admin];
const PHYSICIANS: &[Role] = &[Role::Doctor, Role::Admin];

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    // Registration and booking belong to the front desk
    let front_desk_routes = Router::new()
        .route("/patients", post(patients::register_patient))
        .route("/appointments", post(appointments::book_appointment))
        .layer(middleware::from_fn(require_any_role(FRONT_DESK)));

    let intake_routes = Router::new()
        .route("/appointments/:id/vitals", post(appointments::record_vitals))
        .layer(middleware::from_fn(require_any_role(CLINICAL)));

    let notification_routes = Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", post(notifications::mark_notification_read))
        .layer(middleware::from_fn(require_any_role(PHYSICIANS)));

    // Status changes are checked per transition by the appointment service
    let shared_routes = Router::new()
        .route("/patients", get(patients::search_patients))
        .route("/patients/:id", get(patients::get_patient))
        .route("/appointments", get(appointments::list_appointments))
        .route("/appointments/:id", get(appointments::get_appointment))
        .route("/appointments/:id/status", put(appointments::update_status))
        .route("/queue", get(appointments::live_queue))
        .route("/vitals/ranges", get(vitals::vital_ranges))
        .route("/vitals/assessment", post(vitals::assess_vitals));

    // Authentication must happen before authorization, so it is the outer layer
    let api_routes = Router::new()
        .merge(front_desk_routes)
        .merge(intake_routes)
        .merge(notification_routes)
        .merge(shared_routes)
        .layer(middleware::from_fn_with_state(state.auth.clone(), auth_middleware));

    debug!("API routes configured");

    let me_route = Router::new()
        .route("/auth/me", get(auth::me))
        .layer(middleware::from_fn_with_state(state.auth.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/roles", get(auth::roles))
        .route("/auth/availability", get(auth::availability))
        .route("/auth/signup", post(auth::sign_up));

    debug!("Public routes configured");

    let app = Router::new()
        .merge(public_routes)
        .merge(me_route)
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(configure_swagger_routes());

    debug!("Swagger UI merged");

    configure_security(app).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_groups() {
        assert!(!FRONT_DESK.contains(&Role::Doctor));
        assert!(!PHYSICIANS.contains(&Role::Staff));
        assert_eq!(CLINICAL.len(), Role::ALL.len());
    }
}
