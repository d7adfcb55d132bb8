use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Registers the bearer scheme referenced by the protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Auth endpoints
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::refresh,
        crate::api::handlers::auth::roles,
        crate::api::handlers::auth::availability,
        crate::api::handlers::auth::sign_up,
        crate::api::handlers::auth::me,

        // Patient endpoints
        crate::api::handlers::patients::register_patient,
        crate::api::handlers::patients::search_patients,
        crate::api::handlers::patients::get_patient,

        // Appointment endpoints
        crate::api::handlers::appointments::book_appointment,
        crate::api::handlers::appointments::list_appointments,
        crate::api::handlers::appointments::get_appointment,
        crate::api::handlers::appointments::update_status,
        crate::api::handlers::appointments::record_vitals,
        crate::api::handlers::appointments::live_queue,

        // Vitals endpoints
        crate::api::handlers::vitals::vital_ranges,
        crate::api::handlers::vitals::assess_vitals,

        // Notification endpoints
        crate::api::handlers::notifications::list_notifications,
        crate::api::handlers::notifications::mark_notification_read,
    ),
    components(
        schemas(
            // Common entities
            crate::entities::common::ErrorResponse,
            crate::entities::common::PaginationParams,
            crate::entities::common::AppointmentPage,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Auth schemas
            ayuu_domain::auth::LoginRequest,
            ayuu_domain::auth::LoginResponse,
            ayuu_domain::auth::SignUpRequest,
            ayuu_domain::auth::UserInfo,
            ayuu_domain::auth::directory::RoleInfo,
            ayuu_domain::auth::directory::UserAccount,
            ayuu_domain::entities::Role,
            crate::entities::auth::RefreshRequest,
            crate::entities::auth::AvailabilityResponse,

            // Patients
            ayuu_domain::entities::Patient,
            ayuu_domain::entities::RegisterPatientRequest,

            // Appointments
            ayuu_domain::entities::Appointment,
            ayuu_domain::entities::AppointmentStatus,
            ayuu_domain::entities::BookAppointmentRequest,
            ayuu_domain::entities::UpdateStatusRequest,
            ayuu_domain::entities::VitalsOutcome,
            ayuu_domain::entities::LiveQueue,
            ayuu_domain::entities::QueueEntry,
            ayuu_domain::entities::QueueSummary,

            // Vitals and risk
            ayuu_domain::entities::VitalsEntry,
            ayuu_domain::entities::VitalsRecord,
            ayuu_domain::entities::VitalReading,
            ayuu_domain::entities::Temperature,
            ayuu_domain::entities::TemperatureUnit,
            ayuu_domain::entities::VitalRanges,
            ayuu_domain::entities::VitalRange,
            ayuu_domain::entities::CriticalBounds,
            ayuu_domain::entities::VitalsClassification,
            ayuu_domain::entities::VitalStatus,
            ayuu_domain::entities::AgeBand,
            ayuu_domain::entities::CardiovascularRiskAssessment,
            ayuu_domain::entities::RiskFactors,
            ayuu_domain::entities::RiskLevel,
            crate::entities::vitals::AssessmentRequest,
            crate::entities::vitals::AssessmentResponse,

            // Notifications
            ayuu_domain::entities::Notification,
            ayuu_domain::entities::NotificationKind,
            crate::api::handlers::notifications::NotificationFeed,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Sign-in, sign-up and tokens"),
        (name = "patients", description = "Patient registration and search"),
        (name = "appointments", description = "Booking, status changes, vitals intake and the live queue"),
        (name = "vitals", description = "Reference ranges and ad-hoc risk assessment"),
        (name = "notifications", description = "Critical vitals alerts")
    ),
    info(
        title = "Ayuu API",
        version = "0.1.0",
        description = "Front desk API for the Ayuu clinic",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "Ayuu API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().expect("tags are defined");
        assert!(tags.iter().any(|tag| tag.name == "appointments"));

        for path in [
            "/health",
            "/auth/login",
            "/api/v1/patients",
            "/api/v1/appointments/{id}/vitals",
            "/api/v1/queue",
            "/api/v1/notifications/{id}/read",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components are defined");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
