use std::sync::Arc;

use ayuu_data::database::DatabasePool;
use ayuu_domain::auth::directory::UserDirectory;
use ayuu_domain::auth::AuthConfig;
use ayuu_domain::health::{HealthService, HealthServiceTrait};
use ayuu_domain::services::{create_services, AppointmentServiceTrait, NotificationBus, PatientServiceTrait};

/// Shared handles every handler can reach
#[derive(Clone)]
pub struct AppState {
    pub patients: Arc<dyn PatientServiceTrait>,
    pub appointments: Arc<dyn AppointmentServiceTrait>,
    pub notifications: Arc<NotificationBus>,
    pub directory: Arc<dyn UserDirectory>,
    pub auth: Arc<AuthConfig>,
    pub health: Arc<dyn HealthServiceTrait>,
    /// Deployment label reported by the health endpoint
    pub environment: String,
}

impl AppState {
    /// Wire the domain services over the configured storage backend
    pub fn new(pool: Option<DatabasePool>, directory: Arc<dyn UserDirectory>, auth: AuthConfig) -> Self {
        let notifications = Arc::new(NotificationBus::new());
        let (patients, appointments) = create_services(pool.clone(), notifications.clone());

        Self {
            patients: Arc::new(patients),
            appointments: Arc::new(appointments),
            notifications,
            directory,
            auth: Arc::new(auth),
            health: Arc::new(HealthService::new(pool)),
            environment: "development".to_string(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}
