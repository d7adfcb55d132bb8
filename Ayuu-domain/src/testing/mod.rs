// Testing utilities and mock implementations for the domain layer
// This module is only available when the "mock" feature is enabled

// Re-export useful test mocks from the data layer
pub use ayuu_data::repository::tests::{MockAppointmentRepository, MockPatientRepository};

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;

use crate::auth::directory::{InMemoryUserDirectory, NewAccount, UserDirectory};
use crate::auth::AuthError;
use crate::entities::user::Role;
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::{AppointmentService, NotificationBus, PatientService};

/// Password given to every account created by [`seeded_directory`]
pub const TEST_PASSWORD: &str = "test-password";

/// Services over mock repositories that share one patient store
pub fn create_mock_services(
    notifications: Arc<NotificationBus>,
) -> (
    PatientService<MockPatientRepository>,
    AppointmentService<MockAppointmentRepository, MockPatientRepository>,
) {
    let patients = MockPatientRepository::new();
    (
        PatientService::new(patients.sharing()),
        AppointmentService::new(MockAppointmentRepository::new(), patients, notifications),
    )
}

/// Directory with one account per role, usernames `staff`, `doctor`, `admin`
pub async fn seeded_directory() -> Result<InMemoryUserDirectory, AuthError> {
    let directory = InMemoryUserDirectory::new();
    for role in Role::ALL {
        directory
            .create_account(NewAccount {
                username: role.as_str().to_string(),
                email: format!("{}@clinic.test", role.as_str()),
                password: TEST_PASSWORD.to_string(),
                full_name: format!("Test {}", role.display_name()),
                phone: None,
                role,
            })
            .await?;
    }
    Ok(directory)
}

/// Health service reporting a fixed status
#[derive(Debug, Clone)]
pub struct MockHealthService {
    status: SystemStatus,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    pub fn new() -> Self {
        Self { status: SystemStatus::Healthy }
    }

    pub fn with_status(status: SystemStatus) -> Self {
        Self { status }
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let component_status = match self.status {
            SystemStatus::Healthy => ComponentStatus::Healthy,
            SystemStatus::Degraded => ComponentStatus::Degraded,
            SystemStatus::Unhealthy => ComponentStatus::Unhealthy,
        };

        let mut components = HashMap::new();
        components.insert(
            "database".to_string(),
            HealthComponent { status: component_status, details: Some("mock".to_string()) },
        );

        SystemHealth { status: self.status.clone(), components }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.status {
            SystemStatus::Healthy => Ok(true),
            SystemStatus::Degraded => Ok(false),
            SystemStatus::Unhealthy => Err("mock database is down".to_string()),
        }
    }
}
