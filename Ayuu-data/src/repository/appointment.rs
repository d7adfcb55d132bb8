use async_trait::async_trait;
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::appointment::{Appointment, CreateAppointmentRequest};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for appointments
#[async_trait]
pub trait AppointmentRepositoryTrait: Send + Sync {
    /// Create an appointment; the repository assigns the id and the day's next token
    async fn create(&self, request: CreateAppointmentRequest) -> Result<Appointment, RepositoryError>;

    /// Get an appointment by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Appointment>, RepositoryError>;

    /// All appointments for a day (YYYY-MM-DD), ordered by token
    async fn list_by_date(&self, date: &str) -> Result<Vec<Appointment>, RepositoryError>;

    /// All appointments for a patient
    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, RepositoryError>;

    /// Persist a modified appointment
    async fn update(&self, appointment: Appointment) -> Result<Appointment, RepositoryError>;
}

/// Repository for appointments.
///
/// Backed by SQLite when a pool is supplied, otherwise by process memory.
#[derive(Debug, Clone, Default)]
pub struct AppointmentRepository {
    pool: Option<DatabasePool>,
    storage: InMemoryStorage,
}

impl AppointmentRepository {
    /// Create a new repository
    pub fn new(pool: Option<DatabasePool>) -> Self {
        Self {
            pool,
            storage: InMemoryStorage::new(),
        }
    }

    /// Create a repository that never touches a database
    pub fn in_memory() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentRepositoryTrait for AppointmentRepository {
    async fn create(&self, request: CreateAppointmentRequest) -> Result<Appointment, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::insert_appointment(pool, request).await,
            None => {
                debug!("No database configured, storing appointment in memory");
                self.storage.insert_appointment(request).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Appointment>, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::get_appointment(pool, id).await,
            None => self.storage.get_appointment(id).await,
        }
    }

    async fn list_by_date(&self, date: &str) -> Result<Vec<Appointment>, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::list_appointments_by_date(pool, date).await,
            None => self.storage.list_appointments_by_date(date).await,
        }
    }

    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::list_appointments_by_patient(pool, patient_id).await,
            None => self.storage.list_appointments_by_patient(patient_id).await,
        }
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::update_appointment(pool, appointment).await,
            None => self.storage.update_appointment(appointment).await,
        }
    }
}
