//! Mock repositories for testing services without a database.
//!
//! Each mock keeps real in-memory state and can be switched into a failing
//! mode to exercise error paths upstream.

use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;

use crate::models::appointment::{Appointment, CreateAppointmentRequest};
use crate::models::patient::{CreatePatientRequest, Patient};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::{AppointmentRepositoryTrait, PatientRepositoryTrait};

fn simulated_failure() -> RepositoryError {
    RepositoryError::Database("simulated database failure".to_string().into())
}

/// Mock implementation of the appointment repository
#[derive(Debug, Default)]
pub struct MockAppointmentRepository {
    storage: InMemoryStorage,
    fail: AtomicBool,
}

impl MockAppointmentRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock repository where every call fails
    pub fn failing() -> Self {
        let repo = Self::default();
        repo.set_failing(true);
        repo
    }

    /// Toggle failure mode
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentRepositoryTrait for MockAppointmentRepository {
    async fn create(&self, request: CreateAppointmentRequest) -> Result<Appointment, RepositoryError> {
        self.check()?;
        self.storage.insert_appointment(request).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Appointment>, RepositoryError> {
        self.check()?;
        self.storage.get_appointment(id).await
    }

    async fn list_by_date(&self, date: &str) -> Result<Vec<Appointment>, RepositoryError> {
        self.check()?;
        self.storage.list_appointments_by_date(date).await
    }

    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, RepositoryError> {
        self.check()?;
        self.storage.list_appointments_by_patient(patient_id).await
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, RepositoryError> {
        self.check()?;
        self.storage.update_appointment(appointment).await
    }
}

/// Mock implementation of the patient repository
#[derive(Debug, Default)]
pub struct MockPatientRepository {
    storage: InMemoryStorage,
    fail: AtomicBool,
}

impl MockPatientRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock repository where every call fails
    pub fn failing() -> Self {
        let repo = Self::default();
        repo.set_failing(true);
        repo
    }

    /// A second handle on the same records, with its own failure flag
    pub fn sharing(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            fail: AtomicBool::new(false),
        }
    }

    /// Toggle failure mode
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl PatientRepositoryTrait for MockPatientRepository {
    async fn create(&self, request: CreatePatientRequest) -> Result<Patient, RepositoryError> {
        self.check()?;
        self.storage.insert_patient(request).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Patient>, RepositoryError> {
        self.check()?;
        self.storage.get_patient(id).await
    }

    async fn get_by_mr_number(&self, mr_number: &str) -> Result<Option<Patient>, RepositoryError> {
        self.check()?;
        self.storage.get_patient_by_mr_number(mr_number).await
    }

    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, RepositoryError> {
        self.check()?;
        self.storage.search_patients(query, limit).await
    }
}
