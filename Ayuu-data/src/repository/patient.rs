use async_trait::async_trait;
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::patient::{CreatePatientRequest, Patient};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for registered patients
#[async_trait]
pub trait PatientRepositoryTrait: Send + Sync {
    /// Register a patient. Fails with `Conflict` if the MR number is taken.
    async fn create(&self, request: CreatePatientRequest) -> Result<Patient, RepositoryError>;

    /// Get a patient by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Patient>, RepositoryError>;

    /// Get a patient by MR number
    async fn get_by_mr_number(&self, mr_number: &str) -> Result<Option<Patient>, RepositoryError>;

    /// Search by name, phone or MR number
    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, RepositoryError>;
}

/// Repository for patients
#[derive(Debug, Clone, Default)]
pub struct PatientRepository {
    pool: Option<DatabasePool>,
    storage: InMemoryStorage,
}

impl PatientRepository {
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
impl PatientRepositoryTrait for PatientRepository {
    async fn create(&self, request: CreatePatientRequest) -> Result<Patient, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::insert_patient(pool, request).await,
            None => {
                debug!("No database configured, storing patient in memory");
                self.storage.insert_patient(request).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Patient>, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::get_patient(pool, id).await,
            None => self.storage.get_patient(id).await,
        }
    }

    async fn get_by_mr_number(&self, mr_number: &str) -> Result<Option<Patient>, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::get_patient_by_mr_number(pool, mr_number).await,
            None => self.storage.get_patient_by_mr_number(mr_number).await,
        }
    }

    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, RepositoryError> {
        match &self.pool {
            Some(pool) => DatabaseStorage::search_patients(pool, query, limit).await,
            None => self.storage.search_patients(query, limit).await,
        }
    }
}
