use thiserror::Error;
use tracing::{error, info, warn};
use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use validator::Validate;
use async_trait::async_trait;

use ayuu_data::repository::{PatientRepositoryTrait, RepositoryError};

use crate::entities::conversions;
use crate::entities::patient::{Patient, RegisterPatientRequest};
use crate::services::validation_message;

/// Attempts at finding an unused MR number before giving up
const MR_NUMBER_ATTEMPTS: usize = 10;

/// Patient service errors
#[derive(Debug, Error)]
pub enum PatientServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Not found error
    #[error("Patient not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Generate a medical record number: `MR`, two-digit year, two-digit month,
/// four random digits.
pub fn generate_mr_number<G: Rng + ?Sized>(today: NaiveDate, rng: &mut G) -> String {
    format!(
        "MR{:02}{:02}{:04}",
        today.year() % 100,
        today.month(),
        rng.gen_range(0..10_000)
    )
}

/// Trait for patient service operations
#[async_trait]
pub trait PatientServiceTrait: Send + Sync {
    /// Register a new patient with a fresh MR number
    async fn register_patient(&self, request: RegisterPatientRequest) -> Result<Patient, PatientServiceError>;

    /// Get a patient by ID
    async fn get_patient(&self, id: &str) -> Result<Patient, PatientServiceError>;

    /// Search patients by name, phone or MR number
    async fn search_patients(&self, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, PatientServiceError>;

    /// Age in years of a patient today
    async fn patient_age(&self, id: &str) -> Result<i32, PatientServiceError>;
}

/// Patient service for domain logic
pub struct PatientService<R: PatientRepositoryTrait> {
    repository: R,
}

impl<R: PatientRepositoryTrait> PatientService<R> {
    /// Create a new patient service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> PatientServiceError {
        match err {
            RepositoryError::NotFound(msg) => PatientServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => PatientServiceError::ValidationError(msg),
            RepositoryError::Conflict(msg) => PatientServiceError::Conflict(msg),
            _ => PatientServiceError::RepositoryError(err.to_string()),
        }
    }

    async fn unused_mr_number(&self) -> Result<String, PatientServiceError> {
        let today = Utc::now().date_naive();
        for _ in 0..MR_NUMBER_ATTEMPTS {
            let candidate = generate_mr_number(today, &mut rand::thread_rng());
            let existing = self
                .repository
                .get_by_mr_number(&candidate)
                .await
                .map_err(|e| self.map_repo_error(e))?;
            if existing.is_none() {
                return Ok(candidate);
            }
            warn!("MR number {} already taken, retrying", candidate);
        }

        Err(PatientServiceError::Conflict(
            "Could not allocate a unique MR number".to_string(),
        ))
    }
}

#[async_trait]
impl<R: PatientRepositoryTrait> PatientServiceTrait for PatientService<R> {
    async fn register_patient(&self, request: RegisterPatientRequest) -> Result<Patient, PatientServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(PatientServiceError::ValidationError(validation_message(&validation_errors)));
        }
        if request.full_name.trim().is_empty() {
            return Err(PatientServiceError::ValidationError(
                "full_name: Full name is required".to_string(),
            ));
        }
        if request.date_of_birth > Utc::now().date_naive() {
            return Err(PatientServiceError::ValidationError(
                "date_of_birth: Date of birth cannot be in the future".to_string(),
            ));
        }

        let mr_number = self.unused_mr_number().await?;
        let create_request = conversions::convert_to_data_create_patient(&request, &mr_number);

        let stored = self.repository.create(create_request).await.map_err(|e| {
            error!("Failed to register patient: {}", e);
            self.map_repo_error(e)
        })?;

        info!("Registered patient {} with MR number {}", stored.id, stored.mr_number);
        conversions::convert_to_domain_patient(stored).map_err(PatientServiceError::RepositoryError)
    }

    async fn get_patient(&self, id: &str) -> Result<Patient, PatientServiceError> {
        let stored = self
            .repository
            .get_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| PatientServiceError::NotFound(id.to_string()))?;

        conversions::convert_to_domain_patient(stored).map_err(PatientServiceError::RepositoryError)
    }

    async fn search_patients(&self, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, PatientServiceError> {
        let stored = self
            .repository
            .search(query.trim(), limit)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        // Skip rows that no longer parse rather than failing the whole search
        Ok(stored
            .into_iter()
            .filter_map(|p| match conversions::convert_to_domain_patient(p) {
                Ok(patient) => Some(patient),
                Err(e) => {
                    warn!("Skipping unreadable patient record: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn patient_age(&self, id: &str) -> Result<i32, PatientServiceError> {
        let patient = self.get_patient(id).await?;
        Ok(patient.age_on(Utc::now().date_naive()))
    }
}
