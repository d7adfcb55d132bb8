use std::sync::{Arc, Mutex};
use std::collections::HashMap;
use chrono::Utc;
use uuid::Uuid;

use crate::models::appointment::{Appointment, CreateAppointmentRequest};
use crate::models::patient::{CreatePatientRequest, Patient};
use super::errors::RepositoryError;

/// In-memory storage for patients and appointments.
///
/// Clones share the same maps, so a cloned repository sees every write.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    patients: Arc<Mutex<HashMap<String, Patient>>>,
    appointments: Arc<Mutex<HashMap<String, Appointment>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new patient; MR numbers must be unique
    pub async fn insert_patient(&self, request: CreatePatientRequest) -> Result<Patient, RepositoryError> {
        let mut store = self.patients.lock()?;

        if store.values().any(|p| p.mr_number == request.mr_number) {
            return Err(RepositoryError::Conflict(format!("MR number {} already exists", request.mr_number)));
        }

        let patient = Patient {
            id: Uuid::new_v4().to_string(),
            mr_number: request.mr_number,
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            date_of_birth: request.date_of_birth,
            address: request.address,
            emergency_contact: request.emergency_contact,
            created_at: Utc::now(),
        };
        store.insert(patient.id.clone(), patient.clone());
        Ok(patient)
    }

    /// Get a patient by ID
    pub async fn get_patient(&self, id: &str) -> Result<Option<Patient>, RepositoryError> {
        let store = self.patients.lock()?;
        Ok(store.get(id).cloned())
    }

    /// Get a patient by MR number
    pub async fn get_patient_by_mr_number(&self, mr_number: &str) -> Result<Option<Patient>, RepositoryError> {
        let store = self.patients.lock()?;
        Ok(store.values().find(|p| p.mr_number == mr_number).cloned())
    }

    /// Case-insensitive search over name, phone and MR number, ordered by name
    pub async fn search_patients(&self, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, RepositoryError> {
        let store = self.patients.lock()?;
        let needle = query.trim().to_lowercase();

        let mut patients: Vec<Patient> = store
            .values()
            .filter(|p| {
                needle.is_empty()
                    || p.full_name.to_lowercase().contains(&needle)
                    || p.phone.contains(&needle)
                    || p.mr_number.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        patients.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        if let Some(limit) = limit {
            patients.truncate(limit);
        }
        Ok(patients)
    }

    /// Store a new appointment with the next token for its day
    pub async fn insert_appointment(&self, request: CreateAppointmentRequest) -> Result<Appointment, RepositoryError> {
        let mut store = self.appointments.lock()?;

        let next_token = store
            .values()
            .filter(|a| a.appointment_date == request.appointment_date)
            .filter_map(|a| a.token_number)
            .max()
            .unwrap_or(0)
            + 1;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            token_number: Some(next_token),
            patient_id: request.patient_id,
            patient_name: request.patient_name,
            mr_number: request.mr_number,
            doctor_id: request.doctor_id,
            doctor_name: request.doctor_name,
            appointment_slot: request.appointment_slot,
            appointment_date: request.appointment_date,
            status: "scheduled".to_string(),
            vitals: None,
            diagnosis: None,
            created_at: now,
            updated_at: now,
        };
        store.insert(appointment.id.clone(), appointment.clone());
        Ok(appointment)
    }

    /// Get an appointment by ID
    pub async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, RepositoryError> {
        let store = self.appointments.lock()?;
        Ok(store.get(id).cloned())
    }

    /// Appointments for one day, ordered by token
    pub async fn list_appointments_by_date(&self, date: &str) -> Result<Vec<Appointment>, RepositoryError> {
        let store = self.appointments.lock()?;
        let mut appointments: Vec<Appointment> = store
            .values()
            .filter(|a| a.appointment_date == date)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.token_number.unwrap_or(0));
        Ok(appointments)
    }

    /// Appointments for one patient, newest day first
    pub async fn list_appointments_by_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, RepositoryError> {
        let store = self.appointments.lock()?;
        let mut appointments: Vec<Appointment> = store
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| {
            b.appointment_date
                .cmp(&a.appointment_date)
                .then(a.token_number.cmp(&b.token_number))
        });
        Ok(appointments)
    }

    /// Replace a stored appointment
    pub async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment, RepositoryError> {
        let mut store = self.appointments.lock()?;
        match store.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(appointment)
            }
            None => Err(RepositoryError::NotFound(format!("Appointment {} not found", appointment.id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(date: &str, patient: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: patient.to_string(),
            patient_name: format!("Patient {}", patient),
            mr_number: format!("MR2401{:0>4}", patient),
            doctor_id: "doc-1".to_string(),
            doctor_name: "Dr. Rao".to_string(),
            appointment_slot: "09:00 AM".to_string(),
            appointment_date: date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_tokens_are_sequential_per_day() {
        let storage = InMemoryStorage::new();

        let first = storage.insert_appointment(booking("2024-03-01", "1")).await.unwrap();
        let second = storage.insert_appointment(booking("2024-03-01", "2")).await.unwrap();
        let other_day = storage.insert_appointment(booking("2024-03-02", "3")).await.unwrap();

        assert_eq!(first.token_number, Some(1));
        assert_eq!(second.token_number, Some(2));
        assert_eq!(other_day.token_number, Some(1));
        assert_eq!(first.status, "scheduled");
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let storage = InMemoryStorage::new();
        let clone = storage.clone();

        clone.insert_appointment(booking("2024-03-01", "1")).await.unwrap();

        let listed = storage.list_appointments_by_date("2024-03-01").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_mr_number_is_a_conflict() {
        let storage = InMemoryStorage::new();
        let request = CreatePatientRequest {
            mr_number: "MR24010001".to_string(),
            full_name: "Asha Menon".to_string(),
            email: None,
            phone: "9876543210".to_string(),
            date_of_birth: "1980-05-12".to_string(),
            address: None,
            emergency_contact: None,
        };

        storage.insert_patient(request.clone()).await.unwrap();
        let result = storage.insert_patient(request).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_missing_appointment_is_not_found() {
        let storage = InMemoryStorage::new();
        let mut appointment = storage.insert_appointment(booking("2024-03-01", "1")).await.unwrap();
        appointment.id = "missing".to_string();

        let result = storage.update_appointment(appointment).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
