use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use chrono::{NaiveDate, Utc};
use validator::Validate;
use async_trait::async_trait;

use ayuu_data::models::appointment::CreateAppointmentRequest;
use ayuu_data::repository::{AppointmentRepositoryTrait, PatientRepositoryTrait, RepositoryError};

use crate::entities::appointment::{
    Appointment, AppointmentStatus, BookAppointmentRequest, LiveQueue, QueueEntry, UpdateStatusRequest,
    VitalsOutcome,
};
use crate::entities::conversions;
use crate::entities::patient::age_on;
use crate::entities::risk::RiskInput;
use crate::entities::user::CurrentUser;
use crate::entities::vitals::{VitalsEntry, VitalsRecord};
use crate::services::lifecycle::{self, TransitionError};
use crate::services::notifications::{critical_vitals_notification, NotificationBus};
use crate::services::risk::calculate_cardiovascular_risk;
use crate::services::validation_message;
use crate::services::vitals::{bmi_for, classify_reading, critical_warnings};

/// Bookable slots of a clinic day
pub const TIME_SLOTS: [&str; 12] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM", "04:00 PM", "04:30 PM",
];

/// Age used when neither the form nor the patient record gives one
pub const DEFAULT_PATIENT_AGE: i32 = 35;

/// Appointment service errors
#[derive(Debug, Error)]
pub enum AppointmentServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Not found error
    #[error("Appointment not found: {0}")]
    NotFound(String),

    /// The actor's role may not request this change
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// The status graph forbids this change
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Vitals entry for a completed visit
    #[error("{0}")]
    VitalsLocked(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<TransitionError> for AppointmentServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotPermitted { .. } => AppointmentServiceError::NotPermitted(err.to_string()),
            _ => AppointmentServiceError::InvalidTransition(err.to_string()),
        }
    }
}

/// Trait for appointment service operations
#[async_trait]
pub trait AppointmentServiceTrait: Send + Sync {
    /// Book an appointment for an existing patient
    async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentServiceError>;

    /// Get an appointment by ID
    async fn get_appointment(&self, id: &str) -> Result<Appointment, AppointmentServiceError>;

    /// Appointments of one day matching `search`, in display order
    async fn list_appointments(
        &self,
        date: NaiveDate,
        search: Option<String>,
    ) -> Result<Vec<Appointment>, AppointmentServiceError>;

    /// Change the status of an appointment on behalf of `actor`
    async fn update_status(
        &self,
        id: &str,
        request: UpdateStatusRequest,
        actor: &CurrentUser,
    ) -> Result<Appointment, AppointmentServiceError>;

    /// Record intake vitals, score them and advance the appointment
    async fn record_vitals(
        &self,
        id: &str,
        entry: VitalsEntry,
        actor: &CurrentUser,
    ) -> Result<VitalsOutcome, AppointmentServiceError>;

    /// The queue for one day with wait estimates
    async fn live_queue(&self, date: NaiveDate) -> Result<LiveQueue, AppointmentServiceError>;
}

/// Appointment service for domain logic
pub struct AppointmentService<A: AppointmentRepositoryTrait, P: PatientRepositoryTrait> {
    appointments: A,
    patients: P,
    notifications: Arc<NotificationBus>,
}

impl<A: AppointmentRepositoryTrait, P: PatientRepositoryTrait> AppointmentService<A, P> {
    /// Create a new appointment service
    pub fn new(appointments: A, patients: P, notifications: Arc<NotificationBus>) -> Self {
        Self { appointments, patients, notifications }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> AppointmentServiceError {
        match err {
            RepositoryError::NotFound(msg) => AppointmentServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => AppointmentServiceError::ValidationError(msg),
            _ => AppointmentServiceError::RepositoryError(err.to_string()),
        }
    }

    async fn load_day(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentServiceError> {
        let stored = self
            .appointments
            .list_by_date(&conversions::format_date(date))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(stored
            .into_iter()
            .filter_map(|a| match conversions::convert_to_domain_appointment(a) {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    warn!("Skipping unreadable appointment record: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn save(&self, appointment: &Appointment) -> Result<Appointment, AppointmentServiceError> {
        let stored = self
            .appointments
            .update(conversions::convert_to_data_appointment(appointment))
            .await
            .map_err(|e| {
                error!("Failed to update appointment {}: {}", appointment.id, e);
                self.map_repo_error(e)
            })?;

        conversions::convert_to_domain_appointment(stored).map_err(AppointmentServiceError::RepositoryError)
    }

    /// Form age, then the patient's date of birth, then the default
    async fn resolve_age(&self, entry: &VitalsEntry, appointment: &Appointment) -> i32 {
        if let Some(age) = entry.patient_age {
            return age;
        }

        match self.patients.get_by_id(&appointment.patient_id).await {
            Ok(Some(patient)) => match conversions::parse_date(&patient.date_of_birth) {
                Ok(dob) => return age_on(dob, Utc::now().date_naive()),
                Err(e) => warn!("Patient {} has an unreadable date of birth: {}", patient.id, e),
            },
            Ok(None) => warn!("Patient {} not found for age lookup", appointment.patient_id),
            Err(e) => warn!("Patient lookup failed for {}: {}", appointment.patient_id, e),
        }

        warn!("Using default age {} for appointment {}", DEFAULT_PATIENT_AGE, appointment.id);
        DEFAULT_PATIENT_AGE
    }
}

#[async_trait]
impl<A, P> AppointmentServiceTrait for AppointmentService<A, P>
where
    A: AppointmentRepositoryTrait,
    P: PatientRepositoryTrait,
{
    async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(AppointmentServiceError::ValidationError(validation_message(&validation_errors)));
        }
        if !TIME_SLOTS.contains(&request.appointment_slot.as_str()) {
            return Err(AppointmentServiceError::ValidationError(format!(
                "appointment_slot: {} is not a clinic slot",
                request.appointment_slot
            )));
        }

        let patient = self
            .patients
            .get_by_id(&request.patient_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| {
                AppointmentServiceError::ValidationError(format!("patient_id: Unknown patient {}", request.patient_id))
            })?;

        let create_request = CreateAppointmentRequest {
            patient_id: patient.id,
            patient_name: patient.full_name,
            mr_number: patient.mr_number,
            doctor_id: request.doctor_id,
            doctor_name: request.doctor_name,
            appointment_slot: request.appointment_slot,
            appointment_date: conversions::format_date(request.appointment_date),
        };

        let stored = self.appointments.create(create_request).await.map_err(|e| {
            error!("Failed to book appointment: {}", e);
            self.map_repo_error(e)
        })?;

        info!(
            "Booked appointment {} with token {:?} on {}",
            stored.id, stored.token_number, stored.appointment_date
        );
        conversions::convert_to_domain_appointment(stored).map_err(AppointmentServiceError::RepositoryError)
    }

    async fn get_appointment(&self, id: &str) -> Result<Appointment, AppointmentServiceError> {
        let stored = self
            .appointments
            .get_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| AppointmentServiceError::NotFound(id.to_string()))?;

        conversions::convert_to_domain_appointment(stored).map_err(AppointmentServiceError::RepositoryError)
    }

    async fn list_appointments(
        &self,
        date: NaiveDate,
        search: Option<String>,
    ) -> Result<Vec<Appointment>, AppointmentServiceError> {
        let mut appointments = self.load_day(date).await?;
        if let Some(term) = search.as_deref() {
            appointments.retain(|a| lifecycle::matches_search(a, term));
        }
        lifecycle::sort_for_display(&mut appointments);
        Ok(appointments)
    }

    async fn update_status(
        &self,
        id: &str,
        request: UpdateStatusRequest,
        actor: &CurrentUser,
    ) -> Result<Appointment, AppointmentServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(AppointmentServiceError::ValidationError(validation_message(&validation_errors)));
        }

        let mut appointment = self.get_appointment(id).await?;
        let next = lifecycle::transition(appointment.status, request.status, actor.role).map_err(|e| {
            warn!("User {} refused status change on {}: {}", actor.username, id, e);
            AppointmentServiceError::from(e)
        })?;

        info!(
            "User {} moved appointment {} from {} to {}",
            actor.username, id, appointment.status, next
        );
        appointment.status = next;
        if request.diagnosis.is_some() {
            appointment.diagnosis = request.diagnosis;
        }
        appointment.updated_at = Utc::now();

        self.save(&appointment).await
    }

    async fn record_vitals(
        &self,
        id: &str,
        entry: VitalsEntry,
        actor: &CurrentUser,
    ) -> Result<VitalsOutcome, AppointmentServiceError> {
        let mut appointment = self.get_appointment(id).await?;

        lifecycle::ensure_vitals_editable(&appointment)
            .map_err(|msg| AppointmentServiceError::VitalsLocked(msg.to_string()))?;

        if let Err(validation_errors) = entry.validate() {
            return Err(AppointmentServiceError::ValidationError(validation_message(&validation_errors)));
        }
        let reading = entry
            .to_reading()
            .map_err(|msg| AppointmentServiceError::ValidationError(msg.to_string()))?;

        let age = self.resolve_age(&entry, &appointment).await;
        let bmi = bmi_for(&reading);
        let assessment = calculate_cardiovascular_risk(&RiskInput::from_reading(&reading, age, bmi));
        let classification = classify_reading(&reading, age);
        let warnings = critical_warnings(&reading);

        appointment.vitals = Some(VitalsRecord {
            systolic: reading.systolic,
            diastolic: reading.diastolic,
            pulse: reading.pulse,
            temperature_c: (reading.temperature.as_celsius() * 10.0).round() / 10.0,
            spo2: reading.spo2,
            height_cm: reading.height_cm,
            weight_kg: reading.weight_kg,
            bmi,
            notes: reading.notes.clone(),
            risk_score: assessment.score,
            risk_level: assessment.level,
            taken_by: actor.username.clone(),
            taken_at: Utc::now(),
        });

        // A visit already with the doctor keeps its place
        if matches!(
            appointment.status,
            AppointmentStatus::Scheduled | AppointmentStatus::VitalsDone | AppointmentStatus::ReturnQueue
        ) {
            appointment.status = AppointmentStatus::VitalsDone;
        }
        appointment.updated_at = Utc::now();

        let appointment = self.save(&appointment).await?;
        info!(
            "Vitals recorded for appointment {} by {}: risk {} ({})",
            appointment.id, actor.username, assessment.score, assessment.level
        );

        let critical = reading.systolic > 180.0
            || matches!(reading.spo2, Some(spo2) if spo2 < 90.0)
            || !warnings.is_empty();
        if critical {
            let notification = self.notifications.add(critical_vitals_notification(
                &appointment.patient_name,
                &appointment.mr_number,
                Some(reading.systolic),
                reading.spo2,
                &warnings,
            ));
            warn!(
                "Critical vitals for {} ({}), notification {}",
                appointment.patient_name, appointment.mr_number, notification.id
            );
        }

        Ok(VitalsOutcome {
            appointment,
            assessment,
            classification,
            warnings,
            notified: critical,
        })
    }

    async fn live_queue(&self, date: NaiveDate) -> Result<LiveQueue, AppointmentServiceError> {
        let mut appointments = self.load_day(date).await?;
        lifecycle::sort_for_display(&mut appointments);

        let summary = lifecycle::queue_summary(&appointments);
        let entries = appointments
            .iter()
            .map(|a| QueueEntry {
                appointment: a.clone(),
                estimated_wait: lifecycle::estimated_wait(&appointments, a),
            })
            .collect();

        Ok(LiveQueue { date, summary, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayuu_data::models::patient::CreatePatientRequest;
    use ayuu_data::repository::tests::{MockAppointmentRepository, MockPatientRepository};
    use crate::entities::risk::RiskLevel;
    use crate::entities::user::Role;
    use crate::entities::vitals::TemperatureUnit;

    type TestService = AppointmentService<MockAppointmentRepository, MockPatientRepository>;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn staff() -> CurrentUser {
        CurrentUser::new("u-staff", "nurse.anu", Role::Staff, "Anu")
    }

    fn doctor() -> CurrentUser {
        CurrentUser::new("u-doc", "dr.rao", Role::Doctor, "Dr. Rao")
    }

    async fn service_with_patient() -> (TestService, Arc<NotificationBus>, String) {
        let patients = MockPatientRepository::new();
        let patient = patients
            .create(CreatePatientRequest {
                mr_number: "MR24030001".to_string(),
                full_name: "Asha Menon".to_string(),
                email: None,
                phone: "9876543210".to_string(),
                date_of_birth: "1980-05-12".to_string(),
                address: None,
                emergency_contact: None,
            })
            .await
            .unwrap();
        let bus = Arc::new(NotificationBus::new());
        let service = AppointmentService::new(MockAppointmentRepository::new(), patients, bus.clone());
        (service, bus, patient.id)
    }

    fn booking(patient_id: &str, slot: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id: patient_id.to_string(),
            doctor_id: "doc-1".to_string(),
            doctor_name: "Dr. Rao".to_string(),
            appointment_slot: slot.to_string(),
            appointment_date: day(),
        }
    }

    fn entry(systolic: f64, spo2: Option<f64>) -> VitalsEntry {
        VitalsEntry {
            systolic: Some(systolic),
            diastolic: Some(80.0),
            pulse: Some(72.0),
            temperature: Some(98.6),
            temperature_unit: TemperatureUnit::Fahrenheit,
            spo2,
            ..VitalsEntry::default()
        }
    }

    #[tokio::test]
    async fn test_booking_assigns_sequential_tokens() {
        let (service, _, patient_id) = service_with_patient().await;
        let first = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();
        let second = service.book_appointment(booking(&patient_id, "09:30 AM")).await.unwrap();

        assert_eq!(first.token_number, Some(1));
        assert_eq!(second.token_number, Some(2));
        assert_eq!(first.status, AppointmentStatus::Scheduled);
        assert_eq!(first.mr_number, "MR24030001");
        assert_eq!(first.patient_name, "Asha Menon");
    }

    #[tokio::test]
    async fn test_booking_validation() {
        let (service, _, patient_id) = service_with_patient().await;
        assert!(matches!(
            service.book_appointment(booking(&patient_id, "08:00 PM")).await,
            Err(AppointmentServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.book_appointment(booking("missing", "09:00 AM")).await,
            Err(AppointmentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_record_vitals_scores_and_advances() {
        let (service, bus, patient_id) = service_with_patient().await;
        let appointment = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();

        let outcome = service
            .record_vitals(&appointment.id, entry(120.0, Some(98.0)), &staff())
            .await
            .unwrap();

        assert_eq!(outcome.appointment.status, AppointmentStatus::VitalsDone);
        assert_eq!(outcome.assessment.level, RiskLevel::Low);
        assert!(outcome.warnings.is_empty());
        assert!(!outcome.notified);
        assert!(bus.list().is_empty());

        let vitals = outcome.appointment.vitals.unwrap();
        assert_eq!(vitals.temperature_c, 37.0);
        assert_eq!(vitals.taken_by, "nurse.anu");
    }

    #[tokio::test]
    async fn test_critical_vitals_notify() {
        let (service, bus, patient_id) = service_with_patient().await;
        let appointment = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();

        let outcome = service
            .record_vitals(&appointment.id, entry(190.0, Some(85.0)), &staff())
            .await
            .unwrap();

        assert!(outcome.notified);
        assert_eq!(outcome.warnings.len(), 2);
        let notifications = bus.list();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].mr_number, "MR24030001");
        assert!(notifications[0].message.contains("Systolic BP: 190 mmHg"));
    }

    #[tokio::test]
    async fn test_missing_fields_write_nothing() {
        let (service, _, patient_id) = service_with_patient().await;
        let appointment = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();

        let mut incomplete = entry(120.0, None);
        incomplete.pulse = None;
        let result = service.record_vitals(&appointment.id, incomplete, &staff()).await;
        assert!(matches!(result, Err(AppointmentServiceError::ValidationError(_))));

        let unchanged = service.get_appointment(&appointment.id).await.unwrap();
        assert_eq!(unchanged.status, AppointmentStatus::Scheduled);
        assert!(unchanged.vitals.is_none());
    }

    #[tokio::test]
    async fn test_completed_visit_locks_vitals() {
        let (service, _, patient_id) = service_with_patient().await;
        let appointment = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();

        service.record_vitals(&appointment.id, entry(120.0, None), &staff()).await.unwrap();
        for status in [AppointmentStatus::WithDoctor, AppointmentStatus::Completed] {
            service
                .update_status(&appointment.id, UpdateStatusRequest { status, diagnosis: None }, &doctor())
                .await
                .unwrap();
        }

        let result = service.record_vitals(&appointment.id, entry(130.0, None), &staff()).await;
        match result {
            Err(AppointmentServiceError::VitalsLocked(msg)) => assert_eq!(msg, lifecycle::VITALS_LOCKED_MESSAGE),
            other => panic!("expected VitalsLocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_changes_are_role_checked() {
        let (service, _, patient_id) = service_with_patient().await;
        let appointment = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();

        let to_doctor = UpdateStatusRequest { status: AppointmentStatus::WithDoctor, diagnosis: None };
        assert!(matches!(
            service.update_status(&appointment.id, to_doctor.clone(), &staff()).await,
            Err(AppointmentServiceError::NotPermitted(_))
        ));
        assert!(matches!(
            service.update_status(&appointment.id, to_doctor, &doctor()).await,
            Err(AppointmentServiceError::InvalidTransition(_))
        ));

        let admin = CurrentUser::new("u-admin", "admin", Role::Admin, "Admin");
        let cancelled = service
            .update_status(
                &appointment.id,
                UpdateStatusRequest { status: AppointmentStatus::Cancelled, diagnosis: None },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_list_and_queue() {
        let (service, _, patient_id) = service_with_patient().await;
        let first = service.book_appointment(booking(&patient_id, "09:00 AM")).await.unwrap();
        let second = service.book_appointment(booking(&patient_id, "09:30 AM")).await.unwrap();
        service.book_appointment(booking(&patient_id, "10:00 AM")).await.unwrap();

        service.record_vitals(&first.id, entry(120.0, None), &staff()).await.unwrap();
        for status in [AppointmentStatus::WithDoctor, AppointmentStatus::Completed] {
            service
                .update_status(&first.id, UpdateStatusRequest { status, diagnosis: Some("Viral fever".to_string()) }, &doctor())
                .await
                .unwrap();
        }

        let listed = service.list_appointments(day(), None).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[2].id, first.id);
        assert_eq!(listed[2].diagnosis.as_deref(), Some("Viral fever"));

        let searched = service.list_appointments(day(), Some("completed".to_string())).await.unwrap();
        assert_eq!(searched.len(), 1);

        let queue = service.live_queue(day()).await.unwrap();
        assert_eq!(queue.summary.total, 3);
        assert_eq!(queue.summary.completed, 1);
        let wait_for_second = queue
            .entries
            .iter()
            .find(|e| e.appointment.id == second.id)
            .map(|e| e.estimated_wait.clone());
        assert_eq!(wait_for_second.as_deref(), Some("0 min"));
    }

    #[tokio::test]
    async fn test_repository_failure_is_reported() {
        let bus = Arc::new(NotificationBus::new());
        let service = AppointmentService::new(MockAppointmentRepository::failing(), MockPatientRepository::new(), bus);
        assert!(matches!(
            service.get_appointment("a-1").await,
            Err(AppointmentServiceError::RepositoryError(_))
        ));
    }
}
