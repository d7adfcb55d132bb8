pub mod appointment;
pub mod lifecycle;
pub mod notifications;
pub mod patient;
pub mod risk;
pub mod vitals;

// Domain services
// This module contains business logic implementations.

use std::sync::Arc;
use validator::ValidationErrors;

use ayuu_data::database::DatabasePool;
use ayuu_data::repository::{AppointmentRepository, PatientRepository};

// Re-export service traits and factory functions
pub use appointment::{AppointmentService, AppointmentServiceError, AppointmentServiceTrait};
pub use notifications::NotificationBus;
pub use patient::{PatientService, PatientServiceError, PatientServiceTrait};
pub use risk::calculate_cardiovascular_risk;
pub use vitals::{classify_reading, get_vital_ranges, get_vital_status};

/// Patient and appointment services over the configured backend.
///
/// Both services read the same patient repository, so a patient registered
/// through one is visible to bookings through the other.
pub fn create_services(
    pool: Option<DatabasePool>,
    notifications: Arc<NotificationBus>,
) -> (
    PatientService<PatientRepository>,
    AppointmentService<AppointmentRepository, PatientRepository>,
) {
    let patients = PatientRepository::new(pool.clone());
    let appointments = AppointmentRepository::new(pool);
    (
        PatientService::new(patients.clone()),
        AppointmentService::new(appointments, patients, notifications),
    )
}

/// Flatten validator errors into `field: message; field: message`
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, error_msgs.join(", "))
        })
        .collect();
    // HashMap order is not stable
    fields.sort();
    fields.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::entities::appointment::BookAppointmentRequest;
    use crate::entities::patient::RegisterPatientRequest;

    #[tokio::test]
    async fn test_services_share_patients() {
        let (patients, appointments) = create_services(None, Arc::new(NotificationBus::new()));
        let patient = patients
            .register_patient(RegisterPatientRequest {
                full_name: "Ravi Kumar".to_string(),
                email: None,
                phone: "9000012345".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1955, 1, 20).unwrap(),
                address: None,
                emergency_contact: None,
            })
            .await
            .unwrap();

        let appointment = appointments
            .book_appointment(BookAppointmentRequest {
                patient_id: patient.id.clone(),
                doctor_id: "doc-1".to_string(),
                doctor_name: "Dr. Rao".to_string(),
                appointment_slot: "10:30 AM".to_string(),
                appointment_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(appointment.mr_number, patient.mr_number);
    }

    #[test]
    fn test_validation_message_is_sorted() {
        use validator::Validate;
        let request = RegisterPatientRequest {
            full_name: String::new(),
            email: None,
            phone: "1".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            address: None,
            emergency_contact: None,
        };
        let message = validation_message(&request.validate().unwrap_err());
        assert!(message.starts_with("full_name: "));
        assert!(message.contains("; phone: Phone must be between 7 and 20 characters"));
    }
}
