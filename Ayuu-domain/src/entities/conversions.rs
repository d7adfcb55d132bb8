use chrono::NaiveDate;

use ayuu_data::models::appointment as data_appointment;
use ayuu_data::models::patient as data_patient;

use crate::entities::appointment::{Appointment, AppointmentStatus};
use crate::entities::patient::{Patient, RegisterPatientRequest};
use crate::entities::vitals::VitalsRecord;

// Conversion functions between domain entities and data models.
// Functions follow the pattern convert_to_[target_layer]_[model_name].
// Stored records carry dates and statuses as text, so the domain direction is
// fallible; the error names the offending value.

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a stored YYYY-MM-DD date
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| format!("Invalid date format: {}", value))
}

/// Format a date for storage
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Convert from data model to domain entity for vitals
pub fn convert_to_domain_vitals(data_vitals: data_appointment::VitalsRecord) -> Result<VitalsRecord, String> {
    Ok(VitalsRecord {
        systolic: data_vitals.systolic,
        diastolic: data_vitals.diastolic,
        pulse: data_vitals.pulse,
        temperature_c: data_vitals.temperature_c,
        spo2: data_vitals.spo2,
        height_cm: data_vitals.height_cm,
        weight_kg: data_vitals.weight_kg,
        bmi: data_vitals.bmi,
        notes: data_vitals.notes,
        risk_score: data_vitals.risk_score,
        risk_level: data_vitals.risk_level.parse()?,
        taken_by: data_vitals.taken_by,
        taken_at: data_vitals.taken_at,
    })
}

/// Convert from domain entity to data model for vitals
pub fn convert_to_data_vitals(vitals: &VitalsRecord) -> data_appointment::VitalsRecord {
    data_appointment::VitalsRecord {
        systolic: vitals.systolic,
        diastolic: vitals.diastolic,
        pulse: vitals.pulse,
        temperature_c: vitals.temperature_c,
        spo2: vitals.spo2,
        height_cm: vitals.height_cm,
        weight_kg: vitals.weight_kg,
        bmi: vitals.bmi,
        notes: vitals.notes.clone(),
        risk_score: vitals.risk_score,
        risk_level: vitals.risk_level.as_str().to_string(),
        taken_by: vitals.taken_by.clone(),
        taken_at: vitals.taken_at,
    }
}

/// Convert from data model to domain entity for an appointment
pub fn convert_to_domain_appointment(data: data_appointment::Appointment) -> Result<Appointment, String> {
    let status: AppointmentStatus = data.status.parse()?;
    let appointment_date = parse_date(&data.appointment_date)?;
    let vitals = data.vitals.map(convert_to_domain_vitals).transpose()?;

    Ok(Appointment {
        id: data.id,
        token_number: data.token_number,
        patient_id: data.patient_id,
        patient_name: data.patient_name,
        mr_number: data.mr_number,
        doctor_id: data.doctor_id,
        doctor_name: data.doctor_name,
        appointment_slot: data.appointment_slot,
        appointment_date,
        status,
        vitals,
        diagnosis: data.diagnosis,
        created_at: data.created_at,
        updated_at: data.updated_at,
    })
}

/// Convert from domain entity to data model for an appointment
pub fn convert_to_data_appointment(appointment: &Appointment) -> data_appointment::Appointment {
    data_appointment::Appointment {
        id: appointment.id.clone(),
        token_number: appointment.token_number,
        patient_id: appointment.patient_id.clone(),
        patient_name: appointment.patient_name.clone(),
        mr_number: appointment.mr_number.clone(),
        doctor_id: appointment.doctor_id.clone(),
        doctor_name: appointment.doctor_name.clone(),
        appointment_slot: appointment.appointment_slot.clone(),
        appointment_date: format_date(appointment.appointment_date),
        status: appointment.status.as_str().to_string(),
        vitals: appointment.vitals.as_ref().map(convert_to_data_vitals),
        diagnosis: appointment.diagnosis.clone(),
        created_at: appointment.created_at,
        updated_at: appointment.updated_at,
    }
}

/// Convert from data model to domain entity for a patient
pub fn convert_to_domain_patient(data: data_patient::Patient) -> Result<Patient, String> {
    Ok(Patient {
        id: data.id,
        mr_number: data.mr_number,
        full_name: data.full_name,
        email: data.email,
        phone: data.phone,
        date_of_birth: parse_date(&data.date_of_birth)?,
        address: data.address,
        emergency_contact: data.emergency_contact,
        created_at: data.created_at,
    })
}

/// Convert a registration request into the data layer's create request
pub fn convert_to_data_create_patient(request: &RegisterPatientRequest, mr_number: &str) -> data_patient::CreatePatientRequest {
    data_patient::CreatePatientRequest {
        mr_number: mr_number.to_string(),
        full_name: request.full_name.trim().to_string(),
        email: request.email.clone(),
        phone: request.phone.trim().to_string(),
        date_of_birth: format_date(request.date_of_birth),
        address: request.address.clone(),
        emergency_contact: request.emergency_contact.clone(),
    }
}
