use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Storage model for an appointment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique identifier for the appointment
    pub id: String,

    /// Per-day queue token, assigned on creation
    pub token_number: Option<u32>,

    /// Patient identifier
    pub patient_id: String,

    /// Patient display name at booking time
    pub patient_name: String,

    /// Medical record number of the patient
    pub mr_number: String,

    /// Doctor identifier
    pub doctor_id: String,

    /// Doctor display name at booking time
    pub doctor_name: String,

    /// Time slot label (e.g. "09:30 AM")
    pub appointment_slot: String,

    /// Appointment day as YYYY-MM-DD
    pub appointment_date: String,

    /// Lifecycle status in snake_case (e.g. "vitals_done")
    pub status: String,

    /// Vitals taken at intake, if any
    pub vitals: Option<VitalsRecord>,

    /// Diagnosis written by the doctor
    pub diagnosis: Option<String>,

    /// When the appointment was created
    pub created_at: DateTime<Utc>,

    /// When the appointment was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating an appointment. The repository assigns id and token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub mr_number: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub appointment_slot: String,
    pub appointment_date: String,
}

/// Stored vitals blob, kept as JSON alongside the appointment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalsRecord {
    pub systolic: f64,
    pub diastolic: f64,
    pub pulse: f64,
    /// Always stored in Celsius
    pub temperature_c: f64,
    pub spo2: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: Option<String>,
    pub risk_score: u32,
    pub risk_level: String,
    pub taken_by: String,
    pub taken_at: DateTime<Utc>,
}
