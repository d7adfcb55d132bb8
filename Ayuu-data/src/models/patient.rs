use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Storage model for a registered patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Unique identifier for the patient
    pub id: String,

    /// Medical record number assigned at registration
    pub mr_number: String,

    /// Full name as registered
    pub full_name: String,

    /// Optional email address
    pub email: Option<String>,

    /// Contact phone number
    pub phone: String,

    /// Date of birth as YYYY-MM-DD
    pub date_of_birth: String,

    /// Optional postal address
    pub address: Option<String>,

    /// Optional emergency contact
    pub emergency_contact: Option<String>,

    /// When the patient was registered
    pub created_at: DateTime<Utc>,
}

/// Input data for registering a patient. The MR number is generated upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub mr_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub date_of_birth: String,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}
