use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::entities::risk::CardiovascularRiskAssessment;
use crate::entities::vitals::{VitalsClassification, VitalsRecord};

/// Lifecycle status of an appointment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    VitalsDone,
    WithDoctor,
    Completed,
    ReturnQueue,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::VitalsDone,
        AppointmentStatus::WithDoctor,
        AppointmentStatus::Completed,
        AppointmentStatus::ReturnQueue,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::VitalsDone => "vitals_done",
            AppointmentStatus::WithDoctor => "with_doctor",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::ReturnQueue => "return_queue",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions leave a terminal status, except by an admin
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Whether the appointment still occupies a place ahead in the queue
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::VitalsDone | AppointmentStatus::WithDoctor
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown appointment status: {}", s))
    }
}

/// Domain model for an appointment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Appointment {
    pub id: String,
    /// Per-day queue token; treated as 0 when absent
    pub token_number: Option<u32>,
    pub patient_id: String,
    pub patient_name: String,
    pub mr_number: String,
    pub doctor_id: String,
    pub doctor_name: String,
    /// Time slot label, e.g. "09:30 AM"
    pub appointment_slot: String,
    pub appointment_date: NaiveDate,
    pub status: AppointmentStatus,
    pub vitals: Option<VitalsRecord>,
    pub diagnosis: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Token used for ordering
    pub fn token(&self) -> u32 {
        self.token_number.unwrap_or(0)
    }
}

/// Request payload for booking an appointment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct BookAppointmentRequest {
    #[validate(length(min = 1, message = "Patient is required"))]
    pub patient_id: String,

    #[validate(length(min = 1, message = "Doctor is required"))]
    pub doctor_id: String,

    #[validate(length(min = 1, max = 100, message = "Doctor name must be between 1 and 100 characters"))]
    pub doctor_name: String,

    /// One of the clinic's fixed slots
    pub appointment_slot: String,

    pub appointment_date: NaiveDate,
}

/// Request payload for changing an appointment's status
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,

    /// Diagnosis written when the doctor completes the visit
    #[validate(length(max = 2000, message = "Diagnosis cannot exceed 2000 characters"))]
    pub diagnosis: Option<String>,
}

/// Outcome of a successful vitals entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalsOutcome {
    pub appointment: Appointment,
    pub assessment: CardiovascularRiskAssessment,
    pub classification: VitalsClassification,
    /// Critical alert strings raised by the reading
    pub warnings: Vec<String>,
    /// Whether a critical vitals notification was published
    pub notified: bool,
}

/// One row of the live queue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct QueueEntry {
    pub appointment: Appointment,
    /// "N/A", "In Progress" or "<n> min"
    pub estimated_wait: String,
}

/// Count of appointments per status for one day
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct QueueSummary {
    pub total: usize,
    pub scheduled: usize,
    pub vitals_done: usize,
    pub with_doctor: usize,
    pub completed: usize,
    pub return_queue: usize,
    pub cancelled: usize,
}

/// The live queue for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LiveQueue {
    pub date: NaiveDate,
    pub summary: QueueSummary,
    pub entries: Vec<QueueEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("waiting".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::VitalsDone).unwrap();
        assert_eq!(json, "\"vitals_done\"");
    }
}
