// Domain entities and value objects
pub mod appointment;
pub mod conversions;
pub mod notification;
pub mod patient;
pub mod risk;
pub mod user;
pub mod vitals;

// Re-export common types for easier imports
pub use appointment::{Appointment, AppointmentStatus, BookAppointmentRequest, LiveQueue, QueueEntry, QueueSummary, UpdateStatusRequest, VitalsOutcome};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use patient::{Patient, RegisterPatientRequest};
pub use risk::{CardiovascularRiskAssessment, RiskFactors, RiskInput, RiskLevel};
pub use user::{CurrentUser, Role};
pub use vitals::{AgeBand, CriticalBounds, Temperature, TemperatureUnit, VitalRange, VitalRanges, VitalReading, VitalStatus, VitalsClassification, VitalsEntry, VitalsRecord};
