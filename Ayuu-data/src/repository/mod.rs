// Repository module structure
pub mod errors;
mod appointment;
mod patient;
mod in_memory;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use appointment::{AppointmentRepository, AppointmentRepositoryTrait};
pub use patient::{PatientRepository, PatientRepositoryTrait};

// Mock repositories for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub mod tests;
