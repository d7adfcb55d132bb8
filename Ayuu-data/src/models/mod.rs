// Storage models persisted by the repositories
pub mod appointment;
pub mod patient;
