pub mod appointments;
pub mod auth;
pub mod health;
pub mod notifications;
pub mod patients;
pub mod vitals;

pub use health::health_check;
