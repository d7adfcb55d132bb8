// Ayuu Domain
// This crate contains the business logic for the Ayuu clinic front desk

// Services that implement business logic
pub mod services;

// Authentication and the user directory
pub mod auth;

// Domain entities
pub mod entities;

// Current-user session context
pub mod session;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use ayuu_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
