// Public entities for the Ayuu API
// Request and response shapes that only exist at the HTTP boundary; domain
// entities are serialized as they are.

// Common entities for error handling, pagination, etc.
pub mod common;

// Auth entities
pub mod auth;

// Stateless vitals assessment
pub mod vitals;

pub use common::{ErrorResponse, PaginatedResponse, PaginationParams};
