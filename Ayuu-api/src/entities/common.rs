use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use ayuu_domain::auth::AuthError;
use ayuu_domain::entities::Appointment;
use ayuu_domain::services::{AppointmentServiceError, PatientServiceError};

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a not found error response
    pub fn not_found(resource: &str) -> Self {
        Self::new("not_found", format!("The requested {} could not be found", resource))
    }

    /// Create a validation error response
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create a bad request error response
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("forbidden", message)
    }

    /// The request clashes with the current state of the resource
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<PatientServiceError> for ErrorResponse {
    fn from(err: PatientServiceError) -> Self {
        match err {
            PatientServiceError::ValidationError(msg) => Self::validation_error(msg),
            PatientServiceError::NotFound(_) => Self::not_found("patient"),
            PatientServiceError::Conflict(msg) => Self::conflict(msg),
            PatientServiceError::RepositoryError(msg) => {
                error!("Patient storage failure: {}", msg);
                Self::internal_error()
            }
        }
    }
}

impl From<AppointmentServiceError> for ErrorResponse {
    fn from(err: AppointmentServiceError) -> Self {
        match err {
            AppointmentServiceError::ValidationError(msg) => Self::validation_error(msg),
            AppointmentServiceError::NotFound(_) => Self::not_found("appointment"),
            AppointmentServiceError::NotPermitted(msg) => Self::forbidden(msg),
            AppointmentServiceError::InvalidTransition(msg) | AppointmentServiceError::VitalsLocked(msg) => {
                Self::conflict(msg)
            }
            AppointmentServiceError::RepositoryError(msg) => {
                error!("Appointment storage failure: {}", msg);
                Self::internal_error()
            }
        }
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Token(_) => Self::unauthorized(err.to_string()),
            AuthError::UsernameTaken | AuthError::EmailTaken => Self::conflict(err.to_string()),
            AuthError::Validation(msg) => Self::validation_error(msg),
            AuthError::Forbidden(msg) => Self::forbidden(msg),
            AuthError::Directory(_) | AuthError::Config(_) => {
                error!("Authentication backend failure: {}", err);
                Self::internal_error()
            }
        }
    }
}

/// Query parameters for paginated requests
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaginationParams {
    /// Number of results to return (default: 50)
    #[schema(default = 50, minimum = 1, maximum = 200)]
    pub limit: Option<usize>,

    /// Number of results to skip (default: 0)
    #[schema(default = 0, minimum = 0)]
    pub offset: Option<usize>,
}

impl PaginationParams {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 200;

    /// Effective `(limit, offset)` with defaults applied and the limit capped
    pub fn resolve(&self) -> (usize, usize) {
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}

/// Paginated response format
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(AppointmentPage = PaginatedResponse<Appointment>)]
pub struct PaginatedResponse<T> {
    /// Total count of items available
    pub total_count: usize,

    /// Current offset
    pub offset: usize,

    /// Current limit
    pub limit: usize,

    /// URL for the next page (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// URL for the previous page (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,

    /// Actual data items
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Slice one page out of `items`.
    ///
    /// `link` renders the URL of the page starting at the given offset.
    pub fn from_items(items: Vec<T>, limit: usize, offset: usize, link: impl Fn(usize) -> String) -> Self {
        let total_count = items.len();
        let next_offset = offset.saturating_add(limit);
        let next = (next_offset < total_count).then(|| link(next_offset));
        let previous = (offset > 0).then(|| link(offset.saturating_sub(limit)));
        let data = items.into_iter().skip(offset).take(limit).collect();

        Self {
            total_count,
            offset,
            limit,
            next,
            previous,
            data,
        }
    }
}
