use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use ayuu_domain::entities::{Patient, RegisterPatientRequest};

use crate::api::state::AppState;
use crate::entities::{ErrorResponse, PaginationParams};

/// Query parameters for patient search
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PatientSearchParams {
    /// Name, MR number or phone fragment; empty matches every patient
    pub q: Option<String>,

    /// Maximum number of results (default: 50, max: 200)
    pub limit: Option<usize>,
}

/// Register a new patient
#[utoipa::path(
    post,
    path = "/api/v1/patients",
    request_body = RegisterPatientRequest,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Role may not register patients", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(state, request))]
pub async fn register_patient(
    State(state): State<AppState>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let patient = state.patients.register_patient(request).await?;
    info!("Patient registered with MR number {}", patient.mr_number);
    Ok((StatusCode::CREATED, Json(patient)))
}

/// Get a single patient by ID
#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}",
    params(
        ("id" = String, Path, description = "Patient ID")
    ),
    responses(
        (status = 200, description = "Patient found", body = Patient),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(state))]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ErrorResponse> {
    Ok(Json(state.patients.get_patient(&id).await?))
}

/// Search patients
#[utoipa::path(
    get,
    path = "/api/v1/patients",
    params(PatientSearchParams),
    responses(
        (status = 200, description = "Matching patients", body = Vec<Patient>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(state))]
pub async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<PatientSearchParams>,
) -> Result<Json<Vec<Patient>>, ErrorResponse> {
    let (limit, _) = PaginationParams {
        limit: params.limit,
        offset: None,
    }
    .resolve();
    let query = params.q.unwrap_or_default();

    let patients = state.patients.search_patients(&query, Some(limit)).await?;
    info!("Patient search returned {} results", patients.len());
    Ok(Json(patients))
}
