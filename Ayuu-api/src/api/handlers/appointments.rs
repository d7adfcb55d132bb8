use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use ayuu_domain::auth::UserInfo;
use ayuu_domain::entities::{
    Appointment, BookAppointmentRequest, LiveQueue, UpdateStatusRequest, VitalsEntry, VitalsOutcome,
};

use crate::api::state::AppState;
use crate::entities::{ErrorResponse, PaginatedResponse, PaginationParams};

/// Query parameters for listing appointments
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct AppointmentListParams {
    /// Day to list (default: today)
    pub date: Option<NaiveDate>,

    /// Patient name, MR number or token fragment
    pub q: Option<String>,

    /// Maximum number of results (default: 50, max: 200)
    pub limit: Option<usize>,

    /// Pagination offset (default: 0)
    pub offset: Option<usize>,
}

/// Query parameters for the live queue
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct QueueParams {
    /// Day to show (default: today)
    pub date: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// URL of the page of `params` starting at `offset`
fn page_link(date: NaiveDate, params: &AppointmentListParams, limit: usize, offset: usize) -> String {
    let mut query_parts = vec![format!("date={}", date)];
    if let Some(q) = params.q.as_deref().filter(|q| !q.is_empty()) {
        query_parts.push(format!("q={}", urlencoding::encode(q)));
    }
    query_parts.push(format!("limit={}", limit));
    query_parts.push(format!("offset={}", offset));

    format!("/api/v1/appointments?{}", query_parts.join("&"))
}

/// Book an appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "appointments"
)]
#[instrument(skip(state, request))]
pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let appointment = state.appointments.book_appointment(request).await?;
    info!(
        "Booked token {} for {} on {}",
        appointment.token(),
        appointment.mr_number,
        appointment.appointment_date
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// List one day's appointments in display order
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    params(AppointmentListParams),
    responses(
        (status = 200, description = "Appointments for the day", body = AppointmentPage),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "appointments"
)]
#[instrument(skip(state))]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(params): Query<AppointmentListParams>,
) -> Result<Json<PaginatedResponse<Appointment>>, ErrorResponse> {
    let date = params.date.unwrap_or_else(today);
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve();

    let appointments = state.appointments.list_appointments(date, params.q.clone()).await?;
    let page = PaginatedResponse::from_items(appointments, limit, offset, |offset| {
        page_link(date, &params, limit, offset)
    });

    Ok(Json(page))
}

/// Get a single appointment by ID
#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    params(
        ("id" = String, Path, description = "Appointment ID")
    ),
    responses(
        (status = 200, description = "Appointment found", body = Appointment),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "appointments"
)]
#[instrument(skip(state))]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ErrorResponse> {
    Ok(Json(state.appointments.get_appointment(&id).await?))
}

/// Move an appointment to another status
#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}/status",
    params(
        ("id" = String, Path, description = "Appointment ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Appointment),
        (status = 403, description = "Role may not set this status", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed from the current status", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "appointments"
)]
#[instrument(skip(state, user, request), fields(user = %user.user_id, status = %request.status.as_str()))]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Appointment>, ErrorResponse> {
    let appointment = state
        .appointments
        .update_status(&id, request, &user.to_current_user())
        .await
        .map_err(|e| {
            warn!("Status change on {} refused: {}", id, e);
            ErrorResponse::from(e)
        })?;
    Ok(Json(appointment))
}

/// Record intake vitals and score cardiovascular risk
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/vitals",
    params(
        ("id" = String, Path, description = "Appointment ID")
    ),
    request_body = VitalsEntry,
    responses(
        (status = 200, description = "Vitals recorded", body = VitalsOutcome),
        (status = 400, description = "Missing or invalid measurements", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
        (status = 409, description = "Visit already completed", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "appointments"
)]
#[instrument(skip(state, user, entry), fields(user = %user.user_id))]
pub async fn record_vitals(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
    Json(entry): Json<VitalsEntry>,
) -> Result<Json<VitalsOutcome>, ErrorResponse> {
    let outcome = state
        .appointments
        .record_vitals(&id, entry, &user.to_current_user())
        .await?;

    info!(
        "Vitals recorded for {}: risk {} ({})",
        outcome.appointment.mr_number,
        outcome.assessment.level.as_str(),
        outcome.assessment.score
    );
    Ok(Json(outcome))
}

/// Live queue with per-status counts and estimated waits
#[utoipa::path(
    get,
    path = "/api/v1/queue",
    params(QueueParams),
    responses(
        (status = 200, description = "Live queue", body = LiveQueue),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "appointments"
)]
#[instrument(skip(state))]
pub async fn live_queue(
    State(state): State<AppState>,
    Query(params): Query<QueueParams>,
) -> Result<Json<LiveQueue>, ErrorResponse> {
    let date = params.date.unwrap_or_else(today);
    Ok(Json(state.appointments.live_queue(date).await?))
}
