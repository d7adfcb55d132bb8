use axum::{
    extract::{Json, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};
use tracing::{debug, info, instrument};
use validator::Validate;

use ayuu_domain::auth::directory::RoleInfo;
use ayuu_domain::auth::{self, LoginRequest, LoginResponse, SignUpRequest, UserInfo};

use crate::api::state::AppState;
use crate::entities::auth::{AvailabilityQuery, AvailabilityResponse, RefreshRequest};
use crate::entities::ErrorResponse;

/// Sign in with username, password and role
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid username, password or role", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, request), fields(username = %request.username, role = %request.role))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let response = auth::login(state.directory.as_ref(), &state.auth, request).await?;
    info!("User {} signed in", response.user.user_id);
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = LoginResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    if let Err(e) = request.validate() {
        return Err(ErrorResponse::validation_error(e.to_string()));
    }
    Ok(Json(auth::refresh(&state.auth, &request.refresh_token)?))
}

/// Roles offered on the sign-in form
#[utoipa::path(
    get,
    path = "/auth/roles",
    responses(
        (status = 200, description = "Role catalog", body = Vec<RoleInfo>),
    ),
    tag = "auth"
)]
#[instrument(skip(state))]
pub async fn roles(State(state): State<AppState>) -> Result<Json<Vec<RoleInfo>>, ErrorResponse> {
    Ok(Json(state.directory.role_catalog().await?))
}

/// Check whether a username and/or email are still free
#[utoipa::path(
    get,
    path = "/auth/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Availability", body = AvailabilityResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ErrorResponse> {
    let username_available = match query.username.as_deref().map(str::trim) {
        Some(username) if !username.is_empty() => Some(state.directory.is_username_available(username).await?),
        _ => None,
    };
    let email_available = match query.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => {
            Some(state.directory.is_email_available(&email.to_lowercase()).await?)
        }
        _ => None,
    };

    debug!("Availability: username={:?} email={:?}", username_available, email_available);
    Ok(Json(AvailabilityResponse {
        username_available,
        email_available,
    }))
}

/// Register a new clinic account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = UserAccount),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Bearer token present but invalid", body = ErrorResponse),
        (status = 403, description = "Administrator accounts need an administrator's token", body = ErrorResponse),
        (status = 409, description = "Username or email already in use", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, headers, request), fields(username = %request.username))]
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let authorization = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok());
    let caller = auth::caller_from_bearer(&state.auth, authorization)?;

    let account = auth::sign_up(state.directory.as_ref(), request, caller.as_ref()).await?;
    info!("Account {} created with role {}", account.username, account.role);
    Ok((StatusCode::CREATED, Json(account)))
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(Extension(user): Extension<UserInfo>) -> Json<UserInfo> {
    Json(user)
}
