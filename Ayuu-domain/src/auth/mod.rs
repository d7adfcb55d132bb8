//! Authentication for the Ayuu API
//!
//! Password sign-in against a [`directory::UserDirectory`], HS256 bearer tokens
//! carrying the user's role, and the middleware that checks them.

#[cfg(feature = "with-axum")]
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "with-axum")]
use std::sync::Arc;
use std::env;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::entities::user::{CurrentUser, Role};
use crate::auth::directory::{NewAccount, UserAccount, UserDirectory};
use crate::auth::logging::{log_auth_event, log_failed_login, AuthEvent, AuthEventType};
use crate::auth::token::{SecurityError, TokenType};

// JWT handling
pub mod token;

// Account store and role catalog
pub mod directory;

// Authorization module for RBAC
#[cfg(feature = "with-axum")]
pub mod authorize;

// Structured auth event logging
pub mod logging;

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    /// "access" or "refresh"
    pub token_type: String,
}

/// User information extracted from authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    /// Authentication source (e.g. "password", "jwt")
    pub auth_source: String,
}

impl UserInfo {
    /// The session view of this user
    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser::new(&self.user_id, &self.username, self.role, &self.full_name)
    }

    fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            username: claims.username.clone(),
            full_name: claims.full_name.clone(),
            role: claims.role,
            auth_source: "jwt".to_string(),
        }
    }
}

impl From<&UserAccount> for UserInfo {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.id.clone(),
            username: account.username.clone(),
            full_name: account.full_name.clone(),
            role: account.role,
            auth_source: "password".to_string(),
        }
    }
}

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Role the user signs in as
    pub role: Role,
}

/// Login response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LoginResponse {
    /// JWT access token
    pub access_token: String,
    /// JWT refresh token
    pub refresh_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Sign-up request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SignUpRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"))]
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Token settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl AuthConfig {
    /// Default lifetimes and issuer with the given secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: "ayuu-api".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
        }
    }

    /// Load from environment variables. `JWT_SECRET` is required.
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|e| {
            error!("JWT_SECRET environment variable not found: {}", e);
            AuthError::Config("JWT_SECRET environment variable not found".to_string())
        })?;

        let mut config = Self::new(jwt_secret);
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            config.issuer = issuer;
        }
        config.access_token_minutes = env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.access_token_minutes);
        config.refresh_token_days = env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.refresh_token_days);

        Ok(config)
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username, password or role")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Token(#[from] SecurityError),

    #[error("User directory error: {0}")]
    Directory(String),

    #[error("Auth configuration error: {0}")]
    Config(String),
}

fn issue_tokens(config: &AuthConfig, user: UserInfo) -> Result<LoginResponse, AuthError> {
    let access_token = token::generate_token(config, &user, TokenType::Access)?;
    let refresh_token = token::generate_token(config, &user, TokenType::Refresh)?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_minutes * 60,
        user,
    })
}

/// Sign in with username, password and role.
///
/// The username is resolved to an email for the chosen role first, so a
/// username registered under another role fails like a wrong password.
pub async fn login(
    directory: &dyn UserDirectory,
    config: &AuthConfig,
    request: LoginRequest,
) -> Result<LoginResponse, AuthError> {
    let start_time = Instant::now();

    if let Err(e) = request.validate() {
        return Err(AuthError::Validation(e.to_string()));
    }

    let email = match directory.resolve_email(request.username.trim(), request.role).await? {
        Some(email) => email,
        None => {
            log_failed_login(&request.username, request.role, "Unknown username for role");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let account = match directory.sign_in(&email, &request.password).await? {
        Some(account) if account.role == request.role => account,
        _ => {
            log_failed_login(&request.username, request.role, "Invalid password");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let response = issue_tokens(config, UserInfo::from(&account))?;

    let event = AuthEvent::new(AuthEventType::Login, Some(&account.id), true)
        .with_details(format!("Login successful as {}", account.role))
        .with_duration(start_time.elapsed().as_millis() as u64)
        .with_auth_method("password");
    log_auth_event(event);

    Ok(response)
}

/// Exchange a refresh token for a fresh pair
pub fn refresh(config: &AuthConfig, refresh_token: &str) -> Result<LoginResponse, AuthError> {
    let claims = token::validate_token(config, refresh_token, TokenType::Refresh)?;
    debug!("Refresh token valid for user: {}", claims.sub);
    issue_tokens(config, UserInfo::from_claims(&claims))
}

/// Register a new account after checking that username and email are free.
///
/// Administrator accounts can only be created by a signed-in administrator;
/// anonymous callers may register staff and doctors.
pub async fn sign_up(
    directory: &dyn UserDirectory,
    request: SignUpRequest,
    caller: Option<&UserInfo>,
) -> Result<UserAccount, AuthError> {
    if request.role == Role::Admin && caller.map(|user| user.role) != Some(Role::Admin) {
        warn!("Refused administrator sign-up for {}", request.username);
        let event = AuthEvent::new(AuthEventType::Registration, caller.map(|user| user.user_id.as_str()), false)
            .with_details(format!("Administrator sign-up refused for {}", request.username))
            .with_auth_method("password");
        log_auth_event(event);
        return Err(AuthError::Forbidden(
            "Only an administrator can create administrator accounts".to_string(),
        ));
    }

    register(directory, request).await
}

/// Create the first administrator, skipping the caller check.
///
/// Does nothing when the username is already registered, so it is safe to
/// run on every start.
pub async fn bootstrap_admin(
    directory: &dyn UserDirectory,
    mut request: SignUpRequest,
) -> Result<Option<UserAccount>, AuthError> {
    if !directory.is_username_available(request.username.trim()).await? {
        debug!("Administrator {} already exists", request.username.trim());
        return Ok(None);
    }
    request.role = Role::Admin;
    register(directory, request).await.map(Some)
}

/// Administrator account described by `ADMIN_USERNAME`, `ADMIN_EMAIL` and
/// `ADMIN_PASSWORD`; `ADMIN_FULL_NAME` is optional. `None` unless all three
/// required variables are set.
pub fn admin_bootstrap_from_env() -> Option<SignUpRequest> {
    let username = env::var("ADMIN_USERNAME").ok()?;
    let email = env::var("ADMIN_EMAIL").ok()?;
    let password = env::var("ADMIN_PASSWORD").ok()?;

    Some(SignUpRequest {
        username,
        email,
        password,
        full_name: env::var("ADMIN_FULL_NAME").unwrap_or_else(|_| "Clinic Administrator".to_string()),
        phone: None,
        role: Role::Admin,
    })
}

/// The user behind an optional `Authorization` header value.
///
/// No header is an anonymous caller; a header that is present but not a
/// valid access token is an error.
pub fn caller_from_bearer(config: &AuthConfig, authorization: Option<&str>) -> Result<Option<UserInfo>, AuthError> {
    let Some(value) = authorization else {
        return Ok(None);
    };
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Token(SecurityError::InvalidToken))?;

    let claims = token::validate_token(config, token, TokenType::Access)?;
    Ok(Some(UserInfo::from_claims(&claims)))
}

async fn register(directory: &dyn UserDirectory, request: SignUpRequest) -> Result<UserAccount, AuthError> {
    if let Err(e) = request.validate() {
        return Err(AuthError::Validation(e.to_string()));
    }

    let username = request.username.trim().to_string();
    let email = request.email.trim().to_lowercase();

    if !directory.is_username_available(&username).await? {
        return Err(AuthError::UsernameTaken);
    }
    if !directory.is_email_available(&email).await? {
        return Err(AuthError::EmailTaken);
    }

    let account = directory
        .create_account(NewAccount {
            username,
            email,
            password: request.password,
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            role: request.role,
        })
        .await?;

    let event = AuthEvent::new(AuthEventType::Registration, Some(&account.id), true)
        .with_details(format!("Registered {} as {}", account.username, account.role))
        .with_auth_method("password");
    log_auth_event(event);

    Ok(account)
}

#[cfg(feature = "with-axum")]
fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message,
        })),
    )
        .into_response()
}

/// Authentication middleware for protected routes
#[cfg(feature = "with-axum")]
pub async fn auth_middleware(
    State(config): State<Arc<AuthConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Development bypass signs every request in as an admin
    if cfg!(debug_assertions) && env::var("BYPASS_AUTH").is_ok() {
        debug!("Auth bypass enabled in development mode");
        req.extensions_mut().insert(UserInfo {
            user_id: "dev-admin".to_string(),
            username: "dev".to_string(),
            full_name: "Development Admin".to_string(),
            role: Role::Admin,
            auth_source: "bypass".to_string(),
        });
        return next.run(req).await;
    }

    let request_path = req.uri().path().to_string();
    let start_time = Instant::now();

    let token = match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        Some(token) => token.to_string(),
        None => {
            debug!("Missing or malformed Authorization header");
            let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                .with_details("Missing or malformed Authorization header")
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);
            return unauthorized("Missing bearer token");
        }
    };

    match token::validate_token(&config, &token, TokenType::Access) {
        Ok(claims) => {
            debug!("Token validated for user: {}", claims.sub);
            let event = AuthEvent::new(AuthEventType::TokenValidation, Some(&claims.sub), true)
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);

            req.extensions_mut().insert(UserInfo::from_claims(&claims));
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            warn!("Rejected token for {}: {}", request_path, e);
            let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                .with_details(e.to_string())
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);
            unauthorized("Invalid or expired token")
        }
    }
}

/// Apply CORS and security headers to the application
#[cfg(feature = "with-web")]
pub fn configure_security(app: axum::Router) -> axum::Router {
    use axum::http::{HeaderName, HeaderValue, Method};
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    info!("CORS and security headers configured");
    app.layer(cors).layer(security_headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::{InMemoryUserDirectory, MockUserDirectory};

    fn config() -> AuthConfig {
        AuthConfig::new("test_secret_key_for_testing_only")
    }

    fn sign_up_request(username: &str, email: &str, role: Role) -> SignUpRequest {
        SignUpRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
            full_name: "Dr. Meera Rao".to_string(),
            phone: None,
            role,
        }
    }

    fn login_request(username: &str, password: &str, role: Role) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_login() {
        let directory = InMemoryUserDirectory::new();
        let config = config();
        sign_up(&directory, sign_up_request("meera", "Meera@Clinic.test", Role::Doctor), None)
            .await
            .unwrap();

        let response = login(&directory, &config, login_request("meera", "correct-horse", Role::Doctor))
            .await
            .unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);
        assert_eq!(response.user.role, Role::Doctor);

        let claims = token::validate_token(&config, &response.access_token, TokenType::Access).unwrap();
        assert_eq!(claims.username, "meera");

        let refreshed = refresh(&config, &response.refresh_token).unwrap();
        assert_eq!(refreshed.user.user_id, response.user.user_id);
        assert!(refresh(&config, &response.access_token).is_err());
    }

    #[tokio::test]
    async fn test_login_with_wrong_role_or_password() {
        let directory = InMemoryUserDirectory::new();
        let config = config();
        sign_up(&directory, sign_up_request("meera", "meera@clinic.test", Role::Doctor), None)
            .await
            .unwrap();

        assert!(matches!(
            login(&directory, &config, login_request("meera", "correct-horse", Role::Admin)).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&directory, &config, login_request("meera", "nope", Role::Doctor)).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_checks_availability_first() {
        let mut directory = MockUserDirectory::new();
        directory.expect_is_username_available().returning(|_| Ok(true));
        directory.expect_is_email_available().returning(|_| Ok(false));
        directory.expect_create_account().never();

        let result = sign_up(&directory, sign_up_request("anu", "anu@clinic.test", Role::Staff), None).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let directory = MockUserDirectory::new();
        let mut request = sign_up_request("anu", "not-an-email", Role::Staff);
        request.password = "short".to_string();
        assert!(matches!(sign_up(&directory, request, None).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_admin_sign_up_needs_an_admin_caller() {
        let directory = InMemoryUserDirectory::new();
        let request = sign_up_request("root", "root@clinic.test", Role::Admin);

        let anonymous = sign_up(&directory, request.clone(), None).await;
        assert!(matches!(anonymous, Err(AuthError::Forbidden(_))));

        let staff = UserInfo::from(&sign_up(&directory, sign_up_request("anu", "anu@clinic.test", Role::Staff), None)
            .await
            .unwrap());
        assert!(matches!(
            sign_up(&directory, request.clone(), Some(&staff)).await,
            Err(AuthError::Forbidden(_))
        ));
        assert!(directory.is_username_available("root").await.unwrap());

        let admin = UserInfo::from(&bootstrap_admin(&directory, sign_up_request("owner", "owner@clinic.test", Role::Staff))
            .await
            .unwrap()
            .unwrap());
        assert_eq!(admin.role, Role::Admin);

        let created = sign_up(&directory, request, Some(&admin)).await.unwrap();
        assert_eq!(created.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let directory = InMemoryUserDirectory::new();
        let request = sign_up_request("owner", "owner@clinic.test", Role::Admin);
        assert!(bootstrap_admin(&directory, request.clone()).await.unwrap().is_some());
        assert!(bootstrap_admin(&directory, request).await.unwrap().is_none());
    }

    #[test]
    fn test_caller_from_bearer() {
        let config = config();
        assert!(caller_from_bearer(&config, None).unwrap().is_none());
        assert!(caller_from_bearer(&config, Some("Basic abc")).is_err());
        assert!(caller_from_bearer(&config, Some("Bearer not-a-token")).is_err());

        let user = UserInfo {
            user_id: "u9".to_string(),
            username: "owner".to_string(),
            full_name: "Owner".to_string(),
            role: Role::Admin,
            auth_source: "password".to_string(),
        };
        let access = token::generate_token(&config, &user, TokenType::Access).unwrap();
        let caller = caller_from_bearer(&config, Some(&format!("Bearer {}", access))).unwrap().unwrap();
        assert_eq!(caller.user_id, "u9");
        assert_eq!(caller.role, Role::Admin);

        let refresh_token = token::generate_token(&config, &user, TokenType::Refresh).unwrap();
        assert!(caller_from_bearer(&config, Some(&format!("Bearer {}", refresh_token))).is_err());
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let mut directory = MockUserDirectory::new();
        directory
            .expect_resolve_email()
            .returning(|_, _| Err(AuthError::Directory("offline".to_string())));

        let result = login(&directory, &config(), login_request("anu", "pw", Role::Staff)).await;
        assert!(matches!(result, Err(AuthError::Directory(_))));
    }

    #[test]
    fn test_user_info_to_current_user() {
        let info = UserInfo {
            user_id: "u1".to_string(),
            username: "anu".to_string(),
            full_name: "Anu K".to_string(),
            role: Role::Staff,
            auth_source: "jwt".to_string(),
        };
        let current = info.to_current_user();
        assert_eq!(current.id, "u1");
        assert_eq!(current.role, Role::Staff);
        assert_eq!(current.full_name, "Anu K");
    }
}
