use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};
use serde_json::json;
use futures::future::BoxFuture;

use crate::auth::{AuthError, UserInfo};
use crate::auth::logging::{log_access_denied, log_auth_event, AuthEvent, AuthEventType};
use crate::entities::user::Role;

/// Fail unless `user` holds one of `roles`
pub fn ensure_any_role(user: &UserInfo, roles: &[Role]) -> Result<(), AuthError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(format!(
            "role {} may not perform this action",
            user.role
        )))
    }
}

/// Middleware for role-based access control
///
/// Checks the [`UserInfo`] placed in the request by `auth_middleware`. Users
/// without one of the required roles get 403 Forbidden.
pub async fn require_roles(req: Request<Body>, next: Next, required_roles: Vec<Role>) -> Response {
    let request_path = req.uri().path().to_string();

    match req.extensions().get::<UserInfo>() {
        Some(user) if required_roles.contains(&user.role) => {
            debug!("User {} has required role for resource access: {}", user.user_id, request_path);
            next.run(req).await
        }
        Some(user) => {
            warn!(
                "User {} with role {} lacks required roles {:?} for {}",
                user.user_id, user.role, required_roles, request_path
            );
            log_access_denied(&user.user_id, &request_path, &required_roles);

            let required: Vec<&str> = required_roles.iter().map(|r| r.as_str()).collect();
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "You don't have the required permissions to access this resource",
                    "required_roles": required,
                })),
            )
                .into_response()
        }
        None => {
            // auth_middleware must run first
            warn!("No user info found in request extensions for path: {}", request_path);
            let event = AuthEvent::new(AuthEventType::AccessDenied, None, false)
                .with_details("Authentication context missing in request extensions")
                .with_resource(request_path)
                .with_auth_method("rbac");
            log_auth_event(event);

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "Authentication context missing",
                })),
            )
                .into_response()
        }
    }
}

/// Middleware factory that requires any of the given roles
///
/// # Example
/// ```ignore
/// let intake_routes = Router::new()
///     .route("/patients", post(register_patient))
///     .layer(middleware::from_fn(require_any_role(&[Role::Staff, Role::Admin])));
/// ```
pub fn require_any_role(
    roles: &[Role],
) -> impl Fn(Request<Body>, Next) -> BoxFuture<'static, Response> + Clone + Send + 'static {
    let roles = roles.to_vec();
    move |req, next| {
        let roles = roles.clone();
        Box::pin(async move { require_roles(req, next, roles).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn user(role: Role) -> UserInfo {
        UserInfo {
            user_id: "test-user".to_string(),
            username: "tester".to_string(),
            full_name: "Test User".to_string(),
            role,
            auth_source: "test".to_string(),
        }
    }

    fn app(user: Option<UserInfo>, roles: &[Role]) -> Router {
        let router = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(middleware::from_fn(require_any_role(roles)));
        match user {
            Some(user) => router.layer(Extension(user)),
            None => router,
        }
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/test").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_matching_role_passes() {
        let response = app(Some(user(Role::Doctor)), &[Role::Doctor, Role::Admin])
            .oneshot(request())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_other_role_is_forbidden() {
        let response = app(Some(user(Role::Staff)), &[Role::Doctor, Role::Admin])
            .oneshot(request())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_user_is_an_error() {
        let response = app(None, &[Role::Admin]).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_ensure_any_role() {
        assert!(ensure_any_role(&user(Role::Admin), &[Role::Admin]).is_ok());
        assert!(matches!(
            ensure_any_role(&user(Role::Staff), &[Role::Doctor]),
            Err(AuthError::Forbidden(_))
        ));
    }
}
