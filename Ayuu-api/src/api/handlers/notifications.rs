use axum::extract::{Json, Path, State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use ayuu_domain::entities::Notification;

use crate::api::state::AppState;
use crate::entities::ErrorResponse;

/// The notification feed, newest first
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationFeed {
    pub unread_count: usize,
    pub notifications: Vec<Notification>,
}

/// List notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Notification feed", body = NotificationFeed),
        (status = 403, description = "Role may not read notifications", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state))]
pub async fn list_notifications(State(state): State<AppState>) -> Json<NotificationFeed> {
    Json(NotificationFeed {
        unread_count: state.notifications.unread_count(),
        notifications: state.notifications.list(),
    })
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(
        ("id" = String, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = NotificationFeed),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationFeed>, ErrorResponse> {
    if !state.notifications.mark_as_read(&id) {
        return Err(ErrorResponse::not_found("notification"));
    }
    info!("Notification {} marked as read", id);
    Ok(list_notifications(State(state)).await)
}
