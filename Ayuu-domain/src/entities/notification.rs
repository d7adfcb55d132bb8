use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Severity of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Critical,
    Warning,
    Info,
}

/// A notification shown to doctors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub patient_name: String,
    pub mr_number: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[cfg_attr(feature = "with-api", schema(value_type = Option<Object>))]
    pub data: Option<serde_json::Value>,
}

/// A notification before it is published
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub patient_name: String,
    pub mr_number: String,
    pub data: Option<serde_json::Value>,
}
