use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Role of a signed-in user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Front-desk and nursing staff
    Staff,
    Doctor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Staff, Role::Doctor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    /// Human-readable name shown in the role picker
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Staff => "Staff",
            Role::Doctor => "Doctor",
            Role::Admin => "Administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// The persisted "current user" blob.
///
/// Unknown keys are kept in `extra` so a blob written by a newer client
/// survives a load/store cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
            full_name: full_name.into(),
            extra: HashMap::new(),
        }
    }
}
