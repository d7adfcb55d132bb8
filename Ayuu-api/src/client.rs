//! Front-desk client for a running Ayuu API
//!
//! Signs in over HTTP and keeps the signed-in user, tokens included, in a
//! [`SessionContext`]. A desk terminal that is closed and reopened picks the
//! session back up with [`DeskClient::resume`].

use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use ayuu_domain::auth::{LoginRequest, LoginResponse};
use ayuu_domain::entities::{CurrentUser, LiveQueue, Role};
use ayuu_domain::session::{SessionContext, SessionError, SessionStore};

use crate::entities::ErrorResponse;

/// Session blob key holding the bearer token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Session blob key holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Errors raised by the desk client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error body
    #[error("{message}")]
    Api { status: u16, error: String, message: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// HTTP client bound to one API base URL and one session store
pub struct DeskClient<S: SessionStore> {
    http: Client,
    base_url: String,
    session: SessionContext<S>,
}

impl<S: SessionStore> DeskClient<S> {
    pub fn new(base_url: impl Into<String>, store: S) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: SessionContext::new(store),
        }
    }

    /// Load whatever session the store holds
    pub fn resume(&self) -> Result<Option<CurrentUser>, ClientError> {
        Ok(self.session.load()?)
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.session.current()
    }

    /// Sign in and persist the user with both tokens
    pub async fn sign_in(&self, username: &str, password: &str, role: Role) -> Result<CurrentUser, ClientError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };

        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&request)
            .send()
            .await?;
        let login: LoginResponse = read_json(response).await?;

        let mut user = login.user.to_current_user();
        user.extra.insert(ACCESS_TOKEN_KEY.to_string(), Value::String(login.access_token));
        user.extra.insert(REFRESH_TOKEN_KEY.to_string(), Value::String(login.refresh_token));

        self.session.sign_in(user.clone())?;
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), ClientError> {
        Ok(self.session.sign_out()?)
    }

    /// The live queue for `date`, or today when `None`.
    ///
    /// A 401 from the API ends the stored session.
    pub async fn live_queue(&self, date: Option<NaiveDate>) -> Result<LiveQueue, ClientError> {
        let token = self.access_token()?;

        let mut request = self.http.get(self.url("/api/v1/queue")).bearer_auth(token);
        if let Some(date) = date {
            request = request.query(&[("date", date.to_string())]);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Stored session was rejected, signing out");
            self.session.sign_out()?;
        }
        read_json(response).await
    }

    fn access_token(&self) -> Result<String, ClientError> {
        self.session
            .current()
            .and_then(|user| user.extra.get(ACCESS_TOKEN_KEY).and_then(Value::as_str).map(str::to_string))
            .ok_or(ClientError::NotSignedIn)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        debug!("API answered {}", status);
        return Ok(response.json().await?);
    }

    let (error, message) = match response.json::<ErrorResponse>().await {
        Ok(body) => (body.error, body.message),
        Err(_) => ("unknown".to_string(), format!("Request failed with status {}", status)),
    };
    info!("API refused request: {} ({})", message, status);
    Err(ClientError::Api {
        status: status.as_u16(),
        error,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayuu_domain::session::MemorySessionStore;

    #[test]
    fn test_base_url_is_normalized() {
        let client = DeskClient::new("http://localhost:3000/", MemorySessionStore::new());
        assert_eq!(client.url("/auth/login"), "http://localhost:3000/auth/login");
    }

    #[test]
    fn test_stored_session_without_token_is_not_signed_in() {
        let blob = r#"{"id":"u1","username":"anu","role":"staff","fullName":"Anu K"}"#;
        let client = DeskClient::new("http://localhost:3000", MemorySessionStore::with_blob(blob));

        let user = client.resume().unwrap().unwrap();
        assert_eq!(user.username, "anu");
        assert!(matches!(client.access_token(), Err(ClientError::NotSignedIn)));
    }
}
