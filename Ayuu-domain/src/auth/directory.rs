//! User directory: accounts, profiles and the role catalog.

use std::sync::RwLock;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::entities::user::Role;

/// A user account with its profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Entry of the role picker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RoleInfo {
    pub id: Role,
    pub name: String,
}

/// Data for a new account
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Account and profile store used for sign-in and sign-up
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Roles offered at sign-in and sign-up
    async fn role_catalog(&self) -> Result<Vec<RoleInfo>, AuthError>;

    /// Email of the account with this username and role
    async fn resolve_email(&self, username: &str, role: Role) -> Result<Option<String>, AuthError>;

    /// Check a password; `None` for wrong credentials
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<UserAccount>, AuthError>;

    async fn is_username_available(&self, username: &str) -> Result<bool, AuthError>;

    async fn is_email_available(&self, email: &str) -> Result<bool, AuthError>;

    /// Create the account and its profile together
    async fn create_account(&self, account: NewAccount) -> Result<UserAccount, AuthError>;
}

struct StoredAccount {
    account: UserAccount,
    // Development store only; no hashing
    password: String,
}

/// Directory held in memory, for development and tests
#[derive(Default)]
pub struct InMemoryUserDirectory {
    accounts: RwLock<Vec<StoredAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error(e: impl std::fmt::Display) -> AuthError {
        AuthError::Directory(format!("user directory lock poisoned: {}", e))
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn role_catalog(&self) -> Result<Vec<RoleInfo>, AuthError> {
        Ok(Role::ALL
            .iter()
            .map(|role| RoleInfo { id: *role, name: role.display_name().to_string() })
            .collect())
    }

    async fn resolve_email(&self, username: &str, role: Role) -> Result<Option<String>, AuthError> {
        let accounts = self.accounts.read().map_err(Self::lock_error)?;
        Ok(accounts
            .iter()
            .find(|s| s.account.username.eq_ignore_ascii_case(username) && s.account.role == role)
            .map(|s| s.account.email.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<UserAccount>, AuthError> {
        let accounts = self.accounts.read().map_err(Self::lock_error)?;
        let account = accounts
            .iter()
            .find(|s| s.account.email.eq_ignore_ascii_case(email) && s.password == password)
            .map(|s| s.account.clone());
        debug!("Directory sign-in for {}: {}", email, account.is_some());
        Ok(account)
    }

    async fn is_username_available(&self, username: &str) -> Result<bool, AuthError> {
        let accounts = self.accounts.read().map_err(Self::lock_error)?;
        Ok(!accounts.iter().any(|s| s.account.username.eq_ignore_ascii_case(username)))
    }

    async fn is_email_available(&self, email: &str) -> Result<bool, AuthError> {
        let accounts = self.accounts.read().map_err(Self::lock_error)?;
        Ok(!accounts.iter().any(|s| s.account.email.eq_ignore_ascii_case(email)))
    }

    async fn create_account(&self, new: NewAccount) -> Result<UserAccount, AuthError> {
        let mut accounts = self.accounts.write().map_err(Self::lock_error)?;

        // Checked again under the write lock
        if accounts.iter().any(|s| s.account.username.eq_ignore_ascii_case(&new.username)) {
            return Err(AuthError::UsernameTaken);
        }
        if accounts.iter().any(|s| s.account.email.eq_ignore_ascii_case(&new.email)) {
            return Err(AuthError::EmailTaken);
        }

        let account = UserAccount {
            id: Uuid::new_v4().to_string(),
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            phone: new.phone,
            role: new.role,
        };
        accounts.push(StoredAccount { account: account.clone(), password: new.password });
        info!("Created {} account {}", account.role, account.username);

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn new_account(username: &str, email: &str, role: Role) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password: "s3cret-pass".to_string(),
            full_name: "Test User".to_string(),
            phone: None,
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let directory = InMemoryUserDirectory::new();
        let created = assert_ok!(
            directory
                .create_account(new_account("dr.rao", "rao@clinic.test", Role::Doctor))
                .await
        );

        let email = directory.resolve_email("DR.RAO", Role::Doctor).await.unwrap();
        assert_eq!(email.as_deref(), Some("rao@clinic.test"));
        assert!(directory.resolve_email("dr.rao", Role::Staff).await.unwrap().is_none());

        let signed_in = directory.sign_in("rao@clinic.test", "s3cret-pass").await.unwrap();
        assert_eq!(signed_in, Some(created));
        assert!(directory.sign_in("rao@clinic.test", "wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let directory = InMemoryUserDirectory::new();
        directory
            .create_account(new_account("anu", "anu@clinic.test", Role::Staff))
            .await
            .unwrap();

        assert!(!directory.is_username_available("Anu").await.unwrap());
        assert!(!directory.is_email_available("ANU@clinic.test").await.unwrap());
        assert!(directory.is_email_available("other@clinic.test").await.unwrap());

        let err = assert_err!(directory.create_account(new_account("anu", "x@clinic.test", Role::Staff)).await);
        assert!(matches!(err, AuthError::UsernameTaken));
        assert!(matches!(
            directory.create_account(new_account("anu2", "anu@clinic.test", Role::Staff)).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_role_catalog() {
        let roles = InMemoryUserDirectory::new().role_catalog().await.unwrap();
        assert_eq!(roles.len(), 3);
        assert_eq!(roles[2].name, "Administrator");
    }
}
