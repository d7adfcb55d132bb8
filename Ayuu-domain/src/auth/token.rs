use thiserror::Error;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error, info};
use chrono::{Duration, Utc};

use crate::auth::{AuthConfig, Claims, UserInfo};

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Invalid issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Refresh token used where an access token is required, or the reverse
    #[error("Wrong token type")]
    WrongTokenType,
}

/// Token types for authentication
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType {
    /// Short-lived access token
    Access,
    /// Long-lived refresh token
    Refresh,
}

impl TokenType {
    /// Get the expiration duration for this token type
    fn expiration(&self, config: &AuthConfig) -> Duration {
        match self {
            TokenType::Access => Duration::minutes(config.access_token_minutes),
            TokenType::Refresh => Duration::days(config.refresh_token_days),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Generate a signed token carrying the user's id and role
pub fn generate_token(
    config: &AuthConfig,
    user: &UserInfo,
    token_type: TokenType,
) -> Result<String, SecurityError> {
    let now = Utc::now();
    let expiration = now + token_type.expiration(config);

    let claims = Claims {
        sub: user.user_id.clone(),
        iss: config.issuer.clone(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        role: user.role,
        token_type: token_type.as_str().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    // Never log the token itself
    info!("Generated {:?} token for user {}", token_type, user.user_id);
    debug!("Token expiration: {}", expiration);

    Ok(token)
}

/// Validate a token of the expected type and return its claims
pub fn validate_token(
    config: &AuthConfig,
    token: &str,
    expected: TokenType,
) -> Result<Claims, SecurityError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[config.issuer.as_str()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => SecurityError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            SecurityError::TokenValidation("Invalid signature".to_string())
        }
        _ => SecurityError::TokenValidation(e.to_string()),
    })?;

    if token_data.claims.token_type != expected.as_str() {
        return Err(SecurityError::WrongTokenType);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;

    fn config() -> AuthConfig {
        AuthConfig::new("test_secret_key_for_testing_only")
    }

    fn user() -> UserInfo {
        UserInfo {
            user_id: "user-123".to_string(),
            username: "dr.rao".to_string(),
            full_name: "Dr. Rao".to_string(),
            role: Role::Doctor,
            auth_source: "password".to_string(),
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let config = config();
        let token = generate_token(&config, &user(), TokenType::Access).unwrap();
        assert!(!token.is_empty());

        let claims = validate_token(&config, &token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.iss, "ayuu-api");
        assert_eq!(claims.role, Role::Doctor);
    }

    #[test]
    fn test_token_expiration() {
        let config = config();
        let claims = Claims {
            sub: "user-456".to_string(),
            iss: config.issuer.clone(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
            username: "anu".to_string(),
            full_name: "Anu".to_string(),
            role: Role::Staff,
            token_type: "access".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        match validate_token(&config, &token, TokenType::Access) {
            Err(SecurityError::TokenExpired) => {}
            other => panic!("Expected TokenExpired error but got: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_and_foreign_tokens() {
        let config = config();
        assert!(validate_token(&config, "invalid.token.format", TokenType::Access).is_err());

        let other = AuthConfig::new("a_different_secret");
        let token = generate_token(&other, &user(), TokenType::Access).unwrap();
        assert!(validate_token(&config, &token, TokenType::Access).is_err());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = config();
        let refresh = generate_token(&config, &user(), TokenType::Refresh).unwrap();
        assert!(matches!(
            validate_token(&config, &refresh, TokenType::Access),
            Err(SecurityError::WrongTokenType)
        ));
        assert!(validate_token(&config, &refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_expiration_durations() {
        let config = config();
        assert_eq!(TokenType::Access.expiration(&config), Duration::minutes(15));
        assert_eq!(TokenType::Refresh.expiration(&config), Duration::days(7));
    }
}
