//! Session token and password module.
//!
//! Handles JWT issuing/validation and argon2 password hashing. A token is
//! only half of a session: its `jti` must also match a row in the
//! `sessions` table (see [`crate::context`]).

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shopbook_db::Session;
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID, the id of the session row
    pub jti: String,
}

/// A signed token together with the session row it refers to.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session: Session,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Generate a token for `account_id`. The caller persists the session.
    pub fn issue(&self, account_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, ApiError> {
        let expires_at = now + Duration::seconds(self.lifetime_secs);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            created_at: now,
            expires_at,
        };

        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: session.id.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "Failed to sign session token");
            ApiError::Store
        })?;

        Ok(IssuedToken { token, session })
    }

    /// Validate signature and expiry, and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized("invalid or expired session".to_string()))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password into a salted PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ApiError::Store
        })
}

/// Check a password against a stored hash. An unparsable hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret-test-secret";

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new(SECRET, 3600);
        let issued = manager.issue("account-001", Utc::now()).unwrap();

        let claims = manager.validate_token(&issued.token).unwrap();

        assert_eq!(claims.sub, "account-001");
        assert_eq!(claims.jti, issued.session.id);
        assert_eq!(issued.session.account_id, "account-001");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = JwtManager::new(SECRET, 3600).issue("a", Utc::now()).unwrap();
        let other = JwtManager::new("another-secret-another-secret-xx", 3600);

        assert!(other.validate_token(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new(SECRET, 60);
        let issued = manager
            .issue("a", Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(manager.validate_token(&issued.token).is_err());
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("s3cret!").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }
}
