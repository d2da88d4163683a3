//! Bearer tokens
//!
//! HS256 JWTs. Access and refresh tokens are signed with separate secrets
//! and carry their kind in `token_type`, so neither can stand in for the
//! other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid NIK or password")]
    InvalidCredentials,

    #[error("Token encoding error: {0}")]
    Encoding(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub customer_id: Uuid,
    pub nik: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token
    pub expires_at: DateTime<Utc>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Keys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and validates bearer tokens
#[derive(Clone)]
pub struct TokenService {
    access: std::sync::Arc<Keys>,
    refresh: std::sync::Arc<Keys>,
}

impl TokenService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access: std::sync::Arc::new(Keys::new(access_secret, access_ttl)),
            refresh: std::sync::Arc::new(Keys::new(refresh_secret, refresh_ttl)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_refresh_secret,
            Duration::minutes(config.access_token_expiry_minutes),
            Duration::days(config.refresh_token_expiry_days),
        )
    }

    /// Issue a new access/refresh pair for a customer.
    pub fn issue(&self, customer_id: Uuid, nik: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let (access_token, expires_at) =
            self.sign(TokenType::Access, customer_id, nik, now)?;
        let (refresh_token, _) = self.sign(TokenType::Refresh, customer_id, nik, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate(TokenType::Access, token)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate(TokenType::Refresh, token)
    }

    /// Exchange a valid refresh token for a new pair.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate_refresh(refresh_token)?;
        self.issue(claims.customer_id, &claims.nik)
    }

    fn keys(&self, token_type: TokenType) -> &Keys {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    fn sign(
        &self,
        token_type: TokenType,
        customer_id: Uuid,
        nik: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let keys = self.keys(token_type);
        let expires_at = now + keys.ttl;
        let claims = Claims {
            customer_id,
            nik: nik.to_string(),
            token_type,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;

        Ok((token, expires_at))
    }

    fn validate(&self, expected: TokenType, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &self.keys(expected).decoding, &validation).map_err(
            |e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            },
        )?;

        if data.claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIK: &str = "3201234567890001";

    fn service() -> TokenService {
        TokenService::new(
            "access-secret",
            "refresh-secret",
            Duration::minutes(15),
            Duration::days(7),
        )
    }

    #[test]
    fn test_issue_and_validate_access() {
        let service = service();
        let customer_id = Uuid::new_v4();

        let pair = service.issue(customer_id, NIK).unwrap();
        let claims = service.validate_access(&pair.access_token).unwrap();

        assert_eq!(claims.customer_id, customer_id);
        assert_eq!(claims.nik, NIK);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp, pair.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = service();
        let pair = service.issue(Uuid::new_v4(), NIK).unwrap();

        assert!(service.validate_access(&pair.refresh_token).is_err());
        assert!(service.validate_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_kind_checked_even_with_shared_secret() {
        let service = TokenService::new("same", "same", Duration::minutes(15), Duration::days(7));
        let pair = service.issue(Uuid::new_v4(), NIK).unwrap();

        assert!(matches!(
            service.validate_access(&pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_issues_new_pair_for_same_customer() {
        let service = service();
        let customer_id = Uuid::new_v4();
        let pair = service.issue(customer_id, NIK).unwrap();

        let refreshed = service.refresh(&pair.refresh_token).unwrap();
        let claims = service.validate_access(&refreshed.access_token).unwrap();
        assert_eq!(claims.customer_id, customer_id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            customer_id: Uuid::new_v4(),
            nik: NIK.to_string(),
            token_type: TokenType::Access,
            iat: past.timestamp(),
            nbf: past.timestamp(),
            exp: (past + Duration::minutes(15)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert!(matches!(
            service.validate_access(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service().validate_access("not.a.jwt").is_err());
    }
}
