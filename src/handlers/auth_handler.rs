//! Auth Handler
//!
//! Login and token refresh. Registration goes through `CustomerHandler`.

use sqlx::PgPool;

use crate::auth::{verify_password, AuthError, TokenPair, TokenService};
use crate::cache::CacheAside;
use crate::domain::Nik;
use crate::error::{AppError, AppResult};
use crate::store::CustomerDirectory;

use super::{AuthTokens, LoginCommand, RefreshTokenCommand};

impl From<TokenPair> for AuthTokens {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_at: pair.expires_at,
        }
    }
}

pub struct AuthHandler {
    directory: CustomerDirectory,
    tokens: TokenService,
}

impl AuthHandler {
    pub fn new(pool: PgPool, cache: CacheAside, tokens: TokenService) -> Self {
        Self {
            directory: CustomerDirectory::new(pool, cache),
            tokens,
        }
    }

    /// Check NIK and password. Every failed check, a malformed NIK
    /// included, is `InvalidCredentials` to the caller.
    pub async fn login(&self, command: LoginCommand) -> AppResult<AuthTokens> {
        let nik = Nik::parse(&command.nik).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .directory
            .find_credentials_by_nik(&nik)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = command.password;
        let stored_hash = credentials.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))??;

        if !valid {
            tracing::info!(customer_id = %credentials.customer_id, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = self
            .tokens
            .issue(credentials.customer_id, credentials.nik.as_str())?;

        tracing::info!(customer_id = %credentials.customer_id, "Customer logged in");

        Ok(pair.into())
    }

    pub fn refresh(&self, command: RefreshTokenCommand) -> AppResult<AuthTokens> {
        Ok(self.tokens.refresh(&command.refresh_token)?.into())
    }
}
