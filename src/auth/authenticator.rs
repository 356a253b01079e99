/// Login, refresh and revoke.
///
/// Passwords are checked once, at login. After that the refresh token stands in for the
/// password: it can mint new access tokens until it expires or is revoked.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::auth::jwt::{AccessTokenCodec, IssuedAccessToken};
use crate::auth::password::{verify_dummy_password, verify_password};
use crate::auth::refresh_token::{RefreshTokenError, RefreshTokenStore};
use crate::error::{AppError, AuthError};
use crate::models::{RefreshTokenState, User};
use crate::store::Store;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn Store>,
    codec: AccessTokenCodec,
    refresh_tokens: RefreshTokenStore,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn Store>,
        codec: AccessTokenCodec,
        refresh_tokens: RefreshTokenStore,
    ) -> Self {
        Self {
            store,
            codec,
            refresh_tokens,
        }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Verify email and password and open a session
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password, indistinguishably
    /// - internal/store errors if hashing, signing or persistence fails
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl: Option<Duration>,
    ) -> Result<Session, AppError> {
        let user = match self.store.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                verify_dummy_password(password).await;
                tracing::info!("Login attempt for unknown account");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(password, &user.hashed_password).await? {
            tracing::info!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let access = self.codec.issue(user.id, requested_ttl)?;
        let refresh = self.refresh_tokens.issue(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session {
            user,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_token_expires_at: refresh.expires_at,
        })
    }

    /// Mint a new access token from a refresh token. The refresh token is left unchanged.
    ///
    /// # Errors
    /// `Unauthorized` if the token is unknown, revoked or expired
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedAccessToken, AppError> {
        let record = match self.refresh_tokens.lookup(refresh_token).await {
            Ok(record) => record,
            Err(RefreshTokenError::NotFound) => {
                return Err(AuthError::RefreshTokenNotFound.into());
            }
            Err(RefreshTokenError::Store(e)) => return Err(e.into()),
        };

        match record.state(Utc::now()) {
            RefreshTokenState::Revoked => {
                tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
                Err(AuthError::RefreshTokenRevoked.into())
            }
            RefreshTokenState::Expired => {
                tracing::info!(user_id = %record.user_id, "Refresh token expired");
                Err(AuthError::RefreshTokenExpired.into())
            }
            RefreshTokenState::Active => {
                let access = self.codec.issue(record.user_id, None)?;
                tracing::info!(user_id = %record.user_id, "Access token refreshed");
                Ok(access)
            }
        }
    }

    /// Revoke a refresh token. Always succeeds from the caller's point of view: failures
    /// are logged, never reported, so the endpoint reveals nothing about which tokens exist.
    pub async fn revoke(&self, refresh_token: &str) {
        if let Err(e) = self.refresh_tokens.revoke(refresh_token).await {
            tracing::error!(error = %e, "Failed to revoke refresh token");
        }
    }
}
