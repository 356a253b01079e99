/// Refresh Token Management
///
/// Refresh tokens are opaque capabilities:
/// - 32 bytes from the OS random number generator, hex encoded (64 characters)
/// - persisted with an expiry 60 days out and a nullable revocation time
/// - never rotated or extended; revocation is the only mutation
///
/// `lookup` deliberately does not judge expiry or revocation so that the caller can log
/// which of "unknown", "expired" and "revoked" applied.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::RefreshTokenRecord;
use crate::store::{Store, StoreError};

const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    store: Arc<dyn Store>,
    lifetime: Duration,
}

impl RefreshTokenStore {
    pub fn new(store: Arc<dyn Store>, lifetime: Duration) -> Self {
        Self { store, lifetime }
    }

    /// Create and persist a refresh token owned by `user_id`
    ///
    /// # Errors
    /// Returns an error if the database write fails
    pub async fn issue(&self, user_id: Uuid) -> Result<IssuedRefreshToken, AppError> {
        let token = generate_refresh_token();
        let expires_at = Utc::now() + self.lifetime;

        let record = self
            .store
            .create_refresh_token(&token, user_id, expires_at)
            .await?;

        Ok(IssuedRefreshToken {
            token: record.token,
            expires_at: record.expires_at,
        })
    }

    pub async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, RefreshTokenError> {
        self.store
            .get_refresh_token_and_owner(token)
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Revoke a refresh token. Unknown and already revoked tokens are left as they are.
    pub async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        self.store.revoke_refresh_token(token, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, RefreshTokenState};
    use crate::store::InMemoryStore;

    async fn store_with_user() -> (RefreshTokenStore, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .create_user(NewUser {
                email: "alice@example.com".to_string(),
                hashed_password: "hash".to_string(),
            })
            .await
            .unwrap();
        (RefreshTokenStore::new(store, Duration::days(60)), user.id)
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), 64);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_tokens_are_unique() {
        let token1 = generate_refresh_token();
        let token2 = generate_refresh_token();

        assert_ne!(token1, token2);
    }

    #[tokio::test]
    async fn test_issue_persists_with_sixty_day_expiry() {
        let (tokens, user_id) = store_with_user().await;
        let before = Utc::now();

        let issued = tokens.issue(user_id).await.unwrap();
        let record = tokens.lookup(&issued.token).await.unwrap();

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.expires_at, issued.expires_at);
        assert!(record.revoked_at.is_none());
        assert!(issued.expires_at >= before + Duration::days(60));
        assert!(issued.expires_at <= Utc::now() + Duration::days(60));
    }

    #[tokio::test]
    async fn test_lookup_unknown_token() {
        let (tokens, _) = store_with_user().await;

        let result = tokens.lookup(&generate_refresh_token()).await;
        assert!(matches!(result, Err(RefreshTokenError::NotFound)));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (tokens, user_id) = store_with_user().await;
        let issued = tokens.issue(user_id).await.unwrap();

        tokens.revoke(&issued.token).await.unwrap();
        let first = tokens.lookup(&issued.token).await.unwrap();
        tokens.revoke(&issued.token).await.unwrap();
        let second = tokens.lookup(&issued.token).await.unwrap();

        assert_eq!(first.state(Utc::now()), RefreshTokenState::Revoked);
        assert_eq!(first.revoked_at, second.revoked_at);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_ok() {
        let (tokens, _) = store_with_user().await;

        assert!(tokens.revoke("no-such-token").await.is_ok());
    }
}
