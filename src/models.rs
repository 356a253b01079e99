/// Persistent records shared by the store implementations and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A registered account.
///
/// `hashed_password` is skipped during serialization so a `User` can never leak it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_gohost_red: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
}

/// A persisted refresh token row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a refresh token. `Expired` and `Revoked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

impl RefreshTokenRecord {
    /// Revocation takes precedence over expiry.
    pub fn state(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if now > self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}

/// A short text post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Gobit {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}
