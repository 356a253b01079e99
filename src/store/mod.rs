/// Persistence layer
///
/// The credential core only talks to storage through the `Store` trait. `PgStore` is the
/// production backend; `InMemoryStore` backs tests and `database.in_memory` deployments.
/// Absent rows are `Ok(None)`; `StoreError` is reserved for real failures.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Gobit, NewUser, RefreshTokenRecord, SortOrder, User};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate entry: {0}")]
    Conflict(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Replace email and password hash. `None` if the user does not exist.
    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Mark the user as a paying member. `None` if the user does not exist.
    async fn upgrade_membership(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError>;

    async fn get_refresh_token_and_owner(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Set `revoked_at` unless it is already set. Unknown tokens are ignored.
    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Delete every user along with their tokens and gobits.
    async fn reset_all_users(&self) -> Result<(), StoreError>;

    async fn create_gobit(&self, body: &str, user_id: Uuid) -> Result<Gobit, StoreError>;

    async fn list_gobits(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Gobit>, StoreError>;

    async fn get_gobit(&self, id: Uuid) -> Result<Option<Gobit>, StoreError>;

    /// Delete a gobit only if `owner` wrote it. Returns whether a row was removed.
    async fn delete_gobit(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}
