use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{Gobit, NewUser, RefreshTokenRecord, SortOrder, User};

/// Postgres error code for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, created_at, updated_at, email, hashed_password, is_gohost_red
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, created_at, updated_at, email, hashed_password, is_gohost_red
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, updated_at, email, hashed_password, is_gohost_red
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(now)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, created_at, updated_at, email, hashed_password, is_gohost_red
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn upgrade_membership(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_gohost_red = true, updated_at = $2
            WHERE id = $1
            RETURNING id, created_at, updated_at, email, hashed_password, is_gohost_red
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING token, user_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(token)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_refresh_token_and_owner(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        // The revoked_at guard keeps the first revocation time and makes this idempotent
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(at)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset_all_users(&self) -> Result<(), StoreError> {
        // refresh_tokens and gobits cascade
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_gobit(&self, body: &str, user_id: Uuid) -> Result<Gobit, StoreError> {
        let now = Utc::now();
        let gobit = sqlx::query_as::<_, Gobit>(
            r#"
            INSERT INTO gobits (id, created_at, updated_at, body, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, updated_at, body, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(now)
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(gobit)
    }

    async fn list_gobits(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Gobit>, StoreError> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        // direction comes from a closed enum, never from user input
        let sql = format!(
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM gobits
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at {direction}
            "#
        );

        let gobits = sqlx::query_as::<_, Gobit>(&sql)
            .bind(author)
            .fetch_all(&self.pool)
            .await?;

        Ok(gobits)
    }

    async fn get_gobit(&self, id: Uuid) -> Result<Option<Gobit>, StoreError> {
        let gobit = sqlx::query_as::<_, Gobit>(
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM gobits
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(gobit)
    }

    async fn delete_gobit(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM gobits WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
