use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{Gobit, NewUser, RefreshTokenRecord, SortOrder, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    gobits: Vec<Gobit>,
}

/// Process-local store with the same constraints as the Postgres schema:
/// unique emails, unique refresh tokens, cascading user deletion.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("Lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("Lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.read()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: user.email,
            hashed_password: user.hashed_password,
            is_gohost_red: false,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn upgrade_membership(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.is_gohost_red = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Backend(format!(
                "refresh_tokens.user_id references missing user {}",
                user_id
            )));
        }
        if tables.refresh_tokens.contains_key(token) {
            return Err(StoreError::Conflict("refresh_tokens_pkey".to_string()));
        }

        let now = Utc::now();
        let record = RefreshTokenRecord {
            token: token.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };
        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token_and_owner(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.read()?.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(record) = tables.refresh_tokens.get_mut(token) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(at);
                record.updated_at = at;
            }
        }
        Ok(())
    }

    async fn reset_all_users(&self) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        *tables = Tables::default();
        Ok(())
    }

    async fn create_gobit(&self, body: &str, user_id: Uuid) -> Result<Gobit, StoreError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Backend(format!(
                "gobits.user_id references missing user {}",
                user_id
            )));
        }

        let now = Utc::now();
        let gobit = Gobit {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        tables.gobits.push(gobit.clone());
        Ok(gobit)
    }

    async fn list_gobits(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Gobit>, StoreError> {
        let tables = self.read()?;
        let mut gobits: Vec<Gobit> = tables
            .gobits
            .iter()
            .filter(|g| author.map_or(true, |a| g.user_id == a))
            .cloned()
            .collect();

        gobits.sort_by_key(|g| g.created_at);
        if order == SortOrder::Descending {
            gobits.reverse();
        }
        Ok(gobits)
    }

    async fn get_gobit(&self, id: Uuid) -> Result<Option<Gobit>, StoreError> {
        Ok(self.read()?.gobits.iter().find(|g| g.id == id).cloned())
    }

    async fn delete_gobit(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let before = tables.gobits.len();
        tables.gobits.retain(|g| !(g.id == id && g.user_id == owner));
        Ok(tables.gobits.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = InMemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        let result = store.create_user(new_user("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = InMemoryStore::new();
        store.create_user(new_user("Alice@example.com")).await.unwrap();

        assert!(store.find_user_by_email("alice@example.com").await.unwrap().is_none());
        assert!(store.find_user_by_email("Alice@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_timestamp() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let expires = Utc::now() + Duration::days(60);
        store.create_refresh_token("tok", user.id, expires).await.unwrap();

        let first = Utc::now();
        store.revoke_refresh_token("tok", first).await.unwrap();
        store
            .revoke_refresh_token("tok", first + Duration::seconds(5))
            .await
            .unwrap();

        let record = store.get_refresh_token_and_owner("tok").await.unwrap().unwrap();
        assert_eq!(record.revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.revoke_refresh_token("missing", Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_refresh_token_is_conflict() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let expires = Utc::now() + Duration::days(60);
        store.create_refresh_token("tok", user.id, expires).await.unwrap();

        let result = store.create_refresh_token("tok", user.id, expires).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_gobit_requires_owner() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();
        let gobit = store.create_gobit("hello", alice.id).await.unwrap();

        assert!(!store.delete_gobit(gobit.id, bob.id).await.unwrap());
        assert!(store.get_gobit(gobit.id).await.unwrap().is_some());

        assert!(store.delete_gobit(gobit.id, alice.id).await.unwrap());
        assert!(store.get_gobit(gobit.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_gobits_filters_and_sorts() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();
        let first = store.create_gobit("first", alice.id).await.unwrap();
        store.create_gobit("other", bob.id).await.unwrap();
        let second = store.create_gobit("second", alice.id).await.unwrap();

        let asc = store.list_gobits(Some(alice.id), SortOrder::Ascending).await.unwrap();
        assert_eq!(asc, vec![first.clone(), second.clone()]);

        let desc = store.list_gobits(Some(alice.id), SortOrder::Descending).await.unwrap();
        assert_eq!(desc, vec![second, first]);

        let all = store.list_gobits(None, SortOrder::Ascending).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_reset_removes_dependent_rows() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        store
            .create_refresh_token("tok", user.id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        store.create_gobit("hi", user.id).await.unwrap();

        store.reset_all_users().await.unwrap();

        assert!(store.find_user_by_id(user.id).await.unwrap().is_none());
        assert!(store.get_refresh_token_and_owner("tok").await.unwrap().is_none());
        assert!(store.list_gobits(None, SortOrder::Ascending).await.unwrap().is_empty());
    }
}
