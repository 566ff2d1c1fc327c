use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{UserId, UserRecord},
    error::{DomainError, DomainResult},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::RecordStore;

#[derive(Debug, Clone)]
struct StoredUser {
    record: UserRecord,
    password: Option<String>,
}

/// User records and their credentials kept in one map.
pub struct MemoryRecordStore {
    users: RwLock<HashMap<UserId, StoredUser>>,
    latency: Duration,
}

impl MemoryRecordStore {
    pub fn new(latency: Duration) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            latency,
        }
    }

    /// Builds a store pre-populated with records that already carry ids.
    /// Records without an id are skipped.
    pub fn with_seed_users(latency: Duration, seed: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = seed
            .into_iter()
            .filter_map(|record| {
                let id = record.id.clone()?;
                Some((
                    id,
                    StoredUser {
                        record,
                        password: None,
                    },
                ))
            })
            .collect();
        Self {
            users: RwLock::new(users),
            latency,
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    pub async fn credential(&self, id: &UserId) -> Option<String> {
        self.users
            .read()
            .await
            .get(id)
            .and_then(|stored| stored.password.clone())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self) -> DomainResult<Vec<UserRecord>> {
        self.simulate_latency().await;
        let users = self.users.read().await;
        debug!(count = users.len(), "listing user records");
        Ok(users.values().map(|stored| stored.record.clone()).collect())
    }

    async fn get(&self, id: &UserId) -> DomainResult<UserRecord> {
        self.simulate_latency().await;
        let users = self.users.read().await;
        users
            .get(id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))
    }

    async fn insert(&self, mut record: UserRecord) -> DomainResult<UserId> {
        if record.id.is_some() {
            return Err(DomainError::invalid_input(
                "record to insert already has an id",
            ));
        }
        self.simulate_latency().await;

        let id = UserId(Uuid::new_v4().to_string());
        record.id = Some(id.clone());
        self.users.write().await.insert(
            id.clone(),
            StoredUser {
                record,
                password: None,
            },
        );
        debug!(user_id = %id, "inserted user record");
        Ok(id)
    }

    async fn update(&self, record: UserRecord) -> DomainResult<()> {
        self.simulate_latency().await;
        let Some(id) = record.id.clone() else {
            return Err(DomainError::invalid_input("record to update has no id"));
        };

        let mut users = self.users.write().await;
        let password = users.get(&id).and_then(|stored| stored.password.clone());
        users.insert(id.clone(), StoredUser { record, password });
        debug!(user_id = %id, "updated user record");
        Ok(())
    }

    async fn remove(&self, id: &UserId) -> DomainResult<()> {
        self.simulate_latency().await;
        if self.users.write().await.remove(id).is_none() {
            return Err(DomainError::invalid_input(format!("unknown user id {id}")));
        }
        debug!(user_id = %id, "removed user record");
        Ok(())
    }

    async fn set_credential(&self, id: &UserId, secret: &str) -> DomainResult<()> {
        self.simulate_latency().await;
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(id)
            .ok_or_else(|| DomainError::invalid_input(format!("unknown user id {id}")))?;
        stored.password = Some(secret.to_string());
        debug!(user_id = %id, "updated user credential");
        Ok(())
    }
}
