use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::AssetKey,
    error::{DomainError, DomainResult},
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::BlobStore;

pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<AssetKey, Vec<u8>>>,
    latency: Duration,
}

impl MemoryBlobStore {
    pub fn new(latency: Duration) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            latency,
        }
    }

    pub async fn contains(&self, key: &AssetKey) -> bool {
        self.blobs.read().await.contains_key(key)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &AssetKey) -> DomainResult<Vec<u8>> {
        self.simulate_latency().await;
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("asset {key} not found")))
    }

    async fn save(&self, key: &AssetKey, bytes: Vec<u8>) -> DomainResult<()> {
        let size = bytes.len();
        self.blobs.write().await.insert(key.clone(), bytes);
        self.simulate_latency().await;
        debug!(asset_key = %key, size, "saved asset");
        Ok(())
    }

    async fn remove(&self, key: &AssetKey) -> DomainResult<()> {
        self.simulate_latency().await;
        if self.blobs.write().await.remove(key).is_none() {
            return Err(DomainError::invalid_input(format!("unknown asset key {key}")));
        }
        debug!(asset_key = %key, "removed asset");
        Ok(())
    }
}
