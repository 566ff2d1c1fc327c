//! Persistence collaborators: keyed user records, keyed attachment blobs and
//! an external content loader.
//!
//! Every operation is a single-result async call. Each in-memory store guards
//! its map with one lock, so concurrent calls never observe partial writes, but
//! nothing is transactional across calls or across stores.

use async_trait::async_trait;
use shared::{
    domain::{AssetKey, UserId, UserRecord},
    error::DomainResult,
};

mod blobs;
mod content;
mod records;

pub use blobs::MemoryBlobStore;
pub use content::FsContentLoader;
pub use records::MemoryRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self) -> DomainResult<Vec<UserRecord>>;
    async fn get(&self, id: &UserId) -> DomainResult<UserRecord>;
    /// Stores a new record and returns its generated id. Fails with
    /// `InvalidInput` when the record already carries an id.
    async fn insert(&self, record: UserRecord) -> DomainResult<UserId>;
    async fn update(&self, record: UserRecord) -> DomainResult<()>;
    async fn remove(&self, id: &UserId) -> DomainResult<()>;
    async fn set_credential(&self, id: &UserId, secret: &str) -> DomainResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &AssetKey) -> DomainResult<Vec<u8>>;
    async fn save(&self, key: &AssetKey, bytes: Vec<u8>) -> DomainResult<()>;
    async fn remove(&self, key: &AssetKey) -> DomainResult<()>;
}

#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, reference: &str) -> DomainResult<Vec<u8>>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
