//! Single-purpose async operations over the persistence collaborators.
//!
//! Each use case is a narrow trait so screens depend only on what they call;
//! the `Default*` types are the store-backed implementations.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{AssetKey, AttachmentKind, UserDetail, UserId, UserRecord},
    error::{DomainError, DomainResult},
};
use storage::{BlobStore, ContentLoader, RecordStore};
use tracing::{debug, info};

mod assembler;

pub use assembler::{assemble, persist, DefaultGetUserDetail, DefaultUpsertUser};

#[async_trait]
pub trait ListUsers: Send + Sync {
    async fn execute(&self) -> DomainResult<Vec<UserRecord>>;
}

#[async_trait]
pub trait GetUserDetail: Send + Sync {
    async fn execute(&self, id: &UserId) -> DomainResult<UserDetail>;
}

#[async_trait]
pub trait UpsertUser: Send + Sync {
    /// Creates the user when `detail.id` is absent, updates it otherwise.
    /// Returns the id the user is stored under.
    async fn execute(&self, detail: UserDetail) -> DomainResult<UserId>;
}

#[async_trait]
pub trait AddAttachment: Send + Sync {
    async fn execute(
        &self,
        owner: Option<&UserId>,
        content_ref: &str,
        kind: AttachmentKind,
    ) -> DomainResult<AssetKey>;
}

#[async_trait]
pub trait FetchAttachment: Send + Sync {
    async fn execute(&self, key: &AssetKey) -> DomainResult<Vec<u8>>;
}

#[async_trait]
pub trait DeleteUser: Send + Sync {
    async fn execute(&self, id: &UserId) -> DomainResult<()>;
}

#[async_trait]
pub trait UpdatePassword: Send + Sync {
    async fn execute(&self, id: &UserId, secret: &str) -> DomainResult<()>;
}

pub struct DefaultListUsers {
    records: Arc<dyn RecordStore>,
}

impl DefaultListUsers {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ListUsers for DefaultListUsers {
    async fn execute(&self) -> DomainResult<Vec<UserRecord>> {
        self.records.list().await
    }
}

pub struct DefaultAddAttachment {
    loader: Arc<dyn ContentLoader>,
    blobs: Arc<dyn BlobStore>,
}

impl DefaultAddAttachment {
    pub fn new(loader: Arc<dyn ContentLoader>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { loader, blobs }
    }
}

#[async_trait]
impl AddAttachment for DefaultAddAttachment {
    async fn execute(
        &self,
        owner: Option<&UserId>,
        content_ref: &str,
        kind: AttachmentKind,
    ) -> DomainResult<AssetKey> {
        let bytes = self.loader.load(content_ref).await?;
        let key = kind.asset_key(owner.map(UserId::as_str).unwrap_or_default());
        self.blobs.save(&key, bytes).await?;
        debug!(asset_key = %key, ?kind, "attachment staged");
        Ok(key)
    }
}

pub struct DefaultFetchAttachment {
    blobs: Arc<dyn BlobStore>,
}

impl DefaultFetchAttachment {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }
}

#[async_trait]
impl FetchAttachment for DefaultFetchAttachment {
    async fn execute(&self, key: &AssetKey) -> DomainResult<Vec<u8>> {
        self.blobs.get(key).await
    }
}

pub struct DefaultDeleteUser {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DefaultDeleteUser {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }
}

#[async_trait]
impl DeleteUser for DefaultDeleteUser {
    async fn execute(&self, id: &UserId) -> DomainResult<()> {
        self.records.remove(id).await?;
        for kind in AttachmentKind::ALL {
            let key = kind.asset_key(id.as_str());
            match self.blobs.remove(&key).await {
                Ok(()) => debug!(asset_key = %key, "removed attachment of deleted user"),
                Err(DomainError::InvalidInput(_)) | Err(DomainError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

pub struct DefaultUpdatePassword {
    records: Arc<dyn RecordStore>,
}

impl DefaultUpdatePassword {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl UpdatePassword for DefaultUpdatePassword {
    async fn execute(&self, id: &UserId, secret: &str) -> DomainResult<()> {
        self.records.set_credential(id, secret).await?;
        info!(user_id = %id, "password updated");
        Ok(())
    }
}

/// Every use case a screen may need, ready to hand to controllers.
#[derive(Clone)]
pub struct UseCases {
    pub list_users: Arc<dyn ListUsers>,
    pub get_user_detail: Arc<dyn GetUserDetail>,
    pub upsert_user: Arc<dyn UpsertUser>,
    pub add_attachment: Arc<dyn AddAttachment>,
    pub fetch_attachment: Arc<dyn FetchAttachment>,
    pub delete_user: Arc<dyn DeleteUser>,
    pub update_password: Arc<dyn UpdatePassword>,
}

impl UseCases {
    pub fn from_stores(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        loader: Arc<dyn ContentLoader>,
    ) -> Self {
        Self {
            list_users: Arc::new(DefaultListUsers::new(Arc::clone(&records))),
            get_user_detail: Arc::new(DefaultGetUserDetail::new(
                Arc::clone(&records),
                Arc::clone(&blobs),
            )),
            upsert_user: Arc::new(DefaultUpsertUser::new(
                Arc::clone(&records),
                Arc::clone(&blobs),
            )),
            add_attachment: Arc::new(DefaultAddAttachment::new(loader, Arc::clone(&blobs))),
            fetch_attachment: Arc::new(DefaultFetchAttachment::new(Arc::clone(&blobs))),
            delete_user: Arc::new(DefaultDeleteUser::new(Arc::clone(&records), blobs)),
            update_password: Arc::new(DefaultUpdatePassword::new(records)),
        }
    }
}

#[cfg(test)]
#[path = "../tests/usecase_tests.rs"]
mod tests;
