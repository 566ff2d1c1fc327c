//! Two-phase mapping between a user record plus its keyed attachments and the
//! [`UserDetail`] aggregate.
//!
//! Reading merges the record with both attachment lookups; a missing or
//! unreadable attachment degrades to "no attachment" instead of failing the
//! load. Writing splits the aggregate into a record write followed by up to two
//! attachment writes, strictly in that order. A failed step stops the chain and
//! is reported as-is: earlier writes are not rolled back.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{AttachmentKind, UserDetail, UserId},
    error::DomainResult,
};
use storage::{BlobStore, RecordStore};
use tracing::{debug, info};

use super::{GetUserDetail, UpsertUser};

pub async fn assemble(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    id: &UserId,
) -> DomainResult<UserDetail> {
    let record = records.get(id).await?;
    let owner = record.id.clone().unwrap_or_else(|| id.clone());
    let mut detail = UserDetail::from_record(record);
    detail.id = Some(owner.clone());

    for kind in AttachmentKind::ALL {
        let key = kind.asset_key(owner.as_str());
        match blobs.get(&key).await {
            Ok(bytes) => detail.set_attachment(kind, Some(bytes)),
            Err(err) => debug!(asset_key = %key, error = %err, "attachment unavailable"),
        }
    }
    Ok(detail)
}

pub async fn persist(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    detail: UserDetail,
) -> DomainResult<UserId> {
    // an empty id means "not created yet", same as an absent one
    let id = match detail.id.clone().filter(|id| !id.as_str().is_empty()) {
        None => {
            let mut record = detail.record();
            record.id = None;
            let id = records.insert(record).await?;
            info!(user_id = %id, "user created");
            id
        }
        Some(id) => {
            records.update(detail.record()).await?;
            info!(user_id = %id, "user updated");
            id
        }
    };

    for kind in AttachmentKind::ALL {
        if let Some(bytes) = detail.attachment(kind) {
            blobs.save(&kind.asset_key(id.as_str()), bytes.to_vec()).await?;
        }
    }
    Ok(id)
}

pub struct DefaultGetUserDetail {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DefaultGetUserDetail {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }
}

#[async_trait]
impl GetUserDetail for DefaultGetUserDetail {
    async fn execute(&self, id: &UserId) -> DomainResult<UserDetail> {
        assemble(self.records.as_ref(), self.blobs.as_ref(), id).await
    }
}

pub struct DefaultUpsertUser {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DefaultUpsertUser {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }

    /// Hook for server-consistent form checks. Field rules are enforced by the
    /// edit screen, so nothing is rejected here yet.
    fn preflight(&self, _detail: &UserDetail) -> DomainResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UpsertUser for DefaultUpsertUser {
    async fn execute(&self, detail: UserDetail) -> DomainResult<UserId> {
        self.preflight(&detail)?;
        persist(self.records.as_ref(), self.blobs.as_ref(), detail).await
    }
}
