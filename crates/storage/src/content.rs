use std::path::PathBuf;

use async_trait::async_trait;
use shared::error::{DomainError, DomainResult};
use tracing::debug;
use url::Url;

use crate::ContentLoader;

/// Reads content references that point at the local filesystem, either as
/// `file://` URLs or as plain paths.
#[derive(Debug, Clone, Default)]
pub struct FsContentLoader;

impl FsContentLoader {
    pub fn new() -> Self {
        Self
    }

    fn resolve(reference: &str) -> DomainResult<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(DomainError::load_failure("empty content reference"));
        }

        match Url::parse(reference) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| {
                DomainError::load_failure(format!("unusable file url '{reference}'"))
            }),
            Ok(url) => Err(DomainError::load_failure(format!(
                "unsupported content scheme '{}'",
                url.scheme()
            ))),
            Err(_) => Ok(PathBuf::from(reference)),
        }
    }
}

#[async_trait]
impl ContentLoader for FsContentLoader {
    async fn load(&self, reference: &str) -> DomainResult<Vec<u8>> {
        let path = Self::resolve(reference)?;
        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            DomainError::load_failure(format!("failed to read '{}': {err}", path.display()))
        })?;
        debug!(path = %path.display(), size = bytes.len(), "loaded content");
        Ok(bytes)
    }
}
