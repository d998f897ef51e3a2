//! Asset resolution.
//!
//! Templates reference media by [`AssetId`]; the store turns an id into a
//! local file path. A missing asset is fatal for the job, so resolution
//! returns an error rather than a placeholder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reel_models::AssetId;

use crate::error::{EngineError, EngineResult};

/// A resolved asset on the local filesystem.
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub path: PathBuf,
}

/// Resolves asset ids to local files.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn get(&self, id: &AssetId) -> EngineResult<AssetFile>;
}

/// Extensions tried when an id carries none.
const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "mp3", "wav", "m4a", "aac"];

/// Directory-backed asset store.
///
/// An id is looked up verbatim under the root first, then with each known
/// extension appended.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn candidates(&self, id: &AssetId) -> impl Iterator<Item = PathBuf> + '_ {
        let base = self.root.join(Path::new(id.as_str()));
        std::iter::once(base.clone()).chain(
            KNOWN_EXTENSIONS
                .iter()
                .map(move |ext| base.with_extension(ext)),
        )
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn get(&self, id: &AssetId) -> EngineResult<AssetFile> {
        for candidate in self.candidates(id) {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Ok(AssetFile { path: candidate });
            }
        }
        Err(EngineError::asset_not_found(id.as_str()))
    }
}
