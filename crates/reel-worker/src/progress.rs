//! Job-id-keyed progress store.
//!
//! External clients poll render progress through this channel while the job
//! runs; the engine writes checkpoints into it through the sink bridge.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reel_models::JobId;
use tokio::sync::RwLock;

use crate::store::JobStore;

/// Key-value progress channel, addressed exclusively by job id.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn set(&self, job_id: &JobId, fraction: f32);
    async fn get(&self, job_id: &JobId) -> Option<f32>;
    async fn remove(&self, job_id: &JobId);
}

/// In-process progress store.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    inner: RwLock<HashMap<String, f32>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn set(&self, job_id: &JobId, fraction: f32) {
        self.inner
            .write()
            .await
            .insert(job_id.to_string(), fraction.clamp(0.0, 1.0));
    }

    async fn get(&self, job_id: &JobId) -> Option<f32> {
        self.inner.read().await.get(job_id.as_str()).copied()
    }

    async fn remove(&self, job_id: &JobId) {
        self.inner.write().await.remove(job_id.as_str());
    }
}

/// Adapts the progress store to the engine's sink seam, mirroring each
/// checkpoint onto the job row so both poll channels agree.
pub struct ProgressBridge {
    progress: Arc<dyn ProgressStore>,
    jobs: Arc<dyn JobStore>,
}

impl ProgressBridge {
    pub fn new(progress: Arc<dyn ProgressStore>, jobs: Arc<dyn JobStore>) -> Self {
        Self { progress, jobs }
    }
}

#[async_trait]
impl reel_engine::ProgressSink for ProgressBridge {
    async fn set(&self, job_id: &JobId, fraction: f32) {
        self.progress.set(job_id, fraction).await;
        if let Some(row) = self.jobs.get(job_id).await {
            self.jobs.put(row.with_progress(fraction)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_is_clamped_and_readable() {
        let store = MemoryProgressStore::new();
        let id = JobId::new();

        assert_eq!(store.get(&id).await, None);
        store.set(&id, 0.4).await;
        assert_eq!(store.get(&id).await, Some(0.4));
        store.set(&id, 1.7).await;
        assert_eq!(store.get(&id).await, Some(1.0));

        store.remove(&id).await;
        assert_eq!(store.get(&id).await, None);
    }

    #[tokio::test]
    async fn test_bridge_mirrors_checkpoints_onto_row() {
        use crate::store::MemoryJobStore;
        use reel_engine::ProgressSink;
        use reel_models::{RenderJob, TemplateKind};

        let progress: Arc<dyn ProgressStore> = Arc::new(MemoryProgressStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let row = RenderJob::new("t", "u", TemplateKind::ImageStory, uuid::Uuid::new_v4());
        let id = row.id.clone();
        jobs.put(row).await;

        let bridge = ProgressBridge::new(progress.clone(), jobs.clone());
        bridge.set(&id, 0.2).await;
        bridge.set(&id, 0.575).await;

        assert_eq!(progress.get(&id).await, Some(0.575));
        let row = jobs.get(&id).await.unwrap();
        assert!((row.progress - 0.575).abs() < 1e-6);

        // Stale checkpoints never walk the row backwards.
        bridge.set(&id, 0.3).await;
        let row = jobs.get(&id).await.unwrap();
        assert!((row.progress - 0.575).abs() < 1e-6);
    }
}
