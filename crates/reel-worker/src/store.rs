//! Job and parameter-set persistence seams.
//!
//! Writes must be visible to readers immediately after each update; the
//! in-memory implementations back tests and single-process deployments, with
//! a database behind the same traits in larger ones.

use std::collections::HashMap;

use async_trait::async_trait;
use reel_models::{JobId, ParameterSet, RenderJob};
use tokio::sync::RwLock;
use uuid::Uuid;

/// RenderJob table access.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn put(&self, job: RenderJob);
    async fn get(&self, id: &JobId) -> Option<RenderJob>;
    async fn count(&self) -> usize;
}

/// ParameterSet table access.
#[async_trait]
pub trait ParamStore: Send + Sync {
    async fn put(&self, set: ParameterSet);
    async fn get(&self, id: &Uuid) -> Option<ParameterSet>;
}

#[derive(Debug, Default)]
pub struct MemoryJobStore {
    inner: RwLock<HashMap<String, RenderJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, job: RenderJob) {
        self.inner
            .write()
            .await
            .insert(job.id.to_string(), job);
    }

    async fn get(&self, id: &JobId) -> Option<RenderJob> {
        self.inner.read().await.get(id.as_str()).cloned()
    }

    async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[derive(Debug, Default)]
pub struct MemoryParamStore {
    inner: RwLock<HashMap<Uuid, ParameterSet>>,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParamStore for MemoryParamStore {
    async fn put(&self, set: ParameterSet) {
        self.inner.write().await.insert(set.id, set);
    }

    async fn get(&self, id: &Uuid) -> Option<ParameterSet> {
        self.inner.read().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::TemplateKind;

    #[tokio::test]
    async fn test_job_store_roundtrip() {
        let store = MemoryJobStore::new();
        let job = RenderJob::new("t", "u", TemplateKind::ImageStory, Uuid::new_v4());
        let id = job.id.clone();

        store.put(job).await;
        assert_eq!(store.count().await, 1);

        let updated = store.get(&id).await.unwrap().with_progress(0.5);
        store.put(updated).await;
        assert_eq!(store.get(&id).await.unwrap().progress, 0.5);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_param_store_roundtrip() {
        let store = MemoryParamStore::new();
        let set = ParameterSet::snapshot(serde_json::json!({"title": "x"}));
        let id = set.id;
        store.put(set).await;
        assert_eq!(store.get(&id).await.unwrap().raw["title"], "x");
    }
}
