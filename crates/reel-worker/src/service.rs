//! Job submission service.
//!
//! Validation happens synchronously here, before any job row or resource
//! exists: an unknown template id or invalid parameters never leave a
//! dangling job to clean up. Accepted jobs are persisted and handed to the
//! worker pool over a channel; submission returns immediately with the id.

use std::sync::Arc;

use reel_models::{JobId, ParameterSet, RenderJob, TemplateKind, TemplateParams};
use tokio::sync::mpsc;
use tracing::info;
use validator::Validate;

use crate::error::{WorkerError, WorkerResult};
use crate::registry::TemplateRegistry;
use crate::store::{JobStore, ParamStore};

/// One accepted job handed to the executor.
#[derive(Debug)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub kind: TemplateKind,
    pub params: TemplateParams,
}

/// Front door for video generation.
pub struct VideoService {
    registry: Arc<TemplateRegistry>,
    jobs: Arc<dyn JobStore>,
    params: Arc<dyn ParamStore>,
    submit_tx: mpsc::Sender<QueuedJob>,
}

impl VideoService {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        jobs: Arc<dyn JobStore>,
        params: Arc<dyn ParamStore>,
        submit_tx: mpsc::Sender<QueuedJob>,
    ) -> Self {
        Self {
            registry,
            jobs,
            params,
            submit_tx,
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Validate and submit one render job; returns its id while rendering
    /// proceeds asynchronously.
    pub async fn generate(
        &self,
        template_id: &str,
        creator: &str,
        raw: serde_json::Value,
    ) -> WorkerResult<JobId> {
        let kind = self.registry.resolve(template_id)?;

        let params: TemplateParams = serde_json::from_value(raw.clone())
            .map_err(|e| WorkerError::invalid_params(e.to_string()))?;
        params
            .validate()
            .map_err(|e| WorkerError::invalid_params(e.to_string()))?;

        // Snapshot the raw parameters first so the request can be recreated
        // even if rendering fails.
        let snapshot = ParameterSet::snapshot(raw);
        let params_id = snapshot.id;
        self.params.put(snapshot).await;

        let job = RenderJob::new(params.title.clone(), creator, kind, params_id);
        let job_id = job.id.clone();
        self.jobs.put(job).await;

        self.submit_tx
            .send(QueuedJob {
                job_id: job_id.clone(),
                kind,
                params,
            })
            .await
            .map_err(|_| WorkerError::QueueClosed)?;

        info!(job_id = %job_id, template = %kind, creator, "job submitted");
        Ok(job_id)
    }
}
