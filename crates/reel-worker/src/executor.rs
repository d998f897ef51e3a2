//! Render worker pool.
//!
//! A bounded pool pulls accepted jobs off the submission channel and runs one
//! template `process` per job. Jobs are disjoint by construction (own row,
//! own workspace), so the semaphore is the only concurrency control.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use reel_engine::{template_for, EngineContext, RenderRun};
use reel_media::JobWorkspace;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::config::WorkerConfig;
use crate::logging::JobLogger;
use crate::progress::ProgressStore;
use crate::service::QueuedJob;
use crate::store::JobStore;

/// Executes queued render jobs on a bounded pool.
pub struct JobExecutor {
    config: WorkerConfig,
    ctx: Arc<EngineContext>,
    jobs: Arc<dyn JobStore>,
    progress: Arc<dyn ProgressStore>,
    rx: mpsc::Receiver<QueuedJob>,
    semaphore: Arc<Semaphore>,
}

impl JobExecutor {
    pub fn new(
        config: WorkerConfig,
        ctx: Arc<EngineContext>,
        jobs: Arc<dyn JobStore>,
        progress: Arc<dyn ProgressStore>,
        rx: mpsc::Receiver<QueuedJob>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        Self {
            config,
            ctx,
            jobs,
            progress,
            rx,
            semaphore,
        }
    }

    /// Run until the submission channel closes, then drain in-flight jobs.
    pub async fn run(mut self) {
        info!(max_workers = self.config.max_workers, "starting render worker pool");

        while let Some(queued) = self.rx.recv().await {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let config = self.config.clone();
            let ctx = Arc::clone(&self.ctx);
            let jobs = Arc::clone(&self.jobs);
            let progress = Arc::clone(&self.progress);

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(config, ctx, jobs, progress, queued).await;
            });
        }

        info!("submission channel closed, waiting for in-flight jobs");
        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            let _ = self
                .semaphore
                .acquire_many(self.config.max_workers as u32)
                .await;
        })
        .await;
        if drained.is_err() {
            warn!("shutdown timeout reached with jobs still in flight");
        }
        info!("render worker pool stopped");
    }

    /// Run one job end to end: workspace, render, finalize, cleanup.
    async fn execute_job(
        config: WorkerConfig,
        ctx: Arc<EngineContext>,
        jobs: Arc<dyn JobStore>,
        progress: Arc<dyn ProgressStore>,
        queued: QueuedJob,
    ) {
        let QueuedJob {
            job_id,
            kind,
            params,
        } = queued;
        let logger = JobLogger::new(&job_id, "render_template");
        logger.log_start(kind.type_name());
        let started = Instant::now();

        if let Err(e) = tokio::fs::create_dir_all(&config.output_dir).await {
            logger.log_error(&format!("cannot create output dir: {}", e));
            Self::finalize_failure(&jobs, &job_id, &e.to_string()).await;
            return;
        }

        let workspace = match JobWorkspace::create(&config.work_dir, job_id.as_str()).await {
            Ok(ws) => ws,
            Err(e) => {
                logger.log_error(&format!("cannot create workspace: {}", e));
                Self::finalize_failure(&jobs, &job_id, &e.to_string()).await;
                return;
            }
        };

        // Templates render into the workspace; finished artifacts are
        // promoted to their deterministic job-id paths afterwards.
        let final_output = Path::new(&config.output_dir).join(format!("{}.mp4", job_id));
        let final_cover = kind
            .has_cover()
            .then(|| Path::new(&config.output_dir).join(format!("{}.jpg", job_id)));

        let run = RenderRun {
            job_id: job_id.clone(),
            params,
            work_dir: workspace.path().to_path_buf(),
            output_path: workspace.file("render.mp4"),
            cover_path: kind.has_cover().then(|| workspace.file("cover.jpg")),
        };

        let result = template_for(kind).process(&ctx, &run).await;

        match result {
            Ok(output) => {
                match Self::promote(&output, &final_output, final_cover.as_deref()).await {
                    Ok(cover) => {
                        if let Some(row) = jobs.get(&job_id).await {
                            let mut row = row.succeed(
                                final_output.to_string_lossy(),
                                output.size,
                                started.elapsed().as_secs_f64(),
                            );
                            if let Some(cover) = &cover {
                                row = row.with_cover(cover.to_string_lossy());
                            }
                            jobs.put(row).await;
                        }
                        progress.set(&job_id, 1.0).await;
                        logger.log_completion(&format!(
                            "{} bytes in {:.1}s",
                            output.size,
                            started.elapsed().as_secs_f64()
                        ));
                    }
                    Err(e) => {
                        logger.log_error(&format!("cannot promote output: {}", e));
                        remove_partial(&final_output).await;
                        Self::finalize_failure(&jobs, &job_id, &e.to_string()).await;
                    }
                }
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                remove_partial(&final_output).await;
                if let Some(cover) = &final_cover {
                    remove_partial(cover).await;
                }
                Self::finalize_failure(&jobs, &job_id, &e.to_string()).await;
            }
        }

        workspace.cleanup().await;
    }

    /// Move finished artifacts out of the workspace to their final paths.
    /// Returns the promoted cover path, if any.
    async fn promote(
        output: &reel_engine::RenderOutput,
        final_output: &Path,
        final_cover: Option<&Path>,
    ) -> Result<Option<PathBuf>, reel_media::MediaError> {
        reel_media::move_file(&output.output, final_output).await?;
        match (&output.cover, final_cover) {
            (Some(cover), Some(dest)) => {
                reel_media::move_file(cover, dest).await?;
                Ok(Some(dest.to_path_buf()))
            }
            _ => Ok(None),
        }
    }

    async fn finalize_failure(
        jobs: &Arc<dyn JobStore>,
        job_id: &reel_models::JobId,
        error: &str,
    ) {
        if let Some(row) = jobs.get(job_id).await {
            jobs.put(row.fail(error)).await;
        }
    }
}

/// Best-effort removal of a partially written artifact.
async fn remove_partial(path: &PathBuf) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "failed to remove partial output: {}", e),
    }
}
