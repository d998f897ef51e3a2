//! Render worker binary.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_engine::{
    EngineContext, FfmpegCompositor, FfprobeAudioProbe, HalfWidthMetrics, HttpSpeechSynthesizer,
    LocalAssetStore,
};
use reel_worker::{
    JobExecutor, MemoryJobStore, MemoryParamStore, MemoryProgressStore, ProgressBridge,
    TemplateRegistry, VideoService, WorkerConfig,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reel-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let progress = Arc::new(MemoryProgressStore::new());
    let jobs = Arc::new(MemoryJobStore::new());
    let params = Arc::new(MemoryParamStore::new());

    let ctx = Arc::new(EngineContext {
        speech: Arc::new(HttpSpeechSynthesizer::new(config.speech_endpoint.clone())),
        assets: Arc::new(LocalAssetStore::new(config.asset_root.clone())),
        compositor: Arc::new(FfmpegCompositor::new(config.render_timeout.as_secs())),
        probe: Arc::new(FfprobeAudioProbe),
        metrics: Arc::new(HalfWidthMetrics),
        progress: Arc::new(ProgressBridge::new(progress.clone(), jobs.clone())),
    });
    let registry = Arc::new(TemplateRegistry::new());

    let (tx, rx) = tokio::sync::mpsc::channel(config.max_workers * 4);
    let service = VideoService::new(registry, jobs.clone(), params, tx);
    let executor = JobExecutor::new(config, ctx, jobs, progress, rx);

    let executor_handle = tokio::spawn(executor.run());

    tokio::signal::ctrl_c().await.ok();
    info!("Received shutdown signal");

    // Dropping the service closes the submission channel; the executor then
    // drains in-flight jobs and exits.
    drop(service);
    executor_handle.await.ok();

    info!("Worker shutdown complete");
}
