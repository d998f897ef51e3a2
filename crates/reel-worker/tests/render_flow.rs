//! End-to-end render flow against stubbed collaborators.
//!
//! The speech service, probe and compositor are stubs, so these tests drive
//! the real segmentation, timeline, layout and job lifecycle without FFmpeg
//! or a synthesis endpoint.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use reel_engine::{
    AudioProbe, Compositor, EngineContext, EngineError, EngineResult, HalfWidthMetrics,
    LocalAssetStore, ProgressSink, RenderGraph, SpeechSynthesizer, SpokenClip,
};
use reel_models::{JobId, RenderState, TemplateKind};
use reel_worker::{
    JobExecutor, JobStore, MemoryJobStore, MemoryParamStore, MemoryProgressStore, ProgressBridge,
    ProgressStore, TemplateRegistry, VideoService, WorkerConfig, WorkerError,
};

/// Synthesizer that writes fake clips; optionally fails from the n-th call.
struct StubSpeech {
    fail_from_call: Option<usize>,
    calls: AtomicUsize,
}

impl StubSpeech {
    fn reliable() -> Self {
        Self {
            fail_from_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_from(call: usize) -> Self {
        Self {
            fail_from_call: Some(call),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(
        &self,
        text: &str,
        _voice: Option<&str>,
        out_dir: &Path,
    ) -> EngineResult<SpokenClip> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail_from) = self.fail_from_call {
            if call >= fail_from {
                return Err(EngineError::speech_failed("synthesis service unreachable"));
            }
        }
        let path = out_dir.join(format!("clip-{}.mp3", call));
        tokio::fs::write(&path, text.as_bytes()).await?;
        Ok(SpokenClip {
            path,
            duration: 2.0,
        })
    }
}

/// Compositor that writes a marker file instead of encoding.
struct StubCompositor;

#[async_trait]
impl Compositor for StubCompositor {
    async fn render(&self, graph: &RenderGraph, output: &Path) -> EngineResult<u64> {
        assert!(graph.duration > 0.0);
        assert!(!graph.audio.narration.is_empty());
        tokio::fs::write(output, b"encoded-video").await?;
        Ok(13)
    }

    async fn cover(&self, _video: &Path, output: &Path) -> EngineResult<()> {
        tokio::fs::write(output, b"cover-jpg").await?;
        Ok(())
    }
}

struct StubProbe;

#[async_trait]
impl AudioProbe for StubProbe {
    async fn duration(&self, _path: &Path) -> EngineResult<f64> {
        Ok(3.0)
    }
}

struct Harness {
    service: VideoService,
    jobs: Arc<MemoryJobStore>,
    progress: Arc<MemoryProgressStore>,
    work_dir: String,
    output_dir: String,
    _asset_dir: TempDir,
    _work_root: TempDir,
}

fn seed_assets(dir: &Path) {
    for name in ["bg-01.jpg", "img-1.jpg", "img-open.jpg", "bgm-chill.mp3"] {
        std::fs::write(dir.join(name), b"asset").unwrap();
    }
}

fn start_harness(speech: StubSpeech) -> Harness {
    let asset_dir = TempDir::new().unwrap();
    seed_assets(asset_dir.path());
    let work_root = TempDir::new().unwrap();
    let work_dir = work_root.path().join("work").to_string_lossy().to_string();
    let output_dir = work_root.path().join("out").to_string_lossy().to_string();

    let config = WorkerConfig {
        max_workers: 2,
        work_dir: work_dir.clone(),
        output_dir: output_dir.clone(),
        shutdown_timeout: Duration::from_secs(5),
        ..Default::default()
    };

    let progress = Arc::new(MemoryProgressStore::new());
    let jobs = Arc::new(MemoryJobStore::new());
    let ctx = Arc::new(EngineContext {
        speech: Arc::new(speech),
        assets: Arc::new(LocalAssetStore::new(asset_dir.path())),
        compositor: Arc::new(StubCompositor),
        probe: Arc::new(StubProbe),
        metrics: Arc::new(HalfWidthMetrics),
        progress: Arc::new(ProgressBridge::new(progress.clone(), jobs.clone())),
    });
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let service = VideoService::new(
        Arc::new(TemplateRegistry::new()),
        jobs.clone(),
        Arc::new(MemoryParamStore::new()),
        tx,
    );
    let executor = JobExecutor::new(config, ctx, jobs.clone(), progress.clone(), rx);
    tokio::spawn(executor.run());

    Harness {
        service,
        jobs,
        progress,
        work_dir,
        output_dir,
        _asset_dir: asset_dir,
        _work_root: work_root,
    }
}

async fn wait_for_terminal(jobs: &Arc<MemoryJobStore>, id: &JobId) -> reel_models::RenderJob {
    for _ in 0..250 {
        if let Some(job) = jobs.get(id).await {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

fn success_params() -> serde_json::Value {
    json!({
        "title": "年度最佳新秀",
        "background": "bg-01",
        "bgm": "bgm-chill",
        "opening": { "narration": "本赛季最佳新秀是谁？", "image": "img-open" },
        "scenes": [
            {
                "narration": "第一位候选人场均得分领跑。第二个候选人防守更加稳健。",
                "images": ["img-1"],
                "caption": "候选人"
            }
        ]
    })
}

#[tokio::test]
async fn test_successful_job_reaches_terminal_success() {
    let h = start_harness(StubSpeech::reliable());
    let id = h
        .service
        .generate(&TemplateKind::ImageStory.id(), "user123", success_params())
        .await
        .unwrap();

    let job = wait_for_terminal(&h.jobs, &id).await;
    assert_eq!(job.state, RenderState::Success);
    assert_eq!(job.progress, 1.0);
    assert_eq!(h.progress.get(&id).await, Some(1.0));

    let output_path = job.output_path.expect("success must set an output path");
    assert!(Path::new(&output_path).exists());
    assert_eq!(job.output_size, Some(13));
    assert!(job.cost_seconds.unwrap() >= 0.0);

    let cover_path = job.cover_path.expect("template declares a cover");
    assert!(Path::new(&cover_path).exists());

    // Job-scoped workspace is gone after completion.
    assert!(!Path::new(&h.work_dir).join(id.as_str()).exists());
}

#[tokio::test]
async fn test_unknown_template_id_is_synchronous_and_rowless() {
    let h = start_harness(StubSpeech::reliable());
    let err = h
        .service
        .generate("deadbeef", "user123", success_params())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::UnknownTemplate(_)));
    assert_eq!(h.jobs.count().await, 0);
}

#[tokio::test]
async fn test_speech_failure_in_second_scene_fails_cleanly() {
    // Opening narrates one chunk, the first scene one chunk; the third
    // synthesis call (second scene) fails.
    let h = start_harness(StubSpeech::failing_from(2));
    let params = json!({
        "title": "年度最佳新秀",
        "background": "bg-01",
        "opening": { "narration": "本赛季最佳新秀是谁？" },
        "scenes": [
            { "narration": "第一位候选人表现抢眼。", "images": ["img-1"] },
            { "narration": "第二位候选人同样出色。", "images": ["img-1"] }
        ]
    });
    let id = h
        .service
        .generate(&TemplateKind::ImageStory.id(), "user123", params)
        .await
        .unwrap();

    let job = wait_for_terminal(&h.jobs, &id).await;
    assert_eq!(job.state, RenderState::Fail);
    assert!(job.output_path.is_none());
    assert!(job.error.unwrap().contains("synthesis service unreachable"));

    // No partial output, no residual workspace.
    assert!(!Path::new(&h.output_dir).join(format!("{}.mp4", id)).exists());
    assert!(!Path::new(&h.work_dir).join(id.as_str()).exists());

    // Progress stalled at a pre-terminal checkpoint, mirrored on the row.
    let stalled = h.progress.get(&id).await.unwrap();
    assert!(stalled < 1.0);
    assert!((job.progress - stalled).abs() < 1e-6);
    assert!(job.progress > 0.0);
}
