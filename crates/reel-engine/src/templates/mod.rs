//! Template orchestration.
//!
//! A template's `process` drives the whole pipeline for one job: segment and
//! synthesize narration, place it on the audio timeline, lay out subtitles,
//! build animated visual layers, then hand the sealed render graph to the
//! compositor. Progress is reported through the job-id-keyed sink at fixed
//! checkpoints: 0.2 after the opening, then proportionally across scenes; the
//! worker owns the final 1.0.

mod image_story;
mod player_compare;

pub use image_story::ImageStoryTemplate;
pub use player_compare::PlayerCompareTemplate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reel_models::{JobId, TemplateKind, TemplateParams};
use tracing::debug;

use crate::assets::AssetStore;
use crate::compositor::Compositor;
use crate::error::EngineResult;
use crate::graph::{LayerContent, RenderGraph};
use crate::segmenter::TextSegmenter;
use crate::speech::SpeechSynthesizer;
use crate::subtitle::{FontMetrics, SubtitleLayout};
use crate::timeline::AudioTimeline;

/// Progress fraction reported once the opening block is placed.
pub const OPENING_CHECKPOINT: f32 = 0.2;

/// Progress budget spread across the content scenes; the remainder is spent
/// by the worker on encoding and finalization.
pub const SCENES_BUDGET: f32 = 0.75;

/// Trailing seconds appended after the last narration segment.
const TAIL_PADDING: f64 = 1.0;

/// Job-id-keyed progress channel written during rendering.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn set(&self, job_id: &JobId, fraction: f32);
}

/// Duration lookup for audio beds (the bgm loop plan needs it up front).
#[async_trait]
pub trait AudioProbe: Send + Sync {
    async fn duration(&self, path: &Path) -> EngineResult<f64>;
}

/// FFprobe-backed probe with container fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeAudioProbe;

#[async_trait]
impl AudioProbe for FfprobeAudioProbe {
    async fn duration(&self, path: &Path) -> EngineResult<f64> {
        Ok(reel_media::probe_audio_duration(path).await?)
    }
}

/// Collaborators shared by all templates. Each seam is a trait so tests can
/// run the whole pipeline without FFmpeg or a synthesis service.
pub struct EngineContext {
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub assets: Arc<dyn AssetStore>,
    pub compositor: Arc<dyn Compositor>,
    pub probe: Arc<dyn AudioProbe>,
    pub metrics: Arc<dyn FontMetrics>,
    pub progress: Arc<dyn ProgressSink>,
}

/// One job's inputs and destinations.
pub struct RenderRun {
    pub job_id: JobId,
    pub params: TemplateParams,
    /// Job-scoped working directory for intermediate artifacts
    pub work_dir: PathBuf,
    pub output_path: PathBuf,
    /// Destination for the cover still, when the template declares one
    pub cover_path: Option<PathBuf>,
}

/// Result of a completed render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub output: PathBuf,
    pub cover: Option<PathBuf>,
    /// Output size in bytes
    pub size: u64,
}

/// A registered video-generation recipe.
#[async_trait]
pub trait VideoTemplate: Send + Sync {
    fn kind(&self) -> TemplateKind;

    /// Render one job end to end. Any error fails the whole job; there are
    /// no per-scene retries.
    async fn process(&self, ctx: &EngineContext, run: &RenderRun) -> EngineResult<RenderOutput>;
}

/// Construct the implementation for a registered kind.
pub fn template_for(kind: TemplateKind) -> Box<dyn VideoTemplate> {
    match kind {
        TemplateKind::ImageStory => Box::new(ImageStoryTemplate),
        TemplateKind::PlayerCompare => Box::new(PlayerCompareTemplate),
    }
}

/// Narrate one text block: segment, synthesize each chunk in order, place it
/// on the timeline and emit its subtitle overlay lines.
pub(crate) async fn narrate_block(
    ctx: &EngineContext,
    run: &RenderRun,
    timeline: &mut AudioTimeline,
    graph: &mut RenderGraph,
    layout: &SubtitleLayout<'_>,
    text: &str,
    baseline_y: f32,
    subtitle_font_size: u32,
) -> EngineResult<()> {
    let segmenter = TextSegmenter::default();
    let voice = run.params.voice.as_deref();

    for chunk in segmenter.split(text) {
        let clip = ctx.speech.synthesize(&chunk, voice, &run.work_dir).await?;
        let start = timeline.push(chunk.clone(), clip.path, clip.duration);
        debug!(job_id = %run.job_id, start, duration = clip.duration, "placed narration chunk");

        for line in layout.layout(&chunk, start, clip.duration, baseline_y, graph.width as f32) {
            graph.push_layer(
                line.start,
                line.duration,
                LayerContent::Text {
                    text: line.text,
                    x_expr: "(w-text_w)/2".to_string(),
                    y: line.y,
                    font_size: subtitle_font_size,
                    color: "white".to_string(),
                },
            );
        }
    }
    Ok(())
}

/// Seal the graph, attach the audio mix and encode; shared template tail.
pub(crate) async fn finish_render(
    ctx: &EngineContext,
    run: &RenderRun,
    mut graph: RenderGraph,
    timeline: AudioTimeline,
) -> EngineResult<RenderOutput> {
    use crate::graph::BgmTrack;
    use crate::timeline::BgmPlan;

    let total = timeline.duration() + TAIL_PADDING;
    graph.audio.narration = timeline.segments().to_vec();

    if let Some(bgm_id) = &run.params.bgm {
        let bed = ctx.assets.get(bgm_id).await?;
        let bed_duration = ctx.probe.duration(&bed.path).await?;
        graph.audio.bgm = Some(BgmTrack {
            path: bed.path,
            plan: BgmPlan::cover(bed_duration, total, 0.12)?,
        });
    }

    graph.seal(total);

    let size = ctx.compositor.render(&graph, &run.output_path).await?;

    let cover = match &run.cover_path {
        Some(cover_path) => {
            ctx.compositor.cover(&run.output_path, cover_path).await?;
            Some(cover_path.clone())
        }
        None => None,
    };

    Ok(RenderOutput {
        output: run.output_path.clone(),
        cover,
        size,
    })
}

/// Scene progress fraction: checkpoint plus the scene share of the budget.
pub(crate) fn scene_progress(done: usize, total: usize) -> f32 {
    OPENING_CHECKPOINT + (done as f32 / total.max(1) as f32) * SCENES_BUDGET
}
