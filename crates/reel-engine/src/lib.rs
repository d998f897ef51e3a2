//! Template rendering pipeline for the Reelsmith backend.
//!
//! The engine turns a validated parameter set into an encoded video:
//! narration is segmented and synthesized, placed on an audio timeline with
//! cross-fades and a background-music bed, subtitles are wrapped to the pixel
//! budget, visual layers are animated by pure per-frame primitives, and the
//! resulting render graph is handed to a compositor for encoding.

pub mod anim;
pub mod assets;
pub mod compositor;
pub mod error;
pub mod graph;
pub mod segmenter;
pub mod speech;
pub mod subtitle;
pub mod templates;
pub mod timeline;

pub use assets::{AssetFile, AssetStore, LocalAssetStore};
pub use compositor::{Compositor, FfmpegCompositor};
pub use error::{EngineError, EngineResult};
pub use graph::{AudioMix, BgmTrack, LayerContent, RenderGraph, TimelineLayer};
pub use segmenter::TextSegmenter;
pub use speech::{HttpSpeechSynthesizer, SpeechSynthesizer, SpokenClip};
pub use subtitle::{FontMetrics, HalfWidthMetrics, SubtitleLayout, SubtitleLine};
pub use templates::{
    template_for, AudioProbe, EngineContext, FfprobeAudioProbe, ProgressSink, RenderOutput,
    RenderRun, VideoTemplate,
};
pub use timeline::{AudioTimeline, BgmPlan, NarrationSegment};
