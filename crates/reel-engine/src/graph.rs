//! Declarative render graph.
//!
//! Templates assemble a [`RenderGraph`] describing every visual layer and the
//! audio mix; the compositor lowers it into one FFmpeg invocation. The graph
//! is plain data, so template output can be asserted in tests without
//! touching FFmpeg.

use std::path::PathBuf;

use crate::anim::{DealIn, PanZoom, Rgb, Typewriter, WipeReveal};
use crate::timeline::{BgmPlan, NarrationSegment};

/// Placement of an image layer.
#[derive(Debug, Clone)]
pub enum ImagePosition {
    Static { x: f64, y: f64 },
    DealIn(DealIn),
}

/// Content of one visual layer.
#[derive(Debug, Clone)]
pub enum LayerContent {
    /// Image scaled to fit `fit_width`, placed by a static point or a fly-in.
    Image {
        path: PathBuf,
        fit_width: u32,
        pos: ImagePosition,
    },
    /// Full-frame image with a slow zoom.
    PanZoom { path: PathBuf, zoom: PanZoom },
    /// Text overlay. `x_expr` may be an FFmpeg expression such as
    /// `(w-text_w)/2`.
    Text {
        text: String,
        x_expr: String,
        y: f32,
        font_size: u32,
        color: String,
    },
    /// Character-by-character text reveal.
    Typewriter {
        anim: Typewriter,
        x_expr: String,
        y: f32,
        font_size: u32,
        color: String,
    },
    /// Solid color band revealed left to right. Also used for stat-bar
    /// fills, which lower to a wipe at the bar's final width.
    Wipe {
        color: Rgb,
        width: u32,
        height: u32,
        x: f64,
        y: f64,
        reveal: WipeReveal,
    },
}

/// One visual layer with its visibility window.
#[derive(Debug, Clone)]
pub struct TimelineLayer {
    pub start: f64,
    pub duration: f64,
    pub content: LayerContent,
}

impl TimelineLayer {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Looped background-music bed.
#[derive(Debug, Clone)]
pub struct BgmTrack {
    pub path: PathBuf,
    pub plan: BgmPlan,
}

/// Complete audio mix: placed narration plus an optional bgm bed.
#[derive(Debug, Clone, Default)]
pub struct AudioMix {
    pub narration: Vec<NarrationSegment>,
    pub bgm: Option<BgmTrack>,
}

/// The full description of one rendered video.
#[derive(Debug, Clone)]
pub struct RenderGraph {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Total output duration in seconds
    pub duration: f64,
    /// Full-frame background image
    pub background: PathBuf,
    /// Visual layers, composited bottom to top in push order
    pub layers: Vec<TimelineLayer>,
    pub audio: AudioMix,
}

impl RenderGraph {
    pub fn new(width: u32, height: u32, fps: u32, background: PathBuf) -> Self {
        Self {
            width,
            height,
            fps,
            duration: 0.0,
            background,
            layers: Vec::new(),
            audio: AudioMix::default(),
        }
    }

    /// Push a layer visible over `[start, start + duration)`.
    pub fn push_layer(&mut self, start: f64, duration: f64, content: LayerContent) {
        self.layers.push(TimelineLayer {
            start,
            duration,
            content,
        });
    }

    /// Push a layer visible for the rest of the video from `start`. The
    /// duration is resolved when the total duration is sealed.
    pub fn push_sticky_layer(&mut self, start: f64, content: LayerContent) {
        self.layers.push(TimelineLayer {
            start,
            duration: f64::INFINITY,
            content,
        });
    }

    /// Fix the final duration and clamp sticky/overhanging layers to it.
    pub fn seal(&mut self, duration: f64) {
        self.duration = duration;
        for layer in &mut self.layers {
            if layer.end() > duration {
                layer.duration = (duration - layer.start).max(0.0);
            }
        }
    }
}
