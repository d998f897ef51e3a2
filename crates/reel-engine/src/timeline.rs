//! Audio timeline bookkeeping.
//!
//! Tracks the presentation-time cursor while narration segments are appended
//! with cross-fades, and plans the looped background-music bed. Pure
//! placement math; the actual mixing is emitted as FFmpeg filters by the
//! compositor.

use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

/// Silence before the first narration segment, in seconds.
pub const LEAD_IN: f64 = 0.5;

/// Cross-fade between consecutive narration segments, in seconds.
pub const CROSSFADE: f64 = 0.2;

/// Nudge applied when backing the cursor up for a cross-fade, keeping start
/// times strictly increasing and gaps never exactly zero-length.
pub const CROSSFADE_EPSILON: f64 = 1e-4;

/// One placed narration segment: text chunk, synthesized audio, timing.
#[derive(Debug, Clone)]
pub struct NarrationSegment {
    pub text: String,
    pub audio: PathBuf,
    /// Clip duration in seconds
    pub duration: f64,
    /// Absolute start offset in the timeline
    pub start: f64,
}

/// Sequential narration placement with a running presentation-time cursor.
#[derive(Debug, Default)]
pub struct AudioTimeline {
    segments: Vec<NarrationSegment>,
    cursor: f64,
}

impl AudioTimeline {
    /// Create an empty timeline; the cursor starts at the fixed lead-in.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            cursor: LEAD_IN,
        }
    }

    /// Append a synthesized segment, cross-fading into the previous one.
    /// Returns the segment's absolute start time.
    ///
    /// The cross-fade overlap is capped at the previous segment's duration,
    /// so a clip shorter than the fade never pulls the cursor behind its own
    /// start time.
    pub fn push(&mut self, text: impl Into<String>, audio: PathBuf, duration: f64) -> f64 {
        let start = match self.segments.last() {
            None => self.cursor,
            Some(prev) => {
                let overlap = CROSSFADE.min(prev.duration) - CROSSFADE_EPSILON;
                self.cursor - overlap
            }
        };
        self.cursor = start + duration;
        self.segments.push(NarrationSegment {
            text: text.into(),
            audio,
            duration,
            start,
        });
        start
    }

    /// All placed segments, in submission order.
    pub fn segments(&self) -> &[NarrationSegment] {
        &self.segments
    }

    /// Current cursor position; equals the narration track's total duration.
    pub fn duration(&self) -> f64 {
        self.cursor
    }

    /// Number of cross-fades between placed segments.
    pub fn crossfades(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Plan for covering the narration track with a background-music bed.
///
/// A bed shorter than the target is tiled back-to-back, then truncated to the
/// exact target length; the gain is fixed low so narration stays intelligible.
#[derive(Debug, Clone, PartialEq)]
pub struct BgmPlan {
    /// Number of bed copies tiled back-to-back (at least 1)
    pub loops: u32,
    /// Exact duration the tiled bed is truncated to
    pub total: f64,
    /// Mixing gain applied to the bed
    pub gain: f32,
}

impl BgmPlan {
    /// Plan a bed of `bed_duration` to cover `target` seconds at `gain`.
    pub fn cover(bed_duration: f64, target: f64, gain: f32) -> EngineResult<Self> {
        if bed_duration <= 0.0 {
            return Err(EngineError::invalid_params(
                "background music bed has no duration",
            ));
        }
        if target <= 0.0 {
            return Err(EngineError::invalid_params(
                "background music target duration must be positive",
            ));
        }
        let loops = (target / bed_duration).ceil().max(1.0) as u32;
        Ok(Self {
            loops,
            total: target,
            gain,
        })
    }

    /// Extra input repetitions needed beyond the first play
    /// (FFmpeg `-stream_loop` semantics).
    pub fn extra_loops(&self) -> u32 {
        self.loops - 1
    }

    /// Tiled bed length before truncation.
    pub fn tiled_duration(&self, bed_duration: f64) -> f64 {
        f64::from(self.loops) * bed_duration
    }
}
