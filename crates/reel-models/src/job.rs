//! Render job records and their lifecycle state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::template::TemplateKind;

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Job is rendering (or waiting for a worker slot)
    #[default]
    Process,
    /// Job finished and the output file exists
    Success,
    /// Job failed; no output is available
    Fail,
}

impl RenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderState::Process => "process",
            RenderState::Success => "success",
            RenderState::Fail => "fail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderState::Success | RenderState::Fail)
    }
}

/// A render job tracked from submission to its terminal state.
///
/// Invariants enforced by the transition methods:
/// - `progress` is monotonically non-decreasing until terminal
/// - exactly one terminal transition occurs; terminal rows refuse mutation
/// - `output_path` is set if and only if the state is `Success`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderJob {
    /// Unique job ID
    pub id: JobId,

    /// Title of the produced video
    pub title: String,

    /// User that submitted the job
    pub creator: String,

    /// Template that renders this job
    pub template: TemplateKind,

    /// Lifecycle state
    #[serde(default)]
    pub state: RenderState,

    /// Progress fraction in `[0.0, 1.0]`
    #[serde(default)]
    pub progress: f32,

    /// Encoded output file path (set on success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// Generated cover image path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_path: Option<String>,

    /// Wall-clock rendering cost in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_seconds: Option<f64>,

    /// Output file size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,

    /// Snapshot of the raw request parameters
    pub params_id: Uuid,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Terminal transition timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RenderJob {
    /// Create a new job in `Process` state at progress 0.0.
    pub fn new(
        title: impl Into<String>,
        creator: impl Into<String>,
        template: TemplateKind,
        params_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            title: title.into(),
            creator: creator.into(),
            template,
            state: RenderState::Process,
            progress: 0.0,
            output_path: None,
            cover_path: None,
            cost_seconds: None,
            output_size: None,
            params_id,
            error: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// Update progress. Clamped to `[current, 1.0]`; a no-op on terminal rows.
    pub fn with_progress(mut self, fraction: f32) -> Self {
        if self.state.is_terminal() {
            return self;
        }
        self.progress = fraction.clamp(self.progress, 1.0);
        self.updated_at = Utc::now();
        self
    }

    /// Finalize the job as `Success` with its output measurements.
    pub fn succeed(
        mut self,
        output_path: impl Into<String>,
        output_size: u64,
        cost_seconds: f64,
    ) -> Self {
        if self.state.is_terminal() {
            return self;
        }
        self.state = RenderState::Success;
        self.progress = 1.0;
        self.output_path = Some(output_path.into());
        self.output_size = Some(output_size);
        self.cost_seconds = Some(cost_seconds);
        let now = Utc::now();
        self.finished_at = Some(now);
        self.updated_at = now;
        self
    }

    /// Attach a generated cover image path.
    pub fn with_cover(mut self, cover_path: impl Into<String>) -> Self {
        self.cover_path = Some(cover_path.into());
        self.updated_at = Utc::now();
        self
    }

    /// Finalize the job as `Fail`.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        if self.state.is_terminal() {
            return self;
        }
        self.state = RenderState::Fail;
        self.error = Some(error.into());
        let now = Utc::now();
        self.finished_at = Some(now);
        self.updated_at = now;
        self
    }

    /// Check whether the job reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
