//! Shared data models for the Reelsmith backend.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their lifecycle state machine
//! - Template parameters and persisted parameter snapshots
//! - Template descriptors and deterministic template ids

pub mod job;
pub mod params;
pub mod template;

// Re-export common types
pub use job::{JobId, RenderJob, RenderState};
pub use params::{
    AssetId, CompareCard, Opening, ParameterSet, PlayerPanel, Scene, StatRow, TemplateParams,
};
pub use template::{template_id, Orientation, TemplateDescriptor, TemplateKind};
