//! Template kinds and registry descriptors.
//!
//! Templates are a closed enum rather than a runtime-discovered class
//! hierarchy: the registry is a static table populated once at process start.

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::params::TemplateParams;

/// Output orientation of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

/// Registered video-generation recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Narrated image sequence with captions and background music
    ImageStory,
    /// Two-player data card with animated stat comparison
    PlayerCompare,
}

impl TemplateKind {
    /// All registered kinds, in registry order.
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::ImageStory, TemplateKind::PlayerCompare]
    }

    /// Name of the implementing type; input to the stable template id.
    pub fn type_name(&self) -> &'static str {
        match self {
            TemplateKind::ImageStory => "ImageStoryTemplate",
            TemplateKind::PlayerCompare => "PlayerCompareTemplate",
        }
    }

    /// Stable identifier derived from the implementing type's name.
    pub fn id(&self) -> String {
        template_id(self.type_name())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateKind::ImageStory => "Image story",
            TemplateKind::PlayerCompare => "Player comparison",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TemplateKind::ImageStory => {
                "Narrated image sequence with subtitles, captions and background music"
            }
            TemplateKind::PlayerCompare => {
                "Animated two-player stat comparison card with narration"
            }
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            TemplateKind::ImageStory => Orientation::Portrait,
            TemplateKind::PlayerCompare => Orientation::Landscape,
        }
    }

    /// Whether the template publishes a cover image record on success.
    pub fn has_cover(&self) -> bool {
        true
    }

    /// Build the read-only registry descriptor for this kind.
    pub fn descriptor(&self) -> TemplateDescriptor {
        TemplateDescriptor {
            id: self.id(),
            kind: *self,
            name: self.display_name().to_string(),
            description: self.description().to_string(),
            orientation: self.orientation(),
            schema: schema_for!(TemplateParams),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Registry entry for one template: created once at warm-up, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Stable identifier (truncated SHA-256 of the implementing type name)
    pub id: String,
    pub kind: TemplateKind,
    pub name: String,
    pub description: String,
    pub orientation: Orientation,
    /// Declared parameter schema
    pub schema: RootSchema,
}

/// Deterministic template id: hex of the first 8 bytes of SHA-256(type name).
pub fn template_id(type_name: &str) -> String {
    let digest = Sha256::digest(type_name.as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
