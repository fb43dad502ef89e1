//! Mesh part input records.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A named piece of the body mesh, as authored by the artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshPart {
    /// Part name, e.g. `Char_Thigh_Left`.
    pub name: String,
    /// World-space pivot.
    pub pivot: DVec3,
}

impl MeshPart {
    /// Creates a new mesh part.
    pub fn new(name: impl Into<String>, pivot: impl Into<DVec3>) -> Self {
        Self {
            name: name.into(),
            pivot: pivot.into(),
        }
    }
}

/// A document listing the mesh parts of a character.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartsDocument {
    pub parts: Vec<MeshPart>,
}

impl PartsDocument {
    /// Returns the part names in document order.
    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }
}
