//! AutoRig Spec Library
//!
//! This crate holds everything about a biped rig that does not touch a scene:
//! the body region vocabulary, the naming convention and its validator, the
//! canonical topology table, and the assembly configuration.
//!
//! # Example
//!
//! ```
//! use autorig_spec::naming::classify_parts;
//! use autorig_spec::{Topology, TopologyKind, TopologyPreset};
//!
//! let topology = Topology::from_preset(TopologyPreset::BipedExtendedV1);
//! topology.validate().unwrap();
//!
//! let report = classify_parts(&["Char_Pelvis", "Char_Thigh_Left"], topology.preset().regions());
//! assert!(report.is_clean());
//! assert!(!topology.edges(TopologyKind::Joint).is_empty());
//! ```
//!
//! # Modules
//!
//! - [`region`]: Body regions, sides and control shape axes
//! - [`naming`]: Naming validator and derived node names
//! - [`topology`]: Topology table and its four views
//! - [`config`]: Rig configuration
//! - [`part`]: Mesh part input records
//! - [`pattern`]: Wildcard name patterns
//! - [`hash`]: Canonical hashing
//! - [`error`]: Error types and codes

pub mod config;
pub mod error;
pub mod hash;
pub mod naming;
pub mod part;
pub mod pattern;
pub mod region;
pub mod topology;

// Re-export commonly used types at the crate root
pub use config::{
    BindMethod, BindParams, ControlSettings, NormalizeMode, RigConfig, SkeletonSettings,
    SkinningMethod,
};
pub use error::{ErrorCode, SpecError, StageError, ValidationError, ValidationResult};
pub use naming::{
    classify_parts, invalid_names, NamingConfig, NamingReport, PartMatch, CONTROL_GROUP,
    JOINT_GROUP, MAIN_CONTROL, OFFSET_CONTROL, OFFSET_GROUP, ROOT_JOINT,
};
pub use part::{MeshPart, PartsDocument};
pub use pattern::NamePattern;
pub use region::{BodyRegion, ShapeAxis, Side};
pub use topology::{
    Slot, Topology, TopologyEdge, TopologyError, TopologyKind, TopologyNode, TopologyPreset,
};
