//! Rig assembly for the canonical biped.
//!
//! This crate turns a selection of named mesh parts into a joint skeleton,
//! animation controls, offset groups and skin bindings. The host scene is
//! reached through the [`SceneGraph`] trait; [`MemoryScene`] is an in-memory
//! implementation used by the CLI and the tests.
//!
//! Stages run in a fixed order and hand their record sets to the next one:
//!
//! 1. [`parts::collect_parts`] classifies the selection ([`PartSet`])
//! 2. [`SkeletonBuilder`] creates and parents the joints ([`JointSet`])
//! 3. [`ControllerGenerator`] creates one control per driven joint ([`ControlSet`])
//! 4. [`OffsetBuilder`] inserts zero-pose groups above the controls ([`OffsetSet`])
//! 5. [`SkinBinder`] binds meshes to their joints ([`BindingSet`])
//!
//! [`RigPipeline`] sequences them inside one undo chunk. It can also hang
//! zero-pose locators above chosen controls after the rig is built.

pub mod controls;
pub mod error;
pub mod memory;
pub mod offsets;
pub mod orient;
pub mod parts;
pub mod pipeline;
pub mod prompt;
pub mod records;
pub mod report;
pub mod scene;
pub mod skeleton;
pub mod skin;

pub use controls::ControllerGenerator;
pub use error::{RigError, RigResult, SceneError, SceneResult, Stage};
pub use memory::{MemoryScene, SceneData};
pub use offsets::OffsetBuilder;
pub use pipeline::{RigOutcome, RigPipeline};
pub use prompt::{Decision, Prompter, ScriptedPrompter};
pub use records::{
    BindingRecord, BindingSet, ControlRecord, ControlSet, JointRecord, JointSet, LocatorRecord,
    OffsetRecord, OffsetSet, PartRecord, PartSet,
};
pub use report::{rig_hash, RigReport, StageTiming};
pub use scene::{
    ChannelLimits, ChannelLocks, Channels, Constraint, ConstraintId, ConstraintKind, CurveShape,
    HistoryEntry, Node, NodeId, NodeKind, Pose, SceneGraph, SkinBinding,
};
pub use skeleton::SkeletonBuilder;
pub use skin::SkinBinder;
