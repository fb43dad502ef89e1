//! Record sets passed between pipeline stages.
//!
//! Each stage returns the handles it created, keyed by topology slot, and the
//! next stage takes them as an explicit input. Scene names are only consulted
//! again by the `discover` constructors, which rebuild the records from an
//! already rigged scene.

use autorig_spec::{
    classify_parts, BodyRegion, NamingConfig, ShapeAxis, Slot, Topology, TopologyEdge,
    JOINT_GROUP, MAIN_CONTROL, OFFSET_CONTROL, ROOT_JOINT,
};
use glam::DVec3;
use log::warn;
use serde::Serialize;

use crate::error::{InStage, RigError, RigResult, Stage};
use crate::scene::{NodeId, NodeKind, SceneGraph};

/// A selected mesh part matched to its region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartRecord {
    pub region: BodyRegion,
    pub node: NodeId,
    pub name: String,
    pub pivot: DVec3,
}

/// Mesh parts taking part in the rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartSet {
    /// Matched parts in selection order.
    pub records: Vec<PartRecord>,
    /// Selected parts left out because their names carry no region token.
    pub excluded: Vec<String>,
}

impl PartSet {
    /// Returns the part of a region.
    pub fn get(&self, region: BodyRegion) -> Option<&PartRecord> {
        self.records.iter().find(|r| r.region == region)
    }

    /// Rebuilds the part set from every mesh in the scene.
    pub fn discover(scene: &dyn SceneGraph, topology: &Topology) -> RigResult<Self> {
        let meshes = scene.nodes_of_kind(NodeKind::Mesh);
        let mut names = Vec::with_capacity(meshes.len());
        for id in &meshes {
            names.push(scene.node(*id).in_stage(Stage::Skin)?.name.clone());
        }

        let report = classify_parts(&names, topology.preset().regions());
        if let Some((part, regions)) = report.ambiguous.into_iter().next() {
            return Err(RigError::AmbiguousName { part, regions });
        }
        if let Some((region, parts)) = report.duplicates.into_iter().next() {
            return Err(RigError::DuplicateRegion { region, parts });
        }

        let mut records = Vec::with_capacity(report.matched.len());
        for matched in report.matched {
            let Some(node) = scene.find(&matched.name) else {
                continue;
            };
            records.push(PartRecord {
                region: matched.region,
                node,
                pivot: scene.world_transform(node).in_stage(Stage::Skin)?.position,
                name: matched.name,
            });
        }
        Ok(Self {
            records,
            excluded: report.invalid,
        })
    }
}

/// A joint created for a topology slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointRecord {
    pub slot: Slot,
    pub node: NodeId,
    pub name: String,
}

/// Joints of the rig in creation order. The root joint comes last.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JointSet {
    pub records: Vec<JointRecord>,
    /// `root_jnt`.
    pub root: Option<NodeId>,
    /// `jnt_grp`.
    pub group: Option<NodeId>,
    /// Top-level joints that were collected under `jnt_grp`.
    pub orphans: Vec<String>,
    /// Joint edges whose declared child or parent was not built.
    pub skipped_edges: Vec<TopologyEdge>,
}

impl JointSet {
    /// Returns the record of a slot.
    pub fn get(&self, slot: Slot) -> Option<&JointRecord> {
        self.records.iter().find(|r| r.slot == slot)
    }

    /// Returns the joint handle of a slot.
    pub fn node(&self, slot: Slot) -> Option<NodeId> {
        match slot {
            Slot::Root => self.root,
            _ => self.get(slot).map(|r| r.node),
        }
    }

    /// Number of joints, root included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no joint was created.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rebuilds the joint set by name lookup.
    pub fn discover(
        scene: &dyn SceneGraph,
        topology: &Topology,
        naming: &NamingConfig,
    ) -> RigResult<Self> {
        let mut set = Self::default();
        for slot in topology.joint_slots() {
            let found = scene.find_nodes(&naming.joint_pattern(slot)?, Some(NodeKind::Joint));
            let Some(&node) = found.first() else {
                continue;
            };
            if found.len() > 1 {
                warn!(
                    "{} joints match slot {}; using the first one",
                    found.len(),
                    slot
                );
            }
            set.records.push(JointRecord {
                slot,
                node,
                name: scene.node(node).in_stage(Stage::Skin)?.name.clone(),
            });
        }
        if let Some(root) = scene.find(ROOT_JOINT) {
            set.records.push(JointRecord {
                slot: Slot::Root,
                node: root,
                name: ROOT_JOINT.to_string(),
            });
            set.root = Some(root);
        }
        set.group = scene.find(JOINT_GROUP);
        Ok(set)
    }
}

/// A control created for a joint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlRecord {
    pub slot: Slot,
    pub node: NodeId,
    pub name: String,
    /// The joint this control drives.
    pub joint: NodeId,
    pub shape_axis: ShapeAxis,
}

/// Controls of the rig in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlSet {
    pub records: Vec<ControlRecord>,
    /// `main_ctrl`.
    pub main: Option<NodeId>,
    /// `offset_ctrl`; drives `root_jnt`.
    pub offset: Option<NodeId>,
}

impl ControlSet {
    /// Returns the record of a slot.
    pub fn get(&self, slot: Slot) -> Option<&ControlRecord> {
        self.records.iter().find(|r| r.slot == slot)
    }

    /// Returns the control handle of a slot; `Root` is `offset_ctrl`.
    pub fn node(&self, slot: Slot) -> Option<NodeId> {
        match slot {
            Slot::Root => self.offset,
            _ => self.get(slot).map(|r| r.node),
        }
    }

    /// Every control handle, globals last.
    pub fn all(&self) -> Vec<NodeId> {
        self.records
            .iter()
            .map(|r| r.node)
            .chain(self.main)
            .chain(self.offset)
            .collect()
    }

    /// Rebuilds the control set by name lookup.
    pub fn discover(
        scene: &dyn SceneGraph,
        topology: &Topology,
        naming: &NamingConfig,
        joints: &JointSet,
    ) -> RigResult<Self> {
        let preset = topology.preset();
        let mut set = Self::default();
        for slot in topology.joint_slots().filter(|s| preset.has_control(*s)) {
            let Some(joint) = joints.node(slot) else {
                continue;
            };
            let found =
                scene.find_nodes(&naming.control_pattern(slot)?, Some(NodeKind::Control));
            let Some(&node) = found.first() else {
                continue;
            };
            set.records.push(ControlRecord {
                slot,
                node,
                name: scene.node(node).in_stage(Stage::Skin)?.name.clone(),
                joint,
                shape_axis: slot.region().map(|r| r.shape_axis()).unwrap_or_default(),
            });
        }
        set.main = scene.find(MAIN_CONTROL);
        set.offset = scene.find(OFFSET_CONTROL);
        Ok(set)
    }
}

/// An offset group inserted above a control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetRecord {
    /// Slot of the control; `None` for the two global controls.
    pub slot: Option<Slot>,
    pub node: NodeId,
    pub name: String,
    pub control: NodeId,
    /// True if the group already existed and was reused.
    pub reused: bool,
}

/// Offset groups of the rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OffsetSet {
    pub records: Vec<OffsetRecord>,
    /// `ctrl_grp`, top of the control rig.
    pub ctrl_grp: Option<NodeId>,
    /// `offset_grp`.
    pub offset_grp: Option<NodeId>,
    /// Offset edges whose declared child or parent was not built.
    pub skipped_edges: Vec<TopologyEdge>,
}

/// A zero-pose locator inserted above a control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatorRecord {
    pub node: NodeId,
    pub name: String,
    pub control: NodeId,
    pub reused: bool,
}

impl OffsetSet {
    /// Returns the offset group of a control slot.
    pub fn node(&self, slot: Slot) -> Option<NodeId> {
        self.records
            .iter()
            .find(|r| r.slot == Some(slot))
            .map(|r| r.node)
    }
}

/// A mesh bound (or found bound) to its joints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingRecord {
    pub region: BodyRegion,
    pub mesh: NodeId,
    pub influences: Vec<NodeId>,
}

/// Outcome of the skin binder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindingSet {
    /// Bindings created by this run.
    pub bound: Vec<BindingRecord>,
    /// Regions whose mesh already carried a binding.
    pub skipped: Vec<BodyRegion>,
    /// Control to joint drives asserted after binding.
    pub drives: usize,
}
