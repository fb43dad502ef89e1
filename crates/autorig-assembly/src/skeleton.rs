//! Skeleton builder: one joint per matched part, parented per the joint view.

use autorig_spec::{
    BodyRegion, RigConfig, Slot, Topology, TopologyKind, JOINT_GROUP, ROOT_JOINT,
};
use glam::{DQuat, DVec3};
use log::{debug, info, warn};

use crate::error::{InStage, RigError, RigResult, Stage};
use crate::orient::aim_orientation;
use crate::records::{JointRecord, JointSet, PartSet};
use crate::scene::{NodeId, NodeKind, SceneGraph};

const STAGE: Stage = Stage::Skeleton;

/// Fails with [`RigError::PreExistingJoints`] if the scene holds any joint.
pub fn check_no_joints(scene: &dyn SceneGraph) -> RigResult<()> {
    let existing = scene.nodes_of_kind(NodeKind::Joint);
    if existing.is_empty() {
        return Ok(());
    }
    let mut names = Vec::with_capacity(existing.len());
    for id in existing {
        names.push(scene.node(id).in_stage(STAGE)?.name.clone());
    }
    Err(RigError::PreExistingJoints { names })
}

/// Builds the joint hierarchy from validated parts.
pub struct SkeletonBuilder<'a> {
    topology: &'a Topology,
    config: &'a RigConfig,
}

impl<'a> SkeletonBuilder<'a> {
    pub fn new(topology: &'a Topology, config: &'a RigConfig) -> Self {
        Self { topology, config }
    }

    /// Creates, parents, orients and groups the joints.
    pub fn build(&self, scene: &mut dyn SceneGraph, parts: &PartSet) -> RigResult<JointSet> {
        check_no_joints(scene)?;

        let mut joints = JointSet::default();
        self.create_joints(scene, parts, &mut joints)?;
        self.apply_joint_view(scene, &mut joints)?;
        self.orient_spine_chain(scene, &joints)?;
        self.align_fingers(scene, &joints)?;
        for record in &joints.records {
            scene.freeze_joint(record.node).in_stage(STAGE)?;
        }
        self.group_joints(scene, &mut joints)?;

        info!(
            "Skeleton built: {} joints, {} skipped joint edges",
            joints.len(),
            joints.skipped_edges.len()
        );
        Ok(joints)
    }

    fn create_joints(
        &self,
        scene: &mut dyn SceneGraph,
        parts: &PartSet,
        joints: &mut JointSet,
    ) -> RigResult<()> {
        let naming = &self.config.naming;
        let settings = &self.config.skeleton;
        let preset = self.topology.preset();

        // Fresh joints are unparented and childless, so they start world
        // aligned; aiming happens once the hierarchy exists.
        for part in &parts.records {
            for slot in preset.joint_slots(part.region) {
                let position = match slot {
                    Slot::FootBase(_) => {
                        DVec3::new(part.pivot.x, settings.ground_height, part.pivot.z)
                    }
                    Slot::FootToe(_) => DVec3::new(
                        part.pivot.x,
                        settings.ground_height,
                        part.pivot.z + settings.toe_length,
                    ),
                    _ => part.pivot,
                };
                let name = naming.joint_name(&part.name, slot);
                let node = scene
                    .create_joint(&name, position, settings.joint_radius)
                    .in_stage(STAGE)?;
                debug!("Created joint {} for {}", name, slot);
                joints.records.push(JointRecord { slot, node, name });
            }
        }

        let root = scene
            .create_joint(ROOT_JOINT, DVec3::ZERO, settings.joint_radius)
            .in_stage(STAGE)?;
        joints.records.push(JointRecord {
            slot: Slot::Root,
            node: root,
            name: ROOT_JOINT.to_string(),
        });
        joints.root = Some(root);
        Ok(())
    }

    /// Parents every joint under its nearest built ancestor.
    fn apply_joint_view(&self, scene: &mut dyn SceneGraph, joints: &mut JointSet) -> RigResult<()> {
        for edge in self.topology.edges(TopologyKind::Joint) {
            let Some(child) = joints.node(edge.child) else {
                debug!("Skipping {}: no joint for {}", edge, edge.child);
                joints.skipped_edges.push(edge);
                continue;
            };
            let Some((parent_slot, parent)) = self.nearest_built_ancestor(joints, edge.child) else {
                joints.skipped_edges.push(edge);
                continue;
            };
            if parent_slot != edge.parent {
                debug!(
                    "Skipping {}: parenting {} under {} instead",
                    edge, edge.child, parent_slot
                );
                joints.skipped_edges.push(edge);
            }
            scene.reparent(child, Some(parent)).in_stage(STAGE)?;
        }
        Ok(())
    }

    fn nearest_built_ancestor(&self, joints: &JointSet, slot: Slot) -> Option<(Slot, NodeId)> {
        let mut current = self.topology.parent_of(slot);
        while let Some(candidate) = current {
            if let Some(node) = joints.node(candidate) {
                return Some((candidate, node));
            }
            current = self.topology.parent_of(candidate);
        }
        None
    }

    /// Aims every joint from the midsection down at its first child.
    fn orient_spine_chain(&self, scene: &mut dyn SceneGraph, joints: &JointSet) -> RigResult<()> {
        for slot in self.topology.subtree(Slot::Region(BodyRegion::Midsection)) {
            let Some(node) = joints.node(slot) else {
                continue;
            };
            let orientation = self.aim_at_first_child(scene, node)?;
            scene.orient_joint(node, orientation).in_stage(STAGE)?;
        }
        Ok(())
    }

    /// X toward the first child; leaves copy their parent.
    fn aim_at_first_child(&self, scene: &dyn SceneGraph, node: NodeId) -> RigResult<DQuat> {
        let record = scene.node(node).in_stage(STAGE)?;
        let here = scene.world_transform(node).in_stage(STAGE)?;
        if let Some(&child) = record.children.first() {
            let target = scene.world_transform(child).in_stage(STAGE)?.position;
            if let Some(aim) = aim_orientation(here.position, target) {
                return Ok(aim);
            }
        }
        match record.parent {
            Some(parent) => Ok(scene.world_transform(parent).in_stage(STAGE)?.orientation),
            None => Ok(DQuat::IDENTITY),
        }
    }

    /// Tips are world aligned first, then each finger root aims at its tip.
    fn align_fingers(&self, scene: &mut dyn SceneGraph, joints: &JointSet) -> RigResult<()> {
        let fingers: Vec<BodyRegion> = self
            .topology
            .preset()
            .regions()
            .iter()
            .copied()
            .filter(|r| r.is_finger())
            .collect();

        for region in fingers.iter().filter(|r| r.is_finger_tip()) {
            if let Some(node) = joints.node(Slot::Region(*region)) {
                scene.orient_joint(node, DQuat::IDENTITY).in_stage(STAGE)?;
            }
        }

        for root in fingers.iter().filter(|r| r.is_finger_root()) {
            let Some(node) = joints.node(Slot::Region(*root)) else {
                continue;
            };
            let tip = fingers
                .iter()
                .find(|r| r.parent() == Some(*root))
                .and_then(|r| joints.node(Slot::Region(*r)));
            let Some(tip) = tip else {
                debug!("{} has no tip joint to aim at", root);
                continue;
            };
            let from = scene.world_transform(node).in_stage(STAGE)?.position;
            let to = scene.world_transform(tip).in_stage(STAGE)?.position;
            if let Some(aim) = aim_orientation(from, to) {
                scene.orient_joint(node, aim).in_stage(STAGE)?;
            }
        }
        Ok(())
    }

    /// Puts `root_jnt` and any other top-level joint under `jnt_grp`.
    fn group_joints(&self, scene: &mut dyn SceneGraph, joints: &mut JointSet) -> RigResult<()> {
        let group = match scene.find(JOINT_GROUP) {
            Some(existing) => {
                info!("Reusing existing {}", JOINT_GROUP);
                existing
            }
            None => scene.create_group(JOINT_GROUP).in_stage(STAGE)?,
        };
        joints.group = Some(group);

        if let Some(root) = joints.root {
            scene.reparent(root, Some(group)).in_stage(STAGE)?;
        }
        for id in scene.nodes_of_kind(NodeKind::Joint) {
            if Some(id) == joints.root {
                continue;
            }
            let node = scene.node(id).in_stage(STAGE)?;
            if node.parent.is_none() {
                let name = node.name.clone();
                warn!("Joint {} has no parent; moving it under {}", name, JOINT_GROUP);
                scene.reparent(id, Some(group)).in_stage(STAGE)?;
                joints.orphans.push(name);
            }
        }
        Ok(())
    }
}
