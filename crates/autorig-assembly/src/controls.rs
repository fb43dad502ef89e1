//! Controller generator: one circle control per driven joint plus the two
//! global controls.

use autorig_spec::{RigConfig, ShapeAxis, Slot, Topology, MAIN_CONTROL, OFFSET_CONTROL};
use log::{debug, info};

use crate::error::{InStage, RigError, RigResult, Stage};
use crate::records::{ControlRecord, ControlSet, JointSet};
use crate::scene::{
    ChannelLimits, ChannelLocks, ConstraintKind, CurveShape, NodeId, NodeKind, Pose, SceneGraph,
};

const STAGE: Stage = Stage::Controls;

/// Builds the animation controls for a joint set.
pub struct ControllerGenerator<'a> {
    topology: &'a Topology,
    config: &'a RigConfig,
}

impl<'a> ControllerGenerator<'a> {
    pub fn new(topology: &'a Topology, config: &'a RigConfig) -> Self {
        Self { topology, config }
    }

    /// Creates and wires every control.
    pub fn build(&self, scene: &mut dyn SceneGraph, joints: &JointSet) -> RigResult<ControlSet> {
        let root = joints.root.ok_or(RigError::NoRoot)?;
        if scene.node(root).is_err() {
            return Err(RigError::NoRoot);
        }

        let preset = self.topology.preset();
        let settings = &self.config.controls;
        let mut controls = ControlSet::default();

        for joint in &joints.records {
            if !preset.has_control(joint.slot) {
                debug!("{} gets no control", joint.name);
                continue;
            }
            let shape_axis = joint
                .slot
                .region()
                .map(|r| r.shape_axis())
                .unwrap_or_default();
            let name = self.config.naming.control_name(&joint.name);
            let node = self.create_joint_control(scene, &name, joint.node, shape_axis)?;
            controls.records.push(ControlRecord {
                slot: joint.slot,
                node,
                name,
                joint: joint.node,
                shape_axis,
            });
        }

        self.delete_stale_controls(scene)?;

        let main = self.create_global(
            scene,
            MAIN_CONTROL,
            settings.main_radius,
            settings.main_color,
        )?;
        let offset = self.create_global(
            scene,
            OFFSET_CONTROL,
            settings.offset_radius,
            settings.offset_color,
        )?;
        scene
            .constrain(ConstraintKind::Parent, offset, root)
            .in_stage(STAGE)?;
        controls.main = Some(main);
        controls.offset = Some(offset);

        for id in controls.all() {
            scene.lock_channels(id, ChannelLocks::TRANSLATE).in_stage(STAGE)?;
        }

        info!("Controls built: {} joint controls", controls.records.len());
        Ok(controls)
    }

    fn create_joint_control(
        &self,
        scene: &mut dyn SceneGraph,
        name: &str,
        joint: NodeId,
        shape_axis: ShapeAxis,
    ) -> RigResult<NodeId> {
        let settings = &self.config.controls;
        let ctrl = scene
            .create_curve(
                name,
                CurveShape {
                    radius: settings.radius,
                    normal: shape_axis,
                },
            )
            .in_stage(STAGE)?;

        let at = scene.world_transform(joint).in_stage(STAGE)?.position;
        scene
            .set_world_transform(ctrl, Pose::from_translation(at))
            .in_stage(STAGE)?;

        // Borrow the joint's axes for the curve, then drop the constraint.
        let align = scene
            .constrain(ConstraintKind::Orient, joint, ctrl)
            .in_stage(STAGE)?;
        scene.delete_constraint(align).in_stage(STAGE)?;

        scene
            .constrain(ConstraintKind::Parent, ctrl, joint)
            .in_stage(STAGE)?;
        scene.bake_history(ctrl).in_stage(STAGE)?;
        scene.freeze_translate(ctrl).in_stage(STAGE)?;
        scene
            .set_channel_limits(
                ctrl,
                ChannelLimits {
                    translate: Some([0.0, 0.0]),
                    scale: Some([1.0, 1.0]),
                },
            )
            .in_stage(STAGE)?;
        scene.lock_channels(ctrl, ChannelLocks::SCALE).in_stage(STAGE)?;
        scene
            .set_display_color(ctrl, settings.color)
            .in_stage(STAGE)?;
        Ok(ctrl)
    }

    /// Deletes controls left over for slots this preset never controls.
    fn delete_stale_controls(&self, scene: &mut dyn SceneGraph) -> RigResult<()> {
        let preset = self.topology.preset();
        let excluded = std::iter::once(Slot::Root)
            .chain(self.topology.joint_slots())
            .filter(|s| !preset.has_control(*s));
        for slot in excluded {
            let pattern = self.config.naming.control_pattern(slot)?;
            for stale in scene.find_nodes(&pattern, Some(NodeKind::Control)) {
                info!("Deleting stale control {} ({})", pattern, stale);
                scene.delete_node(stale).in_stage(STAGE)?;
            }
        }
        Ok(())
    }

    fn create_global(
        &self,
        scene: &mut dyn SceneGraph,
        name: &str,
        radius: f64,
        color: u8,
    ) -> RigResult<NodeId> {
        let ctrl = scene
            .create_curve(
                name,
                CurveShape {
                    radius,
                    normal: ShapeAxis::Y,
                },
            )
            .in_stage(STAGE)?;
        scene.set_display_color(ctrl, color).in_stage(STAGE)?;
        Ok(ctrl)
    }
}
