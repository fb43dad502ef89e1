//! Offset-group builder: a zero-pose parent above every control, hung into one
//! control hierarchy rooted at `ctrl_grp`. Zero-pose locators use the same
//! insertion on demand.

use autorig_spec::{
    RigConfig, Slot, Topology, TopologyKind, CONTROL_GROUP, MAIN_CONTROL, OFFSET_CONTROL,
    OFFSET_GROUP,
};
use log::{debug, info};

use crate::error::{InStage, RigError, RigResult, SceneError, Stage};
use crate::records::{ControlSet, LocatorRecord, OffsetRecord, OffsetSet};
use crate::scene::{NodeId, NodeKind, SceneGraph};

const STAGE: Stage = Stage::Offsets;

/// Inserts offset groups above the controls of a control set.
pub struct OffsetBuilder<'a> {
    topology: &'a Topology,
    config: &'a RigConfig,
}

impl<'a> OffsetBuilder<'a> {
    pub fn new(topology: &'a Topology, config: &'a RigConfig) -> Self {
        Self { topology, config }
    }

    pub fn build(&self, scene: &mut dyn SceneGraph, controls: &ControlSet) -> RigResult<OffsetSet> {
        let mut offsets = OffsetSet::default();

        let owners = controls
            .records
            .iter()
            .map(|r| (Some(r.slot), r.node, r.name.clone()))
            .chain(controls.main.map(|id| (None, id, MAIN_CONTROL.to_string())))
            .chain(controls.offset.map(|id| (None, id, OFFSET_CONTROL.to_string())));
        for (slot, control, control_name) in owners {
            let record = self.insert_offset(scene, slot, control, &control_name)?;
            offsets.records.push(record);
        }

        offsets.ctrl_grp = self.rename_global(scene, &mut offsets, controls.main, CONTROL_GROUP)?;
        offsets.offset_grp =
            self.rename_global(scene, &mut offsets, controls.offset, OFFSET_GROUP)?;

        self.apply_offset_view(scene, controls, &mut offsets)?;

        if let (Some(offset_grp), Some(main)) = (offsets.offset_grp, controls.main) {
            scene.reparent(offset_grp, Some(main)).in_stage(STAGE)?;
        }

        info!(
            "Offset groups built: {} groups, {} skipped offset edges",
            offsets.records.len(),
            offsets.skipped_edges.len()
        );
        Ok(offsets)
    }

    fn insert_offset(
        &self,
        scene: &mut dyn SceneGraph,
        slot: Option<Slot>,
        control: NodeId,
        control_name: &str,
    ) -> RigResult<OffsetRecord> {
        let name = self.config.naming.offset_name(control_name);
        let (group, reused) = match reusable(scene, &name, NodeKind::Group)? {
            Some(existing) => {
                info!("Offset group {} already exists; reusing it", name);
                (existing, true)
            }
            None => (scene.create_group(&name).in_stage(STAGE)?, false),
        };

        if scene.node(control).in_stage(STAGE)?.parent != Some(group) {
            zero_pose_above(scene, group, control)?;
        }

        Ok(OffsetRecord {
            slot,
            node: group,
            name,
            control,
            reused,
        })
    }

    /// Inserts a zero-pose locator directly above a control.
    ///
    /// The locator keeps the control's former parent, so a control that
    /// already sits under its offset group ends up as
    /// `offset -> loc -> ctrl`.
    pub fn insert_locator(
        &self,
        scene: &mut dyn SceneGraph,
        control: NodeId,
    ) -> RigResult<LocatorRecord> {
        let node = scene.node(control).in_stage(STAGE)?;
        if node.kind != NodeKind::Control {
            return Err(RigError::NotAControl {
                name: node.name.clone(),
            });
        }
        let former_parent = node.parent;
        let name = self.config.naming.locator_name(&node.name);

        let (locator, reused) = match reusable(scene, &name, NodeKind::Locator)? {
            Some(existing) => (existing, true),
            None => {
                let scale = self.config.controls.locator_scale;
                (scene.create_locator(&name, scale).in_stage(STAGE)?, false)
            }
        };
        if former_parent == Some(locator) {
            debug!("{} already sits under {}", control, name);
            return Ok(LocatorRecord {
                node: locator,
                name,
                control,
                reused,
            });
        }

        zero_pose_above(scene, locator, control)?;
        if former_parent.is_some() {
            scene.reparent(locator, former_parent).in_stage(STAGE)?;
        }
        debug!("Inserted locator {} above {}", name, control);
        Ok(LocatorRecord {
            node: locator,
            name,
            control,
            reused,
        })
    }

    /// Inserts a locator above each of `controls`, in order.
    pub fn build_locators(
        &self,
        scene: &mut dyn SceneGraph,
        controls: &[NodeId],
    ) -> RigResult<Vec<LocatorRecord>> {
        let mut records = Vec::with_capacity(controls.len());
        for control in controls {
            records.push(self.insert_locator(scene, *control)?);
        }
        info!("Locators built: {}", records.len());
        Ok(records)
    }

    fn rename_global(
        &self,
        scene: &mut dyn SceneGraph,
        offsets: &mut OffsetSet,
        control: Option<NodeId>,
        fixed: &str,
    ) -> RigResult<Option<NodeId>> {
        let Some(control) = control else {
            return Ok(None);
        };
        let Some(record) = offsets.records.iter_mut().find(|r| r.control == control) else {
            return Ok(None);
        };
        scene.rename(record.node, fixed).in_stage(STAGE)?;
        record.name = fixed.to_string();
        Ok(Some(record.node))
    }

    /// Hangs each region offset group under the control of its nearest
    /// built, controlled ancestor (`offset_ctrl` at the top).
    fn apply_offset_view(
        &self,
        scene: &mut dyn SceneGraph,
        controls: &ControlSet,
        offsets: &mut OffsetSet,
    ) -> RigResult<()> {
        for edge in self.topology.edges(TopologyKind::Offset) {
            let Some(group) = offsets.node(edge.child) else {
                debug!("Skipping {}: no offset group for {}", edge, edge.child);
                offsets.skipped_edges.push(edge);
                continue;
            };
            let mut parent_slot = edge.parent;
            while parent_slot != Slot::Root && controls.node(parent_slot).is_none() {
                parent_slot = self.topology.controlling_ancestor(parent_slot);
            }
            let Some(parent) = controls.node(parent_slot) else {
                debug!("Skipping {}: no control for {}", edge, parent_slot);
                offsets.skipped_edges.push(edge);
                continue;
            };
            if parent_slot != edge.parent {
                debug!(
                    "Skipping {}: parenting {} under {} instead",
                    edge, edge.child, parent_slot
                );
                offsets.skipped_edges.push(edge);
            }
            scene.reparent(group, Some(parent)).in_stage(STAGE)?;
        }
        Ok(())
    }
}

/// Looks up a node to reuse by name. A node of another kind holding the name
/// is a collision.
fn reusable(scene: &dyn SceneGraph, name: &str, kind: NodeKind) -> RigResult<Option<NodeId>> {
    let Some(existing) = scene.find(name) else {
        return Ok(None);
    };
    if scene.node(existing).in_stage(STAGE)?.kind != kind {
        return Err(RigError::scene(STAGE, SceneError::NameCollision(name.to_string())));
    }
    Ok(Some(existing))
}

/// Parents `holder` under `control`, snaps and freezes it there, then swaps
/// them so `holder` is the top-level parent of `control` with the control at
/// a zero local pose.
fn zero_pose_above(scene: &mut dyn SceneGraph, holder: NodeId, control: NodeId) -> RigResult<()> {
    let pose = scene.world_transform(control).in_stage(STAGE)?;
    scene.reparent(holder, Some(control)).in_stage(STAGE)?;
    scene.set_world_transform(holder, pose).in_stage(STAGE)?;
    scene.freeze_transform(holder).in_stage(STAGE)?;
    scene.reparent(holder, None).in_stage(STAGE)?;
    scene.reparent(control, Some(holder)).in_stage(STAGE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControllerGenerator;
    use crate::memory::MemoryScene;
    use crate::parts::collect_parts;
    use crate::prompt::ScriptedPrompter;
    use crate::scene::{Channels, Pose};
    use crate::skeleton::SkeletonBuilder;
    use autorig_spec::{BodyRegion, MeshPart};
    use glam::DVec3;

    fn controlled(parts: &[MeshPart]) -> (MemoryScene, ControlSet) {
        let config = RigConfig::default();
        let topology = Topology::biped();
        let mut scene = MemoryScene::from_parts(parts).unwrap();
        let selection = scene.selection();
        let parts = collect_parts(&scene, &selection, config.preset, &mut ScriptedPrompter::proceed())
            .unwrap()
            .unwrap();
        let joints = SkeletonBuilder::new(&topology, &config)
            .build(&mut scene, &parts)
            .unwrap();
        let controls = ControllerGenerator::new(&topology, &config)
            .build(&mut scene, &joints)
            .unwrap();
        (scene, controls)
    }

    fn rig(parts: &[MeshPart]) -> (MemoryScene, ControlSet, OffsetSet) {
        let (mut scene, controls) = controlled(parts);
        let offsets = OffsetBuilder::new(&Topology::biped(), &RigConfig::default())
            .build(&mut scene, &controls)
            .unwrap();
        (scene, controls, offsets)
    }

    fn upper_body() -> Vec<MeshPart> {
        vec![
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Midsection", [0.0, 12.0, 0.0]),
            MeshPart::new("Char_UpperTorso", [0.0, 14.0, 0.0]),
            MeshPart::new("Char_Head", [0.0, 16.0, 0.0]),
            MeshPart::new("Char_Shoulder_Left", [2.0, 14.0, 0.0]),
        ]
    }

    fn parent_name(scene: &MemoryScene, name: &str) -> Option<String> {
        let id = scene.find(name).unwrap();
        scene
            .node(id)
            .unwrap()
            .parent
            .map(|p| scene.node(p).unwrap().name.clone())
    }

    #[test]
    fn test_each_control_has_zero_offset_parent() {
        let (scene, controls, offsets) = rig(&upper_body());
        assert_eq!(offsets.records.len(), controls.all().len());
        for record in &offsets.records {
            let ctrl = scene.node(record.control).unwrap();
            assert_eq!(ctrl.parent, Some(record.node));
            assert!(ctrl.local_pose().approx_eq(&Pose::IDENTITY));
            let group = scene.node(record.node).unwrap();
            assert_eq!(group.channels, Channels::IDENTITY);
        }
    }

    #[test]
    fn test_globals_renamed_and_nested() {
        let (scene, _, offsets) = rig(&upper_body());
        assert!(scene.find("main_offset").is_none());
        assert!(scene.find("offset_offset").is_none());
        assert_eq!(offsets.ctrl_grp, scene.find(CONTROL_GROUP));
        assert_eq!(parent_name(&scene, OFFSET_GROUP).as_deref(), Some(MAIN_CONTROL));
        assert_eq!(parent_name(&scene, CONTROL_GROUP), None);
    }

    #[test]
    fn test_offset_view_hierarchy() {
        let (scene, _, _) = rig(&upper_body());
        assert_eq!(parent_name(&scene, "Char_Pelvis_offset").as_deref(), Some(OFFSET_CONTROL));
        assert_eq!(
            parent_name(&scene, "Char_Midsection_offset").as_deref(),
            Some("Char_Pelvis_ctrl")
        );
        // Upper torso has no control, so head and shoulder hang off the midsection.
        assert_eq!(
            parent_name(&scene, "Char_Head_offset").as_deref(),
            Some("Char_Midsection_ctrl")
        );
        assert_eq!(
            parent_name(&scene, "Char_Shoulder_Left_offset").as_deref(),
            Some("Char_Midsection_ctrl")
        );
    }

    #[test]
    fn test_control_rig_is_one_tree() {
        let (scene, controls, _) = rig(&upper_body());
        let top = scene.find(CONTROL_GROUP).unwrap();
        for id in controls.all() {
            let mut current = id;
            while let Some(parent) = scene.node(current).unwrap().parent {
                current = parent;
            }
            assert_eq!(current, top);
        }
    }

    #[test]
    fn test_missing_ancestor_control_falls_back() {
        let parts = [
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Head", [0.0, 16.0, 0.0]),
        ];
        let (scene, _, offsets) = rig(&parts);
        assert_eq!(parent_name(&scene, "Char_Head_offset").as_deref(), Some("Char_Pelvis_ctrl"));
        assert!(offsets
            .skipped_edges
            .iter()
            .any(|e| e.child == Slot::Region(BodyRegion::Head)));
    }

    #[test]
    fn test_offset_name_held_by_other_kind_is_an_error() {
        let (mut scene, controls) = controlled(&upper_body());
        let squatter = scene.create_mesh("Char_Head_offset", DVec3::ZERO).unwrap();
        let err = OffsetBuilder::new(&Topology::biped(), &RigConfig::default())
            .build(&mut scene, &controls)
            .unwrap_err();
        assert!(matches!(
            err,
            RigError::Scene {
                source: SceneError::NameCollision(_),
                ..
            }
        ));
        let mesh = scene.node(squatter).unwrap();
        assert_eq!(mesh.kind, NodeKind::Mesh);
        assert!(mesh.children.is_empty());
    }

    #[test]
    fn test_locator_sits_between_offset_and_control() {
        let (mut scene, _, _) = rig(&upper_body());
        let config = RigConfig::default();
        let topology = Topology::biped();
        let control = scene.find("Char_Head_ctrl").unwrap();
        let before = scene.world_transform(control).unwrap();

        let record = OffsetBuilder::new(&topology, &config)
            .insert_locator(&mut scene, control)
            .unwrap();
        assert_eq!(record.name, "Char_Head_loc");
        assert!(!record.reused);

        let locator = scene.node(record.node).unwrap();
        assert_eq!(locator.kind, NodeKind::Locator);
        assert_eq!(locator.local_scale, Some(DVec3::splat(0.001)));
        assert_eq!(locator.channels, Channels::IDENTITY);
        assert_eq!(parent_name(&scene, "Char_Head_loc").as_deref(), Some("Char_Head_offset"));
        assert!(scene
            .world_transform(record.node)
            .unwrap()
            .approx_eq(&before));

        let ctrl = scene.node(control).unwrap();
        assert_eq!(ctrl.parent, Some(record.node));
        assert!(ctrl.local_pose().approx_eq(&Pose::IDENTITY));
        assert!(scene.world_transform(control).unwrap().approx_eq(&before));
    }

    #[test]
    fn test_locator_insertion_is_reentrant() {
        let (mut scene, controls, _) = rig(&upper_body());
        let config = RigConfig::default();
        let topology = Topology::biped();
        let builder = OffsetBuilder::new(&topology, &config);
        let targets: Vec<NodeId> = controls.records.iter().map(|r| r.node).collect();

        let first = builder.build_locators(&mut scene, &targets).unwrap();
        let count = scene.len();
        let second = builder.build_locators(&mut scene, &targets).unwrap();
        assert_eq!(scene.len(), count);
        assert!(second.iter().all(|r| r.reused));
        assert_eq!(
            first.iter().map(|r| r.node).collect::<Vec<_>>(),
            second.iter().map(|r| r.node).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_locator_requires_control() {
        let (mut scene, _, _) = rig(&upper_body());
        let joint = scene.find("Char_Head_jnt").unwrap();
        let err = OffsetBuilder::new(&Topology::biped(), &RigConfig::default())
            .insert_locator(&mut scene, joint)
            .unwrap_err();
        assert!(matches!(err, RigError::NotAControl { ref name } if name == "Char_Head_jnt"));
        assert!(scene.find("Char_Head_loc").is_none());
    }
}
