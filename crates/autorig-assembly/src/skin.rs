//! Skin binder: binds each region mesh to its joints, skipping meshes that
//! are already bound.

use autorig_spec::{RigConfig, Slot, Topology, TopologyKind};
use log::{debug, info};

use crate::error::{InStage, RigResult, Stage};
use crate::records::{BindingRecord, BindingSet, ControlSet, JointSet, PartSet};
use crate::scene::{ConstraintKind, SceneGraph};

const STAGE: Stage = Stage::Skin;

/// Binds mesh parts to joints per the skin view.
pub struct SkinBinder<'a> {
    topology: &'a Topology,
    config: &'a RigConfig,
}

impl<'a> SkinBinder<'a> {
    pub fn new(topology: &'a Topology, config: &'a RigConfig) -> Self {
        Self { topology, config }
    }

    /// Binds every resolvable region and re-asserts the control drives.
    pub fn bind(
        &self,
        scene: &mut dyn SceneGraph,
        parts: &PartSet,
        joints: &JointSet,
        controls: &ControlSet,
    ) -> RigResult<BindingSet> {
        let mut bindings = BindingSet::default();
        let mut bound_slots: Vec<Slot> = Vec::new();

        for edge in self.topology.edges(TopologyKind::Skin) {
            let Some(region) = edge.child.region() else {
                continue;
            };
            let Some(part) = parts.get(region) else {
                debug!("Skipping {}: no mesh for {}", edge, region);
                continue;
            };
            let slots = self.topology.skin_influences(region);
            let influences: Vec<_> = slots.iter().filter_map(|s| joints.node(*s)).collect();
            if influences.is_empty() {
                debug!("Skipping {}: no joint for {}", edge, region);
                continue;
            }

            if scene.skin_binding(part.node).in_stage(STAGE)?.is_some() {
                info!("{} is already bound; skipping", part.name);
                bindings.skipped.push(region);
            } else {
                scene
                    .bind_skin(part.node, &influences, &self.config.skin)
                    .in_stage(STAGE)?;
                debug!("Bound {} to {} joints", part.name, influences.len());
                bindings.bound.push(BindingRecord {
                    region,
                    mesh: part.node,
                    influences,
                });
            }
            bound_slots.extend(slots);
        }

        for control in &controls.records {
            if !bound_slots.contains(&control.slot) {
                continue;
            }
            scene
                .constrain(ConstraintKind::Parent, control.node, control.joint)
                .in_stage(STAGE)?;
            bindings.drives += 1;
        }

        info!(
            "Skin bound: {} new bindings, {} already bound",
            bindings.bound.len(),
            bindings.skipped.len()
        );
        Ok(bindings)
    }

    /// Rediscovers parts, joints and controls by name and binds them.
    pub fn resume(&self, scene: &mut dyn SceneGraph) -> RigResult<BindingSet> {
        let naming = &self.config.naming;
        let parts = PartSet::discover(scene, self.topology)?;
        let joints = JointSet::discover(scene, self.topology, naming)?;
        let controls = ControlSet::discover(scene, self.topology, naming, &joints)?;
        info!(
            "Resuming skin binding: {} parts, {} joints, {} controls found",
            parts.records.len(),
            joints.len(),
            controls.records.len()
        );
        self.bind(scene, &parts, &joints, &controls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControllerGenerator;
    use crate::memory::MemoryScene;
    use crate::parts::collect_parts;
    use crate::prompt::ScriptedPrompter;
    use crate::skeleton::SkeletonBuilder;
    use autorig_spec::{BindMethod, BodyRegion, MeshPart};

    fn rigged(parts: &[MeshPart]) -> (MemoryScene, PartSet, JointSet, ControlSet) {
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
        (scene, parts, joints, controls)
    }

    fn legs() -> Vec<MeshPart> {
        vec![
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Calf_Left", [1.0, 4.0, 0.0]),
            MeshPart::new("Char_Foot_Left", [1.0, 1.0, 0.5]),
        ]
    }

    #[test]
    fn test_binds_each_mesh_once() {
        let (mut scene, parts, joints, controls) = rigged(&legs());
        let config = RigConfig::default();
        let topology = Topology::biped();
        let binder = SkinBinder::new(&topology, &config);

        let first = binder.bind(&mut scene, &parts, &joints, &controls).unwrap();
        assert_eq!(first.bound.len(), 3);
        assert!(first.skipped.is_empty());
        assert_eq!(scene.bindings().len(), 3);

        let second = binder.bind(&mut scene, &parts, &joints, &controls).unwrap();
        assert!(second.bound.is_empty());
        assert_eq!(second.skipped.len(), 3);
        assert_eq!(scene.bindings().len(), 3);
    }

    #[test]
    fn test_foot_binds_base_and_toe() {
        let (mut scene, parts, joints, controls) = rigged(&legs());
        let config = RigConfig::default();
        let topology = Topology::biped();
        SkinBinder::new(&topology, &config)
            .bind(&mut scene, &parts, &joints, &controls)
            .unwrap();

        let foot = parts.get(BodyRegion::FootLeft).unwrap();
        let binding = scene.skin_binding(foot.node).unwrap().unwrap();
        let names: Vec<&str> = binding
            .influences
            .iter()
            .map(|j| scene.node(*j).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Char_Foot_Left_Base_jnt", "Char_Foot_Left_Toe_jnt"]);
        assert_eq!(binding.params.max_influences, 1);
        assert_eq!(binding.params.bind_method, BindMethod::GeodesicVoxel);
        assert_eq!(binding.params.dropoff_rate, 4.0);
        assert_eq!(binding.params.heatmap_falloff, 0.2);
    }

    #[test]
    fn test_drives_are_reasserted_without_duplicates() {
        let (mut scene, parts, joints, controls) = rigged(&legs());
        let config = RigConfig::default();
        let topology = Topology::biped();
        let before = scene.constraints().len();
        let bindings = SkinBinder::new(&topology, &config)
            .bind(&mut scene, &parts, &joints, &controls)
            .unwrap();
        // Pelvis and calf are controlled; foot joints are not.
        assert_eq!(bindings.drives, 2);
        assert_eq!(scene.constraints().len(), before);
    }

    #[test]
    fn test_resume_rediscovers_rig() {
        let (mut scene, parts, joints, controls) = rigged(&legs());
        let config = RigConfig::default();
        let topology = Topology::biped();
        let binder = SkinBinder::new(&topology, &config);

        // Bind only the pelvis by hand, then let resume finish the job.
        let pelvis = parts.get(BodyRegion::Pelvis).unwrap().node;
        let pelvis_jnt = joints.node(Slot::Region(BodyRegion::Pelvis)).unwrap();
        scene.bind_skin(pelvis, &[pelvis_jnt], &config.skin).unwrap();

        let resumed = binder.resume(&mut scene).unwrap();
        assert_eq!(resumed.skipped, vec![BodyRegion::Pelvis]);
        assert_eq!(resumed.bound.len(), 2);
        assert_eq!(resumed.drives, controls.records.len());
    }
}
