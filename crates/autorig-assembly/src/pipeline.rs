//! Stage sequencing inside one undo chunk.

use std::time::Instant;

use autorig_spec::{RigConfig, Topology};
use log::{error, info, warn};

use crate::controls::ControllerGenerator;
use crate::error::{InStage, RigResult, Stage};
use crate::offsets::OffsetBuilder;
use crate::parts::collect_parts;
use crate::prompt::Prompter;
use crate::records::{BindingSet, LocatorRecord};
use crate::report::{rig_hash, RigReport, StageTiming};
use crate::scene::{NodeId, SceneGraph};
use crate::skeleton::{check_no_joints, SkeletonBuilder};
use crate::skin::SkinBinder;

/// Result of a pipeline run that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum RigOutcome {
    /// Every stage ran; the scene holds the new rig.
    Completed(RigReport),
    /// The user declined to continue; the scene is unchanged.
    Cancelled,
}

impl RigOutcome {
    /// Returns the report of a completed run.
    pub fn report(&self) -> Option<&RigReport> {
        match self {
            RigOutcome::Completed(report) => Some(report),
            RigOutcome::Cancelled => None,
        }
    }
}

/// Runs naming validation, skeleton, controls, offsets and skin in order.
///
/// # Example
/// ```
/// use autorig_assembly::{MemoryScene, RigOutcome, RigPipeline, SceneGraph, ScriptedPrompter};
/// use autorig_spec::{MeshPart, RigConfig};
///
/// let parts = [
///     MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
///     MeshPart::new("Char_Thigh_Left", [1.0, 8.0, 0.0]),
/// ];
/// let mut scene = MemoryScene::from_parts(&parts).unwrap();
/// let selection = scene.selection();
/// let pipeline = RigPipeline::new(RigConfig::default()).unwrap();
/// let outcome = pipeline
///     .run(&mut scene, &selection, &mut ScriptedPrompter::proceed())
///     .unwrap();
/// assert!(matches!(outcome, RigOutcome::Completed(_)));
/// assert!(scene.find("Char_Thigh_Left_ctrl").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RigPipeline {
    config: RigConfig,
    topology: Topology,
}

impl RigPipeline {
    /// Validates the configuration and builds the topology for its preset.
    pub fn new(config: RigConfig) -> RigResult<Self> {
        config.validate()?;
        let topology = Topology::from_preset(config.preset);
        topology.validate()?;
        Ok(Self { config, topology })
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Rigs the selected mesh parts.
    ///
    /// Cancelled and failed runs revert every change they made. Fatal
    /// errors are shown to the prompter before they are returned.
    pub fn run(
        &self,
        scene: &mut dyn SceneGraph,
        selection: &[NodeId],
        prompter: &mut dyn Prompter,
    ) -> RigResult<RigOutcome> {
        scene.open_undo_chunk();
        match self.assemble(scene, selection, prompter) {
            Ok(RigOutcome::Completed(report)) => {
                scene.close_undo_chunk().in_stage(Stage::Pipeline)?;
                info!("Rig complete: {}", report.rig_hash);
                Ok(RigOutcome::Completed(report))
            }
            Ok(RigOutcome::Cancelled) => {
                scene.revert_undo_chunk().in_stage(Stage::Pipeline)?;
                info!("Rig cancelled; scene restored");
                Ok(RigOutcome::Cancelled)
            }
            Err(err) => {
                if let Err(revert) = scene.revert_undo_chunk() {
                    error!("Could not revert failed run: {}", revert);
                }
                warn!("Rig failed in {} stage: {}", err.stage(), err);
                prompter.warn(&err);
                Err(err)
            }
        }
    }

    /// Re-runs the skin binder on an already rigged scene.
    pub fn rebind(&self, scene: &mut dyn SceneGraph) -> RigResult<BindingSet> {
        scene.open_undo_chunk();
        match SkinBinder::new(&self.topology, &self.config).resume(scene) {
            Ok(bindings) => {
                scene.close_undo_chunk().in_stage(Stage::Pipeline)?;
                Ok(bindings)
            }
            Err(err) => {
                if let Err(revert) = scene.revert_undo_chunk() {
                    error!("Could not revert failed rebind: {}", revert);
                }
                Err(err)
            }
        }
    }

    /// Hangs a zero-pose locator above each of `controls`.
    ///
    /// All or nothing: a non-control in the list reverts the locators
    /// already inserted.
    pub fn locate(
        &self,
        scene: &mut dyn SceneGraph,
        controls: &[NodeId],
    ) -> RigResult<Vec<LocatorRecord>> {
        scene.open_undo_chunk();
        match OffsetBuilder::new(&self.topology, &self.config).build_locators(scene, controls) {
            Ok(locators) => {
                scene.close_undo_chunk().in_stage(Stage::Pipeline)?;
                Ok(locators)
            }
            Err(err) => {
                if let Err(revert) = scene.revert_undo_chunk() {
                    error!("Could not revert failed locator insertion: {}", revert);
                }
                Err(err)
            }
        }
    }

    fn assemble(
        &self,
        scene: &mut dyn SceneGraph,
        selection: &[NodeId],
        prompter: &mut dyn Prompter,
    ) -> RigResult<RigOutcome> {
        let config = &self.config;
        let topology = &self.topology;
        let mut timings = Vec::with_capacity(5);

        check_no_joints(scene)?;

        let started = Instant::now();
        let Some(parts) = collect_parts(scene, selection, config.preset, prompter)? else {
            return Ok(RigOutcome::Cancelled);
        };
        timings.push(StageTiming::since(Stage::Naming, started));
        for name in &parts.excluded {
            warn!("Part {} is excluded from the rig", name);
        }

        let started = Instant::now();
        let joints = SkeletonBuilder::new(topology, config).build(scene, &parts)?;
        timings.push(StageTiming::since(Stage::Skeleton, started));

        let started = Instant::now();
        let controls = ControllerGenerator::new(topology, config).build(scene, &joints)?;
        timings.push(StageTiming::since(Stage::Controls, started));

        let started = Instant::now();
        let offsets = OffsetBuilder::new(topology, config).build(scene, &controls)?;
        timings.push(StageTiming::since(Stage::Offsets, started));

        let started = Instant::now();
        let bindings = SkinBinder::new(topology, config).bind(scene, &parts, &joints, &controls)?;
        timings.push(StageTiming::since(Stage::Skin, started));

        let mut skipped_edges = joints.skipped_edges.clone();
        skipped_edges.extend(offsets.skipped_edges.iter().copied());

        Ok(RigOutcome::Completed(RigReport {
            preset: topology.preset(),
            parts: parts.records.len(),
            excluded_parts: parts.excluded,
            joints: joints.len(),
            controls: controls.all().len(),
            offset_groups: offsets.records.len(),
            bindings: bindings.bound.len(),
            skipped_bindings: bindings.skipped.len(),
            skipped_edges,
            orphans: joints.orphans,
            rig_hash: rig_hash(scene)?,
            timings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use crate::prompt::ScriptedPrompter;
    use crate::scene::NodeKind;
    use autorig_spec::{ControlSettings, MeshPart};
    use glam::DVec3;

    fn parts() -> Vec<MeshPart> {
        vec![
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Thigh_Left", [1.0, 8.0, 0.0]),
        ]
    }

    #[test]
    fn test_completed_run_reports_counts() {
        let mut scene = MemoryScene::from_parts(&parts()).unwrap();
        let selection = scene.selection();
        let pipeline = RigPipeline::new(RigConfig::default()).unwrap();
        let outcome = pipeline
            .run(&mut scene, &selection, &mut ScriptedPrompter::proceed())
            .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.parts, 2);
        assert_eq!(report.joints, 3);
        assert_eq!(report.controls, 4);
        assert_eq!(report.offset_groups, 4);
        assert_eq!(report.bindings, 2);
        assert_eq!(report.timings.len(), 5);
        assert_eq!(report.rig_hash.len(), 64);
        assert_eq!(scene.undo_depth(), 0);
    }

    #[test]
    fn test_cancel_restores_scene() {
        let mut scene = MemoryScene::from_parts(&[
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Tail", [0.0, 9.0, -2.0]),
        ])
        .unwrap();
        let before = scene.to_json_pretty().unwrap();
        let selection = scene.selection();
        let pipeline = RigPipeline::new(RigConfig::default()).unwrap();
        let outcome = pipeline
            .run(&mut scene, &selection, &mut ScriptedPrompter::cancel())
            .unwrap();
        assert_eq!(outcome, RigOutcome::Cancelled);
        assert_eq!(scene.to_json_pretty().unwrap(), before);
    }

    #[test]
    fn test_failure_warns_and_reverts() {
        let mut scene = MemoryScene::from_parts(&parts()).unwrap();
        scene.create_joint("Old_jnt", DVec3::ZERO, 1.0).unwrap();
        let before = scene.to_json_pretty().unwrap();
        let selection = scene.nodes_of_kind(NodeKind::Mesh);
        let mut prompter = ScriptedPrompter::proceed();

        let pipeline = RigPipeline::new(RigConfig::default()).unwrap();
        let err = pipeline.run(&mut scene, &selection, &mut prompter).unwrap_err();
        assert_eq!(err.stage(), Stage::Skeleton);
        assert_eq!(prompter.warnings.len(), 1);
        assert!(prompter.warnings[0].contains("Old_jnt"));
        assert_eq!(scene.to_json_pretty().unwrap(), before);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RigConfig::new().with_controls(ControlSettings {
            radius: -1.0,
            ..Default::default()
        });
        assert!(RigPipeline::new(config).is_err());
    }

    #[test]
    fn test_rebind_is_idempotent() {
        let mut scene = MemoryScene::from_parts(&parts()).unwrap();
        let selection = scene.selection();
        let pipeline = RigPipeline::new(RigConfig::default()).unwrap();
        pipeline
            .run(&mut scene, &selection, &mut ScriptedPrompter::proceed())
            .unwrap();
        let bindings = pipeline.rebind(&mut scene).unwrap();
        assert!(bindings.bound.is_empty());
        assert_eq!(bindings.skipped.len(), 2);
        assert_eq!(scene.bindings().len(), 2);
    }

    #[test]
    fn test_locate_is_all_or_nothing() {
        let mut scene = MemoryScene::from_parts(&parts()).unwrap();
        let selection = scene.selection();
        let pipeline = RigPipeline::new(RigConfig::default()).unwrap();
        pipeline
            .run(&mut scene, &selection, &mut ScriptedPrompter::proceed())
            .unwrap();
        let before = scene.to_json_pretty().unwrap();

        let pelvis_ctrl = scene.find("Char_Pelvis_ctrl").unwrap();
        let thigh_jnt = scene.find("Char_Thigh_Left_jnt").unwrap();
        let err = pipeline
            .locate(&mut scene, &[pelvis_ctrl, thigh_jnt])
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Offsets);
        assert_eq!(scene.to_json_pretty().unwrap(), before);

        let locators = pipeline.locate(&mut scene, &[pelvis_ctrl]).unwrap();
        assert_eq!(locators[0].name, "Char_Pelvis_loc");
        assert_eq!(scene.nodes_of_kind(NodeKind::Locator).len(), 1);
        assert_eq!(scene.undo_depth(), 0);
    }
}
