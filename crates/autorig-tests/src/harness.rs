//! Pipeline runner and hierarchy queries for integration tests.

use autorig_assembly::{
    MemoryScene, NodeId, NodeKind, Pose, Prompter, RigOutcome, RigPipeline, RigResult,
    SceneGraph, ScriptedPrompter,
};
use autorig_spec::{MeshPart, RigConfig};
use glam::DVec3;

/// A scene together with the outcome of rigging it.
pub struct RigRun {
    pub scene: MemoryScene,
    pub outcome: RigResult<RigOutcome>,
}

impl RigRun {
    /// Panics unless the run completed.
    pub fn completed(&self) -> &autorig_assembly::RigReport {
        match &self.outcome {
            Ok(RigOutcome::Completed(report)) => report,
            other => panic!("expected a completed run, got {:?}", other),
        }
    }
}

/// Builds a scene from `parts`, selects all of them and rigs it.
pub fn rig_parts(parts: &[MeshPart], config: RigConfig, prompter: &mut dyn Prompter) -> RigRun {
    let mut scene = MemoryScene::from_parts(parts).expect("part names are unique");
    let selection = scene.selection();
    let pipeline = RigPipeline::new(config).expect("config is valid");
    let outcome = pipeline.run(&mut scene, &selection, prompter);
    RigRun { scene, outcome }
}

/// Rigs `parts` with the default config, proceeding past any prompt.
pub fn rig_default(parts: &[MeshPart]) -> RigRun {
    rig_parts(parts, RigConfig::default(), &mut ScriptedPrompter::proceed())
}

/// Looks a node up by name.
pub fn node_id(scene: &MemoryScene, name: &str) -> NodeId {
    scene
        .find(name)
        .unwrap_or_else(|| panic!("no node named {}", name))
}

/// Name of the parent of `name`, if any.
pub fn parent_name(scene: &MemoryScene, name: &str) -> Option<String> {
    let id = node_id(scene, name);
    scene
        .node(id)
        .unwrap()
        .parent
        .map(|p| scene.node(p).unwrap().name.clone())
}

/// World position of `name`.
pub fn world_position(scene: &MemoryScene, name: &str) -> DVec3 {
    scene.world_transform(node_id(scene, name)).unwrap().position
}

/// World pose of a node.
pub fn world_pose(scene: &MemoryScene, id: NodeId) -> Pose {
    scene.world_transform(id).unwrap()
}

/// Follows parents from `id` while they are joints; returns the topmost joint.
pub fn top_joint(scene: &MemoryScene, id: NodeId) -> NodeId {
    let mut current = id;
    while let Some(parent) = scene.node(current).unwrap().parent {
        if scene.node(parent).unwrap().kind != NodeKind::Joint {
            break;
        }
        current = parent;
    }
    current
}

/// Follows parents from `id` to the top of its hierarchy.
pub fn top_ancestor(scene: &MemoryScene, id: NodeId) -> NodeId {
    let mut current = id;
    while let Some(parent) = scene.node(current).unwrap().parent {
        current = parent;
    }
    current
}

/// Names of every node of `kind`, sorted.
pub fn names_of_kind(scene: &MemoryScene, kind: NodeKind) -> Vec<String> {
    let mut names: Vec<String> = scene
        .nodes_of_kind(kind)
        .into_iter()
        .map(|id| scene.node(id).unwrap().name.clone())
        .collect();
    names.sort();
    names
}
