//! Run report and canonical rig hash.

use std::time::Instant;

use autorig_spec::hash::canonical_hash;
use autorig_spec::{TopologyEdge, TopologyPreset};
use serde::Serialize;

use crate::error::{InStage, RigResult, Stage};
use crate::scene::{ConstraintKind, NodeKind, SceneGraph};

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub millis: u64,
}

impl StageTiming {
    /// Measures the time elapsed since `started`.
    pub fn since(stage: Stage, started: Instant) -> Self {
        Self {
            stage: stage.as_str(),
            millis: started.elapsed().as_millis() as u64,
        }
    }
}

/// Summary of a completed rig run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigReport {
    pub preset: TopologyPreset,
    /// Parts that received joints.
    pub parts: usize,
    /// Parts left out because of unrecognized names.
    pub excluded_parts: Vec<String>,
    /// Joints created, `root_jnt` included.
    pub joints: usize,
    /// Controls created, globals included.
    pub controls: usize,
    pub offset_groups: usize,
    /// Skin bindings created.
    pub bindings: usize,
    /// Meshes found already bound.
    pub skipped_bindings: usize,
    /// Topology edges that did not apply as declared.
    pub skipped_edges: Vec<TopologyEdge>,
    /// Joints collected under `jnt_grp` for lack of a parent.
    pub orphans: Vec<String>,
    /// Canonical hash of the resulting rig.
    pub rig_hash: String,
    pub timings: Vec<StageTiming>,
}

#[derive(Serialize)]
struct NodeSummary<'a> {
    name: &'a str,
    kind: NodeKind,
    parent: Option<&'a str>,
    position: [f64; 3],
    orientation: [f64; 4],
}

#[derive(Serialize)]
struct ConstraintSummary<'a> {
    kind: ConstraintKind,
    driver: &'a str,
    driven: &'a str,
}

#[derive(Serialize)]
struct BindingSummary<'a> {
    mesh: &'a str,
    influences: Vec<&'a str>,
}

#[derive(Serialize)]
struct RigSummary<'a> {
    nodes: Vec<NodeSummary<'a>>,
    constraints: Vec<ConstraintSummary<'a>>,
    bindings: Vec<BindingSummary<'a>>,
}

/// Rounds to six decimals so float noise does not change the hash.
fn quantize(value: f64) -> f64 {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Hashes the rig by node names, hierarchy, placement, drives and bindings.
///
/// Node handles are left out, so two runs over the same parts hash the same
/// regardless of selection order.
pub fn rig_hash(scene: &dyn SceneGraph) -> RigResult<String> {
    let stage = Stage::Pipeline;
    let mut nodes = Vec::new();
    let mut constraints = Vec::new();
    let mut bindings = Vec::new();

    for kind in [
        NodeKind::Joint,
        NodeKind::Control,
        NodeKind::Group,
        NodeKind::Locator,
        NodeKind::Mesh,
    ] {
        for id in scene.nodes_of_kind(kind) {
            let node = scene.node(id).in_stage(stage)?;
            let parent = match node.parent {
                Some(p) => Some(scene.node(p).in_stage(stage)?.name.as_str()),
                None => None,
            };
            let world = scene.world_transform(id).in_stage(stage)?;
            // q and -q are the same rotation; pick the one with w >= 0.
            let q = if world.orientation.w < 0.0 {
                -world.orientation
            } else {
                world.orientation
            };
            nodes.push(NodeSummary {
                name: node.name.as_str(),
                kind,
                parent,
                position: world.position.to_array().map(quantize),
                orientation: q.to_array().map(quantize),
            });

            for constraint in scene.constraints_on(id) {
                constraints.push(ConstraintSummary {
                    kind: constraint.kind,
                    driver: scene.node(constraint.driver).in_stage(stage)?.name.as_str(),
                    driven: node.name.as_str(),
                });
            }
            if let Some(binding) = scene.skin_binding(id).in_stage(stage)? {
                let mut influences = Vec::with_capacity(binding.influences.len());
                for joint in &binding.influences {
                    influences.push(scene.node(*joint).in_stage(stage)?.name.as_str());
                }
                bindings.push(BindingSummary {
                    mesh: node.name.as_str(),
                    influences,
                });
            }
        }
    }

    nodes.sort_by(|a, b| a.name.cmp(b.name));
    constraints.sort_by(|a, b| (a.driven, a.driver).cmp(&(b.driven, b.driver)));
    bindings.sort_by(|a, b| a.mesh.cmp(b.mesh));

    Ok(canonical_hash(&RigSummary {
        nodes,
        constraints,
        bindings,
    })?)
}
