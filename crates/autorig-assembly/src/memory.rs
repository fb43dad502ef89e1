//! In-memory scene graph.

use autorig_spec::{BindParams, MeshPart, NamePattern};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::scene::{
    ChannelLimits, ChannelLocks, Channels, Constraint, ConstraintId, ConstraintKind, CurveShape,
    HistoryEntry, Node, NodeId, NodeKind, Pose, SceneGraph, SkinBinding,
};

/// Serialized form of a [`MemoryScene`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub next_id: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub next_constraint: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<SkinBinding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<NodeId>,
}

/// A scene held entirely in memory. Nodes are kept sorted by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SceneData", into = "SceneData")]
pub struct MemoryScene {
    data: SceneData,
    undo: Vec<SceneData>,
}

/// Checks that a loaded scene forms a well-founded forest.
fn check_structure(data: &SceneData) -> SceneResult<()> {
    let nodes = &data.nodes;
    let lookup = move |id: NodeId| {
        nodes
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .map(|i| &nodes[i])
    };

    for pair in nodes.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(SceneError::DuplicateId(pair[0].id));
        }
    }
    let mut names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(SceneError::NameCollision(pair[0].to_string()));
    }

    for node in nodes {
        if let Some(parent_id) = node.parent {
            let parent = lookup(parent_id).ok_or_else(|| SceneError::DanglingParent {
                child: node.name.clone(),
                parent: parent_id,
            })?;
            if !parent.children.contains(&node.id) {
                return Err(SceneError::MismatchedChildren {
                    parent: parent.name.clone(),
                    child: node.name.clone(),
                });
            }
        }
        for child_id in &node.children {
            let child = lookup(*child_id).ok_or(SceneError::UnknownNode(*child_id))?;
            if child.parent != Some(node.id) {
                return Err(SceneError::MismatchedChildren {
                    parent: node.name.clone(),
                    child: child.name.clone(),
                });
            }
        }

        // A chain longer than the node count must revisit a node.
        let mut current = node.parent;
        let mut steps = 0;
        while let Some(id) = current {
            steps += 1;
            let ancestor = lookup(id).ok_or(SceneError::UnknownNode(id))?;
            if id == node.id || steps > nodes.len() {
                return Err(SceneError::HierarchyCycle {
                    child: node.name.clone(),
                    parent: ancestor.name.clone(),
                });
            }
            current = ancestor.parent;
        }
    }

    let referenced = data
        .constraints
        .iter()
        .flat_map(|c| [c.driver, c.driven])
        .chain(
            data.bindings
                .iter()
                .flat_map(|b| std::iter::once(b.mesh).chain(b.influences.iter().copied())),
        )
        .chain(data.selection.iter().copied());
    for id in referenced {
        lookup(id).ok_or(SceneError::UnknownNode(id))?;
    }
    Ok(())
}

impl TryFrom<SceneData> for MemoryScene {
    type Error = SceneError;

    fn try_from(mut data: SceneData) -> SceneResult<Self> {
        data.nodes.sort_by_key(|n| n.id);
        check_structure(&data)?;
        let max_id = data.nodes.last().map(|n| n.id.0 + 1).unwrap_or(0);
        data.next_id = data.next_id.max(max_id);
        let max_constraint = data
            .constraints
            .iter()
            .map(|c| c.id.0 + 1)
            .max()
            .unwrap_or(0);
        data.next_constraint = data.next_constraint.max(max_constraint);
        Ok(Self {
            data,
            undo: Vec::new(),
        })
    }
}

impl From<MemoryScene> for SceneData {
    fn from(scene: MemoryScene) -> Self {
        scene.data
    }
}

impl PartialEq for MemoryScene {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl MemoryScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene holding one mesh per part, all selected.
    pub fn from_parts(parts: &[MeshPart]) -> SceneResult<Self> {
        let mut scene = Self::new();
        let mut meshes = Vec::with_capacity(parts.len());
        for part in parts {
            meshes.push(scene.create_mesh(&part.name, part.pivot)?);
        }
        scene.set_selection(&meshes)?;
        Ok(scene)
    }

    /// Parses a scene document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the scene as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.data)
    }

    /// Returns every node in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.data.nodes
    }

    /// Returns every live constraint in creation order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.data.constraints
    }

    /// Returns every skin binding in creation order.
    pub fn bindings(&self) -> &[SkinBinding] {
        &self.data.bindings
    }

    /// Returns the top-level nodes in id order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.data
            .nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect()
    }

    /// Number of nodes in the scene.
    pub fn len(&self) -> usize {
        self.data.nodes.len()
    }

    /// Returns true if the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.data.nodes.is_empty()
    }

    /// Depth of open undo chunks.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    fn index(&self, id: NodeId) -> SceneResult<usize> {
        self.data
            .nodes
            .binary_search_by_key(&id, |n| n.id)
            .map_err(|_| SceneError::UnknownNode(id))
    }

    fn get(&self, id: NodeId) -> SceneResult<&Node> {
        Ok(&self.data.nodes[self.index(id)?])
    }

    fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        let idx = self.index(id)?;
        Ok(&mut self.data.nodes[idx])
    }

    fn insert(&mut self, name: &str, kind: NodeKind) -> SceneResult<NodeId> {
        if self.find(name).is_some() {
            return Err(SceneError::NameCollision(name.to_string()));
        }
        let id = NodeId(self.data.next_id);
        self.data.next_id += 1;
        self.data.nodes.push(Node::new(id, name, kind));
        Ok(id)
    }

    fn parent_world(&self, node: &Node) -> SceneResult<Pose> {
        match node.parent {
            Some(parent) => self.world_transform(parent),
            None => Ok(Pose::IDENTITY),
        }
    }

    /// Sets channels so the node lands on `pose` in world space.
    fn place(&mut self, id: NodeId, pose: Pose) -> SceneResult<()> {
        let parent_world = self.parent_world(self.get(id)?)?;
        let node = self.get_mut(id)?;
        let channel_pose = node.rest.inverse() * parent_world.inverse() * pose;
        node.channels.translate = channel_pose.position;
        node.channels.rotate = (node.joint_orient.inverse() * channel_pose.orientation).normalize();
        Ok(())
    }

    /// Rewrites the rest transform so the node stays at `world` under its
    /// current parent without touching its channels.
    fn rebase(&mut self, id: NodeId, world: Pose) -> SceneResult<()> {
        let parent_world = self.parent_world(self.get(id)?)?;
        let node = self.get_mut(id)?;
        let channel_pose = Pose::new(
            node.channels.translate,
            node.joint_orient * node.channels.rotate,
        );
        node.rest = parent_world.inverse() * world * channel_pose.inverse();
        Ok(())
    }

    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> SceneResult<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.get(id)?.parent;
        }
        Ok(false)
    }

    fn subtree(&self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.get(current)?.children.iter().rev());
        }
        Ok(out)
    }

    fn apply_constraint(&mut self, constraint: Constraint) -> SceneResult<()> {
        let driver = self.world_transform(constraint.driver)?;
        let target = match constraint.kind {
            ConstraintKind::Parent => driver,
            ConstraintKind::Orient => {
                let driven = self.world_transform(constraint.driven)?;
                Pose::new(driven.position, driver.orientation)
            }
        };
        self.place(constraint.driven, target)
    }

    /// Re-evaluates every constraint in creation order.
    fn solve_constraints(&mut self) -> SceneResult<()> {
        let constraints = self.data.constraints.clone();
        for constraint in constraints {
            self.apply_constraint(constraint)?;
        }
        Ok(())
    }
}

impl SceneGraph for MemoryScene {
    fn create_mesh(&mut self, name: &str, pivot: DVec3) -> SceneResult<NodeId> {
        let id = self.insert(name, NodeKind::Mesh)?;
        self.get_mut(id)?.channels.translate = pivot;
        Ok(id)
    }

    fn create_joint(&mut self, name: &str, position: DVec3, radius: f64) -> SceneResult<NodeId> {
        let id = self.insert(name, NodeKind::Joint)?;
        let node = self.get_mut(id)?;
        node.channels.translate = position;
        node.radius = Some(radius);
        Ok(id)
    }

    fn create_curve(&mut self, name: &str, shape: CurveShape) -> SceneResult<NodeId> {
        let id = self.insert(name, NodeKind::Control)?;
        self.get_mut(id)?.curve = Some(shape);
        Ok(id)
    }

    fn create_group(&mut self, name: &str) -> SceneResult<NodeId> {
        self.insert(name, NodeKind::Group)
    }

    fn create_locator(&mut self, name: &str, local_scale: f64) -> SceneResult<NodeId> {
        let id = self.insert(name, NodeKind::Locator)?;
        self.get_mut(id)?.local_scale = Some(DVec3::splat(local_scale));
        Ok(id)
    }

    fn delete_node(&mut self, id: NodeId) -> SceneResult<()> {
        let doomed = self.subtree(id)?;
        if let Some(parent) = self.get(id)?.parent {
            self.get_mut(parent)?.children.retain(|c| *c != id);
        }
        self.data.nodes.retain(|n| !doomed.contains(&n.id));
        self.data
            .constraints
            .retain(|c| !doomed.contains(&c.driver) && !doomed.contains(&c.driven));
        self.data.bindings.retain(|b| !doomed.contains(&b.mesh));
        for binding in &mut self.data.bindings {
            binding.influences.retain(|j| !doomed.contains(j));
        }
        self.data.selection.retain(|s| !doomed.contains(s));
        Ok(())
    }

    fn rename(&mut self, id: NodeId, name: &str) -> SceneResult<()> {
        match self.find(name) {
            Some(existing) if existing != id => Err(SceneError::NameCollision(name.to_string())),
            _ => {
                self.get_mut(id)?.name = name.to_string();
                Ok(())
            }
        }
    }

    fn node(&self, id: NodeId) -> SceneResult<&Node> {
        self.get(id)
    }

    fn find(&self, name: &str) -> Option<NodeId> {
        self.data
            .nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.id)
    }

    fn find_nodes(&self, pattern: &NamePattern, kind: Option<NodeKind>) -> Vec<NodeId> {
        self.data
            .nodes
            .iter()
            .filter(|n| kind.map_or(true, |k| n.kind == k) && pattern.matches(&n.name))
            .map(|n| n.id)
            .collect()
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.data
            .nodes
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.id)
            .collect()
    }

    fn selection(&self) -> Vec<NodeId> {
        self.data.selection.clone()
    }

    fn set_selection(&mut self, nodes: &[NodeId]) -> SceneResult<()> {
        for id in nodes {
            self.index(*id)?;
        }
        self.data.selection = nodes.to_vec();
        Ok(())
    }

    fn world_transform(&self, id: NodeId) -> SceneResult<Pose> {
        let node = self.get(id)?;
        let mut pose = node.local_pose();
        let mut current = node.parent;
        while let Some(parent) = current {
            let parent = self.get(parent)?;
            pose = parent.local_pose() * pose;
            current = parent.parent;
        }
        Ok(pose)
    }

    fn set_world_transform(&mut self, id: NodeId, pose: Pose) -> SceneResult<()> {
        self.place(id, pose)?;
        self.solve_constraints()
    }

    fn reparent(&mut self, child: NodeId, parent: Option<NodeId>) -> SceneResult<()> {
        let current = self.get(child)?.parent;
        if current == parent {
            return Ok(());
        }
        if let Some(parent) = parent {
            if self.is_descendant(parent, child)? {
                return Err(SceneError::HierarchyCycle {
                    child: self.get(child)?.name.clone(),
                    parent: self.get(parent)?.name.clone(),
                });
            }
        }

        let world = self.world_transform(child)?;
        if let Some(old) = current {
            self.get_mut(old)?.children.retain(|c| *c != child);
        }
        if let Some(new) = parent {
            self.get_mut(new)?.children.push(child);
        }
        self.get_mut(child)?.parent = parent;
        self.rebase(child, world)
    }

    fn orient_joint(&mut self, id: NodeId, orientation: DQuat) -> SceneResult<()> {
        let children = self.get(id)?.children.clone();
        let mut saved = Vec::with_capacity(children.len());
        for child in &children {
            saved.push((*child, self.world_transform(*child)?));
        }
        let world = self.world_transform(id)?;
        self.place(id, Pose::new(world.position, orientation.normalize()))?;
        for (child, pose) in saved {
            self.rebase(child, pose)?;
        }
        Ok(())
    }

    fn freeze_joint(&mut self, id: NodeId) -> SceneResult<()> {
        let node = self.get_mut(id)?;
        node.joint_orient = (node.joint_orient * node.channels.rotate).normalize();
        node.channels.rotate = DQuat::IDENTITY;
        Ok(())
    }

    fn freeze_transform(&mut self, id: NodeId) -> SceneResult<()> {
        let node = self.get_mut(id)?;
        node.rest = node.local_pose() * Pose::from_rotation(node.joint_orient).inverse();
        node.channels = Channels::IDENTITY;
        Ok(())
    }

    fn freeze_translate(&mut self, id: NodeId) -> SceneResult<()> {
        let node = self.get_mut(id)?;
        node.rest = node.rest * Pose::from_translation(node.channels.translate);
        node.channels.translate = DVec3::ZERO;
        Ok(())
    }

    fn set_channel_limits(&mut self, id: NodeId, limits: ChannelLimits) -> SceneResult<()> {
        self.get_mut(id)?.limits = limits;
        Ok(())
    }

    fn lock_channels(&mut self, id: NodeId, locks: ChannelLocks) -> SceneResult<()> {
        let node = self.get_mut(id)?;
        node.locks = node.locks.union(locks);
        Ok(())
    }

    fn set_display_color(&mut self, id: NodeId, color: u8) -> SceneResult<()> {
        self.get_mut(id)?.display_color = Some(color);
        Ok(())
    }

    fn constrain(
        &mut self,
        kind: ConstraintKind,
        driver: NodeId,
        driven: NodeId,
    ) -> SceneResult<ConstraintId> {
        self.index(driver)?;
        self.index(driven)?;
        if driver == driven {
            let name = self.get(driven)?.name.clone();
            return Err(SceneError::HierarchyCycle {
                child: name.clone(),
                parent: name,
            });
        }

        for existing in self.constraints_on(driven) {
            if existing.kind != kind {
                continue;
            }
            if existing.driver == driver {
                return Ok(existing.id);
            }
            if kind == ConstraintKind::Parent {
                return Err(SceneError::AlreadyConstrained {
                    driven: self.get(driven)?.name.clone(),
                    existing: self.get(existing.driver)?.name.clone(),
                });
            }
        }

        let constraint = Constraint {
            id: ConstraintId(self.data.next_constraint),
            kind,
            driver,
            driven,
            maintain_offset: false,
        };
        self.data.next_constraint += 1;
        self.data.constraints.push(constraint);
        self.get_mut(driven)?
            .history
            .push(HistoryEntry::Constraint(constraint.id));
        self.apply_constraint(constraint)?;
        self.solve_constraints()?;
        Ok(constraint.id)
    }

    fn delete_constraint(&mut self, id: ConstraintId) -> SceneResult<()> {
        let before = self.data.constraints.len();
        self.data.constraints.retain(|c| c.id != id);
        if self.data.constraints.len() == before {
            return Err(SceneError::UnknownConstraint(id));
        }
        Ok(())
    }

    fn constraints_on(&self, driven: NodeId) -> Vec<Constraint> {
        self.data
            .constraints
            .iter()
            .filter(|c| c.driven == driven)
            .copied()
            .collect()
    }

    fn constraints_from(&self, driver: NodeId) -> Vec<Constraint> {
        self.data
            .constraints
            .iter()
            .filter(|c| c.driver == driver)
            .copied()
            .collect()
    }

    fn bake_history(&mut self, id: NodeId) -> SceneResult<()> {
        let live: Vec<ConstraintId> = self.data.constraints.iter().map(|c| c.id).collect();
        let bound = self.data.bindings.iter().any(|b| b.mesh == id);
        self.get_mut(id)?.history.retain(|entry| match entry {
            HistoryEntry::Constraint(c) => live.contains(c),
            HistoryEntry::Skin => bound,
        });
        Ok(())
    }

    fn skin_binding(&self, mesh: NodeId) -> SceneResult<Option<&SkinBinding>> {
        self.index(mesh)?;
        Ok(self.data.bindings.iter().find(|b| b.mesh == mesh))
    }

    fn bind_skin(
        &mut self,
        mesh: NodeId,
        influences: &[NodeId],
        params: &BindParams,
    ) -> SceneResult<()> {
        let node = self.get(mesh)?;
        if node.kind != NodeKind::Mesh {
            return Err(SceneError::NotAMesh(node.name.clone()));
        }
        if influences.is_empty() {
            return Err(SceneError::NoInfluences(node.name.clone()));
        }
        if self.skin_binding(mesh)?.is_some() {
            return Err(SceneError::AlreadyBound(node.name.clone()));
        }
        for joint in influences {
            self.index(*joint)?;
        }
        self.data.bindings.push(SkinBinding {
            mesh,
            influences: influences.to_vec(),
            params: params.clone(),
        });
        self.get_mut(mesh)?.history.push(HistoryEntry::Skin);
        Ok(())
    }

    fn open_undo_chunk(&mut self) {
        self.undo.push(self.data.clone());
    }

    fn close_undo_chunk(&mut self) -> SceneResult<()> {
        self.undo.pop().map(|_| ()).ok_or(SceneError::NoUndoChunk)
    }

    fn revert_undo_chunk(&mut self) -> SceneResult<()> {
        self.data = self.undo.pop().ok_or(SceneError::NoUndoChunk)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_spec::ShapeAxis;
    use std::f64::consts::FRAC_PI_2;

    fn v(x: f64, y: f64, z: f64) -> DVec3 {
        DVec3::new(x, y, z)
    }

    fn circle() -> CurveShape {
        CurveShape {
            radius: 0.2,
            normal: ShapeAxis::Y,
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut scene = MemoryScene::new();
        scene.create_group("grp").unwrap();
        assert_eq!(
            scene.create_group("grp"),
            Err(SceneError::NameCollision("grp".into()))
        );
        let other = scene.create_group("other").unwrap();
        assert!(scene.rename(other, "grp").is_err());
        scene.rename(other, "renamed").unwrap();
        assert_eq!(scene.find("renamed"), Some(other));
    }

    #[test]
    fn test_reparent_keeps_world_and_channels() {
        let mut scene = MemoryScene::new();
        let parent = scene.create_joint("a_jnt", v(0.0, 10.0, 0.0), 1.0).unwrap();
        let child = scene.create_joint("b_jnt", v(1.0, 8.0, 0.0), 1.0).unwrap();
        scene.reparent(child, Some(parent)).unwrap();

        let world = scene.world_transform(child).unwrap();
        assert!(world.position.abs_diff_eq(v(1.0, 8.0, 0.0), 1e-9));
        assert_eq!(scene.node(child).unwrap().channels.translate, v(1.0, 8.0, 0.0));
        assert_eq!(scene.node(parent).unwrap().children, vec![child]);

        scene
            .set_world_transform(parent, Pose::from_translation(v(0.0, 12.0, 0.0)))
            .unwrap();
        let moved = scene.world_transform(child).unwrap();
        assert!(moved.position.abs_diff_eq(v(1.0, 10.0, 0.0), 1e-9));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut scene = MemoryScene::new();
        let a = scene.create_group("a").unwrap();
        let b = scene.create_group("b").unwrap();
        scene.reparent(b, Some(a)).unwrap();
        assert!(matches!(
            scene.reparent(a, Some(b)),
            Err(SceneError::HierarchyCycle { .. })
        ));
    }

    #[test]
    fn test_orient_joint_keeps_children_in_place() {
        let mut scene = MemoryScene::new();
        let a = scene.create_joint("a_jnt", v(0.0, 0.0, 0.0), 1.0).unwrap();
        let b = scene.create_joint("b_jnt", v(0.0, 5.0, 0.0), 1.0).unwrap();
        scene.reparent(b, Some(a)).unwrap();

        let turn = DQuat::from_rotation_z(FRAC_PI_2);
        scene.orient_joint(a, turn).unwrap();
        assert!(scene.world_transform(a).unwrap().orientation.abs_diff_eq(turn, 1e-9));
        assert!(scene
            .world_transform(b)
            .unwrap()
            .position
            .abs_diff_eq(v(0.0, 5.0, 0.0), 1e-9));

        scene.freeze_joint(a).unwrap();
        let node = scene.node(a).unwrap();
        assert_eq!(node.channels.rotate, DQuat::IDENTITY);
        assert!(node.joint_orient.abs_diff_eq(turn, 1e-9));
    }

    #[test]
    fn test_freeze_keeps_world() {
        let mut scene = MemoryScene::new();
        let ctrl = scene.create_curve("a_ctrl", circle()).unwrap();
        let pose = Pose::new(v(1.0, 2.0, 3.0), DQuat::from_rotation_y(0.4));
        scene.set_world_transform(ctrl, pose).unwrap();

        scene.freeze_translate(ctrl).unwrap();
        assert!(scene.node(ctrl).unwrap().channels.translate_is_zero());
        assert!(scene.world_transform(ctrl).unwrap().approx_eq(&pose));

        scene.freeze_transform(ctrl).unwrap();
        assert_eq!(scene.node(ctrl).unwrap().channels, Channels::IDENTITY);
        assert!(scene.world_transform(ctrl).unwrap().approx_eq(&pose));
    }

    #[test]
    fn test_parent_constraint_is_live_and_one_way() {
        let mut scene = MemoryScene::new();
        let ctrl = scene.create_curve("a_ctrl", circle()).unwrap();
        let joint = scene.create_joint("a_jnt", v(0.0, 3.0, 0.0), 1.0).unwrap();
        scene
            .set_world_transform(ctrl, Pose::from_translation(v(0.0, 3.0, 0.0)))
            .unwrap();

        let id = scene.constrain(ConstraintKind::Parent, ctrl, joint).unwrap();
        assert_eq!(scene.constrain(ConstraintKind::Parent, ctrl, joint).unwrap(), id);

        scene
            .set_world_transform(ctrl, Pose::from_translation(v(2.0, 3.0, 0.0)))
            .unwrap();
        assert!(scene
            .world_transform(joint)
            .unwrap()
            .position
            .abs_diff_eq(v(2.0, 3.0, 0.0), 1e-9));

        // Moving the driven node does not move the driver.
        scene
            .set_world_transform(joint, Pose::from_translation(v(9.0, 9.0, 9.0)))
            .unwrap();
        assert!(scene
            .world_transform(ctrl)
            .unwrap()
            .position
            .abs_diff_eq(v(2.0, 3.0, 0.0), 1e-9));

        let other = scene.create_curve("b_ctrl", circle()).unwrap();
        assert!(matches!(
            scene.constrain(ConstraintKind::Parent, other, joint),
            Err(SceneError::AlreadyConstrained { .. })
        ));
    }

    #[test]
    fn test_bake_history_drops_deleted_constraints() {
        let mut scene = MemoryScene::new();
        let joint = scene.create_joint("a_jnt", v(0.0, 0.0, 0.0), 1.0).unwrap();
        let ctrl = scene.create_curve("a_ctrl", circle()).unwrap();
        let orient = scene.constrain(ConstraintKind::Orient, joint, ctrl).unwrap();
        scene.delete_constraint(orient).unwrap();
        assert_eq!(scene.node(ctrl).unwrap().history.len(), 1);
        scene.bake_history(ctrl).unwrap();
        assert!(scene.node(ctrl).unwrap().history.is_empty());
        assert_eq!(
            scene.delete_constraint(orient),
            Err(SceneError::UnknownConstraint(orient))
        );
    }

    #[test]
    fn test_skin_binding_is_unique() {
        let mut scene = MemoryScene::new();
        let mesh = scene.create_mesh("Char_Head", v(0.0, 16.0, 0.0)).unwrap();
        let joint = scene.create_joint("Char_Head_jnt", v(0.0, 16.0, 0.0), 1.0).unwrap();
        let params = BindParams::default();

        assert!(scene.skin_binding(mesh).unwrap().is_none());
        scene.bind_skin(mesh, &[joint], &params).unwrap();
        assert_eq!(scene.skin_binding(mesh).unwrap().unwrap().influences, vec![joint]);
        assert!(matches!(
            scene.bind_skin(mesh, &[joint], &params),
            Err(SceneError::AlreadyBound(_))
        ));
        assert!(matches!(
            scene.bind_skin(joint, &[joint], &params),
            Err(SceneError::NotAMesh(_))
        ));
    }

    #[test]
    fn test_delete_removes_subtree_and_dependencies() {
        let mut scene = MemoryScene::new();
        let grp = scene.create_group("grp").unwrap();
        let ctrl = scene.create_curve("a_ctrl", circle()).unwrap();
        let joint = scene.create_joint("a_jnt", v(0.0, 0.0, 0.0), 1.0).unwrap();
        scene.reparent(ctrl, Some(grp)).unwrap();
        scene.constrain(ConstraintKind::Parent, ctrl, joint).unwrap();

        scene.delete_node(grp).unwrap();
        assert_eq!(scene.find("a_ctrl"), None);
        assert!(scene.constraints_on(joint).is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_revert_restores_exact_state() {
        let parts = [MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0])];
        let mut scene = MemoryScene::from_parts(&parts).unwrap();
        let before = scene.to_json_pretty().unwrap();

        scene.open_undo_chunk();
        let joint = scene.create_joint("Char_Pelvis_jnt", v(0.0, 10.0, 0.0), 3.0).unwrap();
        scene.orient_joint(joint, DQuat::from_rotation_x(1.0)).unwrap();
        scene.revert_undo_chunk().unwrap();

        assert_eq!(scene.to_json_pretty().unwrap(), before);
        assert_eq!(scene.undo_depth(), 0);
        assert_eq!(scene.close_undo_chunk(), Err(SceneError::NoUndoChunk));
    }

    #[test]
    fn test_json_round_trip_restores_counters() {
        let parts = [
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Head", [0.0, 16.0, 0.0]),
        ];
        let scene = MemoryScene::from_parts(&parts).unwrap();
        let json = scene.to_json_pretty().unwrap();
        let mut restored = MemoryScene::from_json(&json).unwrap();
        assert_eq!(restored, scene);
        assert_eq!(restored.selection().len(), 2);
        let id = restored.create_group("grp").unwrap();
        assert_eq!(id, NodeId(2));
    }

    #[test]
    fn test_find_nodes_by_pattern() {
        let parts = [
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Head", [0.0, 16.0, 0.0]),
        ];
        let mut scene = MemoryScene::from_parts(&parts).unwrap();
        scene.create_joint("Char_Head_jnt", v(0.0, 16.0, 0.0), 1.0).unwrap();
        let pattern = NamePattern::new("*_Head*").unwrap();
        assert_eq!(scene.find_nodes(&pattern, None).len(), 2);
        assert_eq!(scene.find_nodes(&pattern, Some(NodeKind::Joint)).len(), 1);
        assert_eq!(scene.nodes_of_kind(NodeKind::Mesh).len(), 2);
    }

    fn linked(a: NodeId, b: NodeId) -> SceneData {
        let mut data = SceneData::from(MemoryScene::from_parts(&[
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Head", [0.0, 16.0, 0.0]),
        ])
        .unwrap());
        data.nodes[a.0 as usize].parent = Some(b);
        data.nodes[b.0 as usize].children.push(a);
        data
    }

    #[test]
    fn test_load_rejects_parent_cycle() {
        let mut data = linked(NodeId(0), NodeId(1));
        data.nodes[1].parent = Some(NodeId(0));
        data.nodes[0].children.push(NodeId(1));
        let err = MemoryScene::try_from(data.clone()).unwrap_err();
        assert!(matches!(err, SceneError::HierarchyCycle { .. }));

        let json = serde_json::to_string(&data).unwrap();
        let err = MemoryScene::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("cannot parent"));
    }

    #[test]
    fn test_load_rejects_dangling_parent() {
        let mut data = linked(NodeId(0), NodeId(1));
        data.nodes[0].parent = Some(NodeId(7));
        assert_eq!(
            MemoryScene::try_from(data),
            Err(SceneError::DanglingParent {
                child: "Char_Pelvis".into(),
                parent: NodeId(7),
            })
        );
    }

    #[test]
    fn test_load_rejects_duplicate_ids_and_names() {
        let mut data = linked(NodeId(0), NodeId(1));
        data.nodes[1].id = NodeId(0);
        assert_eq!(
            MemoryScene::try_from(data),
            Err(SceneError::DuplicateId(NodeId(0)))
        );

        let mut data = linked(NodeId(0), NodeId(1));
        data.nodes[1].name = "Char_Pelvis".into();
        assert_eq!(
            MemoryScene::try_from(data),
            Err(SceneError::NameCollision("Char_Pelvis".into()))
        );
    }

    #[test]
    fn test_load_rejects_one_sided_links() {
        let mut data = linked(NodeId(0), NodeId(1));
        data.nodes[1].children.clear();
        assert!(matches!(
            MemoryScene::try_from(data),
            Err(SceneError::MismatchedChildren { .. })
        ));
    }

    #[test]
    fn test_load_accepts_well_formed_hierarchy() {
        let data = linked(NodeId(0), NodeId(1));
        let scene = MemoryScene::try_from(data).unwrap();
        let world = scene.world_transform(NodeId(0)).unwrap();
        assert!(world.position.is_finite());
        assert_eq!(scene.roots(), vec![NodeId(1)]);
    }
}
