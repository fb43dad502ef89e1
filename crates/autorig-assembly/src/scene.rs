//! Scene graph seam.
//!
//! The assembly stages only touch the host scene through [`SceneGraph`].
//! Nodes are addressed by [`NodeId`] handles; names are labels used at the
//! boundary (pre-existing joint detection, stale controller cleanup and
//! rediscovery of an earlier rig).
//!
//! Transforms are stored relative to the parent as
//! `rest * translate * joint_orient * rotate`, so moving a node carries its
//! descendants along and reparenting never changes animator-visible channels.

use std::fmt;
use std::ops::Mul;

use autorig_spec::{BindParams, NamePattern, ShapeAxis};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;

/// Tolerance used when comparing positions and orientations.
pub const EPSILON: f64 = 1e-9;

/// Handle to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintId(pub u32);

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Kind of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Mesh,
    Joint,
    Control,
    Group,
    Locator,
}

impl NodeKind {
    /// Returns the string identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Mesh => "mesh",
            NodeKind::Joint => "joint",
            NodeKind::Control => "control",
            NodeKind::Group => "group",
            NodeKind::Locator => "locator",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rigid transform (position and orientation, no scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    /// Creates a pose from a position and an orientation.
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// A pure translation.
    pub fn from_translation(position: DVec3) -> Self {
        Self::new(position, DQuat::IDENTITY)
    }

    /// A pure rotation.
    pub fn from_rotation(orientation: DQuat) -> Self {
        Self::new(DVec3::ZERO, orientation)
    }

    /// Returns the inverse transform.
    pub fn inverse(&self) -> Self {
        let orientation = self.orientation.inverse();
        Self {
            position: -(orientation * self.position),
            orientation,
        }
    }

    /// Transforms a point from local into this pose's parent space.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.position + self.orientation * point
    }

    /// Returns true if both poses agree within [`EPSILON`] (rotations compared
    /// up to quaternion sign).
    pub fn approx_eq(&self, other: &Pose) -> bool {
        self.position.abs_diff_eq(other.position, EPSILON * 1e3)
            && self.orientation.dot(other.orientation).abs() > 1.0 - EPSILON * 1e3
    }

    fn normalized(mut self) -> Self {
        self.orientation = self.orientation.normalize();
        self
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            position: self.transform_point(rhs.position),
            orientation: self.orientation * rhs.orientation,
        }
        .normalized()
    }
}

/// Animator-visible transform channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channels {
    pub translate: DVec3,
    pub rotate: DQuat,
    pub scale: DVec3,
}

impl Channels {
    pub const IDENTITY: Channels = Channels {
        translate: DVec3::ZERO,
        rotate: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Returns true if translate is zero within tolerance.
    pub fn translate_is_zero(&self) -> bool {
        self.translate.abs_diff_eq(DVec3::ZERO, EPSILON * 1e3)
    }

    /// Returns true if scale is one within tolerance.
    pub fn scale_is_unit(&self) -> bool {
        self.scale.abs_diff_eq(DVec3::ONE, EPSILON)
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Locked transform channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLocks {
    #[serde(default)]
    pub translate: bool,
    #[serde(default)]
    pub rotate: bool,
    #[serde(default)]
    pub scale: bool,
}

impl ChannelLocks {
    pub const TRANSLATE: ChannelLocks = ChannelLocks {
        translate: true,
        rotate: false,
        scale: false,
    };

    pub const SCALE: ChannelLocks = ChannelLocks {
        translate: false,
        rotate: false,
        scale: true,
    };

    /// Combines two lock sets.
    pub fn union(self, other: ChannelLocks) -> ChannelLocks {
        ChannelLocks {
            translate: self.translate || other.translate,
            rotate: self.rotate || other.rotate,
            scale: self.scale || other.scale,
        }
    }
}

/// Min/max limits on transform channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f64; 2]>,
}

/// Circle curve drawn for a control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveShape {
    pub radius: f64,
    pub normal: ShapeAxis,
}

/// One-way constraint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Driven follows the driver's position and orientation.
    Parent,
    /// Driven follows the driver's orientation only.
    Orient,
}

/// A live one-way constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub kind: ConstraintKind,
    pub driver: NodeId,
    pub driven: NodeId,
    pub maintain_offset: bool,
}

/// Dependency history attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// The node is driven by a constraint.
    Constraint(ConstraintId),
    /// The node carries a skin binding.
    Skin,
}

/// Association of deforming joints to a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinBinding {
    pub mesh: NodeId,
    pub influences: Vec<NodeId>,
    pub params: BindParams,
}

/// A scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// Children in parenting order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    /// Frozen transform relative to the parent.
    #[serde(default)]
    pub rest: Pose,
    #[serde(default)]
    pub channels: Channels,
    /// Joint orientation; identity for non-joints.
    #[serde(default = "identity_quat")]
    pub joint_orient: DQuat,
    #[serde(default)]
    pub locks: ChannelLocks,
    #[serde(default)]
    pub limits: ChannelLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<CurveShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_color: Option<u8>,
    /// Shape-local scale of a locator; not part of the transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_scale: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

fn identity_quat() -> DQuat {
    DQuat::IDENTITY
}

impl Node {
    /// Creates an unparented node at the origin.
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
            rest: Pose::IDENTITY,
            channels: Channels::IDENTITY,
            joint_orient: DQuat::IDENTITY,
            locks: ChannelLocks::default(),
            limits: ChannelLimits::default(),
            radius: None,
            curve: None,
            display_color: None,
            local_scale: None,
            history: Vec::new(),
        }
    }

    /// Transform relative to the parent.
    pub fn local_pose(&self) -> Pose {
        self.rest
            * Pose::new(
                self.channels.translate,
                self.joint_orient * self.channels.rotate,
            )
    }
}

/// The host scene, as seen by the assembly stages.
pub trait SceneGraph {
    /// Creates a mesh node with its pivot at `pivot`.
    fn create_mesh(&mut self, name: &str, pivot: DVec3) -> SceneResult<NodeId>;

    /// Creates an unparented joint at a world position.
    fn create_joint(&mut self, name: &str, position: DVec3, radius: f64) -> SceneResult<NodeId>;

    /// Creates an unparented circle control at the origin.
    fn create_curve(&mut self, name: &str, shape: CurveShape) -> SceneResult<NodeId>;

    /// Creates an empty unparented transform group at the origin.
    fn create_group(&mut self, name: &str) -> SceneResult<NodeId>;

    /// Creates an unparented locator at the origin with a uniform shape scale.
    fn create_locator(&mut self, name: &str, local_scale: f64) -> SceneResult<NodeId>;

    /// Deletes a node and its descendants, with their constraints and bindings.
    fn delete_node(&mut self, id: NodeId) -> SceneResult<()>;

    /// Renames a node. Names are unique.
    fn rename(&mut self, id: NodeId, name: &str) -> SceneResult<()>;

    /// Returns the node record.
    fn node(&self, id: NodeId) -> SceneResult<&Node>;

    /// Finds a node by exact name.
    fn find(&self, name: &str) -> Option<NodeId>;

    /// Finds nodes whose name matches a wildcard pattern, in id order.
    fn find_nodes(&self, pattern: &NamePattern, kind: Option<NodeKind>) -> Vec<NodeId>;

    /// Returns every node of a kind, in id order.
    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId>;

    /// Returns the current selection.
    fn selection(&self) -> Vec<NodeId>;

    /// Replaces the current selection.
    fn set_selection(&mut self, nodes: &[NodeId]) -> SceneResult<()>;

    /// Returns the world transform of a node.
    fn world_transform(&self, id: NodeId) -> SceneResult<Pose>;

    /// Moves a node (and its descendants) so its world transform is `pose`.
    fn set_world_transform(&mut self, id: NodeId, pose: Pose) -> SceneResult<()>;

    /// Reparents `child` under `parent` (or to the world), keeping its world
    /// transform and channel values.
    fn reparent(&mut self, child: NodeId, parent: Option<NodeId>) -> SceneResult<()>;

    /// Rotates a joint's axes to a world orientation without moving its
    /// children.
    fn orient_joint(&mut self, id: NodeId, orientation: DQuat) -> SceneResult<()>;

    /// Folds the rotate channel of a joint into its joint orient.
    fn freeze_joint(&mut self, id: NodeId) -> SceneResult<()>;

    /// Folds translate and rotate into the rest transform, keeping the world
    /// transform. Scale is reset to one.
    fn freeze_transform(&mut self, id: NodeId) -> SceneResult<()>;

    /// Freezes only the translate channel.
    fn freeze_translate(&mut self, id: NodeId) -> SceneResult<()>;

    /// Sets channel limits.
    fn set_channel_limits(&mut self, id: NodeId, limits: ChannelLimits) -> SceneResult<()>;

    /// Locks channels; already locked channels stay locked.
    fn lock_channels(&mut self, id: NodeId, locks: ChannelLocks) -> SceneResult<()>;

    /// Sets the display override color index.
    fn set_display_color(&mut self, id: NodeId, color: u8) -> SceneResult<()>;

    /// Creates a one-way constraint without offset and snaps the driven node.
    /// Re-asserting an existing pair returns the existing constraint.
    fn constrain(
        &mut self,
        kind: ConstraintKind,
        driver: NodeId,
        driven: NodeId,
    ) -> SceneResult<ConstraintId>;

    /// Deletes a constraint. The driven node keeps its current transform.
    fn delete_constraint(&mut self, id: ConstraintId) -> SceneResult<()>;

    /// Returns the constraints driving a node.
    fn constraints_on(&self, driven: NodeId) -> Vec<Constraint>;

    /// Returns the constraints a node drives.
    fn constraints_from(&self, driver: NodeId) -> Vec<Constraint>;

    /// Drops history entries that no longer refer to a live dependency.
    fn bake_history(&mut self, id: NodeId) -> SceneResult<()>;

    /// Returns the skin binding of a mesh, if any.
    fn skin_binding(&self, mesh: NodeId) -> SceneResult<Option<&SkinBinding>>;

    /// Binds a mesh to joint influences.
    fn bind_skin(
        &mut self,
        mesh: NodeId,
        influences: &[NodeId],
        params: &BindParams,
    ) -> SceneResult<()>;

    /// Opens an undo chunk. Chunks nest.
    fn open_undo_chunk(&mut self);

    /// Closes the innermost chunk, keeping its changes.
    fn close_undo_chunk(&mut self) -> SceneResult<()>;

    /// Reverts every change since the innermost chunk was opened and closes it.
    fn revert_undo_chunk(&mut self) -> SceneResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_pose_inverse_round_trip() {
        let pose = Pose::new(DVec3::new(1.0, 2.0, 3.0), DQuat::from_rotation_y(0.7));
        assert!((pose * pose.inverse()).approx_eq(&Pose::IDENTITY));
        assert!((pose.inverse() * pose).approx_eq(&Pose::IDENTITY));
    }

    #[test]
    fn test_pose_composition_order() {
        let parent = Pose::new(DVec3::new(0.0, 10.0, 0.0), DQuat::from_rotation_z(FRAC_PI_2));
        let child = Pose::from_translation(DVec3::new(1.0, 0.0, 0.0));
        let world = parent * child;
        assert!(world.position.abs_diff_eq(DVec3::new(0.0, 11.0, 0.0), 1e-9));
    }

    #[test]
    fn test_local_pose_includes_joint_orient() {
        let mut node = Node::new(NodeId(0), "a_jnt", NodeKind::Joint);
        node.channels.translate = DVec3::new(0.0, 1.0, 0.0);
        node.joint_orient = DQuat::from_rotation_x(0.3);
        let local = node.local_pose();
        assert!(local.position.abs_diff_eq(DVec3::Y, 1e-12));
        assert!(local.orientation.abs_diff_eq(DQuat::from_rotation_x(0.3), 1e-12));
    }

    #[test]
    fn test_lock_union() {
        let locks = ChannelLocks::SCALE.union(ChannelLocks::TRANSLATE);
        assert!(locks.translate && locks.scale && !locks.rotate);
    }
}
