//! Canonical biped topology table.
//!
//! The joint hierarchy is declared once (see [`BodyRegion::parent`]) and
//! stored as an arena of slots with parent indices. The control, offset and
//! skin views are derived from that arena, so all four hierarchies always
//! agree with each other.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::region::BodyRegion;

/// A node of the biped graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "slot", content = "region", rename_all = "snake_case")]
pub enum Slot {
    /// The designated root of a view (`root_jnt` for joints and drive
    /// relationships, `offset_ctrl` as offset parent).
    Root,
    /// A region backed by exactly one joint.
    Region(BodyRegion),
    /// Heel/ankle joint synthesized from a foot part.
    FootBase(BodyRegion),
    /// Toe joint synthesized from a foot part.
    FootToe(BodyRegion),
}

impl Slot {
    /// Returns the body region this slot was derived from.
    pub fn region(&self) -> Option<BodyRegion> {
        match self {
            Slot::Root => None,
            Slot::Region(r) | Slot::FootBase(r) | Slot::FootToe(r) => Some(*r),
        }
    }

    /// Returns the suffix appended to the part name before the joint suffix
    /// (`"_Base"`, `"_Toe"` or nothing).
    pub fn part_suffix(&self) -> &'static str {
        match self {
            Slot::FootBase(_) => "_Base",
            Slot::FootToe(_) => "_Toe",
            _ => "",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Root => f.write_str("root"),
            Slot::Region(r) => write!(f, "{}", r),
            Slot::FootBase(r) => write!(f, "{}_Base", r),
            Slot::FootToe(r) => write!(f, "{}_Toe", r),
        }
    }
}

/// The four parallel hierarchies instantiated from the biped graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Joint parenting. Child and parent are joint slots.
    Joint,
    /// Drive relationships. Child is the driven joint, parent the driving
    /// control of the same slot; `Root -> Root` is `offset_ctrl -> root_jnt`.
    Control,
    /// Offset-group parenting. Child is the slot's offset group, parent the
    /// control it hangs under (`Root` is `offset_ctrl`).
    Offset,
    /// Skin bindings. Child is the mesh region, parent the deforming joint.
    Skin,
}

impl TopologyKind {
    /// Every kind, in pipeline order.
    pub const ALL: [TopologyKind; 4] = [
        TopologyKind::Joint,
        TopologyKind::Control,
        TopologyKind::Offset,
        TopologyKind::Skin,
    ];

    /// Returns the string identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyKind::Joint => "joint",
            TopologyKind::Control => "control",
            TopologyKind::Offset => "offset",
            TopologyKind::Skin => "skin",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parent/child relationship in one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub kind: TopologyKind,
    pub child: Slot,
    pub parent: Slot,
}

impl fmt::Display for TopologyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} -> {}", self.kind, self.child, self.parent)
    }
}

/// Supported topology complexity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyPreset {
    /// 16 regions, single foot joints, every joint but the root controlled.
    BipedBasicV1,
    /// 22 regions with fingers; feet split into Base and Toe joints; root,
    /// upper torso and foot joints carry no direct control.
    #[default]
    BipedExtendedV1,
}

impl TopologyPreset {
    /// Returns the region vocabulary of this preset.
    pub fn regions(&self) -> &'static [BodyRegion] {
        match self {
            TopologyPreset::BipedBasicV1 => &BodyRegion::BASIC,
            TopologyPreset::BipedExtendedV1 => &BodyRegion::ALL,
        }
    }

    /// Whether foot parts expand into Base and Toe joints.
    pub fn splits_feet(&self) -> bool {
        matches!(self, TopologyPreset::BipedExtendedV1)
    }

    /// Whether the joint in `slot` receives its own control.
    pub fn has_control(&self, slot: Slot) -> bool {
        match (self, slot) {
            (_, Slot::Root) => false,
            (TopologyPreset::BipedBasicV1, _) => true,
            (TopologyPreset::BipedExtendedV1, Slot::Region(BodyRegion::UpperTorso)) => false,
            (TopologyPreset::BipedExtendedV1, Slot::FootBase(_) | Slot::FootToe(_)) => false,
            (TopologyPreset::BipedExtendedV1, Slot::Region(_)) => true,
        }
    }

    /// Returns the joint slots a region expands into.
    pub fn joint_slots(&self, region: BodyRegion) -> Vec<Slot> {
        if region.is_foot() && self.splits_feet() {
            vec![Slot::FootBase(region), Slot::FootToe(region)]
        } else {
            vec![Slot::Region(region)]
        }
    }

    /// Returns the string identifier for this preset.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyPreset::BipedBasicV1 => "biped_basic_v1",
            TopologyPreset::BipedExtendedV1 => "biped_extended_v1",
        }
    }
}

/// Errors raised when a topology violates the forest invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A slot appears as a child more than once in one view.
    #[error("{kind} view lists {slot} as a child more than once")]
    DuplicateChild { kind: TopologyKind, slot: Slot },
    /// A parent slot is not part of the joint graph.
    #[error("{kind} view references unknown slot {slot}")]
    UnknownSlot { kind: TopologyKind, slot: Slot },
    /// Following parents from a slot never reaches the root.
    #[error("{kind} view has a cycle through {slot}")]
    Cycle { kind: TopologyKind, slot: Slot },
    /// An offset group hangs under a slot that has no control.
    #[error("offset view parents {child} under uncontrolled slot {parent}")]
    UncontrolledParent { child: Slot, parent: Slot },
}

/// One slot of the joint arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyNode {
    pub slot: Slot,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// The biped graph as an arena with parent indices.
#[derive(Debug, Clone)]
pub struct Topology {
    preset: TopologyPreset,
    nodes: Vec<TopologyNode>,
    index: HashMap<Slot, usize>,
}

impl Topology {
    /// Builds the arena for a preset. Node 0 is always [`Slot::Root`].
    pub fn from_preset(preset: TopologyPreset) -> Self {
        let mut topology = Self {
            preset,
            nodes: vec![TopologyNode {
                slot: Slot::Root,
                parent: None,
                children: Vec::new(),
            }],
            index: HashMap::from([(Slot::Root, 0)]),
        };

        for &region in preset.regions() {
            let parent_slot = match region.parent() {
                None => Slot::Root,
                Some(parent) => topology.attach_slot(parent),
            };
            let parent = topology.index[&parent_slot];
            let mut previous = parent;
            for slot in preset.joint_slots(region) {
                previous = topology.push(slot, previous);
            }
        }
        topology
    }

    /// The extended biped (fingers, split feet).
    pub fn biped() -> Self {
        Self::from_preset(TopologyPreset::BipedExtendedV1)
    }

    fn attach_slot(&self, region: BodyRegion) -> Slot {
        // Children of a split foot hang under its last joint.
        *self
            .preset
            .joint_slots(region)
            .last()
            .unwrap_or(&Slot::Region(region))
    }

    fn push(&mut self, slot: Slot, parent: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TopologyNode {
            slot,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        self.index.insert(slot, id);
        id
    }

    /// Returns the preset this topology was built from.
    pub fn preset(&self) -> TopologyPreset {
        self.preset
    }

    /// Returns the arena nodes (node 0 is the root).
    pub fn nodes(&self) -> &[TopologyNode] {
        &self.nodes
    }

    /// Returns every non-root joint slot in declaration order.
    pub fn joint_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.nodes.iter().skip(1).map(|n| n.slot)
    }

    /// Returns true if the slot belongs to this topology.
    pub fn contains(&self, slot: Slot) -> bool {
        self.index.contains_key(&slot)
    }

    /// Returns the joint-hierarchy parent of a slot.
    pub fn parent_of(&self, slot: Slot) -> Option<Slot> {
        let id = *self.index.get(&slot)?;
        self.nodes[id].parent.map(|p| self.nodes[p].slot)
    }

    /// Returns the joint-hierarchy children of a slot, in declaration order.
    pub fn children_of(&self, slot: Slot) -> Vec<Slot> {
        self.index
            .get(&slot)
            .map(|&id| {
                self.nodes[id]
                    .children
                    .iter()
                    .map(|&c| self.nodes[c].slot)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `slot` and all of its descendants in depth-first pre-order.
    pub fn subtree(&self, slot: Slot) -> Vec<Slot> {
        let Some(&start) = self.index.get(&slot) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(self.nodes[id].slot);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }

    /// Returns the slot of the closest controlled ancestor, or `Root`.
    pub fn controlling_ancestor(&self, slot: Slot) -> Slot {
        let mut current = self.parent_of(slot);
        while let Some(candidate) = current {
            if self.preset.has_control(candidate) {
                return candidate;
            }
            current = self.parent_of(candidate);
        }
        Slot::Root
    }

    /// Returns the joint slots that deform the mesh of `region`.
    pub fn skin_influences(&self, region: BodyRegion) -> Vec<Slot> {
        self.preset
            .joint_slots(region)
            .into_iter()
            .filter(|s| self.contains(*s))
            .collect()
    }

    /// Returns the edges of one view, in declaration order.
    pub fn edges(&self, kind: TopologyKind) -> Vec<TopologyEdge> {
        let edge = |child, parent| TopologyEdge {
            kind,
            child,
            parent,
        };
        match kind {
            TopologyKind::Joint => self
                .nodes
                .iter()
                .skip(1)
                .filter_map(|n| n.parent.map(|p| edge(n.slot, self.nodes[p].slot)))
                .collect(),
            TopologyKind::Control => std::iter::once(edge(Slot::Root, Slot::Root))
                .chain(
                    self.joint_slots()
                        .filter(|s| self.preset.has_control(*s))
                        .map(|s| edge(s, s)),
                )
                .collect(),
            TopologyKind::Offset => self
                .joint_slots()
                .filter(|s| self.preset.has_control(*s))
                .map(|s| edge(s, self.controlling_ancestor(s)))
                .collect(),
            TopologyKind::Skin => self
                .preset
                .regions()
                .iter()
                .filter_map(|&r| {
                    self.skin_influences(r)
                        .first()
                        .map(|&joint| edge(Slot::Region(r), joint))
                })
                .collect(),
        }
    }

    /// Checks the forest invariants of every view.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for kind in TopologyKind::ALL {
            let edges = self.edges(kind);
            let mut seen = HashSet::new();
            for e in &edges {
                if !seen.insert(e.child) {
                    return Err(TopologyError::DuplicateChild {
                        kind,
                        slot: e.child,
                    });
                }
                if !self.contains(e.parent) {
                    return Err(TopologyError::UnknownSlot {
                        kind,
                        slot: e.parent,
                    });
                }
                if kind == TopologyKind::Offset
                    && e.parent != Slot::Root
                    && !self.preset.has_control(e.parent)
                {
                    return Err(TopologyError::UncontrolledParent {
                        child: e.child,
                        parent: e.parent,
                    });
                }
            }
            if kind == TopologyKind::Joint {
                self.check_acyclic(&edges)?;
            }
        }
        Ok(())
    }

    fn check_acyclic(&self, edges: &[TopologyEdge]) -> Result<(), TopologyError> {
        let parents: HashMap<Slot, Slot> = edges.iter().map(|e| (e.child, e.parent)).collect();
        for e in edges {
            let mut current = e.child;
            let mut steps = 0;
            while current != Slot::Root {
                current = match parents.get(&current) {
                    Some(p) => *p,
                    None => break,
                };
                steps += 1;
                if steps > edges.len() {
                    return Err(TopologyError::Cycle {
                        kind: e.kind,
                        slot: e.child,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::biped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets_validate() {
        for preset in [TopologyPreset::BipedBasicV1, TopologyPreset::BipedExtendedV1] {
            Topology::from_preset(preset).validate().unwrap();
        }
    }

    #[test]
    fn test_basic_joint_edges_match_canonical_table() {
        let topology = Topology::from_preset(TopologyPreset::BipedBasicV1);
        let edges: Vec<String> = topology
            .edges(TopologyKind::Joint)
            .iter()
            .map(|e| format!("{} -> {}", e.child, e.parent))
            .collect();
        assert_eq!(
            edges,
            vec![
                "Pelvis -> root",
                "Midsection -> Pelvis",
                "UpperTorso -> Midsection",
                "Head -> UpperTorso",
                "Thigh_Left -> Pelvis",
                "Calf_Left -> Thigh_Left",
                "Foot_Left -> Calf_Left",
                "Thigh_Right -> Pelvis",
                "Calf_Right -> Thigh_Right",
                "Foot_Right -> Calf_Right",
                "Shoulder_Left -> UpperTorso",
                "Forearm_Left -> Shoulder_Left",
                "Hand_Left -> Forearm_Left",
                "Shoulder_Right -> UpperTorso",
                "Forearm_Right -> Shoulder_Right",
                "Hand_Right -> Forearm_Right",
            ]
        );
    }

    #[test]
    fn test_extended_splits_feet() {
        let topology = Topology::biped();
        let foot = BodyRegion::FootLeft;
        assert!(!topology.contains(Slot::Region(foot)));
        assert_eq!(
            topology.parent_of(Slot::FootBase(foot)),
            Some(Slot::Region(BodyRegion::CalfLeft))
        );
        assert_eq!(
            topology.parent_of(Slot::FootToe(foot)),
            Some(Slot::FootBase(foot))
        );
        assert_eq!(
            topology.skin_influences(foot),
            vec![Slot::FootBase(foot), Slot::FootToe(foot)]
        );
    }

    #[test]
    fn test_extended_joint_count() {
        // 22 regions, two feet expand to two joints each.
        assert_eq!(Topology::biped().joint_slots().count(), 24);
        assert_eq!(
            Topology::from_preset(TopologyPreset::BipedBasicV1)
                .joint_slots()
                .count(),
            16
        );
    }

    #[test]
    fn test_offset_view_skips_uncontrolled_slots() {
        let topology = Topology::biped();
        let offsets = topology.edges(TopologyKind::Offset);
        let parent_of = |slot| {
            offsets
                .iter()
                .find(|e| e.child == slot)
                .map(|e| e.parent)
        };
        assert_eq!(parent_of(Slot::Region(BodyRegion::Pelvis)), Some(Slot::Root));
        // Upper torso has no control; head and shoulders hang under midsection.
        assert_eq!(
            parent_of(Slot::Region(BodyRegion::Head)),
            Some(Slot::Region(BodyRegion::Midsection))
        );
        assert_eq!(
            parent_of(Slot::Region(BodyRegion::ShoulderRight)),
            Some(Slot::Region(BodyRegion::Midsection))
        );
        assert_eq!(parent_of(Slot::Region(BodyRegion::UpperTorso)), None);
        assert_eq!(parent_of(Slot::FootBase(BodyRegion::FootLeft)), None);
    }

    #[test]
    fn test_basic_offset_view_mirrors_joint_view() {
        let topology = Topology::from_preset(TopologyPreset::BipedBasicV1);
        let joints = topology.edges(TopologyKind::Joint);
        let offsets = topology.edges(TopologyKind::Offset);
        assert_eq!(joints.len(), offsets.len());
        for (j, o) in joints.iter().zip(&offsets) {
            assert_eq!(j.child, o.child);
            assert_eq!(j.parent, o.parent);
        }
    }

    #[test]
    fn test_control_view_drives_root_from_offset_control() {
        let edges = Topology::biped().edges(TopologyKind::Control);
        assert_eq!(edges[0].child, Slot::Root);
        assert_eq!(edges[0].parent, Slot::Root);
        assert!(edges.iter().skip(1).all(|e| e.child == e.parent));
        assert!(!edges
            .iter()
            .any(|e| e.child == Slot::Region(BodyRegion::UpperTorso)));
    }

    #[test]
    fn test_skin_view_covers_every_region_once() {
        let topology = Topology::biped();
        let edges = topology.edges(TopologyKind::Skin);
        assert_eq!(edges.len(), BodyRegion::ALL.len());
        let foot = edges
            .iter()
            .find(|e| e.child == Slot::Region(BodyRegion::FootRight))
            .unwrap();
        assert_eq!(foot.parent, Slot::FootBase(BodyRegion::FootRight));
    }

    #[test]
    fn test_subtree_is_preorder() {
        let topology = Topology::biped();
        let arm = topology.subtree(Slot::Region(BodyRegion::ShoulderLeft));
        assert_eq!(
            arm,
            vec![
                Slot::Region(BodyRegion::ShoulderLeft),
                Slot::Region(BodyRegion::ForearmLeft),
                Slot::Region(BodyRegion::HandLeft),
                Slot::Region(BodyRegion::Finger01Left),
                Slot::Region(BodyRegion::Finger02Left),
                Slot::Region(BodyRegion::ThumbLeft),
            ]
        );
    }

    #[test]
    fn test_slot_serde() {
        let json = serde_json::to_string(&Slot::FootToe(BodyRegion::FootLeft)).unwrap();
        assert_eq!(json, r#"{"slot":"foot_toe","region":"Foot_Left"}"#);
        let root: Slot = serde_json::from_str(r#"{"slot":"root"}"#).unwrap();
        assert_eq!(root, Slot::Root);
    }
}
