//! Error types for scene operations and rig assembly.

use std::fmt;

use autorig_spec::{BodyRegion, SpecError, StageError, TopologyError, ROOT_JOINT};
use thiserror::Error;

use crate::scene::{ConstraintId, NodeId};

/// Result type for scene graph operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Result type for pipeline stages.
pub type RigResult<T> = Result<T, RigError>;

/// Errors raised by a scene graph implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// The handle does not refer to a live node.
    #[error("no node with id {0}")]
    UnknownNode(NodeId),

    /// Node names are unique within a scene.
    #[error("a node named '{0}' already exists")]
    NameCollision(String),

    /// Reparenting would make a node its own ancestor.
    #[error("cannot parent '{child}' under its descendant '{parent}'")]
    HierarchyCycle { child: String, parent: String },

    /// The handle does not refer to a live constraint.
    #[error("no constraint with id {0}")]
    UnknownConstraint(ConstraintId),

    /// A node can only be driven by one parent constraint.
    #[error("'{driven}' is already driven by '{existing}'")]
    AlreadyConstrained { driven: String, existing: String },

    /// Skin bindings can only be created on mesh nodes.
    #[error("'{0}' is not a mesh")]
    NotAMesh(String),

    /// Skin bindings need at least one joint influence.
    #[error("'{0}' cannot be bound without joint influences")]
    NoInfluences(String),

    /// The mesh already carries a skin binding.
    #[error("'{0}' already has a skin binding")]
    AlreadyBound(String),

    /// Undo chunk operations without a matching open.
    #[error("no open undo chunk")]
    NoUndoChunk,

    /// Two nodes of a loaded scene share one id.
    #[error("node id {0} is used more than once")]
    DuplicateId(NodeId),

    /// A loaded node names a parent that is not in the scene.
    #[error("'{child}' has parent {parent}, which does not exist")]
    DanglingParent { child: String, parent: NodeId },

    /// A loaded node's children list disagrees with the parent links.
    #[error("'{parent}' and '{child}' disagree about their parent link")]
    MismatchedChildren { parent: String, child: String },
}

/// Pipeline stage, used to tag errors and timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Naming,
    Skeleton,
    Controls,
    Offsets,
    Skin,
    Pipeline,
}

impl Stage {
    /// Returns the string identifier for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Naming => "naming",
            Stage::Skeleton => "skeleton",
            Stage::Controls => "controls",
            Stage::Offsets => "offsets",
            Stage::Skin => "skin",
            Stage::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors of a rig assembly run.
#[derive(Debug, Error)]
pub enum RigError {
    /// The selection holds no mesh parts.
    #[error("No mesh selected.")]
    NoSelection,

    /// Joints already exist; their identities would collide with new ones.
    #[error("Already pre-existing joints in the scene ({}). Please remove these joints.", .names.join(", "))]
    PreExistingJoints { names: Vec<String> },

    /// Controllers need the synthetic root joint.
    #[error("No existing {} in scene.", ROOT_JOINT)]
    NoRoot,

    /// A part name carries several region tokens.
    #[error("Part '{part}' matches several body regions ({}); rename it so exactly one applies.", .regions.iter().map(|r| r.name()).collect::<Vec<_>>().join(", "))]
    AmbiguousName {
        part: String,
        regions: Vec<BodyRegion>,
    },

    /// Two parts claim the same region.
    #[error("Region {region} is claimed by several parts ({}).", .parts.join(", "))]
    DuplicateRegion {
        region: BodyRegion,
        parts: Vec<String>,
    },

    /// Locators are only inserted above controls.
    #[error("'{name}' is not a control.")]
    NotAControl { name: String },

    /// Configuration or topology is invalid.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// A scene operation failed inside a stage.
    #[error("{stage} stage: {source}")]
    Scene {
        stage: Stage,
        #[source]
        source: SceneError,
    },
}

impl RigError {
    /// Wraps a scene error raised while running `stage`.
    pub fn scene(stage: Stage, source: SceneError) -> Self {
        Self::Scene { stage, source }
    }

    /// Returns the stage that raised the error.
    pub fn stage(&self) -> Stage {
        match self {
            RigError::NoSelection | RigError::PreExistingJoints { .. } => Stage::Skeleton,
            RigError::NoRoot => Stage::Controls,
            RigError::NotAControl { .. } => Stage::Offsets,
            RigError::AmbiguousName { .. } | RigError::DuplicateRegion { .. } => Stage::Naming,
            RigError::Spec(_) => Stage::Pipeline,
            RigError::Scene { stage, .. } => *stage,
        }
    }
}

impl From<TopologyError> for RigError {
    fn from(err: TopologyError) -> Self {
        RigError::Spec(SpecError::Topology(err))
    }
}

impl StageError for RigError {
    fn code(&self) -> &'static str {
        match self {
            RigError::NoSelection => "RIG_001",
            RigError::PreExistingJoints { .. } => "RIG_002",
            RigError::NoRoot => "RIG_003",
            RigError::AmbiguousName { .. } => "RIG_004",
            RigError::DuplicateRegion { .. } => "RIG_005",
            RigError::Spec(_) => "RIG_006",
            RigError::Scene { .. } => "RIG_007",
            RigError::NotAControl { .. } => "RIG_008",
        }
    }

    fn category(&self) -> &'static str {
        self.stage().as_str()
    }
}

/// Tags scene results with the stage they happened in.
pub(crate) trait InStage<T> {
    fn in_stage(self, stage: Stage) -> RigResult<T>;
}

impl<T> InStage<T> for SceneResult<T> {
    fn in_stage(self, stage: Stage) -> RigResult<T> {
        self.map_err(|e| RigError::scene(stage, e))
    }
}
