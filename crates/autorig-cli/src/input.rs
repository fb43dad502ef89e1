//! Scene and configuration loading.
//!
//! A scene file is either a serialized [`MemoryScene`] or a bare parts
//! document (`{"parts": [...]}`), which is turned into a scene with every
//! part selected.

use autorig_assembly::{MemoryScene, NodeId, SceneData, SceneGraph};
use autorig_spec::{PartsDocument, RigConfig, SpecError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file used when `--config` is absent.
pub const CONFIG_ENV: &str = "AUTORIG_CONFIG";

/// Identifies the shape of a scene file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Serialized scene graph.
    Scene,
    /// Parts document.
    Parts,
}

impl SourceKind {
    /// Returns the string representation for reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Scene => "scene",
            SourceKind::Parts => "parts",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A loaded scene with its provenance.
#[derive(Debug)]
pub struct LoadResult {
    pub scene: MemoryScene,
    pub source_kind: SourceKind,
    /// BLAKE3 hash of the file content (hex string).
    pub source_hash: String,
}

/// Errors that can occur while loading inputs.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON parsing failed.
    JsonParse { message: String },
    /// The parts document could not be turned into a scene.
    InvalidScene { message: String },
    /// A `--select` name does not exist in the scene.
    UnknownNode { name: String },
    /// Config file could not be loaded.
    Config { path: PathBuf, source: SpecError },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::JsonParse { message } => write!(f, "JSON parse error: {}", message),
            InputError::InvalidScene { message } => write!(f, "invalid scene: {}", message),
            InputError::UnknownNode { name } => write!(f, "no node named '{}' in scene", name),
            InputError::Config { path, source } => {
                write!(f, "failed to load config '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            InputError::Config { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Loads a scene file, accepting either a scene document or a parts document.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use autorig_cli::input::load_scene;
///
/// let result = load_scene(Path::new("character.json")).unwrap();
/// println!("Loaded {} file", result.source_kind);
/// ```
pub fn load_scene(path: &Path) -> Result<LoadResult, InputError> {
    let content = std::fs::read_to_string(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_scene(&content)
}

/// Parses scene file content. See [`load_scene`].
pub fn parse_scene(content: &str) -> Result<LoadResult, InputError> {
    let source_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| InputError::JsonParse {
            message: e.to_string(),
        })?;

    let is_parts = value
        .as_object()
        .map(|o| o.contains_key("parts"))
        .unwrap_or(false);

    let (scene, source_kind) = if is_parts {
        let doc: PartsDocument =
            serde_json::from_value(value).map_err(|e| InputError::JsonParse {
                message: e.to_string(),
            })?;
        let scene = MemoryScene::from_parts(&doc.parts).map_err(|e| InputError::InvalidScene {
            message: e.to_string(),
        })?;
        (scene, SourceKind::Parts)
    } else {
        let data: SceneData =
            serde_json::from_value(value).map_err(|e| InputError::JsonParse {
                message: e.to_string(),
            })?;
        let scene = MemoryScene::try_from(data).map_err(|e| InputError::InvalidScene {
            message: e.to_string(),
        })?;
        (scene, SourceKind::Scene)
    };

    Ok(LoadResult {
        scene,
        source_kind,
        source_hash,
    })
}

/// Picks the config file: the explicit path first, then the environment value.
pub fn config_path(explicit: Option<&str>, env_value: Option<String>) -> Option<PathBuf> {
    explicit
        .map(PathBuf::from)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

/// Loads the rig config from `--config`, `AUTORIG_CONFIG`, or the defaults.
pub fn load_config(explicit: Option<&str>) -> Result<RigConfig, InputError> {
    match config_path(explicit, std::env::var(CONFIG_ENV).ok()) {
        Some(path) => {
            RigConfig::from_path(&path).map_err(|source| InputError::Config { path, source })
        }
        None => Ok(RigConfig::default()),
    }
}

/// Resolves `--select` names to node handles. An empty list keeps the
/// scene's stored selection.
pub fn resolve_selection(
    scene: &MemoryScene,
    names: &[String],
) -> Result<Vec<NodeId>, InputError> {
    if names.is_empty() {
        return Ok(scene.selection());
    }
    names
        .iter()
        .map(|name| {
            scene
                .find(name)
                .ok_or_else(|| InputError::UnknownNode { name: name.clone() })
        })
        .collect()
}

/// Writes the scene as pretty-printed JSON.
pub fn write_scene(scene: &MemoryScene, path: &Path) -> anyhow::Result<()> {
    let json = scene.to_json_pretty()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Default output path for a rigged scene: `<stem>.rig.json` beside the input.
pub fn rigged_scene_path(scene_path: &str) -> PathBuf {
    let path = Path::new(scene_path);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene");
    let stem = stem.strip_suffix(".rig").unwrap_or(stem);
    path.with_file_name(format!("{}.rig.json", stem))
}
