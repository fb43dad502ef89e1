//! Locate command implementation
//!
//! Hangs a zero-pose locator above controls of a rigged scene. Without
//! `--select` every per-joint control gets one; the two global controls are
//! left alone.

use anyhow::{Context, Result};
use autorig_assembly::{MemoryScene, NodeId, NodeKind, RigPipeline, SceneGraph};
use autorig_spec::{MAIN_CONTROL, OFFSET_CONTROL};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::json_output::{print_json, RigOutput};
use super::reporting::{input_failure, rig_failure};
use crate::input::{load_config, load_scene, resolve_selection, write_scene, InputError};

/// Controls to receive a locator: the named nodes, or every per-joint control.
fn targets(scene: &MemoryScene, select: &[String]) -> Result<Vec<NodeId>, InputError> {
    if !select.is_empty() {
        return resolve_selection(scene, select);
    }
    Ok(scene
        .nodes_of_kind(NodeKind::Control)
        .into_iter()
        .filter(|id| {
            scene
                .node(*id)
                .map(|n| n.name != MAIN_CONTROL && n.name != OFFSET_CONTROL)
                .unwrap_or(false)
        })
        .collect())
}

/// Run the locate command
///
/// # Arguments
/// * `scene_path` - Rigged scene file
/// * `select` - Control names (default: every per-joint control)
/// * `config_path` - Optional config file (falls back to `AUTORIG_CONFIG`)
/// * `out` - Output path (default: overwrite the input)
/// * `json_output` - Whether to output machine-readable JSON
pub fn run(
    scene_path: &str,
    select: &[String],
    config_path: Option<&str>,
    out: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    if !json_output {
        println!("{} {}", "Locating:".cyan().bold(), scene_path);
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let mut scene = match load_scene(Path::new(scene_path)) {
        Ok(loaded) => loaded.scene,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let controls = match targets(&scene, select) {
        Ok(controls) => controls,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let pipeline = match RigPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => return rig_failure(&e, json_output),
    };

    let locators = match pipeline.locate(&mut scene, &controls) {
        Ok(locators) => locators,
        Err(e) => return rig_failure(&e, json_output),
    };

    let out_path = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(scene_path));
    write_scene(&scene, &out_path)
        .with_context(|| format!("Failed to write scene: {}", out_path.display()))?;

    if json_output {
        let names = locators.into_iter().map(|l| l.name).collect();
        print_json(&RigOutput::located(names, out_path.display().to_string()))?;
    } else {
        for locator in &locators {
            if locator.reused {
                println!("  {} {} already in place", "-".dimmed(), locator.name);
            } else {
                println!("  {} {}", "✓".green(), locator.name);
            }
        }
        println!(
            "\n{} {} locator(s) ({})",
            "SUCCESS".green().bold(),
            locators.len(),
            out_path.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}
