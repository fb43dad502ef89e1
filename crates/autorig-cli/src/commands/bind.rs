//! Bind command implementation
//!
//! Re-runs the skin binder on an already rigged scene. Meshes that are
//! bound already are left alone, so the command can be repeated.

use anyhow::{Context, Result};
use autorig_assembly::{BindingSet, RigPipeline};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::json_output::{print_json, BindSummary, RigOutput};
use super::reporting::{input_failure, rig_failure};
use crate::input::{load_config, load_scene, write_scene};

impl From<&BindingSet> for BindSummary {
    fn from(bindings: &BindingSet) -> Self {
        Self {
            bound: bindings.bound.iter().map(|b| b.region.to_string()).collect(),
            skipped: bindings.skipped.iter().map(|r| r.to_string()).collect(),
            drives: bindings.drives,
        }
    }
}

/// Run the bind command
///
/// # Arguments
/// * `scene_path` - Rigged scene file
/// * `config_path` - Optional config file (falls back to `AUTORIG_CONFIG`)
/// * `out` - Output path (default: overwrite the input)
/// * `json_output` - Whether to output machine-readable JSON
pub fn run(
    scene_path: &str,
    config_path: Option<&str>,
    out: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    if !json_output {
        println!("{} {}", "Binding:".cyan().bold(), scene_path);
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let mut scene = match load_scene(Path::new(scene_path)) {
        Ok(loaded) => loaded.scene,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let pipeline = match RigPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => return rig_failure(&e, json_output),
    };

    let bindings = match pipeline.rebind(&mut scene) {
        Ok(bindings) => bindings,
        Err(e) => return rig_failure(&e, json_output),
    };

    let out_path = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(scene_path));
    write_scene(&scene, &out_path)
        .with_context(|| format!("Failed to write scene: {}", out_path.display()))?;

    let summary = BindSummary::from(&bindings);
    if json_output {
        print_json(&RigOutput::bound(summary, out_path.display().to_string()))?;
    } else {
        for region in &summary.bound {
            println!("  {} bound {}", "✓".green(), region);
        }
        for region in &summary.skipped {
            println!("  {} {} already bound", "-".dimmed(), region);
        }
        println!(
            "\n{} {} new binding(s), {} control drive(s) ({})",
            "SUCCESS".green().bold(),
            summary.bound.len(),
            summary.drives,
            out_path.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}
