//! Rig command implementation
//!
//! Runs the full assembly pipeline over a scene file and writes the rigged
//! scene.

use anyhow::{Context, Result};
use autorig_assembly::{Decision, Prompter, RigOutcome, RigPipeline, ScriptedPrompter};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::json_output::{print_json, RigOutput};
use super::reporting::{input_failure, print_report, rig_failure};
use crate::input::{load_config, load_scene, resolve_selection, rigged_scene_path, write_scene};
use crate::prompt::TerminalPrompter;

/// Run the rig command
///
/// # Arguments
/// * `scene_path` - Scene or parts document to rig
/// * `select` - Names to rig; empty keeps the stored selection
/// * `config_path` - Optional config file (falls back to `AUTORIG_CONFIG`)
/// * `out` - Output path (default: `<stem>.rig.json` beside the input)
/// * `answer` - Fixed answer to the invalid-name prompt; `None` asks on the terminal
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 if the rig was built, 1 if it failed or was cancelled
pub fn run(
    scene_path: &str,
    select: &[String],
    config_path: Option<&str>,
    out: Option<&str>,
    answer: Option<Decision>,
    json_output: bool,
) -> Result<ExitCode> {
    if !json_output {
        println!("{} {}", "Rigging:".cyan().bold(), scene_path);
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let mut scene = match load_scene(Path::new(scene_path)) {
        Ok(loaded) => loaded.scene,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let selection = match resolve_selection(&scene, select) {
        Ok(selection) => selection,
        Err(e) => return input_failure(&e, scene_path, json_output),
    };
    let pipeline = match RigPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => return rig_failure(&e, json_output),
    };

    let mut prompter: Box<dyn Prompter> = match answer {
        Some(decision) => Box::new(ScriptedPrompter::new(decision)),
        None => Box::new(TerminalPrompter::stdio()),
    };

    match pipeline.run(&mut scene, &selection, prompter.as_mut()) {
        Ok(RigOutcome::Completed(report)) => {
            let out_path = out
                .map(PathBuf::from)
                .unwrap_or_else(|| rigged_scene_path(scene_path));
            write_scene(&scene, &out_path)
                .with_context(|| format!("Failed to write scene: {}", out_path.display()))?;
            let out_display = out_path.display().to_string();
            if json_output {
                print_json(&RigOutput::completed(report, out_display))?;
            } else {
                print_report(&report);
                println!("\n{} Rig written to {}", "SUCCESS".green().bold(), out_display);
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(RigOutcome::Cancelled) => {
            if json_output {
                print_json(&RigOutput::cancelled())?;
            } else {
                println!("\n{} Rig cancelled; nothing written", "CANCELLED".yellow().bold());
            }
            Ok(ExitCode::from(1))
        }
        Err(e) => rig_failure(&e, json_output),
    }
}
