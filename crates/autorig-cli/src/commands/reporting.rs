use anyhow::Result;
use autorig_assembly::{RigError, RigReport};
use autorig_spec::StageError;
use colored::Colorize;
use std::process::ExitCode;

use super::json_output::{input_error_to_json, print_json, rig_error_to_json, RigOutput};
use crate::input::InputError;

/// Reports an input failure and returns exit code 1.
pub(crate) fn input_failure(err: &InputError, file: &str, json: bool) -> Result<ExitCode> {
    if json {
        print_json(&RigOutput::failure(vec![input_error_to_json(err, Some(file))]))?;
    } else {
        println!("\n{} {}", "FAILED".red().bold(), err);
    }
    Ok(ExitCode::from(1))
}

/// Reports a pipeline failure and returns exit code 1.
pub(crate) fn rig_failure(err: &RigError, json: bool) -> Result<ExitCode> {
    if json {
        print_json(&RigOutput::failure(vec![rig_error_to_json(err)]))?;
    } else {
        println!(
            "\n{} [{}] {} stage: {}",
            "FAILED".red().bold(),
            err.code(),
            err.category(),
            err
        );
    }
    Ok(ExitCode::from(1))
}

/// Prints the human-readable summary of a completed run.
pub(crate) fn print_report(report: &RigReport) {
    println!("{} {}", "Preset:".dimmed(), report.preset.as_str());
    println!("  {:<16} {}", "parts", report.parts);
    println!("  {:<16} {}", "joints", report.joints);
    println!("  {:<16} {}", "controls", report.controls);
    println!("  {:<16} {}", "offset groups", report.offset_groups);
    println!(
        "  {:<16} {} ({} already bound)",
        "bindings", report.bindings, report.skipped_bindings
    );

    for name in &report.excluded_parts {
        println!("  {} excluded part {}", "!".yellow(), name);
    }
    for name in &report.orphans {
        println!("  {} orphan joint {} parked under jnt_grp", "!".yellow(), name);
    }
    if !report.skipped_edges.is_empty() {
        println!(
            "  {} {} topology edge(s) skipped for missing parts",
            "-".dimmed(),
            report.skipped_edges.len()
        );
    }

    let timings: Vec<String> = report
        .timings
        .iter()
        .map(|t| format!("{} {}ms", t.stage, t.millis))
        .collect();
    println!("{} {}", "Timings:".dimmed(), timings.join(", ").dimmed());
    println!("{} {}", "Rig hash:".dimmed(), report.rig_hash);
}
