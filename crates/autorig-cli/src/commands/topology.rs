//! Topology command implementation
//!
//! Prints the canonical biped topology, one view per section.

use anyhow::{anyhow, Result};
use autorig_spec::{Topology, TopologyKind, TopologyPreset};
use colored::Colorize;
use std::process::ExitCode;

use super::json_output::{print_json, TopologyOutput};

/// Parses a preset name as accepted by `--preset`.
pub fn parse_preset(name: &str) -> Result<TopologyPreset> {
    match name {
        "biped_basic_v1" | "basic" => Ok(TopologyPreset::BipedBasicV1),
        "biped_extended_v1" | "extended" => Ok(TopologyPreset::BipedExtendedV1),
        other => Err(anyhow!(
            "unknown preset: {} (expected biped_basic_v1 or biped_extended_v1)",
            other
        )),
    }
}

/// Parses a view name as accepted by `--kind`.
pub fn parse_kind(name: &str) -> Result<TopologyKind> {
    TopologyKind::ALL
        .into_iter()
        .find(|k| k.as_str() == name)
        .ok_or_else(|| anyhow!("unknown topology kind: {}", name))
}

/// Run the topology command
pub fn run(preset: Option<&str>, kind: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let preset = preset.map(parse_preset).transpose()?.unwrap_or_default();
    let kinds = match kind {
        Some(name) => vec![parse_kind(name)?],
        None => TopologyKind::ALL.to_vec(),
    };

    let topology = Topology::from_preset(preset);
    topology.validate()?;

    if json_output {
        let edges = kinds.iter().flat_map(|k| topology.edges(*k)).collect();
        print_json(&TopologyOutput {
            preset: preset.as_str(),
            edges,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Preset:".cyan().bold(), preset.as_str());
    for kind in kinds {
        let edges = topology.edges(kind);
        println!("\n{} ({} edges)", kind.as_str().bold(), edges.len());
        for edge in edges {
            println!("  {:<24} {} {}", edge.child.to_string(), "->".dimmed(), edge.parent);
        }
    }
    Ok(ExitCode::SUCCESS)
}
