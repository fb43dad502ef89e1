//! Validate command implementation
//!
//! Runs the naming validator over the mesh parts of a scene file.

use anyhow::{Context, Result};
use autorig_assembly::{NodeKind, SceneGraph};
use autorig_spec::{classify_parts, BodyRegion, ErrorCode, NamingReport, ValidationError};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    input_error_to_json, print_json, validation_error_to_json, ValidateOutput,
};
use crate::input::{load_config, load_scene, LoadResult};

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if every part names exactly one region, 1 otherwise
pub fn run(scene_path: &str, config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(scene_path, config_path)
    } else {
        run_human(scene_path, config_path)
    }
}

/// Classifies every mesh in the scene against the preset's vocabulary.
pub fn classify_scene(scene: &dyn SceneGraph, vocabulary: &[BodyRegion]) -> Result<NamingReport> {
    let mut names = Vec::new();
    for id in scene.nodes_of_kind(NodeKind::Mesh) {
        names.push(scene.node(id)?.name.clone());
    }
    Ok(classify_parts(&names, vocabulary))
}

fn no_parts_error() -> ValidationError {
    ValidationError::new(ErrorCode::NoParts, "scene holds no mesh parts")
}

fn run_human(scene_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), scene_path);

    let config = load_config(config_path)?;
    let LoadResult {
        scene,
        source_kind,
        source_hash,
    } = load_scene(Path::new(scene_path))
        .with_context(|| format!("Failed to load scene file: {}", scene_path))?;
    println!(
        "{} {} ({})",
        "Source:".dimmed(),
        source_kind,
        &source_hash[..16]
    );
    println!("{} {}", "Preset:".dimmed(), config.preset.as_str());

    let report = classify_scene(&scene, config.preset.regions())?;
    let mut result = report.to_validation_result();
    if report.matched.is_empty() && result.is_ok() {
        result.add_error(no_parts_error());
    }

    for part in &report.matched {
        println!("  {} {} {}", "✓".green(), part.name, format!("({})", part.region).dimmed());
    }
    for error in &result.errors {
        let marker = if error.code.is_recoverable() {
            "!".yellow()
        } else {
            "✗".red()
        };
        println!("  {} {}", marker, error);
    }

    if result.is_ok() {
        println!(
            "\n{} {} part(s) recognized",
            "SUCCESS".green().bold(),
            report.matched.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} {} naming error(s)",
            "FAILED".red().bold(),
            result.errors.len()
        );
        Ok(ExitCode::from(1))
    }
}

fn run_json(scene_path: &str, config_path: Option<&str>) -> Result<ExitCode> {
    let loaded = load_config(config_path)
        .and_then(|config| load_scene(Path::new(scene_path)).map(|l| (config, l)));
    let (config, loaded) = match loaded {
        Ok(pair) => pair,
        Err(e) => {
            let output = ValidateOutput::failure(vec![input_error_to_json(&e, Some(scene_path))]);
            print_json(&output)?;
            return Ok(ExitCode::from(1));
        }
    };

    let report = classify_scene(&loaded.scene, config.preset.regions())?;
    let mut output = ValidateOutput::from_report(&report);
    if report.matched.is_empty() && output.errors.is_empty() {
        output.success = false;
        output.errors.push(validation_error_to_json(&no_parts_error()));
    }
    print_json(&output)?;

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_assembly::MemoryScene;
    use autorig_spec::{MeshPart, TopologyPreset};

    #[test]
    fn test_classify_scene_uses_meshes_only() {
        let mut scene = MemoryScene::from_parts(&[
            MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
            MeshPart::new("Char_Tail", [0.0, 9.0, -2.0]),
        ])
        .unwrap();
        scene.create_group("Char_Head_offset").unwrap();

        let report = classify_scene(&scene, BodyRegion::ALL.as_slice()).unwrap();
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.invalid, vec!["Char_Tail".to_string()]);
    }

    #[test]
    fn test_basic_preset_rejects_fingers() {
        let scene = MemoryScene::from_parts(&[MeshPart::new("Char_Thumb_Left", [3.0, 12.0, 0.0])])
            .unwrap();
        let report = classify_scene(&scene, TopologyPreset::BipedBasicV1.regions()).unwrap();
        assert_eq!(report.invalid.len(), 1);
    }

    #[test]
    fn test_run_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(
            &good,
            r#"{"parts": [{"name": "Char_Pelvis", "pivot": [0.0, 10.0, 0.0]}]}"#,
        )
        .unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(
            &bad,
            r#"{"parts": [{"name": "Char_Tail", "pivot": [0.0, 10.0, 0.0]}]}"#,
        )
        .unwrap();
        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{"parts": []}"#).unwrap();

        let missing = Some("/nonexistent/autorig.json");
        assert_eq!(run(good.to_str().unwrap(), missing, true).unwrap(), ExitCode::from(1));
        assert_eq!(run(good.to_str().unwrap(), None, true).unwrap(), ExitCode::SUCCESS);
        assert_eq!(run(bad.to_str().unwrap(), None, true).unwrap(), ExitCode::from(1));
        assert_eq!(run(empty.to_str().unwrap(), None, false).unwrap(), ExitCode::from(1));
    }
}
