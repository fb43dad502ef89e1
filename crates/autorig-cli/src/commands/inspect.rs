//! Inspect command implementation
//!
//! Prints the node hierarchy of a scene file and its rig hash.

use anyhow::Result;
use autorig_assembly::{rig_hash, MemoryScene, NodeId, SceneGraph};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{input_error_to_json, print_json, InspectNode, InspectOutput};
use crate::input::load_scene;

/// Flattens the scene hierarchy depth-first, roots in id order.
pub fn hierarchy(scene: &MemoryScene) -> Result<Vec<InspectNode>> {
    let mut lines = Vec::with_capacity(scene.len());
    let mut stack: Vec<(NodeId, usize)> =
        scene.roots().into_iter().rev().map(|id| (id, 0)).collect();
    while let Some((id, depth)) = stack.pop() {
        let node = scene.node(id)?;
        let parent = match node.parent {
            Some(p) => Some(scene.node(p)?.name.clone()),
            None => None,
        };
        lines.push(InspectNode {
            name: node.name.clone(),
            kind: node.kind.as_str(),
            depth,
            parent,
        });
        stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
    }
    Ok(lines)
}

/// Run the inspect command
pub fn run(scene_path: &str, json_output: bool) -> Result<ExitCode> {
    let scene = match load_scene(Path::new(scene_path)) {
        Ok(loaded) => loaded.scene,
        Err(e) => {
            if json_output {
                print_json(&InspectOutput {
                    success: false,
                    errors: vec![input_error_to_json(&e, Some(scene_path))],
                    nodes: Vec::new(),
                    constraints: 0,
                    bindings: 0,
                    rig_hash: None,
                })?;
                return Ok(ExitCode::from(1));
            }
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to load scene file: {}", scene_path)));
        }
    };

    let nodes = hierarchy(&scene)?;
    let hash = rig_hash(&scene)?;

    if json_output {
        print_json(&InspectOutput {
            success: true,
            errors: Vec::new(),
            nodes,
            constraints: scene.constraints().len(),
            bindings: scene.bindings().len(),
            rig_hash: Some(hash),
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Inspecting:".cyan().bold(), scene_path);
    for node in &nodes {
        println!(
            "{}{} {}",
            "  ".repeat(node.depth + 1),
            node.name,
            format!("[{}]", node.kind).dimmed()
        );
    }
    println!(
        "\n{} {} nodes, {} constraints, {} skin bindings",
        "Scene:".dimmed(),
        nodes.len(),
        scene.constraints().len(),
        scene.bindings().len()
    );
    println!("{} {}", "Rig hash:".dimmed(), hash);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorig_spec::MeshPart;
    use glam::DVec3;

    #[test]
    fn test_hierarchy_is_depth_first() {
        let mut scene = MemoryScene::from_parts(&[MeshPart::new("Char_Head", [0.0, 16.0, 0.0])])
            .unwrap();
        let grp = scene.create_group("jnt_grp").unwrap();
        let root = scene.create_joint("root_jnt", DVec3::ZERO, 1.0).unwrap();
        let pelvis = scene.create_joint("Char_Pelvis_jnt", DVec3::Y, 1.0).unwrap();
        scene.reparent(root, Some(grp)).unwrap();
        scene.reparent(pelvis, Some(root)).unwrap();

        let lines = hierarchy(&scene).unwrap();
        let names: Vec<(&str, usize)> = lines.iter().map(|l| (l.name.as_str(), l.depth)).collect();
        assert_eq!(
            names,
            vec![
                ("Char_Head", 0),
                ("jnt_grp", 0),
                ("root_jnt", 1),
                ("Char_Pelvis_jnt", 2),
            ]
        );
        assert_eq!(lines[3].parent.as_deref(), Some("root_jnt"));
        assert_eq!(lines[3].kind, "joint");
    }
}
