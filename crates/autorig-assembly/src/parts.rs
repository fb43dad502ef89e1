//! Selection intake and naming validation.

use autorig_spec::{classify_parts, TopologyPreset};
use log::{info, warn};

use crate::error::{InStage, RigError, RigResult, Stage};
use crate::prompt::{Decision, Prompter};
use crate::records::{PartRecord, PartSet};
use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Classifies the selected meshes against the preset vocabulary.
///
/// Returns `Ok(None)` when unrecognized names were found and the prompter
/// cancelled. Non-mesh nodes in the selection are ignored.
pub fn collect_parts(
    scene: &dyn SceneGraph,
    selection: &[NodeId],
    preset: TopologyPreset,
    prompter: &mut dyn Prompter,
) -> RigResult<Option<PartSet>> {
    let mut meshes: Vec<NodeId> = Vec::with_capacity(selection.len());
    for &id in selection {
        let node = scene.node(id).in_stage(Stage::Naming)?;
        if node.kind == NodeKind::Mesh && !meshes.contains(&id) {
            meshes.push(id);
        }
    }
    if meshes.is_empty() {
        return Err(RigError::NoSelection);
    }

    let mut names = Vec::with_capacity(meshes.len());
    for &id in &meshes {
        names.push(scene.node(id).in_stage(Stage::Naming)?.name.clone());
    }

    let report = classify_parts(&names, preset.regions());
    if let Some((part, regions)) = report.ambiguous.into_iter().next() {
        return Err(RigError::AmbiguousName { part, regions });
    }
    if let Some((region, parts)) = report.duplicates.into_iter().next() {
        return Err(RigError::DuplicateRegion { region, parts });
    }

    if !report.invalid.is_empty() {
        if prompter.confirm_invalid_names(&report.invalid) == Decision::Cancel {
            info!("Rig cancelled over {} unrecognized part names", report.invalid.len());
            return Ok(None);
        }
        warn!("Excluding unrecognized parts: {}", report.invalid.join(", "));
    }

    let mut records = Vec::with_capacity(report.matched.len());
    for matched in report.matched {
        let Some(index) = names.iter().position(|n| *n == matched.name) else {
            continue;
        };
        let node = meshes[index];
        records.push(PartRecord {
            region: matched.region,
            node,
            pivot: scene.world_transform(node).in_stage(Stage::Naming)?.position,
            name: matched.name,
        });
    }

    Ok(Some(PartSet {
        records,
        excluded: report.invalid,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use crate::prompt::ScriptedPrompter;
    use autorig_spec::{BodyRegion, MeshPart};
    use glam::DVec3;

    fn scene(names: &[&str]) -> MemoryScene {
        let parts: Vec<MeshPart> = names
            .iter()
            .enumerate()
            .map(|(i, n)| MeshPart::new(*n, [0.0, i as f64, 0.0]))
            .collect();
        MemoryScene::from_parts(&parts).unwrap()
    }

    #[test]
    fn test_empty_selection_is_fatal() {
        let scene = scene(&["Char_Pelvis"]);
        let mut prompter = ScriptedPrompter::proceed();
        let err = collect_parts(&scene, &[], TopologyPreset::default(), &mut prompter).unwrap_err();
        assert!(matches!(err, RigError::NoSelection));
    }

    #[test]
    fn test_matched_parts_keep_pivots() {
        let scene = scene(&["Char_Pelvis", "Char_Thigh_Left"]);
        let mut prompter = ScriptedPrompter::proceed();
        let parts = collect_parts(&scene, &scene.selection(), TopologyPreset::default(), &mut prompter)
            .unwrap()
            .unwrap();
        assert_eq!(parts.records.len(), 2);
        let thigh = parts.get(BodyRegion::ThighLeft).unwrap();
        assert_eq!(thigh.pivot, DVec3::new(0.0, 1.0, 0.0));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_invalid_names_go_through_prompter() {
        let scene = scene(&["Char_Pelvis", "Char_Tail"]);

        let mut proceed = ScriptedPrompter::proceed();
        let parts = collect_parts(&scene, &scene.selection(), TopologyPreset::default(), &mut proceed)
            .unwrap()
            .unwrap();
        assert_eq!(proceed.asked, vec![vec!["Char_Tail".to_string()]]);
        assert_eq!(parts.excluded, vec!["Char_Tail".to_string()]);
        assert_eq!(parts.records.len(), 1);

        let mut cancel = ScriptedPrompter::cancel();
        let outcome =
            collect_parts(&scene, &scene.selection(), TopologyPreset::default(), &mut cancel).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_ambiguous_and_duplicate_names_are_fatal() {
        let ambiguous = scene(&["Char_Hand_Left_Thumb_Left"]);
        let mut prompter = ScriptedPrompter::proceed();
        let err = collect_parts(
            &ambiguous,
            &ambiguous.selection(),
            TopologyPreset::default(),
            &mut prompter,
        )
        .unwrap_err();
        assert!(matches!(err, RigError::AmbiguousName { .. }));

        let duplicate = scene(&["A_Head", "B_Head"]);
        let err = collect_parts(
            &duplicate,
            &duplicate.selection(),
            TopologyPreset::default(),
            &mut prompter,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RigError::DuplicateRegion {
                region: BodyRegion::Head,
                ..
            }
        ));
    }

    #[test]
    fn test_basic_preset_excludes_fingers() {
        let scene = scene(&["Char_Hand_Left", "Char_Finger01_Left"]);
        let mut prompter = ScriptedPrompter::proceed();
        let parts = collect_parts(
            &scene,
            &scene.selection(),
            TopologyPreset::BipedBasicV1,
            &mut prompter,
        )
        .unwrap()
        .unwrap();
        assert_eq!(parts.excluded, vec!["Char_Finger01_Left".to_string()]);
    }
}
