//! Mesh part fixtures. The character stands on the ground plane facing +Z,
//! with its left side on +X.

use autorig_spec::{BodyRegion, MeshPart, PartsDocument};

/// Pivot of each region for a character about 18 units tall.
pub fn pivot(region: BodyRegion) -> [f64; 3] {
    let center = match region {
        BodyRegion::Pelvis => [0.0, 10.0, 0.0],
        BodyRegion::Midsection => [0.0, 12.0, 0.0],
        BodyRegion::UpperTorso => [0.0, 14.0, 0.0],
        BodyRegion::Head => [0.0, 17.0, 0.0],
        BodyRegion::ThighLeft | BodyRegion::ThighRight => [1.0, 9.5, 0.0],
        BodyRegion::CalfLeft | BodyRegion::CalfRight => [1.0, 5.0, 0.0],
        BodyRegion::FootLeft | BodyRegion::FootRight => [1.0, 1.0, 0.5],
        BodyRegion::ShoulderLeft | BodyRegion::ShoulderRight => [2.0, 15.0, 0.0],
        BodyRegion::ForearmLeft | BodyRegion::ForearmRight => [4.5, 15.0, 0.0],
        BodyRegion::HandLeft | BodyRegion::HandRight => [7.0, 15.0, 0.0],
        BodyRegion::Finger01Left | BodyRegion::Finger01Right => [8.0, 15.0, 0.3],
        BodyRegion::Finger02Left | BodyRegion::Finger02Right => [8.6, 15.0, 0.3],
        BodyRegion::ThumbLeft | BodyRegion::ThumbRight => [7.6, 15.0, 0.8],
    };
    if region.name().ends_with("_Right") {
        [-center[0], center[1], center[2]]
    } else {
        center
    }
}

/// Part name for a region on the `Char` character.
pub fn part_name(region: BodyRegion) -> String {
    format!("Char_{}", region.name())
}

/// One part per region of `regions`.
pub fn parts_for(regions: &[BodyRegion]) -> Vec<MeshPart> {
    regions
        .iter()
        .map(|r| MeshPart::new(part_name(*r), pivot(*r)))
        .collect()
}

/// Every region of the extended biped.
pub fn extended_biped() -> Vec<MeshPart> {
    parts_for(&BodyRegion::ALL)
}

/// Every region of the basic biped.
pub fn basic_biped() -> Vec<MeshPart> {
    parts_for(&BodyRegion::BASIC)
}

/// Pelvis at (0,10,0) and left thigh at (1,8,0).
pub fn two_part_example() -> Vec<MeshPart> {
    vec![
        MeshPart::new("Char_Pelvis", [0.0, 10.0, 0.0]),
        MeshPart::new("Char_Thigh_Left", [1.0, 8.0, 0.0]),
    ]
}

/// Serializes parts as a parts document.
pub fn parts_json(parts: &[MeshPart]) -> String {
    let doc = PartsDocument {
        parts: parts.to_vec(),
    };
    serde_json::to_string_pretty(&doc).expect("parts document serializes")
}
