//! Naming convention: part classification and derived node names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, SpecError, ValidationError, ValidationResult};
use crate::pattern::NamePattern;
use crate::region::BodyRegion;
use crate::topology::Slot;

/// Synthetic root joint.
pub const ROOT_JOINT: &str = "root_jnt";
/// Container grouping the whole skeleton.
pub const JOINT_GROUP: &str = "jnt_grp";
/// Outer global control.
pub const MAIN_CONTROL: &str = "main_ctrl";
/// Inner global control; drives the root joint.
pub const OFFSET_CONTROL: &str = "offset_ctrl";
/// Offset group of [`MAIN_CONTROL`]; top of the control rig.
pub const CONTROL_GROUP: &str = "ctrl_grp";
/// Offset group of [`OFFSET_CONTROL`].
pub const OFFSET_GROUP: &str = "offset_grp";

fn default_joint_suffix() -> String {
    "_jnt".into()
}

fn default_control_suffix() -> String {
    "_ctrl".into()
}

fn default_offset_suffix() -> String {
    "_offset".into()
}

fn default_locator_suffix() -> String {
    "_loc".into()
}

/// Suffixes appended at each pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    #[serde(default = "default_joint_suffix")]
    pub joint_suffix: String,
    #[serde(default = "default_control_suffix")]
    pub control_suffix: String,
    #[serde(default = "default_offset_suffix")]
    pub offset_suffix: String,
    #[serde(default = "default_locator_suffix")]
    pub locator_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            joint_suffix: default_joint_suffix(),
            control_suffix: default_control_suffix(),
            offset_suffix: default_offset_suffix(),
            locator_suffix: default_locator_suffix(),
        }
    }
}

impl NamingConfig {
    /// Joint name for a part: `Char_Pelvis` -> `Char_Pelvis_jnt`,
    /// `Char_Foot_Left` -> `Char_Foot_Left_Base_jnt`.
    pub fn joint_name(&self, part: &str, slot: Slot) -> String {
        match slot {
            Slot::Root => ROOT_JOINT.to_string(),
            _ => format!("{}{}{}", part, slot.part_suffix(), self.joint_suffix),
        }
    }

    /// Control name for a joint: the joint suffix is replaced.
    pub fn control_name(&self, joint: &str) -> String {
        replace_suffix(joint, &self.joint_suffix, &self.control_suffix)
    }

    /// Offset group name for a control: the control suffix is replaced.
    pub fn offset_name(&self, control: &str) -> String {
        replace_suffix(control, &self.control_suffix, &self.offset_suffix)
    }

    /// Zero-pose locator name for a control: `Char_Head_ctrl` -> `Char_Head_loc`.
    pub fn locator_name(&self, control: &str) -> String {
        replace_suffix(control, &self.control_suffix, &self.locator_suffix)
    }

    /// Wildcard matching any joint of a slot, regardless of character prefix.
    pub fn joint_pattern(&self, slot: Slot) -> Result<NamePattern, SpecError> {
        match slot {
            Slot::Root => NamePattern::new(ROOT_JOINT),
            _ => NamePattern::new(&format!("*{}", self.joint_name(&slot_token(slot), slot))),
        }
    }

    /// Wildcard matching any control of a slot.
    pub fn control_pattern(&self, slot: Slot) -> Result<NamePattern, SpecError> {
        match slot {
            Slot::Root => NamePattern::new(&self.control_name(ROOT_JOINT)),
            _ => NamePattern::new(&format!(
                "*{}",
                self.control_name(&self.joint_name(&slot_token(slot), slot))
            )),
        }
    }
}

fn slot_token(slot: Slot) -> String {
    slot.region().map(|r| r.token()).unwrap_or_default()
}

fn replace_suffix(name: &str, from: &str, to: &str) -> String {
    match name.strip_suffix(from) {
        Some(stem) => format!("{}{}", stem, to),
        None => format!("{}{}", name, to),
    }
}

/// A part that matched exactly one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartMatch {
    pub name: String,
    pub region: BodyRegion,
}

/// Classification of a set of part names against a region vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingReport {
    /// Parts matching exactly one region, in input order.
    pub matched: Vec<PartMatch>,
    /// Parts matching no region.
    pub invalid: Vec<String>,
    /// Parts matching several regions, with the regions they matched.
    pub ambiguous: Vec<(String, Vec<BodyRegion>)>,
    /// Regions claimed by more than one part.
    pub duplicates: Vec<(BodyRegion, Vec<String>)>,
}

impl NamingReport {
    /// Returns true when every part matched exactly one unique region.
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.ambiguous.is_empty() && self.duplicates.is_empty()
    }

    /// Returns true when only recoverable problems (unrecognized names) remain.
    pub fn is_recoverable(&self) -> bool {
        self.ambiguous.is_empty() && self.duplicates.is_empty()
    }

    /// Converts the report into coded diagnostics.
    pub fn to_validation_result(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        for name in &self.invalid {
            result.add_error(ValidationError::for_part(
                ErrorCode::UnrecognizedPartName,
                "name carries no body region token; no joint will be created for it",
                name,
            ));
        }
        for (name, regions) in &self.ambiguous {
            let list: Vec<&str> = regions.iter().map(|r| r.name()).collect();
            result.add_error(ValidationError::for_part(
                ErrorCode::AmbiguousPartName,
                format!("name matches several body regions: {}", list.join(", ")),
                name,
            ));
        }
        for (region, parts) in &self.duplicates {
            result.add_error(ValidationError::new(
                ErrorCode::DuplicateRegion,
                format!("region {} is claimed by {}", region, parts.join(", ")),
            ));
        }
        result
    }
}

/// Returns the regions of `vocabulary` whose token occurs in `name`.
pub fn regions_in_name(name: &str, vocabulary: &[BodyRegion]) -> Vec<BodyRegion> {
    vocabulary
        .iter()
        .copied()
        .filter(|r| r.matches(name))
        .collect()
}

/// Returns the names that match none of the regions in `vocabulary`.
pub fn invalid_names<S: AsRef<str>>(names: &[S], vocabulary: &[BodyRegion]) -> Vec<String> {
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| regions_in_name(name, vocabulary).is_empty())
        .map(str::to_string)
        .collect()
}

/// Classifies part names against a region vocabulary.
///
/// # Example
/// ```
/// use autorig_spec::naming::classify_parts;
/// use autorig_spec::BodyRegion;
///
/// let report = classify_parts(&["Char_Pelvis", "Char_Tail"], &BodyRegion::ALL);
/// assert_eq!(report.matched.len(), 1);
/// assert_eq!(report.invalid, vec!["Char_Tail".to_string()]);
/// ```
pub fn classify_parts<S: AsRef<str>>(names: &[S], vocabulary: &[BodyRegion]) -> NamingReport {
    let mut report = NamingReport::default();
    let mut claims: BTreeMap<BodyRegion, Vec<String>> = BTreeMap::new();

    for name in names.iter().map(AsRef::as_ref) {
        let regions = regions_in_name(name, vocabulary);
        match regions.as_slice() {
            [] => report.invalid.push(name.to_string()),
            [region] => {
                claims.entry(*region).or_default().push(name.to_string());
                report.matched.push(PartMatch {
                    name: name.to_string(),
                    region: *region,
                });
            }
            _ => report.ambiguous.push((name.to_string(), regions)),
        }
    }

    report.duplicates = claims
        .into_iter()
        .filter(|(_, parts)| parts.len() > 1)
        .collect();
    report
}
