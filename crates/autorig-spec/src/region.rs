//! Canonical biped body regions.
//!
//! The vocabulary is closed: every mesh part of a rig-able character must
//! carry exactly one of these region tokens in its name (e.g. `Hero_Thigh_Left`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side of the body a region belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Center,
    Left,
    Right,
}

impl Side {
    /// Returns the suffix used in region tokens (`""`, `"_Left"`, `"_Right"`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Side::Center => "",
            Side::Left => "_Left",
            Side::Right => "_Right",
        }
    }
}

/// Primary axis a control curve is drawn around.
///
/// Twist-style handles (spine, arms, hands, fingers) are drawn around X,
/// stance-style handles around Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeAxis {
    X,
    #[default]
    Y,
}

impl ShapeAxis {
    /// Returns the curve normal for this axis.
    pub fn normal(&self) -> [f64; 3] {
        match self {
            ShapeAxis::X => [1.0, 0.0, 0.0],
            ShapeAxis::Y => [0.0, 1.0, 0.0],
        }
    }
}

/// A canonical semantic slot of the biped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyRegion {
    Pelvis,
    Midsection,
    UpperTorso,
    Head,
    #[serde(rename = "Thigh_Left")]
    ThighLeft,
    #[serde(rename = "Calf_Left")]
    CalfLeft,
    #[serde(rename = "Foot_Left")]
    FootLeft,
    #[serde(rename = "Thigh_Right")]
    ThighRight,
    #[serde(rename = "Calf_Right")]
    CalfRight,
    #[serde(rename = "Foot_Right")]
    FootRight,
    #[serde(rename = "Shoulder_Left")]
    ShoulderLeft,
    #[serde(rename = "Forearm_Left")]
    ForearmLeft,
    #[serde(rename = "Hand_Left")]
    HandLeft,
    #[serde(rename = "Finger01_Left")]
    Finger01Left,
    #[serde(rename = "Finger02_Left")]
    Finger02Left,
    #[serde(rename = "Thumb_Left")]
    ThumbLeft,
    #[serde(rename = "Shoulder_Right")]
    ShoulderRight,
    #[serde(rename = "Forearm_Right")]
    ForearmRight,
    #[serde(rename = "Hand_Right")]
    HandRight,
    #[serde(rename = "Finger01_Right")]
    Finger01Right,
    #[serde(rename = "Finger02_Right")]
    Finger02Right,
    #[serde(rename = "Thumb_Right")]
    ThumbRight,
}

impl BodyRegion {
    /// Every region, in canonical topology order.
    pub const ALL: [BodyRegion; 22] = [
        BodyRegion::Pelvis,
        BodyRegion::Midsection,
        BodyRegion::UpperTorso,
        BodyRegion::Head,
        BodyRegion::ThighLeft,
        BodyRegion::CalfLeft,
        BodyRegion::FootLeft,
        BodyRegion::ThighRight,
        BodyRegion::CalfRight,
        BodyRegion::FootRight,
        BodyRegion::ShoulderLeft,
        BodyRegion::ForearmLeft,
        BodyRegion::HandLeft,
        BodyRegion::Finger01Left,
        BodyRegion::Finger02Left,
        BodyRegion::ThumbLeft,
        BodyRegion::ShoulderRight,
        BodyRegion::ForearmRight,
        BodyRegion::HandRight,
        BodyRegion::Finger01Right,
        BodyRegion::Finger02Right,
        BodyRegion::ThumbRight,
    ];

    /// Regions of the basic biped (no fingers), in canonical topology order.
    pub const BASIC: [BodyRegion; 16] = [
        BodyRegion::Pelvis,
        BodyRegion::Midsection,
        BodyRegion::UpperTorso,
        BodyRegion::Head,
        BodyRegion::ThighLeft,
        BodyRegion::CalfLeft,
        BodyRegion::FootLeft,
        BodyRegion::ThighRight,
        BodyRegion::CalfRight,
        BodyRegion::FootRight,
        BodyRegion::ShoulderLeft,
        BodyRegion::ForearmLeft,
        BodyRegion::HandLeft,
        BodyRegion::ShoulderRight,
        BodyRegion::ForearmRight,
        BodyRegion::HandRight,
    ];

    /// Returns the region name as it appears in part names (e.g. `Thigh_Left`).
    pub fn name(&self) -> &'static str {
        match self {
            BodyRegion::Pelvis => "Pelvis",
            BodyRegion::Midsection => "Midsection",
            BodyRegion::UpperTorso => "UpperTorso",
            BodyRegion::Head => "Head",
            BodyRegion::ThighLeft => "Thigh_Left",
            BodyRegion::CalfLeft => "Calf_Left",
            BodyRegion::FootLeft => "Foot_Left",
            BodyRegion::ThighRight => "Thigh_Right",
            BodyRegion::CalfRight => "Calf_Right",
            BodyRegion::FootRight => "Foot_Right",
            BodyRegion::ShoulderLeft => "Shoulder_Left",
            BodyRegion::ForearmLeft => "Forearm_Left",
            BodyRegion::HandLeft => "Hand_Left",
            BodyRegion::Finger01Left => "Finger01_Left",
            BodyRegion::Finger02Left => "Finger02_Left",
            BodyRegion::ThumbLeft => "Thumb_Left",
            BodyRegion::ShoulderRight => "Shoulder_Right",
            BodyRegion::ForearmRight => "Forearm_Right",
            BodyRegion::HandRight => "Hand_Right",
            BodyRegion::Finger01Right => "Finger01_Right",
            BodyRegion::Finger02Right => "Finger02_Right",
            BodyRegion::ThumbRight => "Thumb_Right",
        }
    }

    /// Returns the identifying token searched for in part names (`_Thigh_Left`).
    pub fn token(&self) -> String {
        format!("_{}", self.name())
    }

    /// Returns true if `part_name` carries this region's token.
    pub fn matches(&self, part_name: &str) -> bool {
        part_name.contains(&self.token())
    }

    /// Returns the side of the body this region belongs to.
    pub fn side(&self) -> Side {
        let name = self.name();
        if name.ends_with(Side::Left.suffix()) {
            Side::Left
        } else if name.ends_with(Side::Right.suffix()) {
            Side::Right
        } else {
            Side::Center
        }
    }

    /// Feet expand into a Base and a Toe joint in the extended biped.
    pub fn is_foot(&self) -> bool {
        matches!(self, BodyRegion::FootLeft | BodyRegion::FootRight)
    }

    /// Fingers and thumbs.
    pub fn is_finger(&self) -> bool {
        self.is_finger_root() || self.is_finger_tip()
    }

    /// First finger segment; aimed at its tip during finger alignment.
    pub fn is_finger_root(&self) -> bool {
        matches!(self, BodyRegion::Finger01Left | BodyRegion::Finger01Right)
    }

    /// Last segment of a digit (no downstream joint).
    pub fn is_finger_tip(&self) -> bool {
        matches!(
            self,
            BodyRegion::Finger02Left
                | BodyRegion::Finger02Right
                | BodyRegion::ThumbLeft
                | BodyRegion::ThumbRight
        )
    }

    /// Regions whose controls are drawn as twist-style handles.
    pub fn is_rotate_primary(&self) -> bool {
        matches!(
            self,
            BodyRegion::Midsection
                | BodyRegion::UpperTorso
                | BodyRegion::ShoulderLeft
                | BodyRegion::ShoulderRight
                | BodyRegion::ForearmLeft
                | BodyRegion::ForearmRight
                | BodyRegion::HandLeft
                | BodyRegion::HandRight
        ) || self.is_finger()
    }

    /// Returns the control shape axis for this region.
    pub fn shape_axis(&self) -> ShapeAxis {
        if self.is_rotate_primary() {
            ShapeAxis::X
        } else {
            ShapeAxis::Y
        }
    }

    /// Canonical parent region in the joint hierarchy (`None` for the pelvis,
    /// which hangs directly under the synthetic root).
    pub fn parent(&self) -> Option<BodyRegion> {
        use BodyRegion::*;
        match self {
            Pelvis => None,
            Midsection => Some(Pelvis),
            UpperTorso => Some(Midsection),
            Head => Some(UpperTorso),
            ThighLeft => Some(Pelvis),
            CalfLeft => Some(ThighLeft),
            FootLeft => Some(CalfLeft),
            ThighRight => Some(Pelvis),
            CalfRight => Some(ThighRight),
            FootRight => Some(CalfRight),
            ShoulderLeft => Some(UpperTorso),
            ForearmLeft => Some(ShoulderLeft),
            HandLeft => Some(ForearmLeft),
            Finger01Left => Some(HandLeft),
            Finger02Left => Some(Finger01Left),
            ThumbLeft => Some(HandLeft),
            ShoulderRight => Some(UpperTorso),
            ForearmRight => Some(ShoulderRight),
            HandRight => Some(ForearmRight),
            Finger01Right => Some(HandRight),
            Finger02Right => Some(Finger01Right),
            ThumbRight => Some(HandRight),
        }
    }
}

impl fmt::Display for BodyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown region name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown body region: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for BodyRegion {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyRegion::ALL
            .iter()
            .copied()
            .find(|region| region.name() == s)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_tokens() {
        assert_eq!(BodyRegion::ThighLeft.token(), "_Thigh_Left");
        assert!(BodyRegion::Pelvis.matches("Char_Pelvis"));
        assert!(!BodyRegion::Pelvis.matches("Pelvis"));
        assert!(!BodyRegion::HandLeft.matches("Char_Hand_Right"));
    }

    #[test]
    fn test_region_sides() {
        assert_eq!(BodyRegion::Head.side(), Side::Center);
        assert_eq!(BodyRegion::Finger02Left.side(), Side::Left);
        assert_eq!(BodyRegion::ThumbRight.side(), Side::Right);
    }

    #[test]
    fn test_region_parse_roundtrip() {
        for region in BodyRegion::ALL {
            assert_eq!(region.name().parse::<BodyRegion>(), Ok(region));
        }
        assert!("Tail".parse::<BodyRegion>().is_err());
    }

    #[test]
    fn test_region_serde_uses_part_token() {
        let json = serde_json::to_string(&BodyRegion::CalfRight).unwrap();
        assert_eq!(json, "\"Calf_Right\"");
        let parsed: BodyRegion = serde_json::from_str("\"Finger01_Left\"").unwrap();
        assert_eq!(parsed, BodyRegion::Finger01Left);
    }

    #[test]
    fn test_shape_axis_convention() {
        assert_eq!(BodyRegion::Pelvis.shape_axis(), ShapeAxis::Y);
        assert_eq!(BodyRegion::CalfLeft.shape_axis(), ShapeAxis::Y);
        assert_eq!(BodyRegion::Head.shape_axis(), ShapeAxis::Y);
        assert_eq!(BodyRegion::Midsection.shape_axis(), ShapeAxis::X);
        assert_eq!(BodyRegion::HandRight.shape_axis(), ShapeAxis::X);
        assert_eq!(BodyRegion::ThumbLeft.shape_axis(), ShapeAxis::X);
    }

    #[test]
    fn test_region_parents_stay_in_vocabulary() {
        for region in BodyRegion::BASIC {
            if let Some(parent) = region.parent() {
                assert!(BodyRegion::BASIC.contains(&parent), "{region} -> {parent}");
            }
        }
        assert_eq!(BodyRegion::Finger02Left.parent(), Some(BodyRegion::Finger01Left));
    }
}
