//! Joint orientation math.
//!
//! Joints use X as the primary (aim) axis and Y as the secondary axis, which
//! points toward world up unless the aim itself is vertical.

use glam::{DMat3, DQuat, DVec3};

/// Aim vectors shorter than this have no usable direction.
const MIN_AIM_LENGTH: f64 = 1e-9;

/// Cosine above which the aim is treated as parallel to world up.
const PARALLEL_COS: f64 = 1.0 - 1e-6;

/// Returns the world orientation of a joint at `from` aiming X at `to`, with
/// Y toward world +Y (or world +Z when the aim is vertical).
///
/// Returns `None` when the two points coincide.
pub fn aim_orientation(from: DVec3, to: DVec3) -> Option<DQuat> {
    let aim = to - from;
    if aim.length() < MIN_AIM_LENGTH {
        return None;
    }
    let x = aim.normalize();
    let up = if x.dot(DVec3::Y).abs() > PARALLEL_COS {
        DVec3::Z
    } else {
        DVec3::Y
    };
    let z = x.cross(up).normalize();
    let y = z.cross(x);
    Some(DQuat::from_mat3(&DMat3::from_cols(x, y, z)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_axes(q: DQuat, x: DVec3, y: DVec3) {
        assert!((q * DVec3::X).abs_diff_eq(x, 1e-9), "x axis was {:?}", q * DVec3::X);
        assert!((q * DVec3::Y).abs_diff_eq(y, 1e-9), "y axis was {:?}", q * DVec3::Y);
    }

    #[test]
    fn test_horizontal_aim_keeps_y_up() {
        let q = aim_orientation(DVec3::ZERO, DVec3::new(5.0, 0.0, 0.0)).unwrap();
        assert_axes(q, DVec3::X, DVec3::Y);

        let q = aim_orientation(DVec3::ZERO, DVec3::new(0.0, 0.0, -2.0)).unwrap();
        assert_axes(q, DVec3::NEG_Z, DVec3::Y);
    }

    #[test]
    fn test_vertical_aim_falls_back_to_z() {
        let q = aim_orientation(DVec3::new(0.0, 10.0, 0.0), DVec3::new(0.0, 12.0, 0.0)).unwrap();
        assert!((q * DVec3::X).abs_diff_eq(DVec3::Y, 1e-9));
        // Secondary axis stays perpendicular to the aim.
        assert!((q * DVec3::Y).dot(DVec3::Y).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_points_have_no_aim() {
        assert_eq!(aim_orientation(DVec3::ONE, DVec3::ONE), None);
    }

    #[test]
    fn test_diagonal_aim_is_orthonormal() {
        let q = aim_orientation(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0)).unwrap();
        let x = q * DVec3::X;
        let y = q * DVec3::Y;
        assert!((x.length() - 1.0).abs() < 1e-9);
        assert!(x.dot(y).abs() < 1e-9);
        assert!(y.y > 0.0);
    }
}
