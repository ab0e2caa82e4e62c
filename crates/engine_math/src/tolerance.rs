//! Per-component absolute tolerance checks.
//!
//! Two values are considered different when any single component differs by
//! at least `epsilon`, regardless of the Euclidean distance between them.

use glam::{Quat, Vec3, Vec4};

/// Returns `true` if any component of `a` and `b` differs by `>= epsilon`.
#[must_use]
pub fn vec3_differs(a: Vec3, b: Vec3, epsilon: f32) -> bool {
    (a - b).abs().max_element() >= epsilon
}

/// Returns `true` if any of the four quaternion components differ by
/// `>= epsilon`.
///
/// `b` is first flipped into the same hemisphere as `a`, so `q` and `-q`
/// compare as equal.
#[must_use]
pub fn quat_differs(a: Quat, b: Quat, epsilon: f32) -> bool {
    let b = if a.dot(b) < 0.0 { -b } else { b };
    (Vec4::from(a) - Vec4::from(b)).abs().max_element() >= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_do_not_differ() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(!vec3_differs(v, v, 0.001));
    }

    #[test]
    fn test_small_drift_below_epsilon() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(1.0005, 2.0, 2.9995);
        assert!(!vec3_differs(a, b, 0.001));
    }

    #[test]
    fn test_single_axis_drift_at_epsilon() {
        let a = Vec3::ZERO;
        let b = Vec3::new(0.0, 0.5, 0.0);
        assert!(vec3_differs(a, b, 0.5));
    }

    #[test]
    fn test_quaternion_components_compared() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(0.1);
        assert!(quat_differs(a, b, 0.001));
        assert!(!quat_differs(a, a, 0.001));
    }

    #[test]
    fn test_negated_quaternion_is_same_rotation() {
        let q = Quat::from_rotation_y(-2.0);
        assert!(!quat_differs(q, -q, 0.001));
        assert!(!quat_differs(-q, q, 0.001));
        assert!(quat_differs(q, -Quat::from_rotation_y(-1.9), 0.001));
    }
}
