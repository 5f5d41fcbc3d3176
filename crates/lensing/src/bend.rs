//! Weak-field light bending and horizon capture.
//!
//! Each camera ray is bent exactly once: the straight-line impact parameter
//! decides capture, and surviving rays are rotated toward the hole by the
//! small-angle deflection `2·rs/b`. The approximation is knowingly wrong close
//! to the critical impact parameter; it is not iterated or corrected.

use glam::Vec3;

use crate::math::EPSILON;

/// `3√3 / 2`, the Schwarzschild photon-capture threshold in units of `rs`.
pub const CRITICAL_IMPACT_FACTOR: f32 = 2.598_076_2;

/// Outcome of bending a single ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deflection {
    /// True when the ray falls below the critical impact parameter.
    ///
    /// Callers must branch on this flag; a captured ray keeps its original
    /// direction, which is meaningless for shading.
    pub captured: bool,
    /// Direction after deflection (unchanged when captured).
    pub direction: Vec3,
    /// Straight-line impact parameter `|o × d|` of the incoming ray.
    pub impact: f32,
}

/// Perpendicular distance between the hole (at the origin) and the ray line.
pub fn impact_parameter(origin: Vec3, direction: Vec3) -> f32 {
    origin.cross(direction).length()
}

/// Critical impact parameter `(3√3/2)·rs`.
pub fn critical_impact_parameter(schwarzschild_radius: f32) -> f32 {
    CRITICAL_IMPACT_FACTOR * schwarzschild_radius
}

/// Small-angle deflection `2·rs/b` for a ray passing at impact parameter `b`.
pub fn deflection_angle(schwarzschild_radius: f32, impact: f32) -> f32 {
    2.0 * schwarzschild_radius / impact.max(EPSILON)
}

/// Tests the ray against the photon sphere and bends it once if it escapes.
///
/// `direction` is expected to be unit length.
pub fn bend_ray(origin: Vec3, direction: Vec3, schwarzschild_radius: f32) -> Deflection {
    let impact = impact_parameter(origin, direction);

    if impact < critical_impact_parameter(schwarzschild_radius) {
        return Deflection {
            captured: true,
            direction,
            impact,
        };
    }

    // A ray aimed straight through the hole has no rotation plane.
    let Some(axis) = origin.cross(direction).try_normalize() else {
        return Deflection {
            captured: false,
            direction,
            impact,
        };
    };

    let angle = deflection_angle(schwarzschild_radius, impact);
    Deflection {
        captured: false,
        direction: rotate_about_axis(direction, axis, angle),
        impact,
    }
}

/// Rodrigues' rotation of `v` about the unit `axis` by `angle` radians.
///
/// With `axis = normalize(o × d)` a positive angle turns `d` toward the origin.
pub fn rotate_about_axis(v: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * axis.dot(v) * (1.0 - cos)
}
