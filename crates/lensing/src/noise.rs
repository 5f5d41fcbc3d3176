//! Deterministic lattice hashing used to scatter stars.

use glam::Vec3;

use crate::math::fract;

/// Hashes a 3D coordinate to a scalar in `[0, 1)`.
///
/// Arithmetic-only (no `sin`), so the same lattice cell produces the same
/// value on every platform and every frame.
pub fn hash13(p: Vec3) -> f32 {
    let scaled = p * 0.1031;
    let mut p3 = Vec3::new(fract(scaled.x), fract(scaled.y), fract(scaled.z));
    let swizzled = Vec3::new(p3.z, p3.y, p3.x) + Vec3::splat(31.32);
    p3 += Vec3::splat(p3.dot(swizzled));
    fract((p3.x + p3.y) * p3.z)
}
