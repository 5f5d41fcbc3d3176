//! Pinhole camera looking at the hole from the +z side.

use glam::{Quat, Vec2, Vec3};

use crate::params::BlackHoleParams;

/// Distance from the pinhole to the image plane in NDC units.
pub const FOCAL_LENGTH: f32 = 1.5;

/// A primary ray leaving the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

/// Converts a pixel coordinate into aspect-corrected normalized device
/// coordinates. `y` spans `[-1, 1]`; `x` spans `[-aspect, aspect]`.
pub fn screen_to_ndc(screen: Vec2, resolution: Vec2) -> Vec2 {
    let resolution = resolution.max(Vec2::ONE);
    let mut ndc = screen / resolution * 2.0 - Vec2::ONE;
    ndc.x *= resolution.x / resolution.y;
    ndc
}

/// Builds the primary ray through `ndc`.
///
/// With zero inclination the camera sits at `(0, 0, camera_distance)` and looks
/// down -z; otherwise the whole rig is tilted about the x axis so the camera
/// rises above the disk plane while still aiming at the hole.
pub fn camera_ray(ndc: Vec2, params: &BlackHoleParams) -> Ray {
    let origin = Vec3::new(0.0, 0.0, params.camera_distance);
    let direction = Vec3::new(ndc.x, ndc.y, -FOCAL_LENGTH).normalize();
    if params.camera_inclination == 0.0 {
        return Ray { origin, direction };
    }

    let tilt = Quat::from_rotation_x(-params.camera_inclination);
    Ray {
        origin: tilt * origin,
        direction: tilt * direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_pixel_maps_to_origin() {
        let ndc = screen_to_ndc(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));
        assert_eq!(ndc, Vec2::ZERO);
    }

    #[test]
    fn horizontal_extent_is_aspect_corrected() {
        let resolution = Vec2::new(800.0, 600.0);
        let right = screen_to_ndc(Vec2::new(800.0, 600.0), resolution);
        assert!((right.x - 4.0 / 3.0).abs() < 1e-6);
        assert!((right.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_resolution_is_clamped() {
        let ndc = screen_to_ndc(Vec2::new(0.5, 0.5), Vec2::ZERO);
        assert!(ndc.is_finite());
    }

    #[test]
    fn edge_on_camera_looks_down_negative_z() {
        let ray = camera_ray(Vec2::ZERO, &BlackHoleParams::default());
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 8.0));
        assert_eq!(ray.direction, Vec3::NEG_Z);
    }

    #[test]
    fn inclined_camera_sits_above_the_disk_and_aims_at_the_hole() {
        let params = BlackHoleParams::default().with_inclination_degrees(30.0);
        let ray = camera_ray(Vec2::ZERO, &params);
        assert!(ray.origin.y > 0.0);
        assert!((ray.origin.length() - 8.0).abs() < 1e-4);
        let to_hole = (-ray.origin).normalize();
        assert!(ray.direction.dot(to_hole) > 0.9999);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }
}
