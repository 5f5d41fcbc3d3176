//! Thin accretion disk lying in the `y = 0` plane.

use glam::{Vec2, Vec3};

use crate::math::EPSILON;
use crate::params::BlackHoleParams;

/// Smallest `|d.y|` used when intersecting the disk plane.
pub const PLANE_EPSILON: f32 = 1e-4;
/// Orbital speeds are clamped below this fraction of `c`.
pub const MAX_ORBITAL_SPEED: f32 = 0.6;
/// Global brightness applied to the Doppler-boosted disk color.
pub const DISK_BRIGHTNESS: f32 = 0.6;
/// Sub-linear exponent on the temperature blend; widens the hot core.
pub const TEMPERATURE_EXPONENT: f32 = 0.6;
/// Floor for `1 - rs/r` before the redshift square root.
pub const REDSHIFT_FLOOR: f32 = 1e-4;

const COOL_HUE: Vec3 = Vec3::new(0.95, 0.32, 0.08);
const HOT_HUE: Vec3 = Vec3::new(1.0, 0.88, 0.72);

/// Intersects a ray with the disk plane, looking forward only.
///
/// The ray is not re-bent on the way: callers pass the already deflected
/// direction and the original origin.
pub fn intersect_disk_plane(origin: Vec3, direction: Vec3) -> Option<Vec3> {
    let dy = if direction.y.abs() < PLANE_EPSILON {
        PLANE_EPSILON.copysign(direction.y)
    } else {
        direction.y
    };
    let t = -origin.y / dy;
    (t > 0.0).then(|| origin + direction * t)
}

/// Keplerian circular-orbit speed `sqrt(rs / 2r)` in units of `c`, clamped.
pub fn keplerian_speed(radius: f32, schwarzschild_radius: f32) -> f32 {
    (schwarzschild_radius / (2.0 * radius).max(EPSILON))
        .max(0.0)
        .sqrt()
        .min(MAX_ORBITAL_SPEED)
}

/// Relativistic beaming factor `(γ·(1 - v·cosθ))^-3`.
///
/// `cos_theta` is the cosine between the emitter velocity and the direction
/// toward the observer; positive values mean approaching material.
pub fn doppler_factor(speed: f32, cos_theta: f32) -> f32 {
    let inverse_gamma = (1.0 - speed * speed).max(EPSILON).sqrt();
    let shift = ((1.0 - speed * cos_theta) / inverse_gamma).max(EPSILON);
    shift.powi(-3)
}

/// Dimming of light climbing out of the potential well, `sqrt(1 - rs/r)`.
pub fn gravitational_redshift(radius: f32, schwarzschild_radius: f32) -> f32 {
    (1.0 - schwarzschild_radius / radius.max(EPSILON))
        .max(REDSHIFT_FLOOR)
        .sqrt()
}

/// Emission of the disk at `point` as seen along `direction`.
///
/// Returns zero outside the `[disk_inner, disk_outer]` annulus.
pub fn shade_disk(point: Vec3, direction: Vec3, params: &BlackHoleParams) -> Vec3 {
    let radius = Vec2::new(point.x, point.z).length();
    if radius < params.disk_inner || radius > params.disk_outer {
        return Vec3::ZERO;
    }

    let speed = keplerian_speed(radius, params.schwarzschild_radius);
    // Disk material orbits counter-clockwise about +y.
    let tangent = Vec3::new(-point.z, 0.0, point.x).normalize_or_zero();
    let cos_theta = tangent.dot(-direction);
    let beaming = doppler_factor(speed, cos_theta);

    let span = (params.disk_outer - params.disk_inner).max(EPSILON);
    let temperature = ((params.disk_outer - radius) / span).clamp(0.0, 1.0);
    let hue = COOL_HUE.lerp(HOT_HUE, temperature.powf(TEMPERATURE_EXPONENT));

    hue * beaming * DISK_BRIGHTNESS
}
