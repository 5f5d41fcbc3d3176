//! Per-pixel orchestration: camera ray, bend, shadow or sky plus disk, then
//! glow, vignette and tone mapping.

use glam::{Vec2, Vec3};

use crate::bend::bend_ray;
use crate::camera::{camera_ray, screen_to_ndc};
use crate::disk::{gravitational_redshift, intersect_disk_plane, shade_disk};
use crate::math::smoothstep;
use crate::params::BlackHoleParams;
use crate::starfield::starfield;

/// Disk hits closer than this multiple of `rs` are left unshaded.
pub const HORIZON_MARGIN: f32 = 1.05;
/// Peak opacity of the disk over the background.
pub const DISK_OPACITY: f32 = 0.85;

const SHADOW_EDGE_BRIGHTNESS: f32 = 0.06;
/// Width of the soft shadow edge as a fraction of `b_c`.
const SHADOW_EDGE_WIDTH: f32 = 0.1;

const GLOW_FALLOFF: f32 = 30.0;
const GLOW_STRENGTH: f32 = 0.35;
const GLOW_TINT: Vec3 = Vec3::new(1.0, 0.85, 0.65);

const VIGNETTE_STRENGTH: f32 = 0.4;
const VIGNETTE_START: f32 = 0.1;
const VIGNETTE_END: f32 = 1.4;

/// Shades one pixel.
///
/// `screen` is in pixels with the origin at the bottom-left, `resolution` is
/// the framebuffer size. `time` is accepted so hosts can drive animation but
/// the current model is static. The result is tone mapped into `[0, 1)`.
pub fn render_pixel(screen: Vec2, resolution: Vec2, _time: f32, params: &BlackHoleParams) -> Vec3 {
    let ndc = screen_to_ndc(screen, resolution);
    let ray = camera_ray(ndc, params);
    let deflection = bend_ray(ray.origin, ray.direction, params.schwarzschild_radius);
    let critical = params.critical_impact_parameter();

    let radiance = if deflection.captured {
        shadow_color(deflection.impact, critical)
    } else {
        composite_background(ray.origin, deflection.direction, params)
    };

    finish(radiance, deflection.impact, critical, ndc)
}

/// Near-black disc with a faint rim just inside the critical parameter.
pub fn shadow_color(impact: f32, critical: f32) -> Vec3 {
    let rim = smoothstep((1.0 - SHADOW_EDGE_WIDTH) * critical, critical, impact);
    Vec3::splat(SHADOW_EDGE_BRIGHTNESS * rim)
}

/// Lensed sky with the accretion disk blended on top where the bent ray
/// crosses it.
pub fn composite_background(origin: Vec3, bent: Vec3, params: &BlackHoleParams) -> Vec3 {
    let sky = starfield(bent);

    let Some(hit) = intersect_disk_plane(origin, bent) else {
        return sky;
    };
    let radius = Vec2::new(hit.x, hit.z).length();
    if radius <= HORIZON_MARGIN * params.schwarzschild_radius {
        return sky;
    }

    let redshift = gravitational_redshift(radius, params.schwarzschild_radius);
    let emission = shade_disk(hit, bent, params) * redshift;
    let alpha = DISK_OPACITY * (1.0 - smoothstep(params.disk_inner, params.disk_outer, radius));
    sky.lerp(emission, alpha)
}

/// Additive warm halo peaking where `impact == critical`.
pub fn photon_ring_glow(impact: f32, critical: f32) -> Vec3 {
    GLOW_TINT * ((-GLOW_FALLOFF * (impact - critical).abs()).exp() * GLOW_STRENGTH)
}

/// Radial darkening factor in `[0.6, 1.0]`.
pub fn vignette(ndc: Vec2) -> f32 {
    1.0 - VIGNETTE_STRENGTH * smoothstep(VIGNETTE_START, VIGNETTE_END, ndc.length())
}

/// Reinhard `c / (c + 1)`, per channel.
pub fn tonemap(color: Vec3) -> Vec3 {
    let color = color.max(Vec3::ZERO);
    color / (color + Vec3::ONE)
}

/// Glow, vignette and tone mapping shared by both branches.
pub fn finish(radiance: Vec3, impact: f32, critical: f32, ndc: Vec2) -> Vec3 {
    let glowing = radiance + photon_ring_glow(impact, critical);
    tonemap(glowing * vignette(ndc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bend::critical_impact_parameter;

    const SMALL: Vec2 = Vec2::new(800.0, 600.0);
    const LARGE: Vec2 = Vec2::new(1600.0, 1200.0);

    fn reference() -> BlackHoleParams {
        BlackHoleParams::new(1.0, 8.0, 1.2, 8.0)
    }

    #[test]
    fn centre_pixel_falls_into_the_shadow() {
        let color = render_pixel(Vec2::new(400.0, 300.0), SMALL, 0.0, &reference());
        assert!(
            color.max_element() < 0.02,
            "expected near-black, got {color:?}"
        );
    }

    #[test]
    fn off_axis_pixel_missing_disk_shows_plain_sky() {
        let params = reference();
        let ndc = screen_to_ndc(Vec2::new(790.0, 300.0), SMALL);
        let ray = camera_ray(ndc, &params);
        let deflection = bend_ray(ray.origin, ray.direction, params.schwarzschild_radius);
        assert!(!deflection.captured);
        assert!(deflection.impact > 2.0 * params.critical_impact_parameter());

        let composite = composite_background(ray.origin, deflection.direction, &params);
        assert_eq!(composite, starfield(deflection.direction));
    }

    #[test]
    fn proportional_coordinates_are_resolution_invariant() {
        let params = reference();
        for screen in [
            Vec2::new(400.0, 300.0),
            Vec2::new(123.5, 457.25),
            Vec2::new(10.0, 20.0),
            Vec2::new(700.5, 150.5),
            Vec2::new(530.0, 310.0),
        ] {
            let small = render_pixel(screen, SMALL, 1.0, &params);
            let large = render_pixel(screen * 2.0, LARGE, 1.0, &params);
            assert_eq!(small, large, "screen {screen:?}");
        }
    }

    #[test]
    fn inclined_camera_sees_the_disk_below_the_hole() {
        let params = reference().with_inclination_degrees(20.0);
        let ray = camera_ray(Vec2::new(0.0, -1.0), &params);
        let deflection = bend_ray(ray.origin, ray.direction, params.schwarzschild_radius);
        assert!(!deflection.captured);

        let hit = intersect_disk_plane(ray.origin, deflection.direction)
            .expect("ray should cross the disk");
        let radius = Vec2::new(hit.x, hit.z).length();
        assert!(
            radius > params.disk_inner && radius < params.disk_outer,
            "radius {radius}"
        );

        let composite = composite_background(ray.origin, deflection.direction, &params);
        assert!((composite - starfield(deflection.direction)).length() > 1e-3);
    }

    #[test]
    fn output_is_finite_and_bounded_everywhere() {
        let params = reference().with_inclination_degrees(12.0);
        for y in (0..600).step_by(37) {
            for x in (0..800).step_by(41) {
                let screen = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let color = render_pixel(screen, SMALL, 0.0, &params);
                assert!(color.is_finite());
                assert!(color.min_element() >= 0.0 && color.max_element() < 1.0);
            }
        }
    }

    #[test]
    fn invalid_geometry_still_shades() {
        let params = BlackHoleParams::new(1.0, 0.5, 3.0, 2.0);
        let color = render_pixel(Vec2::new(10.0, 10.0), SMALL, 0.0, &params);
        assert!(color.is_finite());
    }

    #[test]
    fn tonemap_is_monotonic_and_bounded() {
        let mut previous = tonemap(Vec3::ZERO);
        assert_eq!(previous, Vec3::ZERO);
        for step in 1..200 {
            let current = tonemap(Vec3::splat(step as f32 * 0.25));
            assert!(current.x > previous.x);
            assert!(current.x < 1.0);
            previous = current;
        }
    }

    #[test]
    fn glow_peaks_at_critical_parameter() {
        let critical = critical_impact_parameter(1.0);
        let peak = photon_ring_glow(critical, critical);
        assert!((peak - GLOW_TINT * GLOW_STRENGTH).length() < 1e-6);
        assert!(photon_ring_glow(critical + 0.2, critical).x < peak.x);
        assert!(photon_ring_glow(critical - 0.2, critical).x < peak.x);
        assert!(photon_ring_glow(critical + 2.0, critical).x < 1e-6);
    }

    #[test]
    fn shadow_rim_brightens_toward_critical_parameter() {
        let critical = critical_impact_parameter(1.0);
        assert_eq!(shadow_color(0.0, critical), Vec3::ZERO);
        let rim = shadow_color(0.99 * critical, critical);
        assert!(rim.x > 0.0 && rim.x <= SHADOW_EDGE_BRIGHTNESS);
    }

    #[test]
    fn vignette_darkens_corners_by_at_most_forty_percent() {
        assert_eq!(vignette(Vec2::ZERO), 1.0);
        assert!((vignette(Vec2::new(1.4, 0.0)) - 0.6).abs() < 1e-6);
        assert!((vignette(Vec2::new(3.0, 3.0)) - 0.6).abs() < 1e-6);
    }
}
