//! Procedural sky behind the black hole.

use glam::Vec3;

use crate::math::smoothstep;
use crate::noise::hash13;

/// Cells per unit direction; higher values give smaller, denser stars.
const STAR_LATTICE: f32 = 180.0;
/// Cells whose hash falls below this never light up.
const STAR_THRESHOLD: f32 = 0.985;
const STAR_SHARPNESS: f32 = 8.0;
const STAR_GAIN: f32 = 1.6;
const NEBULA_LATTICE: f32 = 4.0;
const NEBULA_TINT: Vec3 = Vec3::new(0.025, 0.012, 0.04);

/// Maps a view direction to a background color.
///
/// The direction does not need to be normalized. Output is never negative
/// and may exceed 1.0 for bright stars; tone mapping happens later.
pub fn starfield(direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    let cell = (dir * STAR_LATTICE).floor();

    let density = hash13(cell);
    let glow = smoothstep(STAR_THRESHOLD, 1.0, density);
    let star = glow.powf(STAR_SHARPNESS) * STAR_GAIN;
    let tint = Vec3::new(
        1.0,
        0.75 + 0.25 * hash13(cell + Vec3::splat(17.0)),
        0.65 + 0.35 * hash13(cell + Vec3::splat(43.0)),
    );

    let haze = hash13((dir * NEBULA_LATTICE).floor());
    tint * star + NEBULA_TINT * haze
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_directions() -> impl Iterator<Item = Vec3> {
        (0..40).flat_map(|i| {
            (0..40).map(move |j| {
                let theta = i as f32 * 0.157;
                let phi = j as f32 * 0.0785;
                Vec3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin())
            })
        })
    }

    #[test]
    fn repeated_lookups_are_identical() {
        for dir in sample_directions().take(200) {
            assert_eq!(starfield(dir), starfield(dir));
        }
    }

    #[test]
    fn normalisation_happens_inside() {
        let dir = Vec3::new(0.3, -0.2, -0.9);
        let a = starfield(dir);
        let b = starfield(dir * 7.5);
        assert!((a - b).abs().max_element() < 1e-6);
    }

    #[test]
    fn colors_are_never_negative() {
        for dir in sample_directions() {
            let color = starfield(dir);
            assert!(color.min_element() >= 0.0, "negative channel in {color:?}");
        }
    }

    #[test]
    fn sky_is_mostly_dark_with_some_stars() {
        let samples: Vec<Vec3> = sample_directions().map(starfield).collect();
        let bright = samples.iter().filter(|c| c.max_element() > 0.2).count();
        assert!(
            bright < samples.len() / 10,
            "{bright} bright samples is too dense"
        );
        assert!(samples.iter().all(|c| c.max_element() <= STAR_GAIN + 0.1));
    }

    #[test]
    fn zero_direction_does_not_panic() {
        let color = starfield(Vec3::ZERO);
        assert!(color.is_finite());
    }
}
