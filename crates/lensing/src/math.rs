//! Scalar helpers that mirror the GLSL built-ins the shading code leans on.

/// Guard applied to denominators that could otherwise collapse to zero.
pub const EPSILON: f32 = 1e-6;

/// Hermite interpolation between two edges, matching GLSL `smoothstep`.
///
/// Reversed edges (`edge0 > edge1`) produce the mirrored falloff, which is
/// how the shader expresses "1 inside, 0 outside" ramps.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span.abs() < EPSILON {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Fractional part with GLSL semantics (`x - floor(x)`), always in `[0, 1)`.
pub fn fract(x: f32) -> f32 {
    let f = x - x.floor();
    // Tiny negative inputs round up to exactly 1.0.
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}
