//! Per-pixel shading kernel for a stylised Schwarzschild black hole.
//!
//! Every function here is pure and works on `glam` vectors in `f32`, the same
//! way a fragment shader would. Hosts call [`render_pixel`] once per output
//! pixel per frame; pixels never depend on one another. The flow is:
//!
//! ```text
//!   screen xy ──▶ screen_to_ndc ──▶ camera_ray ──▶ bend_ray
//!                                                    │
//!                       captured ◀───────────────────┴──────────▶ escaped
//!                          │                                        │
//!                    shadow_color                      starfield ∪ shade_disk
//!                          │                                        │
//!                          └──────────▶ finish (glow, vignette, tonemap)
//! ```
//!
//! Light bending is a single weak-field rotation (`2·rs/b`) rather than a
//! geodesic integration. Nothing in the kernel returns errors: degenerate
//! inputs are epsilon-guarded and produce odd-looking colors instead of
//! panics, so geometry validation belongs to the host.

pub mod bend;
pub mod camera;
pub mod disk;
pub mod math;
pub mod noise;
pub mod params;
pub mod shade;
pub mod starfield;

pub use bend::{bend_ray, critical_impact_parameter, Deflection};
pub use camera::{camera_ray, screen_to_ndc, Ray};
pub use disk::{doppler_factor, gravitational_redshift, intersect_disk_plane, shade_disk};
pub use noise::hash13;
pub use params::BlackHoleParams;
pub use shade::{render_pixel, tonemap};
pub use starfield::starfield;

/// Re-exported so hosts can build inputs without naming `glam` themselves.
pub use glam::{Vec2, Vec3};
