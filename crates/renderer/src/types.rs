use std::path::PathBuf;

use lensing::BlackHoleParams;

use crate::runtime::RenderPolicy;

/// Where rendered frames end up.
///
/// * `Terminal` previews the scene live in the current terminal using
///   truecolor half-block cells; the surface follows the terminal size.
/// * `Sequence` writes numbered PNG frames into a directory at
///   `surface_size`, stepping simulated time instead of the wall clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    Terminal,
    Sequence { directory: PathBuf },
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and tells the renderer which scene to
/// shade, how large the target surface should be, and which presentation
/// mode to use.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Framebuffer size in pixels for sequence and export output.
    pub surface_size: (u32, u32),
    /// Black hole, disk and camera parameters shared by every pixel.
    pub params: BlackHoleParams,
    /// Presentation target for animated and still policies.
    pub mode: RenderMode,
    /// High-level render behaviour requested by the caller.
    pub policy: RenderPolicy,
    /// Worker threads for pixel shading; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for RendererConfig {
    /// Provides an 800x600 terminal preview of the reference scene.
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            params: BlackHoleParams::default(),
            mode: RenderMode::Terminal,
            policy: RenderPolicy::default(),
            threads: None,
        }
    }
}
