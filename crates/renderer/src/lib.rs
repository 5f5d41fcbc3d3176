//! CPU renderer for the `lensing` black-hole kernel.
//!
//! The crate owns everything around the per-pixel shader: frame sizing, time
//! sources, pacing, parallel shading, and getting pixels somewhere useful
//! (a terminal preview, a numbered PNG sequence, or a single exported still).
//! The overall flow is:
//!
//! ```text
//!   CLI / eventhorizon
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ run_frame_loop ──▶ FrameDriver::render (rayon rows)
//!          │                 │                      │
//!          │                 │        Frame ────────┘
//!          │                 ▼
//!          │          presenter thread ──▶ FrameSink (terminal | sequence)
//!          │                 └──── recycled Surface ◀──┘
//!          ▼
//!   Export policy ──▶ render_still ──▶ write_surface (png | bmp)
//! ```
//!
//! `FrameUniforms` is rebuilt in full before each frame and shared read-only
//! by every shading worker. Two `Surface`s ping-pong between the driver and
//! the presenter so shading the next frame overlaps presenting the last one.

mod driver;
pub mod export;
mod runtime;
mod sink;
mod surface;
pub mod terminal;
mod types;
mod uniforms;

use anyhow::{Context, Result};
use tracing::info;

pub use driver::{FrameDriver, RunStats};
pub use export::{write_surface, ExportError};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, ExportFormat, FixedTimeSource, FrameScheduler,
    RenderPolicy, SteppedTimeSource, SystemTimeSource, TimeSample, TimeSource,
    DEFAULT_SEQUENCE_FPS,
};
pub use sink::{FrameSink, SequenceSink, SinkEvent};
pub use surface::Surface;
pub use types::{RenderMode, RendererConfig};
pub use uniforms::FrameUniforms;

use driver::{run_frame_loop, Linger, RenderPolicyDriver};
use terminal::{TerminalSession, TerminalSink};

/// Entry point that owns the configuration and chooses the output path.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Creates a new renderer from a fully-populated configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Runs the renderer until the policy completes or the user quits.
    pub fn run(&mut self) -> Result<RunStats> {
        match &self.config.policy {
            RenderPolicy::Export { path, format, .. } => {
                let started = std::time::Instant::now();
                let surface = self.render_still()?;
                let written = write_surface(&surface, path, *format).with_context(|| {
                    format!("failed to export still frame to {}", path.display())
                })?;
                info!(
                    path = %written.display(),
                    width = surface.width(),
                    height = surface.height(),
                    "exported still frame"
                );
                Ok(RunStats {
                    frames: 1,
                    elapsed: started.elapsed(),
                })
            }
            _ => match self.config.mode.clone() {
                RenderMode::Terminal => self.run_terminal(),
                RenderMode::Sequence { directory } => {
                    self.run_sequence(SequenceSink::new(directory))
                }
            },
        }
    }

    /// Shades a single frame at the policy's fixed time (zero when animating).
    pub fn render_still(&self) -> Result<Surface> {
        let (width, height) = self.config.surface_size;
        let driver = FrameDriver::new(self.config.params, self.config.threads)?;
        let time = self.config.policy.fixed_time().unwrap_or(0.0);
        let sample = TimeSample::new(time, 0);
        let uniforms = FrameUniforms::new(width, height).advance(sample, width, height);
        let mut surface = Surface::new(width, height);
        driver.render(&mut surface, &uniforms);
        Ok(surface)
    }

    fn run_terminal(&self) -> Result<RunStats> {
        let session = TerminalSession::enter().context("failed to prepare terminal for preview")?;
        let linger = match self.config.policy {
            RenderPolicy::Still { .. } => Linger::UntilQuit,
            _ => Linger::Exit,
        };
        self.run_loop(Box::new(TerminalSink::new(session)), linger)
    }

    fn run_sequence(&self, sink: SequenceSink) -> Result<RunStats> {
        if let RenderPolicy::Animate { frame_limit: None, .. } = self.config.policy {
            anyhow::bail!("sequence output needs a frame limit or duration");
        }
        info!(directory = %sink.directory().display(), "writing frame sequence");
        self.run_loop(Box::new(sink), Linger::Exit)
    }

    fn run_loop(&self, sink: Box<dyn FrameSink>, linger: Linger) -> Result<RunStats> {
        let driver = FrameDriver::new(self.config.params, self.config.threads)?;
        let policy = RenderPolicyDriver::new(self.config.policy.clone(), &self.config.mode)?;
        run_frame_loop(&driver, policy, sink, self.config.surface_size, linger)
    }
}
