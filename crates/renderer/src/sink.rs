use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::export::{sequence_file_name, write_surface};
use crate::runtime::ExportFormat;
use crate::surface::Surface;
use crate::uniforms::FrameUniforms;

/// Signals a sink raises back to the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    /// The presentation target changed size; render the next frame at this size.
    Resized { width: u32, height: u32 },
    /// The user asked to stop.
    Quit,
}

/// Destination for finished frames. Runs on the presenter thread.
pub trait FrameSink: Send {
    /// Shows or stores one finished frame.
    fn present(&mut self, surface: &Surface, uniforms: &FrameUniforms) -> Result<()>;

    /// Collects input and size changes since the last call.
    fn poll_events(&mut self) -> Result<Vec<SinkEvent>> {
        Ok(Vec::new())
    }

    /// Size the sink wants frames rendered at, if it dictates one.
    fn preferred_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// Writes every frame as `frame_NNNNN.png` under a directory.
#[derive(Debug)]
pub struct SequenceSink {
    directory: PathBuf,
    written: u64,
}

impl SequenceSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            written: 0,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for SequenceSink {
    fn present(&mut self, surface: &Surface, uniforms: &FrameUniforms) -> Result<()> {
        let path = self.directory.join(sequence_file_name(uniforms.frame));
        write_surface(surface, &path, ExportFormat::Png)
            .with_context(|| format!("failed to write sequence frame {}", uniforms.frame))?;
        self.written += 1;
        if self.written % 30 == 0 {
            tracing::info!(
                frames = self.written,
                time = uniforms.time,
                "sequence progress"
            );
        }
        Ok(())
    }
}
