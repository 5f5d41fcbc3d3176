use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use crate::types::RenderMode;

/// Frame rate used to step simulated time when the caller did not pick one.
pub const DEFAULT_SEQUENCE_FPS: f32 = 30.0;

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames should animate continuously,
/// be evaluated at a fixed timestamp, or be exported to disk.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Render frames continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
        /// Stop after this many frames; `None` runs until interrupted.
        frame_limit: Option<u64>,
    },
    /// Render a single still frame at an optional timestamp.
    Still {
        /// Specific timestamp to evaluate the scene at (seconds).
        time: Option<f32>,
    },
    /// Render a frame and write the result to disk.
    Export {
        /// Specific timestamp to evaluate the scene at (seconds).
        time: Option<f32>,
        /// Destination path for the exported file.
        path: PathBuf,
        /// Output format the user requested.
        format: ExportFormat,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate {
            target_fps: None,
            frame_limit: None,
        }
    }
}

impl RenderPolicy {
    /// Timestamp a single-frame policy evaluates at.
    pub fn fixed_time(&self) -> Option<f32> {
        match self {
            RenderPolicy::Animate { .. } => None,
            RenderPolicy::Still { time } | RenderPolicy::Export { time, .. } => {
                Some(time.unwrap_or(0.0))
            }
        }
    }
}

/// File formats supported by the still/export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Bmp,
}

impl ExportFormat {
    /// Guesses the format from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Bmp => "bmp",
        }
    }
}

/// Snapshot of the time state supplied to the frame uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    /// Creates a new time sample.
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    /// Creates a system time source initialised to `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
    frame: u64,
}

impl FixedTimeSource {
    /// Constructs a fixed time source that always returns the provided time.
    pub fn new(time: f32) -> Self {
        Self { time, frame: 0 }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Simulated clock advancing by exactly `1 / fps` per sample.
///
/// Offline sequences use this so frame `n` always lands on `n / fps`
/// regardless of how long rendering takes.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTimeSource {
    fps: f32,
    frame: u64,
}

impl SteppedTimeSource {
    pub fn new(fps: f32) -> Result<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            bail!("stepped time source needs a positive frame rate, got {fps}");
        }
        Ok(Self { fps, frame: 0 })
    }
}

impl TimeSource for SteppedTimeSource {
    fn sample(&mut self) -> TimeSample {
        let seconds = self.frame as f64 / f64::from(self.fps);
        let sample = TimeSample::new(seconds as f32, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy and output.
///
/// Live output follows the wall clock; sequences step simulated time so the
/// written frames are reproducible.
pub fn time_source_for_policy(
    policy: &RenderPolicy,
    mode: &RenderMode,
) -> Result<BoxedTimeSource> {
    match (policy, mode) {
        (RenderPolicy::Animate { target_fps, .. }, RenderMode::Sequence { .. }) => {
            let fps = target_fps.unwrap_or(DEFAULT_SEQUENCE_FPS);
            Ok(Box::new(SteppedTimeSource::new(fps)?))
        }
        (RenderPolicy::Animate { .. }, RenderMode::Terminal) => {
            Ok(Box::new(SystemTimeSource::new()))
        }
        (RenderPolicy::Still { .. } | RenderPolicy::Export { .. }, _) => {
            let time = policy.fixed_time().unwrap_or(0.0);
            Ok(Box::new(FixedTimeSource::new(time)))
        }
    }
}

/// Decides when the next frame may be rendered.
///
/// Animated policies are paced by an optional FPS cap and stop after an
/// optional frame limit; still and export policies produce exactly one frame.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    policy: RenderPolicy,
    interval: Option<Duration>,
    next_deadline: Option<Instant>,
    frames_rendered: u64,
}

impl FrameScheduler {
    pub fn new(policy: RenderPolicy) -> Self {
        let interval = match &policy {
            RenderPolicy::Animate {
                target_fps: Some(fps),
                ..
            } if fps.is_finite() && *fps > 0.0 => {
                Some(Duration::from_secs_f64(1.0 / f64::from(*fps)))
            }
            _ => None,
        };
        Self {
            policy,
            interval,
            next_deadline: None,
            frames_rendered: 0,
        }
    }

    /// Drops the FPS cap; offline output renders as fast as it can.
    pub fn without_pacing(mut self) -> Self {
        self.interval = None;
        self.next_deadline = None;
        self
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// True once the policy has no further frames to produce.
    pub fn is_finished(&self) -> bool {
        match &self.policy {
            RenderPolicy::Animate { frame_limit, .. } => {
                frame_limit.is_some_and(|limit| self.frames_rendered >= limit)
            }
            RenderPolicy::Still { .. } | RenderPolicy::Export { .. } => self.frames_rendered > 0,
        }
    }

    pub fn ready_for_frame(&mut self, now: Instant) -> bool {
        if self.is_finished() {
            return false;
        }
        self.next_deadline.map_or(true, |deadline| now >= deadline)
    }

    pub fn mark_rendered(&mut self) {
        self.mark_rendered_at(Instant::now());
    }

    /// Records a frame and schedules the next deadline.
    ///
    /// Deadlines advance from the previous deadline so a steady cap does not
    /// drift; after a long stall they restart from `now`.
    pub fn mark_rendered_at(&mut self, now: Instant) {
        self.frames_rendered = self.frames_rendered.saturating_add(1);
        if let Some(interval) = self.interval {
            let base = match self.next_deadline {
                Some(deadline) if now.saturating_duration_since(deadline) < interval => deadline,
                _ => now,
            };
            self.next_deadline = Some(base + interval);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }
}
