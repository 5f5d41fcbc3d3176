use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use lensing::{render_pixel, BlackHoleParams, Vec2};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::runtime::{
    time_source_for_policy, BoxedTimeSource, FrameScheduler, RenderPolicy, TimeSample,
};
use crate::sink::{FrameSink, SinkEvent};
use crate::surface::Surface;
use crate::types::RenderMode;
use crate::uniforms::FrameUniforms;

/// How long the presenter waits for a frame before polling input again.
const PRESENTER_POLL: Duration = Duration::from_millis(30);
/// Longest single sleep while waiting for a frame deadline or a quit key.
const IDLE_SLEEP: Duration = Duration::from_millis(20);

/// Shades whole frames on the CPU.
///
/// Rows are handed to rayon workers; every pixel reads the same immutable
/// `FrameUniforms` and `BlackHoleParams` and writes only its own slot.
pub struct FrameDriver {
    params: BlackHoleParams,
    pool: Option<ThreadPool>,
}

impl FrameDriver {
    /// `threads` caps the worker count with a dedicated pool; `None` shares
    /// rayon's global pool.
    pub fn new(params: BlackHoleParams, threads: Option<usize>) -> Result<Self> {
        let pool = match threads {
            Some(count) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(count.max(1))
                    .thread_name(|index| format!("eventhorizon-shade-{index}"))
                    .build()
                    .context("failed to build shading thread pool")?,
            ),
            None => None,
        };
        Ok(Self { params, pool })
    }

    /// Fills every pixel of `surface`.
    pub fn render(&self, surface: &mut Surface, uniforms: &FrameUniforms) {
        match &self.pool {
            Some(pool) => pool.install(|| shade_surface(surface, uniforms, &self.params)),
            None => shade_surface(surface, uniforms, &self.params),
        }
    }
}

fn shade_surface(surface: &mut Surface, uniforms: &FrameUniforms, params: &BlackHoleParams) {
    let (width, height) = surface.size();
    let resolution = uniforms.resolution_vec();
    let time = uniforms.time;
    surface
        .pixels_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(row, pixels)| {
            // Row 0 is the top of the image; shading space has y pointing up.
            let y = (height as usize - 1 - row) as f32 + 0.5;
            for (x, pixel) in pixels.iter_mut().enumerate() {
                *pixel = render_pixel(Vec2::new(x as f32 + 0.5, y), resolution, time, params);
            }
        });
}

/// A finished frame travelling to the presenter.
struct Frame {
    surface: Surface,
    uniforms: FrameUniforms,
}

/// Presenter thread plus the channels that make up the double buffer.
///
/// Two surfaces circulate: the driver renders into whichever one the
/// presenter has handed back while the other is being shown.
struct Presenter {
    frames: Option<Sender<Frame>>,
    recycled: Receiver<Surface>,
    events: Receiver<SinkEvent>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl Presenter {
    fn spawn(sink: Box<dyn FrameSink>, size: (u32, u32)) -> Result<Self> {
        let (frame_tx, frame_rx) = bounded::<Frame>(1);
        let (recycle_tx, recycle_rx) = bounded::<Surface>(2);
        let (event_tx, event_rx) = unbounded();

        for _ in 0..2 {
            recycle_tx
                .send(Surface::new(size.0, size.1))
                .map_err(|err| anyhow!("failed to seed frame buffers: {err}"))?;
        }

        let handle = thread::Builder::new()
            .name("eventhorizon-present".into())
            .spawn(move || run_presenter(sink, frame_rx, recycle_tx, event_tx))
            .map_err(|err| anyhow!("failed to spawn presenter thread: {err}"))?;

        Ok(Self {
            frames: Some(frame_tx),
            recycled: recycle_rx,
            events: event_rx,
            join_handle: Some(handle),
        })
    }

    /// Waits for a back buffer. `None` means the presenter has exited.
    fn acquire(&self) -> Option<Surface> {
        self.recycled.recv().ok()
    }

    fn submit(&self, frame: Frame) -> bool {
        self.frames
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }

    fn drain_events(&self) -> Vec<SinkEvent> {
        self.events.try_iter().collect()
    }

    /// Closes the frame channel and joins the presenter, surfacing its error.
    fn finish(mut self) -> Result<()> {
        self.frames.take();
        match self.join_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|err| anyhow!("presenter thread panicked: {err:?}"))?,
            None => Ok(()),
        }
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        self.frames.take();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_presenter(
    mut sink: Box<dyn FrameSink>,
    frames: Receiver<Frame>,
    recycle: Sender<Surface>,
    events: Sender<SinkEvent>,
) -> Result<()> {
    loop {
        match frames.recv_timeout(PRESENTER_POLL) {
            Ok(frame) => {
                sink.present(&frame.surface, &frame.uniforms)?;
                // The driver may already be gone; the buffer is simply dropped then.
                let _ = recycle.send(frame.surface);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        for event in sink.poll_events()? {
            if events.send(event).is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Couples the frame scheduler with the time source for one policy.
pub(crate) struct RenderPolicyDriver {
    scheduler: FrameScheduler,
    time_source: BoxedTimeSource,
}

impl RenderPolicyDriver {
    pub(crate) fn new(policy: RenderPolicy, mode: &RenderMode) -> Result<Self> {
        let scheduler = FrameScheduler::new(policy.clone());
        let scheduler = match mode {
            RenderMode::Sequence { .. } => scheduler.without_pacing(),
            RenderMode::Terminal => scheduler,
        };
        Ok(Self {
            scheduler,
            time_source: time_source_for_policy(&policy, mode)?,
        })
    }

    pub(crate) fn sample(&mut self) -> TimeSample {
        self.time_source.sample()
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.scheduler.mark_rendered();
    }

    pub(crate) fn ready_for_frame(&mut self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub(crate) fn frames_rendered(&self) -> u64 {
        self.scheduler.frames_rendered()
    }
}

/// Whether the loop should keep the sink open after the policy runs out of
/// frames, e.g. to leave a still image on screen until the user quits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Linger {
    UntilQuit,
    Exit,
}

/// Summary of a finished presentation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub elapsed: Duration,
}

/// Renders frames into `sink` until the policy is exhausted or the sink asks
/// to quit.
///
/// While lingering on a finished still, a resize re-renders the frame once at
/// the new size.
pub(crate) fn run_frame_loop(
    frame_driver: &FrameDriver,
    mut policy: RenderPolicyDriver,
    sink: Box<dyn FrameSink>,
    initial_size: (u32, u32),
    linger: Linger,
) -> Result<RunStats> {
    let started = Instant::now();
    let mut size = sink.preferred_size().unwrap_or(initial_size);
    let presenter = Presenter::spawn(sink, size)?;
    let mut uniforms = FrameUniforms::new(size.0, size.1);
    let mut pending_resize = false;

    // Loop lifecycle logs stay at debug while the sink may own the terminal.
    debug!(width = size.0, height = size.1, "frame loop started");

    loop {
        let mut quit = false;
        for event in presenter.drain_events() {
            match event {
                SinkEvent::Quit => quit = true,
                SinkEvent::Resized { width, height } => {
                    debug!(width, height, "presentation target resized");
                    pending_resize |= size != (width, height);
                    size = (width, height);
                }
            }
        }
        if quit {
            debug!("quit requested");
            break;
        }

        let refresh_still = pending_resize && linger == Linger::UntilQuit;
        if policy.is_finished() && !refresh_still {
            if linger == Linger::Exit {
                break;
            }
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        let now = Instant::now();
        if !policy.is_finished() && !policy.ready_for_frame(now) {
            let wait = policy
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(now))
                .unwrap_or(IDLE_SLEEP);
            thread::sleep(wait.min(IDLE_SLEEP));
            continue;
        }

        let Some(mut surface) = presenter.acquire() else {
            break;
        };
        if surface.resize(size.0, size.1) {
            debug!(width = size.0, height = size.1, "reallocated back buffer");
        }

        let sample = policy.sample();
        uniforms = uniforms.advance(sample, surface.width(), surface.height());
        frame_driver.render(&mut surface, &uniforms);

        if !presenter.submit(Frame { surface, uniforms }) {
            break;
        }
        pending_resize = false;
        policy.mark_rendered();
    }

    let frames = policy.frames_rendered();
    presenter.finish()?;
    let elapsed = started.elapsed();
    info!(frames, elapsed = ?elapsed, "frame loop finished");
    Ok(RunStats { frames, elapsed })
}
