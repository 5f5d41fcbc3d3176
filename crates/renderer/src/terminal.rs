//! Live preview in a truecolor terminal.
//!
//! Each character cell shows two vertically stacked pixels: the upper half
//! block `▀` is painted with the top pixel as foreground and the bottom pixel
//! as background, so a `cols x rows` terminal displays `cols x 2·rows` pixels.

use std::fmt::Write as _;
use std::io::{self, BufWriter, Stdout, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::ResetColor;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::sink::{FrameSink, SinkEvent};
use crate::surface::Surface;
use crate::uniforms::FrameUniforms;

const UPPER_HALF_BLOCK: char = '▀';
/// Rows reserved below the picture for the status line.
const STATUS_ROWS: u16 = 1;

/// RAII guard for raw mode and the alternate screen.
///
/// Dropping the session restores the terminal on every exit path, including
/// errors and panics that unwind through the presenter thread.
pub struct TerminalSession {
    out: BufWriter<Stdout>,
    columns: u16,
    rows: u16,
    raw: bool,
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        let mut session = Self {
            out: BufWriter::new(io::stdout()),
            columns: 0,
            rows: 0,
            raw: false,
        };
        execute!(
            session.out,
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;
        session.raw = true;
        let (columns, rows) = terminal::size()?;
        session.columns = columns;
        session.rows = rows;
        Ok(session)
    }

    /// Pixel size of the picture area below which the status line sits.
    pub fn surface_size(&self) -> (u32, u32) {
        surface_size_for_cells(self.columns, self.rows)
    }

    /// Re-reads the terminal size. Returns `true` when it changed.
    pub fn refresh_size(&mut self) -> io::Result<bool> {
        let (columns, rows) = terminal::size()?;
        Ok(self.record_size(columns, rows))
    }

    fn record_size(&mut self, columns: u16, rows: u16) -> bool {
        if (columns, rows) == (self.columns, self.rows) {
            return false;
        }
        self.columns = columns;
        self.rows = rows;
        true
    }

    /// Draws pre-encoded rows and a status line.
    pub fn draw(&mut self, lines: &[String], status: &str) -> io::Result<()> {
        let visible = self.rows.saturating_sub(STATUS_ROWS) as usize;
        for (row, line) in lines.iter().enumerate().take(visible) {
            queue!(self.out, MoveTo(0, row as u16))?;
            self.out.write_all(line.as_bytes())?;
        }
        queue!(
            self.out,
            ResetColor,
            MoveTo(0, self.rows.saturating_sub(STATUS_ROWS)),
            Clear(ClearType::CurrentLine)
        )?;
        let status: String = status.chars().take(self.columns as usize).collect();
        self.out.write_all(status.as_bytes())?;
        self.out.flush()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.out.flush();
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
    }
}

/// Pixel dimensions shown by a terminal of `columns x rows` cells.
pub fn surface_size_for_cells(columns: u16, rows: u16) -> (u32, u32) {
    let picture_rows = rows.saturating_sub(STATUS_ROWS).max(1);
    (u32::from(columns.max(1)), u32::from(picture_rows) * 2)
}

/// Encodes a surface as truecolor half-block rows, one string per cell row.
///
/// An odd final pixel row is paired with black.
pub fn encode_half_blocks(surface: &Surface) -> Vec<String> {
    let (width, height) = surface.size();
    let mut lines = Vec::with_capacity(height.div_ceil(2) as usize);
    for top in (0..height).step_by(2) {
        let mut line = String::with_capacity(width as usize * 40);
        for x in 0..width {
            let [tr, tg, tb] = surface.rgb8(x, top);
            let [br, bg, bb] = if top + 1 < height {
                surface.rgb8(x, top + 1)
            } else {
                [0, 0, 0]
            };
            let _ = write!(
                line,
                "\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m{UPPER_HALF_BLOCK}"
            );
        }
        line.push_str("\x1b[0m");
        lines.push(line);
    }
    lines
}

/// `q`, `Esc` and `Ctrl-C` all end the preview.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Frame sink that draws into a [`TerminalSession`].
pub struct TerminalSink {
    session: TerminalSession,
    last_present: Option<Instant>,
    fps: f32,
}

impl TerminalSink {
    pub fn new(session: TerminalSession) -> Self {
        Self {
            session,
            last_present: None,
            fps: 0.0,
        }
    }

    fn status_line(&self, surface: &Surface, uniforms: &FrameUniforms) -> String {
        format!(
            " frame {:>6}  t={:>7.2}s  {:>5.1} fps  {}x{}  [q] quit",
            uniforms.frame,
            uniforms.time,
            self.fps,
            surface.width(),
            surface.height()
        )
    }
}

impl FrameSink for TerminalSink {
    fn present(&mut self, surface: &Surface, uniforms: &FrameUniforms) -> Result<()> {
        let now = Instant::now();
        if let Some(previous) = self.last_present.replace(now) {
            let elapsed = now.duration_since(previous).as_secs_f32();
            if elapsed > 0.0 {
                // Exponential smoothing keeps the readout legible.
                self.fps = self.fps * 0.8 + 0.2 / elapsed;
            }
        }
        let lines = encode_half_blocks(surface);
        let status = self.status_line(surface, uniforms);
        self.session
            .draw(&lines, &status)
            .context("failed to draw terminal frame")
    }

    fn poll_events(&mut self) -> Result<Vec<SinkEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO).context("failed to poll terminal input")? {
            match event::read().context("failed to read terminal input")? {
                Event::Key(key) if is_quit_key(&key) => events.push(SinkEvent::Quit),
                Event::Resize(columns, rows) => {
                    if self.session.record_size(columns, rows) {
                        let (width, height) = self.session.surface_size();
                        events.push(SinkEvent::Resized { width, height });
                    }
                }
                _ => {}
            }
        }
        // Some terminals never deliver resize events.
        let refreshed = self
            .session
            .refresh_size()
            .context("failed to query terminal size")?;
        if refreshed {
            let (width, height) = self.session.surface_size();
            events.push(SinkEvent::Resized { width, height });
        }
        Ok(events)
    }

    fn preferred_size(&self) -> Option<(u32, u32)> {
        Some(self.session.surface_size())
    }
}
