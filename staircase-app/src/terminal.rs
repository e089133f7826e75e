use std::f64::consts::TAU;
use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use staircase_core::{Response, StimulusDescriptor};
use staircase_experiment::{BoxError, Presentation, Presenter};
use staircase_timing::{HighPrecisionTimer, Timer};
use tracing::debug;

const FIXATION: Duration = Duration::from_millis(500);
const STIMULUS_ON: Duration = Duration::from_millis(250);
const PATCH_COLS: u16 = 32;
const PATCH_ROWS: u16 = 16;
/// Stripe cycles across the patch
const CYCLES: f64 = 4.0;
const MEAN_GREY: f64 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Answer(Response),
    Abort,
}

/// Maps a key press to an answer or an abort request
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Abort)
        }
        KeyCode::Esc => Some(KeyAction::Abort),
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(KeyAction::Answer(Response::Yes)),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(KeyAction::Answer(Response::No)),
        _ => None,
    }
}

/// Grey level of one patch cell: a sine grating around mid-grey whose
/// amplitude is the contrast. Absent stimuli are flat mid-grey.
pub fn patch_luminance(stimulus: &StimulusDescriptor, contrast: f64, col: u16, row: u16) -> u8 {
    let Some(theta) = stimulus.orientation_rad.filter(|_| stimulus.present) else {
        return MEAN_GREY as u8;
    };
    // Cells are roughly twice as tall as they are wide.
    let x = f64::from(col) / f64::from(PATCH_COLS);
    let y = 2.0 * f64::from(row) / f64::from(PATCH_COLS);
    let phase = TAU * CYCLES * (x * theta.cos() + y * theta.sin());
    let level = MEAN_GREY * (1.0 + contrast.clamp(0.0, 1.0) * phase.sin());
    level.round().clamp(0.0, 255.0) as u8
}

/// Keyboard-driven presenter drawing a grating patch in the terminal
pub struct TerminalPresenter<T: Timer> {
    out: Stdout,
    timer: T,
    active: bool,
}

impl TerminalPresenter<HighPrecisionTimer> {
    pub fn new() -> io::Result<Self> {
        Self::with_timer(HighPrecisionTimer::new())
    }
}

impl<T: Timer> TerminalPresenter<T> {
    /// Enters raw mode on the alternate screen until [`Presenter::cleanup`]
    pub fn with_timer(timer: T) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut presenter = Self {
            out: io::stdout(),
            timer,
            active: true,
        };
        if let Err(e) = presenter.enter() {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(presenter)
    }

    fn enter(&mut self) -> io::Result<()> {
        execute!(self.out, EnterAlternateScreen, Hide)?;
        self.message("Press Y if you saw stripes, N if not. Esc quits.")
    }

    fn origin(&self) -> io::Result<(u16, u16)> {
        let (cols, rows) = terminal::size()?;
        Ok((
            cols.saturating_sub(PATCH_COLS) / 2,
            rows.saturating_sub(PATCH_ROWS) / 2,
        ))
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor, Clear(ClearType::All))
    }

    fn message(&mut self, text: &str) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let col = cols.saturating_sub(text.len() as u16) / 2;
        self.clear()?;
        queue!(self.out, MoveTo(col, rows / 2), Print(text))?;
        self.out.flush()
    }

    fn draw_patch(&mut self, stimulus: &StimulusDescriptor, contrast: f64) -> io::Result<()> {
        let (x0, y0) = self.origin()?;
        self.clear()?;
        for row in 0..PATCH_ROWS {
            queue!(self.out, MoveTo(x0, y0 + row))?;
            for col in 0..PATCH_COLS {
                let l = patch_luminance(stimulus, contrast, col, row);
                queue!(
                    self.out,
                    SetBackgroundColor(Color::Rgb { r: l, g: l, b: l }),
                    Print(' ')
                )?;
            }
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    fn draw_fixation(&mut self) -> io::Result<()> {
        let (x0, y0) = self.origin()?;
        self.clear()?;
        queue!(
            self.out,
            MoveTo(x0 + PATCH_COLS / 2, y0 + PATCH_ROWS / 2),
            SetForegroundColor(Color::White),
            Print('+'),
            ResetColor
        )?;
        self.out.flush()
    }

    /// Discards keys pressed before stimulus onset, keeping abort requests
    fn drain_pending(&mut self) -> io::Result<bool> {
        let mut abort = false;
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                abort |= key_action(&key) == Some(KeyAction::Abort);
            }
        }
        Ok(abort)
    }
}

impl<T: Timer> Presenter for TerminalPresenter<T> {
    fn present(
        &mut self,
        stimulus: &StimulusDescriptor,
        contrast: f64,
        timeout: Duration,
    ) -> Result<Presentation, BoxError> {
        if self.drain_pending()? {
            return Ok(Presentation::Abort);
        }
        self.draw_fixation()?;
        self.timer.sleep(FIXATION);
        if self.drain_pending()? {
            return Ok(Presentation::Abort);
        }

        self.draw_patch(stimulus, contrast)?;
        let onset = self.timer.now();
        let mut showing = true;

        loop {
            let elapsed = self.timer.elapsed(onset);
            if showing && elapsed >= STIMULUS_ON {
                self.message("?")?;
                showing = false;
            }
            let Some(remaining) = timeout.checked_sub(elapsed).filter(|d| !d.is_zero()) else {
                self.clear()?;
                self.out.flush()?;
                return Ok(Presentation::TimedOut);
            };
            let wait = if showing {
                remaining.min(STIMULUS_ON.saturating_sub(elapsed))
            } else {
                remaining
            };
            if !event::poll(wait)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            match key_action(&key) {
                Some(KeyAction::Answer(response)) => {
                    let reaction_time_ms = self.timer.elapsed(onset).as_secs_f64() * 1000.0;
                    self.clear()?;
                    self.out.flush()?;
                    return Ok(Presentation::Answered {
                        response,
                        reaction_time_ms,
                    });
                }
                Some(KeyAction::Abort) => return Ok(Presentation::Abort),
                None => {}
            }
        }
    }

    fn inter_trial_wait(&mut self, duration: Duration) -> Result<(), BoxError> {
        self.clear()?;
        self.out.flush()?;
        self.timer.sleep(duration);
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), BoxError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.out, ResetColor, Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        debug!("terminal restored");
        Ok(())
    }
}
