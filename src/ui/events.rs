use crate::player::{Action, PlayerMode};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::ClearType;
use crossterm::{cursor, execute, terminal};
use std::io;
use std::time::Duration;

const SEEK_STEP: f64 = 10.0;

/// What a key press asks the player to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Action(Action),
    /// Relative volume change; the loop turns it into `SetVolume`.
    VolumeStep(f32),
    /// Relative seek in seconds.
    SeekBy(f64),
    PictureInPicture,
    Snapshot,
}

pub fn key_to_command(key: KeyEvent, volume_step: f32) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),

        // Playback controls
        KeyCode::Char(' ') => Some(Command::Action(Action::TogglePlay)),
        KeyCode::Char('s') => Some(Command::Action(Action::Stop)),
        KeyCode::Char('n') | KeyCode::Right => Some(Command::Action(Action::PlayNext)),
        KeyCode::Char('b') | KeyCode::Left => Some(Command::Action(Action::PlayPrevious)),
        KeyCode::Char('r') => Some(Command::Action(Action::CycleQueueMode)),
        KeyCode::Char('x') => Some(Command::Action(Action::CycleSpeed)),
        KeyCode::Char(',') => Some(Command::SeekBy(-SEEK_STEP)),
        KeyCode::Char('.') => Some(Command::SeekBy(SEEK_STEP)),

        // Volume
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::VolumeStep(volume_step)),
        KeyCode::Char('-') => Some(Command::VolumeStep(-volume_step)),
        KeyCode::Char('m') => Some(Command::Action(Action::ToggleMute)),

        // Library filter
        KeyCode::Char('1') => Some(Command::Action(Action::SetMode(PlayerMode::Hybrid))),
        KeyCode::Char('2') => Some(Command::Action(Action::SetMode(PlayerMode::Audio))),
        KeyCode::Char('3') => Some(Command::Action(Action::SetMode(PlayerMode::Video))),

        // Frame affordances
        KeyCode::Char('p') => Some(Command::PictureInPicture),
        KeyCode::Char('c') => Some(Command::Snapshot),

        _ => None,
    }
}

/// Wait up to `timeout` for one key press worth acting on.
pub fn poll_command(timeout: Duration, volume_step: f32) -> Result<Option<Command>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) => Ok(key_to_command(key, volume_step)),
        _ => Ok(None),
    }
}

/// Redraw the single status line in place.
pub fn draw_status(line: &str) -> Result<()> {
    execute!(
        io::stdout(),
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    Ok(())
}

/// Raw mode for the lifetime of the guard; the terminal is restored on drop,
/// panics included.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new() -> Result<Self> {
        // Start from a known state in case a previous run died mid-session
        let _ = terminal::disable_raw_mode();
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), cursor::Show);
    }
}
