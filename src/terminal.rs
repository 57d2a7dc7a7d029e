use crate::input::InputSource;
use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::collections::HashMap;
use std::io::{stdout, Stdout, Write};
use std::time::{Duration, Instant};

/// Without release events a key counts as held until its auto-repeat stops.
const REPEAT_HOLD_WINDOW: Duration = Duration::from_millis(550);
const RELEASE_HOLD_WINDOW: Duration = Duration::from_secs(10);

pub struct TerminalGuard {
    key_release_events: bool,
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Create the guard immediately so Drop will disable raw mode if
        // any subsequent setup step fails.
        let mut guard = Self {
            key_release_events: false,
        };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            out.execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))
            .context("enable key release events")?;
            guard.key_release_events = true;
        }

        Ok(guard)
    }

    pub fn key_release_events(&self) -> bool {
        self.key_release_events
    }

    pub fn stdout() -> Stdout {
        stdout()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = stdout();
        if self.key_release_events {
            let _ = out.execute(PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
        let _ = out.write_all(b"\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
    }
}

/// Keyboard state reconstructed from crossterm key events.
pub struct TerminalInput {
    held: HashMap<String, Instant>,
    pressed: Vec<String>,
    hold_window: Duration,
    quit: bool,
}

impl TerminalInput {
    pub fn new(key_release_events: bool) -> Self {
        Self {
            held: HashMap::new(),
            pressed: Vec::new(),
            hold_window: if key_release_events {
                RELEASE_HOLD_WINDOW
            } else {
                REPEAT_HOLD_WINDOW
            },
            quit: false,
        }
    }

    /// Drains pending events without blocking.
    pub fn pump(&mut self) -> anyhow::Result<()> {
        self.pressed.clear();
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(k) = event::read()? else {
                continue;
            };
            if k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c')) {
                self.quit = true;
                continue;
            }
            let Some(name) = control_name(k.code) else {
                continue;
            };
            self.apply(&name, k.kind, Instant::now());
        }
        Ok(())
    }

    fn apply(&mut self, name: &str, kind: KeyEventKind, now: Instant) {
        match kind {
            KeyEventKind::Press => {
                if !self.is_engaged_at(name, now) {
                    self.pressed.push(name.to_string());
                }
                self.held.insert(name.to_string(), now);
            }
            KeyEventKind::Repeat => {
                self.held.insert(name.to_string(), now);
            }
            KeyEventKind::Release => {
                self.held.remove(name);
            }
        }
    }

    fn is_engaged_at(&self, control: &str, now: Instant) -> bool {
        self.held
            .get(control)
            .is_some_and(|t| now.duration_since(*t) <= self.hold_window)
    }

    pub fn was_pressed(&self, control: &str) -> bool {
        self.pressed.iter().any(|p| p == control)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

impl InputSource for TerminalInput {
    // A tap that was pressed and released within one frame still counts once.
    fn is_engaged(&self, control: &str) -> bool {
        self.was_pressed(control) || self.is_engaged_at(control, Instant::now())
    }
}

fn control_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_lowercase().to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };
    Some(name)
}
