//! Keyboard fallback for machines without a wired panel.
//!
//! Keys `q`, `1`-`4` stand in for buttons 0-4; there are no LEDs to drive.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::error::{Result, TeachableError};
use crate::ui::{Ui, NUM_BUTTONS};

const BUTTON_KEYS: [char; NUM_BUTTONS] = ['q', '1', '2', '3', '4'];

pub struct KeyboardUi {
    raw_mode: bool,
}

impl KeyboardUi {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode().map_err(|e| {
            TeachableError::Ui(format!("Failed to enable raw terminal mode: {}", e))
        })?;
        log::info!(
            "Keyboard UI ready: '{}' resets, '1'-'4' teach classes, Ctrl-C exits",
            BUTTON_KEYS[0]
        );
        Ok(Self { raw_mode: true })
    }
}

impl Ui for KeyboardUi {
    fn set_led(&mut self, index: usize, on: bool) -> Result<()> {
        // No LEDs on a keyboard
        log::trace!("led {} -> {}", index, on);
        Ok(())
    }

    fn read_buttons(&mut self) -> Result<[bool; NUM_BUTTONS]> {
        let mut state = [false; NUM_BUTTONS];
        // Drain everything typed since the last poll
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Raw mode swallows the interrupt signal, so synthesize it
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Err(TeachableError::Io(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "Ctrl-C",
                    )));
                }
                if let KeyCode::Char(c) = key.code {
                    if let Some(i) = BUTTON_KEYS.iter().position(|&k| k == c) {
                        state[i] = true;
                    }
                }
            }
        }
        Ok(state)
    }
}

impl Drop for KeyboardUi {
    fn drop(&mut self) {
        if self.raw_mode {
            terminal::disable_raw_mode().ok();
        }
    }
}
