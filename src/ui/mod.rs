//! Button/LED panel abstraction.
//!
//! Three interchangeable backends: the Raspberry Pi GPIO panel, the dev
//! board GPIO/PWM panel, and a keyboard fallback for machines without wired
//! buttons. Backends implement [`Ui`]; everything above them is shared.

pub mod keyboard;

#[cfg(all(feature = "gpio", target_os = "linux"))]
pub mod devboard;
#[cfg(all(feature = "gpio", target_os = "linux"))]
pub mod raspberry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::platform::Platform;

pub const NUM_BUTTONS: usize = 5;
pub const NUM_LEDS: usize = 5;

const WIGGLE_STEP: Duration = Duration::from_millis(50);
const BUTTON_TEST_POLL: Duration = Duration::from_millis(10);

/// A board's button/LED panel.
pub trait Ui: Send {
    /// Drive a single LED.
    fn set_led(&mut self, index: usize, on: bool) -> Result<()>;

    /// Raw (undebounced) state of all buttons.
    fn read_buttons(&mut self) -> Result<[bool; NUM_BUTTONS]>;

    /// Light exactly one LED, or none.
    fn set_only_led(&mut self, index: Option<usize>) -> Result<()> {
        for i in 0..NUM_LEDS {
            self.set_led(i, false)?;
        }
        if let Some(i) = index {
            self.set_led(i, true)?;
        }
        Ok(())
    }

    fn is_button_pressed(&mut self, index: usize) -> Result<bool> {
        Ok(self.read_buttons()?[index])
    }
}

/// Debounces the raw button lines.
///
/// A press is reported exactly once, when the line rises after the interval
/// has elapsed since the last state change. Held buttons do not repeat;
/// releasing re-arms the button. Change timestamps only move forward.
pub struct Debouncer {
    interval: Duration,
    pressed: [bool; NUM_BUTTONS],
    last_change: [Instant; NUM_BUTTONS],
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            pressed: [false; NUM_BUTTONS],
            last_change: [now; NUM_BUTTONS],
        }
    }

    pub fn update(&mut self, raw: [bool; NUM_BUTTONS]) -> [bool; NUM_BUTTONS] {
        self.update_at(raw, Instant::now())
    }

    pub fn update_at(&mut self, raw: [bool; NUM_BUTTONS], now: Instant) -> [bool; NUM_BUTTONS] {
        let mut fired = [false; NUM_BUTTONS];
        for i in 0..NUM_BUTTONS {
            if raw[i] {
                if !self.pressed[i] && now.duration_since(self.last_change[i]) >= self.interval {
                    self.pressed[i] = true;
                    self.last_change[i] = now;
                    fired[i] = true;
                }
            } else if self.pressed[i] {
                self.pressed[i] = false;
                self.last_change[i] = now;
            }
        }
        fired
    }
}

/// Startup/shutdown chase animation across the panel.
pub fn wiggle_leds(ui: &mut dyn Ui, reps: usize) -> Result<()> {
    for _ in 0..reps {
        for i in 0..NUM_LEDS {
            ui.set_led(i, true)?;
            thread::sleep(WIGGLE_STEP);
            ui.set_led(i, false)?;
        }
    }
    Ok(())
}

/// Panel self test: LED i mirrors button i until `running` clears.
pub fn run_button_test(ui: &mut dyn Ui, running: &AtomicBool) -> Result<()> {
    while running.load(Ordering::Relaxed) {
        let buttons = ui.read_buttons()?;
        for (i, pressed) in buttons.iter().enumerate() {
            ui.set_led(i, *pressed)?;
        }
        let held: Vec<String> = buttons
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(i, _)| i.to_string())
            .collect();
        if !held.is_empty() {
            log::info!("Buttons: {}", held.join(" "));
        }
        thread::sleep(BUTTON_TEST_POLL);
    }
    ui.set_only_led(None)
}

/// Pick the panel backend for the platform.
///
/// GPIO failures on a recognized board are fatal; only an unrecognized
/// platform (or an explicit request) falls back to the keyboard.
pub fn select_ui(platform: Platform, force_keyboard: bool) -> Result<Box<dyn Ui>> {
    if force_keyboard {
        return Ok(Box::new(keyboard::KeyboardUi::new()?));
    }
    match platform {
        #[cfg(all(feature = "gpio", target_os = "linux"))]
        Platform::RaspberryPi => Ok(Box::new(raspberry::RaspberryUi::new()?)),
        #[cfg(all(feature = "gpio", target_os = "linux"))]
        Platform::DevBoard => Ok(Box::new(devboard::DevBoardUi::new()?)),
        _ => {
            log::warn!(
                "No GPIO panel available on {} - falling back to keyboard input",
                platform
            );
            Ok(Box::new(keyboard::KeyboardUi::new()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanelProbe {
        leds: [bool; NUM_LEDS],
        buttons: [bool; NUM_BUTTONS],
    }

    impl PanelProbe {
        fn new() -> Self {
            Self {
                leds: [false; NUM_LEDS],
                buttons: [false; NUM_BUTTONS],
            }
        }
    }

    impl Ui for PanelProbe {
        fn set_led(&mut self, index: usize, on: bool) -> Result<()> {
            self.leds[index] = on;
            Ok(())
        }

        fn read_buttons(&mut self) -> Result<[bool; NUM_BUTTONS]> {
            Ok(self.buttons)
        }
    }

    fn press(index: usize) -> [bool; NUM_BUTTONS] {
        let mut raw = [false; NUM_BUTTONS];
        raw[index] = true;
        raw
    }

    #[test]
    fn set_only_led_lights_one() {
        let mut panel = PanelProbe::new();
        panel.leds = [true; NUM_LEDS];
        panel.set_only_led(Some(2)).unwrap();
        assert_eq!(panel.leds, [false, false, true, false, false]);
        panel.set_only_led(None).unwrap();
        assert_eq!(panel.leds, [false; NUM_LEDS]);
    }

    #[test]
    fn debouncer_suppresses_until_interval_elapses() {
        let interval = Duration::from_millis(100);
        let mut debouncer = Debouncer::new(interval);
        let start = Instant::now();

        // Too soon after construction
        let fired = debouncer.update_at(press(1), start + Duration::from_millis(10));
        assert_eq!(fired, [false; NUM_BUTTONS]);

        // Released, then pressed again once the interval has elapsed
        debouncer.update_at([false; NUM_BUTTONS], start + Duration::from_millis(20));
        let fired = debouncer.update_at(press(1), start + Duration::from_millis(150));
        assert!(fired[1]);
    }

    #[test]
    fn debouncer_reports_a_held_button_once() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        let t1 = start + Duration::from_millis(200);
        assert!(debouncer.update_at(press(3), t1)[3]);
        // Held across later polls: no repeats
        for ms in [210u64, 250, 400, 1_000] {
            let fired = debouncer.update_at(press(3), start + Duration::from_millis(ms));
            assert_eq!(fired, [false; NUM_BUTTONS]);
        }
    }

    #[test]
    fn debouncer_rearms_after_release() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(debouncer.update_at(press(2), start + Duration::from_millis(150))[2]);
        debouncer.update_at([false; NUM_BUTTONS], start + Duration::from_millis(200));

        // Bounce on release: a re-press inside the interval stays quiet
        let fired = debouncer.update_at(press(2), start + Duration::from_millis(250));
        assert_eq!(fired, [false; NUM_BUTTONS]);

        let fired = debouncer.update_at(press(2), start + Duration::from_millis(350));
        assert!(fired[2]);
    }

    #[test]
    fn debouncer_tracks_buttons_independently() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        let mut raw = [false; NUM_BUTTONS];
        raw[0] = true;
        raw[4] = true;
        let fired = debouncer.update_at(raw, start + Duration::from_millis(150));
        assert!(fired[0]);
        assert!(fired[4]);
        assert!(!fired[1]);
    }
}
