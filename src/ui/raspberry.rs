//! Raspberry Pi GPIO panel.

use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::error::{Result, TeachableError};
use crate::ui::{Ui, NUM_BUTTONS, NUM_LEDS};

// BCM numbering, per the demo wiring chart
const BUTTON_PINS: [u8; NUM_BUTTONS] = [16, 6, 5, 24, 27];
const LED_PINS: [u8; NUM_LEDS] = [20, 13, 12, 25, 22];

pub struct RaspberryUi {
    buttons: Vec<InputPin>,
    leds: Vec<OutputPin>,
}

impl RaspberryUi {
    pub fn new() -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| {
            TeachableError::Gpio(format!(
                "Unable to access GPIO ({}). Did you run with permission to /dev/gpiomem?",
                e
            ))
        })?;

        let mut buttons = Vec::with_capacity(NUM_BUTTONS);
        for pin in BUTTON_PINS {
            let button = gpio
                .get(pin)
                .map_err(|e| TeachableError::Gpio(format!("Failed to open button pin {}: {}", pin, e)))?
                .into_input_pulldown();
            buttons.push(button);
        }

        let mut leds = Vec::with_capacity(NUM_LEDS);
        for pin in LED_PINS {
            let mut led = gpio
                .get(pin)
                .map_err(|e| TeachableError::Gpio(format!("Failed to open LED pin {}: {}", pin, e)))?
                .into_output();
            // Panel LEDs are wired active low
            led.set_high();
            leds.push(led);
        }

        log::info!("Raspberry Pi panel initialized");
        Ok(Self { buttons, leds })
    }
}

impl Ui for RaspberryUi {
    fn set_led(&mut self, index: usize, on: bool) -> Result<()> {
        let led = self.leds.get_mut(index).ok_or_else(|| {
            TeachableError::InvalidInput(format!("LED index {} out of range", index))
        })?;
        if on {
            led.set_low();
        } else {
            led.set_high();
        }
        Ok(())
    }

    fn read_buttons(&mut self) -> Result<[bool; NUM_BUTTONS]> {
        let mut state = [false; NUM_BUTTONS];
        for (i, button) in self.buttons.iter().enumerate() {
            state[i] = button.is_high();
        }
        Ok(state)
    }
}

impl Drop for RaspberryUi {
    fn drop(&mut self) {
        for led in self.leds.iter_mut() {
            led.set_high();
        }
    }
}
