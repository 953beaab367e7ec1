//! EdgeTPU dev board panel: GPIO lines plus one PWM-driven LED.

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use sysfs_pwm::Pwm;

use crate::error::{Result, TeachableError};
use crate::ui::{Ui, NUM_BUTTONS, NUM_LEDS};

const CONSUMER: &str = "teachable-edge";

// Line numbers per the demo wiring chart; the kernel exposes them in banks
// of 32 lines per gpiochip. The middle LED sits on a PWM header instead.
const LED_LINES: [Option<u32>; NUM_LEDS] = [Some(86), Some(77), None, Some(140), Some(73)];
const BUTTON_LINES: [u32; NUM_BUTTONS] = [141, 8, 7, 138, 6];

const PWM_LED_CHIP: u32 = 0;
const PWM_LED_CHANNEL: u32 = 0;
const PWM_LED_PERIOD_NS: u32 = 1_000_000; // 1 kHz

enum Led {
    Gpio(LineHandle),
    Pwm(Pwm),
}

pub struct DevBoardUi {
    buttons: Vec<LineHandle>,
    leds: Vec<Led>,
}

fn request_line(number: u32, flags: LineRequestFlags) -> Result<LineHandle> {
    let path = format!("/dev/gpiochip{}", number / 32);
    let mut chip = Chip::new(&path).map_err(|e| {
        TeachableError::Gpio(format!(
            "Unable to open {} ({}). Did you run with sudo?",
            path, e
        ))
    })?;
    let line = chip
        .get_line(number % 32)
        .map_err(|e| TeachableError::Gpio(format!("Failed to find GPIO line {}: {}", number, e)))?;
    line.request(flags, 0, CONSUMER)
        .map_err(|e| TeachableError::Gpio(format!("Failed to request GPIO line {}: {}", number, e)))
}

fn open_pwm_led() -> Result<Pwm> {
    let pwm = Pwm::new(PWM_LED_CHIP, PWM_LED_CHANNEL)
        .map_err(|e| TeachableError::Gpio(format!("Failed to open PWM LED: {}", e)))?;
    pwm.export()
        .map_err(|e| TeachableError::Gpio(format!("Failed to export PWM LED: {}", e)))?;
    pwm.set_period_ns(PWM_LED_PERIOD_NS)
        .map_err(|e| TeachableError::Gpio(format!("Failed to set PWM LED period: {}", e)))?;
    // Off: full duty, the LED is active low like the GPIO ones
    pwm.set_duty_cycle_ns(PWM_LED_PERIOD_NS)
        .map_err(|e| TeachableError::Gpio(format!("Failed to set PWM LED duty: {}", e)))?;
    pwm.enable(true)
        .map_err(|e| TeachableError::Gpio(format!("Failed to enable PWM LED: {}", e)))?;
    Ok(pwm)
}

impl DevBoardUi {
    pub fn new() -> Result<Self> {
        let mut buttons = Vec::with_capacity(NUM_BUTTONS);
        for number in BUTTON_LINES {
            buttons.push(request_line(number, LineRequestFlags::INPUT)?);
        }

        let mut leds = Vec::with_capacity(NUM_LEDS);
        for slot in LED_LINES {
            let led = match slot {
                Some(number) => {
                    let handle = request_line(number, LineRequestFlags::OUTPUT)?;
                    handle.set_value(1).map_err(|e| {
                        TeachableError::Gpio(format!("Failed to write GPIO line {}: {}", number, e))
                    })?;
                    Led::Gpio(handle)
                }
                None => Led::Pwm(open_pwm_led()?),
            };
            leds.push(led);
        }

        log::info!("Dev board panel initialized");
        Ok(Self { buttons, leds })
    }
}

impl Ui for DevBoardUi {
    fn set_led(&mut self, index: usize, on: bool) -> Result<()> {
        let led = self.leds.get_mut(index).ok_or_else(|| {
            TeachableError::InvalidInput(format!("LED index {} out of range", index))
        })?;
        match led {
            Led::Gpio(handle) => {
                // Active low
                handle
                    .set_value(if on { 0 } else { 1 })
                    .map_err(|e| TeachableError::Gpio(format!("Failed to write LED {}: {}", index, e)))?;
            }
            Led::Pwm(pwm) => {
                let duty = if on { 0 } else { PWM_LED_PERIOD_NS };
                pwm.set_duty_cycle_ns(duty).map_err(|e| {
                    TeachableError::Gpio(format!("Failed to set LED {} duty: {}", index, e))
                })?;
            }
        }
        Ok(())
    }

    fn read_buttons(&mut self) -> Result<[bool; NUM_BUTTONS]> {
        let mut state = [false; NUM_BUTTONS];
        for (i, button) in self.buttons.iter().enumerate() {
            let value = button
                .get_value()
                .map_err(|e| TeachableError::Gpio(format!("Failed to read button {}: {}", i, e)))?;
            state[i] = value != 0;
        }
        Ok(state)
    }
}

impl Drop for DevBoardUi {
    fn drop(&mut self) {
        for led in self.leds.iter_mut() {
            match led {
                Led::Gpio(handle) => {
                    handle.set_value(1).ok();
                }
                Led::Pwm(pwm) => {
                    pwm.set_duty_cycle_ns(PWM_LED_PERIOD_NS).ok();
                    pwm.enable(false).ok();
                    pwm.unexport().ok();
                }
            }
        }
    }
}
