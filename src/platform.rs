use std::fs;

use strum::Display;

/// Device tree model string exposed by the kernel on ARM boards.
const DEVICE_TREE_MODEL: &str = "/sys/firmware/devicetree/base/model";

/// Boards the demo knows how to wire a button/LED panel to.
///
/// The panel GPIOs differ between the boards, so the UI backend is picked
/// from this at startup. Anything unrecognized falls back to the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Platform {
    #[strum(serialize = "Raspberry Pi")]
    RaspberryPi,
    #[strum(serialize = "EdgeTPU dev board")]
    DevBoard,
    #[strum(serialize = "generic Linux")]
    Generic,
}

impl Platform {
    /// Detect the current platform from the device tree.
    pub fn detect() -> Platform {
        match fs::read_to_string(DEVICE_TREE_MODEL) {
            Ok(model) => {
                let platform = Platform::from_model_string(&model);
                log::info!("Detected platform: {}", platform);
                platform
            }
            Err(e) => {
                log::warn!(
                    "Could not read {} ({}). Assuming generic Linux.",
                    DEVICE_TREE_MODEL,
                    e
                );
                Platform::Generic
            }
        }
    }

    /// Classify a device tree model string.
    pub fn from_model_string(model: &str) -> Platform {
        if model.contains("Raspberry Pi") {
            Platform::RaspberryPi
        } else if model.contains("MX8MQ") {
            Platform::DevBoard
        } else {
            Platform::Generic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_raspberry_pi() {
        assert_eq!(
            Platform::from_model_string("Raspberry Pi 3 Model B Rev 1.2\0"),
            Platform::RaspberryPi
        );
    }

    #[test]
    fn recognizes_dev_board() {
        assert_eq!(
            Platform::from_model_string("Freescale i.MX8MQ Phanbell\0"),
            Platform::DevBoard
        );
    }

    #[test]
    fn unknown_models_are_generic() {
        assert_eq!(
            Platform::from_model_string("QEMU Virtual Machine"),
            Platform::Generic
        );
        assert_eq!(Platform::from_model_string(""), Platform::Generic);
    }
}
