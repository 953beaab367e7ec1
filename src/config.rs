use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TeachableError};
use crate::ui::NUM_BUTTONS;

/// Headless MobileNet checkpoint the demo ships with.
pub const DEFAULT_MODEL_PATH: &str = "models/mobilenet_quant_v1_224_headless_edgetpu.tflite";

pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";

/// Servo sweep timing.
#[derive(Debug, Clone)]
pub struct ServoConfig {
    /// Degrees advanced per sweep step.
    pub step_degrees: u32,
    /// Delay between steps.
    pub step_delay: Duration,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            step_degrees: 5,
            step_delay: Duration::from_millis(50),
        }
    }
}

/// Runtime configuration for the teachable machine.
///
/// The `TEACHABLE_MODEL` and `TEACHABLE_CAMERA` environment variables
/// override the defaults, CLI flags override both.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub camera_device: PathBuf,
    /// Neighbors consulted per classification.
    pub knn: usize,
    /// Length of the rolling label buffer used for the majority vote.
    pub buffer_length: usize,
    pub debounce_interval: Duration,
    /// Class whose recognition runs the servo.
    pub target_class: usize,
    pub servo: ServoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            camera_device: PathBuf::from(DEFAULT_CAMERA_DEVICE),
            knn: 3,
            buffer_length: 4,
            debounce_interval: Duration::from_millis(100),
            target_class: 3,
            servo: ServoConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load defaults with environment overrides applied.
    pub fn load() -> Self {
        // Pick up a .env file when present (for development)
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(path) = env::var("TEACHABLE_MODEL") {
            config.model_path = PathBuf::from(path);
        }
        if let Ok(device) = env::var("TEACHABLE_CAMERA") {
            config.camera_device = PathBuf::from(device);
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.knn == 0 {
            return Err(TeachableError::Config(
                "knn must be at least 1".to_string(),
            ));
        }
        if self.buffer_length == 0 {
            return Err(TeachableError::Config(
                "buffer length must be at least 1".to_string(),
            ));
        }
        if self.target_class == 0 || self.target_class >= NUM_BUTTONS {
            return Err(TeachableError::Config(format!(
                "target class must be between 1 and {} (button 0 is reset)",
                NUM_BUTTONS - 1
            )));
        }
        if self.servo.step_degrees == 0 || self.servo.step_degrees > 180 {
            return Err(TeachableError::Config(format!(
                "servo step of {} degrees is outside 1..=180",
                self.servo.step_degrees
            )));
        }
        Ok(())
    }
}
