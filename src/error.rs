use thiserror::Error;

pub type Result<T> = std::result::Result<T, TeachableError>;

#[derive(Error, Debug)]
pub enum TeachableError {
    #[error("UI error: {0}")]
    Ui(String),

    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Servo error: {0}")]
    Servo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
