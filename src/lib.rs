//! Teachable machine demo for Linux edge devices.
//!
//! Camera frames are embedded with a TFLite model and classified against a
//! k-NN store the user trains live from a 5-button panel. The voted class
//! lights an LED and, for the target class, runs a servo sweep.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod servo;
pub mod ui;
pub mod vision;

pub use error::{Result, TeachableError};
