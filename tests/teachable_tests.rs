//! End-to-end tests for the classification loop.
//!
//! Drives a `TeachableMachine` through the public trait seams: a stub
//! embedder that maps solid-color frames to fixed vectors, and a scripted
//! panel that plays back button presses and records LED writes.

use std::collections::VecDeque;
use std::time::Duration;

use teachable_edge_rs::classify::{FrameStatus, TeachableMachine};
use teachable_edge_rs::config::AppConfig;
use teachable_edge_rs::engine::{knn, Embedder};
use teachable_edge_rs::error::Result;
use teachable_edge_rs::servo::{NoopServo, SweepHandle};
use teachable_edge_rs::ui::{Ui, NUM_BUTTONS, NUM_LEDS};
use teachable_edge_rs::vision::Frame;

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 255, 0];

fn frame(rgb: [u8; 3]) -> Frame {
    Frame::solid(8, 8, rgb)
}

/// Embeds a solid frame as its (normalized) first pixel.
struct StubEmbedder;

impl Embedder for StubEmbedder {
    fn embed(&mut self, frame: &Frame) -> Result<Vec<f32>> {
        let px = &frame.data()[..3];
        Ok(knn::normalize(vec![
            px[0] as f32,
            px[1] as f32,
            px[2] as f32,
        ]))
    }
}

/// Plays back a script of raw button states and records LED writes.
struct ScriptedPanel {
    presses: VecDeque<[bool; NUM_BUTTONS]>,
    leds: [bool; NUM_LEDS],
}

impl ScriptedPanel {
    fn new() -> Self {
        Self {
            presses: VecDeque::new(),
            leds: [false; NUM_LEDS],
        }
    }

    fn queue_press(&mut self, index: usize) {
        let mut raw = [false; NUM_BUTTONS];
        raw[index] = true;
        self.presses.push_back(raw);
    }

    fn lit(&self) -> Vec<usize> {
        self.leds
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| i)
            .collect()
    }
}

impl Ui for ScriptedPanel {
    fn set_led(&mut self, index: usize, on: bool) -> Result<()> {
        self.leds[index] = on;
        Ok(())
    }

    fn read_buttons(&mut self) -> Result<[bool; NUM_BUTTONS]> {
        Ok(self.presses.pop_front().unwrap_or([false; NUM_BUTTONS]))
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    // Zero debounce so scripted single-frame presses register immediately
    config.debounce_interval = Duration::ZERO;
    config.servo.step_delay = Duration::from_millis(1);
    config
}

fn test_machine(config: &AppConfig) -> TeachableMachine {
    let sweep = SweepHandle::spawn(Box::new(NoopServo), config.servo.clone())
        .expect("failed to spawn sweep worker");
    TeachableMachine::new(Box::new(StubEmbedder), sweep, config)
}

fn drive(
    machine: &mut TeachableMachine,
    panel: &mut ScriptedPanel,
    rgb: [u8; 3],
    frames: usize,
) -> Result<FrameStatus> {
    let mut status = machine.process_frame(panel, &frame(rgb))?;
    for _ in 1..frames {
        status = machine.process_frame(panel, &frame(rgb))?;
    }
    Ok(status)
}

#[test_log::test]
fn untrained_machine_votes_nothing() -> Result<()> {
    let config = test_config();
    let mut machine = test_machine(&config);
    let mut panel = ScriptedPanel::new();

    let status = drive(&mut machine, &mut panel, RED, 5)?;
    assert_eq!(status.classification, None);
    assert_eq!(status.example_count, 0);
    assert!(panel.lit().is_empty());

    machine.shutdown();
    Ok(())
}

#[test_log::test]
fn training_changes_the_vote_and_the_led() -> Result<()> {
    let config = test_config();
    let mut machine = test_machine(&config);
    let mut panel = ScriptedPanel::new();

    // Teach the red frame as class 1, then keep showing red
    panel.queue_press(1);
    let status = drive(&mut machine, &mut panel, RED, 1)?;
    assert_eq!(status.example_count, 1);

    let status = drive(&mut machine, &mut panel, RED, 4)?;
    assert_eq!(status.classification, Some(1));
    assert_eq!(panel.lit(), vec![1]);

    machine.shutdown();
    Ok(())
}

#[test_log::test]
fn vote_needs_a_majority_of_the_buffer() -> Result<()> {
    let config = test_config();
    let mut machine = test_machine(&config);
    let mut panel = ScriptedPanel::new();

    panel.queue_press(1);
    drive(&mut machine, &mut panel, RED, 1)?;
    panel.queue_press(2);
    drive(&mut machine, &mut panel, GREEN, 1)?;

    // Four green frames flush the buffer over to class 2
    let status = drive(&mut machine, &mut panel, GREEN, 4)?;
    assert_eq!(status.classification, Some(2));

    // A single red frame is outvoted by the remaining green labels
    let status = drive(&mut machine, &mut panel, RED, 1)?;
    assert_eq!(status.classification, Some(2));

    machine.shutdown();
    Ok(())
}

#[test_log::test]
fn reset_button_forgets_everything() -> Result<()> {
    let config = test_config();
    let mut machine = test_machine(&config);
    let mut panel = ScriptedPanel::new();

    panel.queue_press(1);
    drive(&mut machine, &mut panel, RED, 1)?;
    let status = drive(&mut machine, &mut panel, RED, 4)?;
    assert_eq!(status.classification, Some(1));

    panel.queue_press(0);
    drive(&mut machine, &mut panel, RED, 1)?;

    let status = drive(&mut machine, &mut panel, RED, 1)?;
    assert_eq!(status.example_count, 0);
    assert_eq!(status.classification, None);
    assert!(panel.lit().is_empty());

    machine.shutdown();
    Ok(())
}

#[test_log::test]
fn servo_runs_only_while_the_target_class_holds_the_vote() -> Result<()> {
    let mut config = test_config();
    // Single-neighbor lookups keep the class balance out of the picture
    config.knn = 1;
    let mut machine = test_machine(&config);
    let mut panel = ScriptedPanel::new();

    // Class 3 is the default target; teach green as 3 and red as 1
    panel.queue_press(3);
    drive(&mut machine, &mut panel, GREEN, 1)?;
    panel.queue_press(1);
    drive(&mut machine, &mut panel, RED, 1)?;

    let status = drive(&mut machine, &mut panel, GREEN, 4)?;
    assert_eq!(status.classification, Some(3));
    assert!(status.servo_running);
    assert!(machine.sweep_handle().is_running());

    // Training the target class pauses the sweep for that frame
    panel.queue_press(3);
    let status = drive(&mut machine, &mut panel, GREEN, 1)?;
    assert!(!status.servo_running);

    // Voting away from the target stops it
    let status = drive(&mut machine, &mut panel, RED, 4)?;
    assert_eq!(status.classification, Some(1));
    assert!(!status.servo_running);
    assert!(!machine.sweep_handle().is_running());

    machine.shutdown();
    Ok(())
}
