//! The teachable machine's per-frame loop.
//!
//! Every frame is embedded and classified against the user-trained store;
//! the label lands in a fixed-length rolling buffer and the majority vote
//! over that buffer is what the panel shows. Button 0 resets the store,
//! buttons 1-4 teach the current frame, and the servo sweeps while the
//! target class holds the vote.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use crate::config::AppConfig;
use crate::engine::{Embedder, KnnStore};
use crate::error::Result;
use crate::servo::SweepHandle;
use crate::ui::{Debouncer, Ui};
use crate::vision::Frame;

pub const CLASS_NAMES: [&str; 5] = ["--", "One", "Two", "Three", "Four"];

// Frames averaged for the FPS readout
const FRAME_TIME_WINDOW: usize = 40;

/// What one processed frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStatus {
    pub classification: Option<usize>,
    pub fps: f32,
    pub example_count: usize,
    pub servo_running: bool,
}

pub struct TeachableMachine {
    embedder: Box<dyn Embedder>,
    store: KnnStore,
    buffer: VecDeque<Option<usize>>,
    buffer_length: usize,
    frame_times: VecDeque<Instant>,
    debouncer: Debouncer,
    sweep: SweepHandle,
    target_class: usize,
}

impl TeachableMachine {
    pub fn new(embedder: Box<dyn Embedder>, sweep: SweepHandle, config: &AppConfig) -> Self {
        Self {
            embedder,
            store: KnnStore::new(config.knn),
            buffer: VecDeque::with_capacity(config.buffer_length),
            buffer_length: config.buffer_length,
            frame_times: VecDeque::with_capacity(FRAME_TIME_WINDOW),
            debouncer: Debouncer::new(config.debounce_interval),
            sweep,
            target_class: config.target_class,
        }
    }

    /// Classify one frame and apply the user's button presses.
    pub fn process_frame(&mut self, ui: &mut dyn Ui, frame: &Frame) -> Result<FrameStatus> {
        let embedding = self.embedder.embed(frame)?;

        let label = self.store.classify(&embedding);
        if self.buffer.len() == self.buffer_length {
            self.buffer.pop_front();
        }
        self.buffer.push_back(label);
        let classification = majority_vote(self.buffer.iter().copied());

        let pressed = self.debouncer.update(ui.read_buttons()?);
        let mut servo_running = false;
        for (i, &is_pressed) in pressed.iter().enumerate() {
            if !is_pressed {
                if i == self.target_class && classification == Some(self.target_class) {
                    servo_running = true;
                } else if classification != Some(self.target_class) {
                    servo_running = false;
                }
                continue;
            }
            if i == 0 {
                log::info!("Clearing examples");
                self.store.clear();
                self.buffer.clear();
            } else {
                log::info!("Adding example for class {}", CLASS_NAMES[i]);
                self.store.add_example(embedding.clone(), i);
            }
            // No sweeping while training
            servo_running = false;
        }
        if servo_running {
            self.sweep.resume();
        } else {
            self.sweep.pause();
        }

        let now = Instant::now();
        if self.frame_times.len() == FRAME_TIME_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(now);
        let fps = self.current_fps(now);

        ui.set_only_led(classification)?;

        let status = FrameStatus {
            classification,
            fps,
            example_count: self.store.example_count(),
            servo_running,
        };
        log::info!(
            "fps {:.1}; #examples: {}; class {:>7}",
            status.fps,
            status.example_count,
            CLASS_NAMES[classification.unwrap_or(0)]
        );
        Ok(status)
    }

    /// Run the servo regardless of the vote (shutdown flourish).
    pub fn sweep_handle(&self) -> &SweepHandle {
        &self.sweep
    }

    /// Stop the sweep worker and join it.
    pub fn shutdown(self) {
        self.sweep.shutdown();
    }

    fn current_fps(&self, now: Instant) -> f32 {
        let oldest = match self.frame_times.front() {
            Some(oldest) => *oldest,
            None => return 0.0,
        };
        let span = now.duration_since(oldest).as_secs_f32();
        if self.frame_times.len() < 2 || span <= 0.0 {
            return 0.0;
        }
        (self.frame_times.len() - 1) as f32 / span
    }
}

/// Most frequent label in the window; ties go to the label that reached
/// the winning count first.
pub fn majority_vote<I>(labels: I) -> Option<usize>
where
    I: IntoIterator<Item = Option<usize>>,
{
    let mut counts: HashMap<Option<usize>, usize> = HashMap::new();
    let mut winner: Option<(Option<usize>, usize)> = None;
    for label in labels {
        let count = counts.entry(label).and_modify(|c| *c += 1).or_insert(1);
        match winner {
            Some((_, best)) if *count <= best => {}
            _ => winner = Some((label, *count)),
        }
    }
    winner.and_then(|(label, _)| label)
}
