//! Mode switch supervisor.
//!
//! Watches a toggle switch on a GPIO line and keeps exactly one of two
//! child commands running: the teachable demo while the switch is on, a
//! stock classifier while it is off. Flipping the switch kills the current
//! child and starts the other one.

use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use clap::Parser;
use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use log::{error, info};

use teachable_edge_rs::error::{Result, TeachableError};

const CONSUMER: &str = "teachable-switcher";

#[derive(Parser)]
#[command(name = "switcher")]
#[command(about = "Toggle between two camera demos with a GPIO switch")]
struct Args {
    /// GPIO line of the mode switch
    #[arg(long, default_value_t = 8)]
    line: u32,

    /// Command to run while the switch is on
    #[arg(long = "on-cmd")]
    on_cmd: String,

    /// Command to run while the switch is off
    #[arg(long = "off-cmd")]
    off_cmd: String,

    /// Switch poll interval, in milliseconds
    #[arg(long = "poll-ms", default_value_t = 50)]
    poll_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    On,
    Off,
}

/// Which mode to switch to, if the level changed.
fn transition(current: Mode, level_high: bool) -> Option<Mode> {
    match (current, level_high) {
        (Mode::Off, true) => Some(Mode::On),
        (Mode::On, false) => Some(Mode::Off),
        _ => None,
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run(&Args::parse()) {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let switch = open_switch(args.line)?;

    let mut mode = Mode::Off;
    info!("Starting in off mode: {}", args.off_cmd);
    let mut child = spawn_shell(&args.off_cmd)?;
    let poll = Duration::from_millis(args.poll_ms);

    loop {
        let level_high = switch
            .get_value()
            .map_err(|e| TeachableError::Gpio(format!("Failed to read switch: {}", e)))?
            != 0;

        if let Some(next) = transition(mode, level_high) {
            child.kill().ok();
            child.wait().ok();
            let cmd = match next {
                Mode::On => &args.on_cmd,
                Mode::Off => &args.off_cmd,
            };
            info!("Switch flipped, starting: {}", cmd);
            child = spawn_shell(cmd)?;
            mode = next;
        }

        thread::sleep(poll);
    }
}

fn open_switch(line: u32) -> Result<LineHandle> {
    let path = format!("/dev/gpiochip{}", line / 32);
    let mut chip = Chip::new(&path)
        .map_err(|e| TeachableError::Gpio(format!("Unable to open {}: {}", path, e)))?;
    chip.get_line(line % 32)
        .map_err(|e| TeachableError::Gpio(format!("Failed to find GPIO line {}: {}", line, e)))?
        .request(LineRequestFlags::INPUT, 0, CONSUMER)
        .map_err(|e| TeachableError::Gpio(format!("Failed to request GPIO line {}: {}", line, e)))
}

fn spawn_shell(cmd: &str) -> Result<Child> {
    Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .spawn()
        .map_err(TeachableError::Io)
}
