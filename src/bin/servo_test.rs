//! Continuously sweep the servo, for wiring checks.

use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use teachable_edge_rs::error::Result;
use teachable_edge_rs::platform::Platform;
use teachable_edge_rs::servo::{self, Servo, SWEEP_RANGE_DEGREES};

#[derive(Parser)]
#[command(name = "servo-test")]
#[command(about = "Sweep the servo back and forth until interrupted")]
struct Args {
    /// Degrees advanced per step
    #[arg(long, default_value_t = 5)]
    step: u32,

    /// Delay between steps, in milliseconds
    #[arg(long = "delay-ms", default_value_t = 50)]
    delay_ms: u64,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if args.step == 0 || args.step > SWEEP_RANGE_DEGREES {
        error!("❌ step of {} degrees is outside 1..={}", args.step, SWEEP_RANGE_DEGREES);
        std::process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let platform = Platform::detect();
    let mut servo = servo::servo_for(platform);
    let delay = Duration::from_millis(args.delay_ms);

    loop {
        info!("Turning!");
        for angle in (0..SWEEP_RANGE_DEGREES).step_by(args.step as usize) {
            servo.set_angle(angle as f32)?;
            thread::sleep(delay);
        }
        info!("Turning back!");
        for angle in (0..SWEEP_RANGE_DEGREES).step_by(args.step as usize).rev() {
            servo.set_angle(angle as f32)?;
            thread::sleep(delay);
        }
    }
}
