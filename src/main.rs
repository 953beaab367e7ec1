use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use teachable_edge_rs::classify::TeachableMachine;
use teachable_edge_rs::config::AppConfig;
use teachable_edge_rs::engine::TfliteEmbedder;
use teachable_edge_rs::error::{Result, TeachableError};
use teachable_edge_rs::platform::Platform;
use teachable_edge_rs::servo::{self, SweepHandle};
use teachable_edge_rs::ui::{self, Ui};
use teachable_edge_rs::vision::FrameSource;

#[derive(Parser)]
#[command(name = "teachable-edge")]
#[command(about = "Teachable machine demo: train classes with the buttons, watch the LEDs")]
struct Args {
    /// File path of the TFLite embedding model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Run the panel self test (Ctrl-C to abort)
    #[arg(long = "test-ui")]
    test_ui: bool,

    /// Force keyboard input instead of the GPIO panel
    #[arg(long)]
    keyboard: bool,

    /// V4L2 camera device
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Neighbors consulted per classification
    #[arg(long)]
    knn: Option<usize>,

    /// Length of the rolling label buffer
    #[arg(long = "buffer-length")]
    buffer_length: Option<usize>,

    /// Class whose recognition runs the servo
    #[arg(long = "target-class")]
    target_class: Option<usize>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()).await {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load();
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(camera) = args.camera {
        config.camera_device = camera;
    }
    if let Some(knn) = args.knn {
        config.knn = knn;
    }
    if let Some(buffer_length) = args.buffer_length {
        config.buffer_length = buffer_length;
    }
    if let Some(target_class) = args.target_class {
        config.target_class = target_class;
    }
    config.validate()?;

    info!("🔘 Initializing UI");
    let platform = Platform::detect();
    let mut ui = ui::select_ui(platform, args.keyboard)?;
    ui::wiggle_leds(ui.as_mut(), 3)?;

    if args.test_ui {
        info!("Running panel self test. Ctrl-C to abort.");
        return run_ui_test(ui).await;
    }

    info!("🧠 Initializing model");
    let embedder = TfliteEmbedder::new(&config.model_path)?;
    let sweep = SweepHandle::spawn(servo::servo_for(platform), config.servo.clone())?;
    let mut machine = TeachableMachine::new(Box::new(embedder), sweep, &config);

    info!("🎥 Starting pipeline");
    let mut source = open_source(&config)?;

    let running = Arc::new(AtomicBool::new(true));
    let loop_flag = Arc::clone(&running);
    let mut worker =
        tokio::task::spawn_blocking(move || -> Result<(Box<dyn Ui>, TeachableMachine)> {
            while loop_flag.load(Ordering::Relaxed) {
                let frame = source.next_frame()?;
                if let Err(e) = machine.process_frame(ui.as_mut(), &frame) {
                    if is_interrupt(&e) {
                        info!("Interrupted from the keyboard");
                        break;
                    }
                    return Err(e);
                }
            }
            Ok((ui, machine))
        });

    let joined = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            running.store(false, Ordering::Relaxed);
            None
        }
        result = &mut worker => Some(result),
    };
    let joined = match joined {
        Some(result) => result,
        // Ctrl-C path: let the loop notice the flag and hand the panel back
        None => worker.await,
    };
    let (mut ui, machine) = flatten(joined)?;

    // Shutdown flourish: a longer wiggle and a one second servo burst
    flatten(
        tokio::task::spawn_blocking(move || -> Result<()> {
            ui::wiggle_leds(ui.as_mut(), 4)?;
            machine.sweep_handle().resume();
            thread::sleep(Duration::from_secs(1));
            machine.shutdown();
            Ok(())
        })
        .await,
    )?;

    info!("👋 Done");
    Ok(())
}

async fn run_ui_test(ui: Box<dyn Ui>) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let mut task = tokio::task::spawn_blocking(move || -> Result<()> {
        let mut ui = ui;
        ui::run_button_test(ui.as_mut(), &flag)
    });
    let joined = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            running.store(false, Ordering::Relaxed);
            None
        }
        result = &mut task => Some(result),
    };
    let joined = match joined {
        Some(result) => result,
        None => task.await,
    };
    match flatten(joined) {
        Err(e) if is_interrupt(&e) => Ok(()),
        result => result,
    }
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn open_source(config: &AppConfig) -> Result<Box<dyn FrameSource>> {
    use teachable_edge_rs::vision::v4l2::V4l2Source;
    Ok(Box::new(V4l2Source::open(&config.camera_device)?))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn open_source(_config: &AppConfig) -> Result<Box<dyn FrameSource>> {
    Err(TeachableError::Camera(
        "built without camera support (enable the `camera` feature)".to_string(),
    ))
}

fn flatten<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    joined.map_err(|e| TeachableError::Processing(format!("worker task failed: {}", e)))?
}

fn is_interrupt(err: &TeachableError) -> bool {
    matches!(err, TeachableError::Io(e) if e.kind() == io::ErrorKind::Interrupted)
}
