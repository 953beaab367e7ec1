//! Servo sweep, driven by a worker thread gated on an on/off flag.
//!
//! The classification loop resumes the sweep while the target class is
//! recognized and pauses it otherwise; pausing freezes the servo mid-sweep
//! and resuming continues from the same angle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::config::ServoConfig;
use crate::error::Result;
use crate::platform::Platform;

pub const SWEEP_RANGE_DEGREES: u32 = 180;

// Standard hobby servo timing: 50 Hz, 1-2 ms pulse over the sweep range
const PWM_PERIOD_NS: u64 = 20_000_000;
const PULSE_MIN_NS: u64 = 1_000_000;
const PULSE_MAX_NS: u64 = 2_000_000;

/// Pulse width for an angle, clamped to the sweep range.
pub fn pulse_width_ns(degrees: f32) -> u64 {
    let clamped = degrees.clamp(0.0, SWEEP_RANGE_DEGREES as f32);
    let span = (PULSE_MAX_NS - PULSE_MIN_NS) as f32;
    PULSE_MIN_NS + (clamped / SWEEP_RANGE_DEGREES as f32 * span) as u64
}

/// A positionable servo.
pub trait Servo: Send {
    fn set_angle(&mut self, degrees: f32) -> Result<()>;
}

/// Stands in when no PWM hardware is around (keyboard mode).
pub struct NoopServo;

impl Servo for NoopServo {
    fn set_angle(&mut self, degrees: f32) -> Result<()> {
        log::trace!("servo angle -> {:.0}", degrees);
        Ok(())
    }
}

/// Build the servo for the platform, degrading to a no-op with a warning
/// when the PWM hardware is unavailable.
pub fn servo_for(platform: Platform) -> Box<dyn Servo> {
    match platform {
        #[cfg(all(feature = "gpio", target_os = "linux"))]
        Platform::RaspberryPi => match hw::RppalServo::new() {
            Ok(servo) => Box::new(servo),
            Err(e) => {
                log::warn!("Servo PWM unavailable ({}) - continuing without servo", e);
                Box::new(NoopServo)
            }
        },
        #[cfg(all(feature = "gpio", target_os = "linux"))]
        Platform::DevBoard => match hw::SysfsServo::new() {
            Ok(servo) => Box::new(servo),
            Err(e) => {
                log::warn!("Servo PWM unavailable ({}) - continuing without servo", e);
                Box::new(NoopServo)
            }
        },
        _ => Box::new(NoopServo),
    }
}

struct GateState {
    enabled: Mutex<bool>,
    cond: Condvar,
    stop: AtomicBool,
}

impl GateState {
    fn lock_enabled(&self) -> MutexGuard<'_, bool> {
        self.enabled.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block until the gate opens. Returns false when shutdown was requested.
    fn wait_enabled(&self) -> bool {
        let mut enabled = self.lock_enabled();
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return false;
            }
            if *enabled {
                return true;
            }
            enabled = self
                .cond
                .wait(enabled)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

/// Handle to the sweep worker thread.
pub struct SweepHandle {
    gate: Arc<GateState>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SweepHandle {
    pub fn spawn(servo: Box<dyn Servo>, config: ServoConfig) -> Result<Self> {
        let gate = Arc::new(GateState {
            enabled: Mutex::new(false),
            cond: Condvar::new(),
            stop: AtomicBool::new(false),
        });
        let worker_gate = Arc::clone(&gate);
        let thread = thread::Builder::new()
            .name("servo-sweep".into())
            .spawn(move || sweep_loop(servo, &worker_gate, &config))?;
        Ok(Self {
            gate,
            thread: Some(thread),
        })
    }

    pub fn resume(&self) {
        let mut enabled = self.gate.lock_enabled();
        if !*enabled {
            *enabled = true;
            self.gate.cond.notify_all();
        }
    }

    pub fn pause(&self) {
        *self.gate.lock_enabled() = false;
    }

    pub fn is_running(&self) -> bool {
        *self.gate.lock_enabled()
    }

    /// Stop the worker and join it.
    pub fn shutdown(mut self) {
        self.gate.stop.store(true, Ordering::Relaxed);
        // Open the gate so a paused worker can observe the stop flag
        {
            let mut enabled = self.gate.lock_enabled();
            *enabled = true;
            self.gate.cond.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

fn sweep_loop(mut servo: Box<dyn Servo>, gate: &GateState, config: &ServoConfig) {
    let step = config.step_degrees as usize;
    loop {
        for angle in (0..SWEEP_RANGE_DEGREES).step_by(step) {
            if !step_servo(servo.as_mut(), gate, angle, config.step_delay) {
                return;
            }
        }
        for angle in (0..SWEEP_RANGE_DEGREES).step_by(step).rev() {
            if !step_servo(servo.as_mut(), gate, angle, config.step_delay) {
                return;
            }
        }
    }
}

fn step_servo(servo: &mut dyn Servo, gate: &GateState, angle: u32, delay: Duration) -> bool {
    if !gate.wait_enabled() {
        return false;
    }
    if let Err(e) = servo.set_angle(angle as f32) {
        log::error!("Servo sweep failed: {}", e);
        return false;
    }
    thread::sleep(delay);
    true
}

#[cfg(all(feature = "gpio", target_os = "linux"))]
mod hw {
    use std::time::Duration;

    use rppal::pwm::{Channel, Polarity, Pwm};
    use sysfs_pwm::Pwm as SysfsPwm;

    use super::{pulse_width_ns, Servo, PWM_PERIOD_NS};
    use crate::error::{Result, TeachableError};

    // Dev board servo header
    const SERVO_PWM_CHIP: u32 = 0;
    const SERVO_PWM_CHANNEL: u32 = 2;

    /// Servo on the Pi's hardware PWM (BCM 18).
    pub struct RppalServo {
        pwm: Pwm,
    }

    impl RppalServo {
        pub fn new() -> Result<Self> {
            let pwm = Pwm::with_period(
                Channel::Pwm0,
                Duration::from_nanos(PWM_PERIOD_NS),
                Duration::from_nanos(pulse_width_ns(90.0)),
                Polarity::Normal,
                true,
            )
            .map_err(|e| TeachableError::Servo(format!("Failed to open PWM channel: {}", e)))?;
            Ok(Self { pwm })
        }
    }

    impl Servo for RppalServo {
        fn set_angle(&mut self, degrees: f32) -> Result<()> {
            self.pwm
                .set_pulse_width(Duration::from_nanos(pulse_width_ns(degrees)))
                .map_err(|e| TeachableError::Servo(format!("Failed to set pulse width: {}", e)))?;
            Ok(())
        }
    }

    /// Servo on the dev board's PWM header via sysfs.
    pub struct SysfsServo {
        pwm: SysfsPwm,
    }

    impl SysfsServo {
        pub fn new() -> Result<Self> {
            let pwm = SysfsPwm::new(SERVO_PWM_CHIP, SERVO_PWM_CHANNEL)
                .map_err(|e| TeachableError::Servo(format!("Failed to open PWM channel: {}", e)))?;
            pwm.export()
                .map_err(|e| TeachableError::Servo(format!("Failed to export PWM: {}", e)))?;
            pwm.set_period_ns(PWM_PERIOD_NS as u32)
                .map_err(|e| TeachableError::Servo(format!("Failed to set PWM period: {}", e)))?;
            pwm.set_duty_cycle_ns(pulse_width_ns(90.0) as u32)
                .map_err(|e| TeachableError::Servo(format!("Failed to set PWM duty: {}", e)))?;
            pwm.enable(true)
                .map_err(|e| TeachableError::Servo(format!("Failed to enable PWM: {}", e)))?;
            Ok(Self { pwm })
        }
    }

    impl Servo for SysfsServo {
        fn set_angle(&mut self, degrees: f32) -> Result<()> {
            self.pwm
                .set_duty_cycle_ns(pulse_width_ns(degrees) as u32)
                .map_err(|e| TeachableError::Servo(format!("Failed to set pulse width: {}", e)))?;
            Ok(())
        }
    }

    impl Drop for SysfsServo {
        fn drop(&mut self) {
            self.pwm.enable(false).ok();
            self.pwm.unexport().ok();
        }
    }
}
