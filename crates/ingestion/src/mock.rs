//! Mock 数据源
//!
//! 按脚本生成一段行程的 motion / position 样本，用于无真实设备的测试与演示。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{MotionSample, PositionSample, Sample, SampleCallback, SampleKind, SampleSource};
use tracing::{debug, info, trace};

use crate::error::{IngestionError, Result};

const GRAVITY: f32 = 9.8;
const METERS_PER_DEG_LAT: f64 = 111_320.0;
const HARD_BRAKE_DECEL: f32 = 14.0;
const SWERVE_YAW_RATE: f32 = 2.5;

/// One leg of a scripted trip
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScenarioSegment {
    /// Steady driving at the given speed
    Cruise { duration_s: f64, speed_mps: f32 },
    /// Deceleration well past the braking threshold, down to standstill at most
    HardBrake { duration_s: f64 },
    /// Alternating yaw at constant speed
    Swerve { duration_s: f64 },
    /// Steady driving, intended above the configured limits
    Speeding { duration_s: f64, speed_mps: f32 },
}

impl ScenarioSegment {
    pub fn duration_s(&self) -> f64 {
        match *self {
            Self::Cruise { duration_s, .. }
            | Self::HardBrake { duration_s }
            | Self::Swerve { duration_s }
            | Self::Speeding { duration_s, .. } => duration_s,
        }
    }

    /// Built-in demo trip: hard braking, zig-zag and highway speeding
    pub fn demo_trip() -> Vec<Self> {
        vec![
            Self::Cruise {
                duration_s: 3.0,
                speed_mps: 15.0,
            },
            Self::HardBrake { duration_s: 0.5 },
            Self::Cruise {
                duration_s: 2.0,
                speed_mps: 10.0,
            },
            Self::Swerve { duration_s: 1.0 },
            Self::Speeding {
                duration_s: 2.0,
                speed_mps: 27.0,
            },
            Self::Cruise {
                duration_s: 2.0,
                speed_mps: 10.0,
            },
        ]
    }
}

/// Mock 数据源配置
#[derive(Debug, Clone)]
pub struct MockScenarioConfig {
    /// Motion sample rate (Hz)
    pub motion_hz: f64,

    /// Position fix rate (Hz), at most `motion_hz`
    pub position_hz: f64,

    /// Trip start (degrees)
    pub start_latitude: f64,
    pub start_longitude: f64,

    /// Sleep between ticks to match the sample rate; off replays as fast as possible
    pub realtime: bool,

    /// Restart the script after the last segment
    pub loop_playback: bool,

    pub segments: Vec<ScenarioSegment>,
}

impl Default for MockScenarioConfig {
    fn default() -> Self {
        Self {
            motion_hz: 20.0,
            position_hz: 1.0,
            start_latitude: 12.9716,
            start_longitude: 77.5946,
            realtime: true,
            loop_playback: false,
            segments: ScenarioSegment::demo_trip(),
        }
    }
}

impl MockScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.motion_hz.is_finite() && self.motion_hz > 0.0) {
            return Err(IngestionError::invalid_scenario("motion_hz must be > 0"));
        }
        if !(self.position_hz.is_finite() && self.position_hz > 0.0) {
            return Err(IngestionError::invalid_scenario("position_hz must be > 0"));
        }
        if self.position_hz > self.motion_hz {
            return Err(IngestionError::invalid_scenario(
                "position_hz must not exceed motion_hz",
            ));
        }
        if self.segments.is_empty() {
            return Err(IngestionError::invalid_scenario("no segments"));
        }
        if let Some(bad) = self
            .segments
            .iter()
            .find(|s| !(s.duration_s().is_finite() && s.duration_s() > 0.0))
        {
            return Err(IngestionError::invalid_scenario(format!(
                "segment duration must be > 0: {bad:?}"
            )));
        }
        Ok(())
    }

    /// Number of motion ticks in one pass of the script
    pub fn ticks_per_pass(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| (s.duration_s() * self.motion_hz).round() as u64)
            .sum()
    }
}

/// Vehicle state advanced tick by tick
#[derive(Debug, Clone, Copy)]
struct TripState {
    timestamp: f64,
    latitude: f64,
    longitude: f64,
    speed_mps: f32,
}

/// Produce the samples for one tick
fn step(
    state: &mut TripState,
    segment: &ScenarioSegment,
    tick_in_segment: u64,
    dt: f64,
) -> MotionSample {
    let mut motion = MotionSample::at_rest(state.timestamp);
    match *segment {
        ScenarioSegment::Cruise { speed_mps, .. } | ScenarioSegment::Speeding { speed_mps, .. } => {
            state.speed_mps = speed_mps;
        }
        ScenarioSegment::HardBrake { .. } => {
            motion.accel_y = -HARD_BRAKE_DECEL;
            state.speed_mps = (state.speed_mps - HARD_BRAKE_DECEL * dt as f32).max(0.0);
        }
        ScenarioSegment::Swerve { .. } => {
            motion.accel_x = if tick_in_segment % 2 == 0 { 3.0 } else { -3.0 };
            motion.gyro_z = if tick_in_segment % 2 == 0 {
                SWERVE_YAW_RATE
            } else {
                -SWERVE_YAW_RATE
            };
        }
    }
    motion.accel_z = GRAVITY;

    // Heading due north
    state.latitude += f64::from(state.speed_mps) * dt / METERS_PER_DEG_LAT;
    state.timestamp += dt;
    motion
}

/// Generate one full pass of the script without pacing
pub fn generate_trip(config: &MockScenarioConfig) -> Vec<Sample> {
    let mut state = TripState {
        timestamp: 0.0,
        latitude: config.start_latitude,
        longitude: config.start_longitude,
        speed_mps: 0.0,
    };
    let mut out = Vec::new();
    run_pass(config, &mut state, &mut |sample| {
        out.push(sample);
        true
    });
    out
}

/// Drive the script once; `emit` returns false to abort
fn run_pass(
    config: &MockScenarioConfig,
    state: &mut TripState,
    emit: &mut dyn FnMut(Sample) -> bool,
) -> bool {
    let dt = 1.0 / config.motion_hz;
    let position_every = (config.motion_hz / config.position_hz).round().max(1.0) as u64;
    let mut tick: u64 = 0;

    for segment in &config.segments {
        let ticks = (segment.duration_s() * config.motion_hz).round() as u64;
        for i in 0..ticks {
            let motion = step(state, segment, i, dt);
            if !emit(motion.into()) {
                return false;
            }
            if tick % position_every == 0 {
                let fix = PositionSample {
                    timestamp: motion.timestamp,
                    latitude: state.latitude,
                    longitude: state.longitude,
                    speed_mps: state.speed_mps,
                    bearing_deg: 0.0,
                    accuracy_m: 5.0,
                };
                if !emit(fix.into()) {
                    return false;
                }
            }
            tick += 1;
        }
    }
    true
}

/// Scripted trip producer
///
/// Runs on a background thread and delivers interleaved motion and position
/// samples through the callback.
pub struct MockSampleSource {
    source_id: String,
    config: MockScenarioConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockSampleSource {
    pub fn new(source_id: impl Into<String>, config: MockScenarioConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source_id: source_id.into(),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        })
    }

    /// Demo trip at real-time pace
    pub fn demo(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            config: MockScenarioConfig::default(),
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MockScenarioConfig {
        &self.config
    }
}

impl SampleSource for MockSampleSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kind(&self) -> Option<SampleKind> {
        None
    }

    fn listen(&self, callback: SampleCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let source_id = self.source_id.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            debug!(source_id = %source_id, segments = config.segments.len(), "mock trip started");
            let mut state = TripState {
                timestamp: 0.0,
                latitude: config.start_latitude,
                longitude: config.start_longitude,
                speed_mps: 0.0,
            };
            let started = Instant::now();

            loop {
                let completed = run_pass(&config, &mut state, &mut |sample| {
                    if !listening.load(Ordering::Relaxed) {
                        return false;
                    }
                    if config.realtime {
                        let target = Duration::from_secs_f64(sample.timestamp().max(0.0));
                        let elapsed = started.elapsed();
                        if target > elapsed {
                            thread::sleep(target - elapsed);
                        }
                    }
                    trace!(source_id = %source_id, kind = %sample.kind(), "mock sample");
                    callback(sample);
                    true
                });

                if !completed {
                    debug!(source_id = %source_id, "mock trip stopped");
                    return;
                }
                if !config.loop_playback {
                    info!(source_id = %source_id, "mock trip completed");
                    break;
                }
            }

            listening.store(false, Ordering::SeqCst);
        });

        if let Ok(mut slot) = self.thread_handle.lock() {
            *slot = Some(handle);
        }
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);

        let handle = self.thread_handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for MockSampleSource {
    fn drop(&mut self) {
        self.stop();
    }
}
