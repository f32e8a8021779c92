//! Motion event detection from accelerometer / gyroscope samples.

use contracts::{DrivingEvent, EventKind, MotionSample, MotionThresholds};
use nalgebra::Vector3;
use tracing::trace;

/// Net acceleration magnitude (m/s²), gravity included
pub fn total_force(sample: &MotionSample) -> f32 {
    Vector3::new(sample.accel_x, sample.accel_y, sample.accel_z).norm()
}

/// Classifies motion samples into braking, rash-driving and zig-zag events
///
/// Rules are evaluated independently: one sample can raise several events.
/// The rash-driving rule compares net acceleration against a 1 g baseline,
/// so hard cornering and device shocks also count as rash driving.
#[derive(Debug, Clone)]
pub struct MotionEventDetector {
    thresholds: MotionThresholds,
    /// Last accepted sample
    last_sample: Option<MotionSample>,
}

impl MotionEventDetector {
    pub fn new(thresholds: MotionThresholds) -> Self {
        Self {
            thresholds,
            last_sample: None,
        }
    }

    pub fn thresholds(&self) -> &MotionThresholds {
        &self.thresholds
    }

    /// Last sample that passed the finiteness check
    pub fn last_sample(&self) -> Option<&MotionSample> {
        self.last_sample.as_ref()
    }

    /// Evaluate one sample
    ///
    /// Malformed samples (NaN / infinite fields) produce no events and are not
    /// retained.
    pub fn on_motion_sample(&mut self, sample: &MotionSample) -> Vec<DrivingEvent> {
        if sample.check_finite().is_err() {
            return Vec::new();
        }

        let mut events = Vec::new();

        if let Some(event) = self.check_braking(sample) {
            events.push(event);
        }
        if let Some(event) = self.check_rash(sample) {
            events.push(event);
        }
        if let Some(event) = self.check_zigzag(sample) {
            events.push(event);
        }

        trace!(
            timestamp = sample.timestamp,
            events = events.len(),
            "motion sample evaluated"
        );

        self.last_sample = Some(*sample);
        events
    }

    /// Forget the retained sample
    pub fn reset(&mut self) {
        self.last_sample = None;
    }

    fn check_braking(&self, sample: &MotionSample) -> Option<DrivingEvent> {
        // Negative Y is deceleration under the forward-facing mount
        (sample.accel_y < -self.thresholds.brake_threshold).then(|| {
            DrivingEvent::new(
                EventKind::SuddenBraking,
                sample.timestamp,
                format!("Hard braking detected: {}", sample.accel_y),
                sample.accel_y as f64,
            )
        })
    }

    fn check_rash(&self, sample: &MotionSample) -> Option<DrivingEvent> {
        let total = total_force(sample);
        ((total - self.thresholds.gravity).abs() > self.thresholds.rash_threshold).then(|| {
            DrivingEvent::new(
                EventKind::RashDriving,
                sample.timestamp,
                format!("High G-force detected: {total}"),
                total as f64,
            )
        })
    }

    fn check_zigzag(&self, sample: &MotionSample) -> Option<DrivingEvent> {
        (sample.gyro_z.abs() > self.thresholds.zigzag_threshold).then(|| {
            DrivingEvent::new(
                EventKind::ZigZag,
                sample.timestamp,
                format!("Zig-zag driving detected: {}", sample.gyro_z),
                sample.gyro_z as f64,
            )
        })
    }
}

impl Default for MotionEventDetector {
    fn default() -> Self {
        Self::new(MotionThresholds::default())
    }
}
