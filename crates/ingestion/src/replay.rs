//! Replay Source - 从录制文件回放行程样本
//!
//! 录制格式为 JSON lines，每行一个 `Sample`：
//!
//! ```text
//! {"kind":"motion","timestamp":0.05,"accel_x":0.0,"accel_y":-13.5,"accel_z":9.8,"gyro_z":0.0}
//! {"kind":"position","timestamp":1.0,"latitude":12.97,"longitude":77.59,"speed_mps":25.0,"bearing_deg":0.0,"accuracy_m":4.0}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{ContractError, Sample, SampleCallback, SampleKind, SampleSource};
use tracing::{debug, info, warn};

use crate::error::{IngestionError, Result};

/// Replay 配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayConfig {
    /// 回放速度倍率 (1.0 = 原速, <= 0 不等待)
    pub speed_multiplier: f64,

    /// 是否循环回放
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            loop_playback: false,
        }
    }
}

/// Decode a JSON-lines recording
///
/// Blank lines and `#` comments are skipped. The first undecodable line fails
/// the whole recording. Samples are returned sorted by timestamp.
pub fn parse_recording<R: Read>(reader: R) -> std::result::Result<Vec<Sample>, ContractError> {
    let mut samples = Vec::new();

    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let sample: Sample = serde_json::from_str(trimmed).map_err(|e| {
            ContractError::RecordingParse {
                line: idx + 1,
                message: e.to_string(),
            }
        })?;
        samples.push(sample);
    }

    // 稳定排序，同一时间戳保持录制顺序
    samples.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
    Ok(samples)
}

/// Replays a recorded trip at its original cadence
pub struct ReplaySource {
    source_id: String,
    samples: Arc<Vec<Sample>>,
    config: ReplayConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReplaySource {
    /// Load a JSON-lines recording from disk
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| IngestionError::recording(path, ContractError::Io(e)))?;
        let samples = parse_recording(file).map_err(|e| IngestionError::recording(path, e))?;

        let source_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("replay")
            .to_string();

        info!(
            source_id = %source_id,
            samples = samples.len(),
            path = %path.display(),
            "loaded trip recording"
        );

        Ok(Self::from_samples(source_id, samples, config))
    }

    /// Replay samples already in memory
    pub fn from_samples(
        source_id: impl Into<String>,
        mut samples: Vec<Sample>,
        config: ReplayConfig,
    ) -> Self {
        samples.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
        Self {
            source_id: source_id.into(),
            samples: Arc::new(samples),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recorded trip duration (seconds)
    pub fn duration_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp() - first.timestamp(),
            _ => 0.0,
        }
    }
}

impl SampleSource for ReplaySource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Uniform recordings report their kind; mixed ones report `None`
    fn kind(&self) -> Option<SampleKind> {
        let first = self.samples.first()?.kind();
        self.samples
            .iter()
            .all(|s| s.kind() == first)
            .then_some(first)
    }

    fn listen(&self, callback: SampleCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let source_id = self.source_id.clone();
        let samples = self.samples.clone();
        let speed = self.config.speed_multiplier;
        let paced = speed.is_finite() && speed > 0.0;
        let loop_playback = self.config.loop_playback;

        let handle = thread::spawn(move || {
            debug!(source_id = %source_id, "replay thread started");

            loop {
                let Some(first) = samples.first() else {
                    warn!(source_id = %source_id, "no samples to replay");
                    break;
                };

                let start_time = Instant::now();
                let first_timestamp = first.timestamp();

                for sample in samples.iter() {
                    if !listening.load(Ordering::Relaxed) {
                        debug!(source_id = %source_id, "replay stopped");
                        return;
                    }

                    if paced {
                        let offset = (sample.timestamp() - first_timestamp) / speed;
                        let target = Duration::from_secs_f64(offset.max(0.0));
                        let elapsed = start_time.elapsed();
                        if target > elapsed {
                            thread::sleep(target - elapsed);
                        }
                    }

                    callback(*sample);
                }

                if !loop_playback {
                    info!(source_id = %source_id, "replay completed");
                    break;
                }

                debug!(source_id = %source_id, "looping replay");
            }

            listening.store(false, Ordering::SeqCst);
        });

        if let Ok(mut slot) = self.thread_handle.lock() {
            *slot = Some(handle);
        }
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);

        // 等待线程结束
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

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}
