//! FileSink - appends scored events to a JSON-lines file

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, EventSink, ScoredEvent};
use serde::Serialize;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file
    pub path: PathBuf,

    /// Keep existing content instead of truncating
    pub append: bool,
}

impl FileSinkConfig {
    /// Build from sink params (`path`, optional `append = "true"`)
    pub fn from_params(params: &HashMap<String, String>) -> std::io::Result<Self> {
        let path = params.get("path").map(PathBuf::from).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' param")
        })?;
        let append = params
            .get("append")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self { path, append })
    }
}

/// One line of the output file
#[derive(Serialize)]
struct EventRecord<'a> {
    /// Wall-clock write time, RFC 3339
    recorded_at: String,
    #[serde(flatten)]
    scored: &'a ScoredEvent,
}

/// Sink that writes one `ScoredEvent` per line
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: BufWriter<File>,
    lines_written: u64,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
            lines_written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params)?)
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    fn write_line(&mut self, scored: &ScoredEvent) -> std::io::Result<()> {
        let record = EventRecord {
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            scored,
        };
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }

    fn sink_error(&self, e: std::io::Error) -> ContractError {
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, scored),
        fields(sink = %self.name, sequence = scored.sequence)
    )]
    async fn write(&mut self, scored: &ScoredEvent) -> Result<(), ContractError> {
        self.write_line(scored).map_err(|e| {
            error!(sink = %self.name, sequence = scored.sequence, error = %e, "Write failed");
            self.sink_error(e)
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer.flush().map_err(|e| self.sink_error(e))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer.flush().map_err(|e| self.sink_error(e))?;
        debug!(
            sink = %self.name,
            path = %self.config.path.display(),
            lines = self.lines_written,
            "FileSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DrivingEvent, EventKind};
    use tempfile::tempdir;

    fn scored(sequence: u64, score_after: u8) -> ScoredEvent {
        ScoredEvent {
            sequence,
            event: DrivingEvent::new(
                EventKind::SuddenBraking,
                sequence as f64,
                "Hard braking detected: -13.5",
                -13.5,
            ),
            score_after,
        }
    }

    #[tokio::test]
    async fn test_file_sink_writes_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("trip.jsonl");
        let config = FileSinkConfig {
            path: path.clone(),
            append: false,
        };

        let mut sink = FileSink::new("trip", config).unwrap();
        sink.write(&scored(1, 95)).await.unwrap();
        sink.write(&scored(2, 90)).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.lines_written(), 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["sequence"], 1);
        assert_eq!(lines[1]["score_after"], 90);
        assert_eq!(lines[0]["event"]["kind"], "SUDDEN_BRAKING");
        let stamp = lines[0]["recorded_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_file_sink_append_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trip.jsonl");
        fs::write(&path, "{\"previous\":true}\n").unwrap();

        let params = HashMap::from([
            ("path".to_string(), path.display().to_string()),
            ("append".to_string(), "true".to_string()),
        ]);
        let mut sink = FileSink::from_params("trip", &params).unwrap();
        sink.write(&scored(1, 95)).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_missing_path_param() {
        assert!(FileSink::from_params("trip", &HashMap::new()).is_err());
    }
}
