//! Layered error definitions
//!
//! Categorized by source: config / sample / road context / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sample Errors =====
    /// Sample carries a NaN or infinite field
    #[error("malformed {kind} sample: field '{field}' is not finite")]
    MalformedSample { kind: String, field: String },

    /// Recorded trip line could not be decoded
    #[error("recording parse error at line {line}: {message}")]
    RecordingParse { line: usize, message: String },

    // ===== Road Context Errors =====
    /// Road context provider failed to answer
    #[error("road context lookup failed at ({latitude}, {longitude}): {message}")]
    RoadLookup {
        latitude: f64,
        longitude: f64,
        message: String,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create malformed sample error
    pub fn malformed_sample(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MalformedSample {
            kind: kind.into(),
            field: field.into(),
        }
    }

    /// Create road lookup error
    pub fn road_lookup(latitude: f64, longitude: f64, message: impl Into<String>) -> Self {
        Self::RoadLookup {
            latitude,
            longitude,
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
