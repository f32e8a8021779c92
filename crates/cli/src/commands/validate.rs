//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RatingBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    penalty: u8,
    /// Events needed to bring a fresh trip down to 0
    events_to_floor: u32,
    zone_count: usize,
    narrow_zone_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    penalty: blueprint.engine.scoring.penalty,
                    events_to_floor: events_to_floor(blueprint.engine.scoring.penalty),
                    zone_count: blueprint.road.zones.len(),
                    narrow_zone_count: blueprint.narrow_zone_count(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn events_to_floor(penalty: u8) -> u32 {
    u32::from(contracts::MAX_SCORE).div_ceil(u32::from(penalty.max(1)))
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RatingBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let engine = &blueprint.engine;

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - scored events will not be dispatched".to_string());
    }

    if engine.location.narrow_limit_kmh >= engine.location.highway_limit_kmh {
        warnings.push(format!(
            "narrow_limit_kmh ({}) is not below highway_limit_kmh ({})",
            engine.location.narrow_limit_kmh, engine.location.highway_limit_kmh
        ));
    }

    if engine.scoring.penalty > 25 {
        warnings.push(format!(
            "penalty {} floors the score after {} events",
            engine.scoring.penalty,
            events_to_floor(engine.scoring.penalty)
        ));
    }

    for zone in &blueprint.road.zones {
        if !zone.narrow_lane && zone.legal_speed_kmh.is_none() {
            warnings.push(format!(
                "Zone '{}' sets neither narrow_lane nor legal_speed_kmh",
                zone.name
            ));
        }
    }

    if blueprint
        .sinks
        .iter()
        .filter(|s| s.sink_type == SinkType::Log)
        .count()
        > 1
    {
        warnings.push("More than one log sink - events will be logged repeatedly".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Rating config OK: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Penalty: {} per event (score floors after {} events)",
                summary.penalty, summary.events_to_floor
            );
            println!(
                "  Road zones: {} ({} narrow)",
                summary.zone_count, summary.narrow_zone_count
            );
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Rating config rejected: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config: path,
            json: true,
        }
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(
            r#"
version = "v1"

[engine.scoring]
penalty = 40

[[road.zones]]
name = "plain"
latitude = 12.97
longitude = 77.59
radius_m = 100.0
"#,
        );
        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("No sinks")));
        assert!(warnings.iter().any(|w| w.contains("after 3 events")));
        assert!(warnings.iter().any(|w| w.contains("'plain'")));
        let summary = result.summary.unwrap();
        assert_eq!(summary.zone_count, 1);
        assert_eq!(summary.events_to_floor, 3);
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let file = write_config("[engine.scoring]\npenalty = 0\n");
        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("penalty"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/rating.toml")));
        assert!(!result.valid);
        assert!(run_validate(&args(PathBuf::from("/nonexistent/rating.toml"))).is_err());
    }
}
