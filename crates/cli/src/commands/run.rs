//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{RatingBlueprint, SinkConfig, SinkType};
use ingestion::{MockScenarioConfig, ReplayConfig};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig, TripSource};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    info!(
        brake_threshold = blueprint.engine.motion.brake_threshold,
        highway_limit_kmh = blueprint.engine.location.highway_limit_kmh,
        zones = blueprint.road.zones.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        source: trip_source(args),
        max_events: (args.max_events > 0).then_some(args.max_events),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    info!("Starting pipeline...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        samples = stats.samples_processed(),
        events = stats.trip.total_events,
        score = stats.trip.final_score,
        duration_secs = stats.duration.as_secs_f64(),
        samples_per_sec = format!("{:.1}", stats.samples_per_sec()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Driver Rating finished");
    Ok(())
}

/// Load the configured blueprint, or defaults with a console sink
fn load_blueprint(args: &RunArgs) -> Result<RatingBlueprint> {
    let Some(path) = &args.config else {
        info!("No configuration file given, using built-in defaults");
        let mut blueprint = RatingBlueprint::default();
        blueprint.sinks.push(SinkConfig {
            name: "console".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 100,
            params: HashMap::new(),
        });
        return Ok(blueprint);
    };

    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn trip_source(args: &RunArgs) -> TripSource {
    match &args.replay {
        Some(path) => {
            info!(path = %path.display(), speed = args.replay_speed, "Running in REPLAY mode");
            TripSource::Replay {
                path: path.clone(),
                config: ReplayConfig {
                    speed_multiplier: if args.no_pacing { 0.0 } else { args.replay_speed },
                    loop_playback: args.loop_playback,
                },
            }
        }
        None => {
            info!("Running the built-in scripted trip");
            TripSource::Scripted(MockScenarioConfig {
                realtime: !args.no_pacing,
                loop_playback: args.loop_playback,
                ..Default::default()
            })
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RatingBlueprint) {
    let engine = &blueprint.engine;
    println!("\n=== Configuration Summary ===\n");
    println!("Motion thresholds:");
    println!("  Braking: {} m/s²", engine.motion.brake_threshold);
    println!("  Rash: {} m/s² off gravity", engine.motion.rash_threshold);
    println!("  Zig-zag: {} rad/s", engine.motion.zigzag_threshold);
    println!("\nSpeed limits:");
    println!("  Narrow lane: {} km/h", engine.location.narrow_limit_kmh);
    println!("  Highway: {} km/h", engine.location.highway_limit_kmh);
    println!("\nPenalty per event: {}", engine.scoring.penalty);

    println!(
        "\nRoad zones ({}, {} narrow)",
        blueprint.road.zones.len(),
        blueprint.narrow_zone_count()
    );
    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }
    println!();
}
