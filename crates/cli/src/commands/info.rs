//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RatingBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    motion: MotionInfo,
    location: LocationInfo,
    penalty: u8,
    zone_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    zones: Vec<ZoneInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct MotionInfo {
    brake_threshold: f32,
    rash_threshold: f32,
    zigzag_threshold: f32,
    gravity: f32,
}

#[derive(Serialize)]
struct LocationInfo {
    narrow_limit_kmh: f32,
    highway_limit_kmh: f32,
    heading_history_len: usize,
}

#[derive(Serialize)]
struct ZoneInfo {
    name: String,
    latitude: f64,
    longitude: f64,
    radius_m: f64,
    narrow_lane: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_speed_kmh: Option<f32>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &RatingBlueprint, args: &InfoArgs) -> ConfigInfo {
    let engine = &blueprint.engine;

    let zones = if args.zones {
        blueprint
            .road
            .zones
            .iter()
            .map(|z| ZoneInfo {
                name: z.name.clone(),
                latitude: z.latitude,
                longitude: z.longitude,
                radius_m: z.radius_m,
                narrow_lane: z.narrow_lane,
                legal_speed_kmh: z.legal_speed_kmh,
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        motion: MotionInfo {
            brake_threshold: engine.motion.brake_threshold,
            rash_threshold: engine.motion.rash_threshold,
            zigzag_threshold: engine.motion.zigzag_threshold,
            gravity: engine.motion.gravity,
        },
        location: LocationInfo {
            narrow_limit_kmh: engine.location.narrow_limit_kmh,
            highway_limit_kmh: engine.location.highway_limit_kmh,
            heading_history_len: engine.location.heading_history_len,
        },
        penalty: engine.scoring.penalty,
        zone_count: blueprint.road.zones.len(),
        zones,
        sinks,
    }
}

fn print_config_info(blueprint: &RatingBlueprint, args: &InfoArgs) {
    let engine = &blueprint.engine;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Driver Rating Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📈 Motion thresholds");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Sudden braking: accel_y < -{} m/s²", engine.motion.brake_threshold);
    println!(
        "   ├─ Rash driving: |force - {}| > {} m/s²",
        engine.motion.gravity, engine.motion.rash_threshold
    );
    println!("   └─ Zig-zag: |gyro_z| > {} rad/s", engine.motion.zigzag_threshold);

    println!("\n🚦 Speed limits");
    println!("   ├─ Narrow lane: {} km/h", engine.location.narrow_limit_kmh);
    println!("   ├─ Highway: {} km/h", engine.location.highway_limit_kmh);
    println!(
        "   └─ Heading history: {} fixes",
        engine.location.heading_history_len
    );

    println!("\n⚙️  Scoring");
    println!("   └─ Penalty per event: {}", engine.scoring.penalty);

    println!(
        "\n🗺️  Road zones ({}, {} narrow)",
        blueprint.road.zones.len(),
        blueprint.narrow_zone_count()
    );
    if args.zones {
        for (i, zone) in blueprint.road.zones.iter().enumerate() {
            let is_last = i == blueprint.road.zones.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let limit = zone
                .legal_speed_kmh
                .map_or_else(|| "default limit".to_string(), |kmh| format!("{kmh} km/h"));
            println!(
                "   {} {} ({:.5}, {:.5}) r={}m{} {}",
                prefix,
                zone.name,
                zone.latitude,
                zone.longitude,
                zone.radius_m,
                if zone.narrow_lane { " narrow" } else { "" },
                limit
            );
        }
    }

    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.sinks {
                println!(
                    "   {} {} ({:?}, queue {}) {:?}",
                    prefix, sink.name, sink.sink_type, sink.queue_capacity, sink.params
                );
            } else {
                println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
            }
        }
    }

    println!();
}
