//! 配置校验模块
//!
//! 校验规则：
//! - engine 阈值合法 (finite, >= 0, gravity > 0, penalty 1..=100)
//! - zone name 唯一且非空
//! - zone 半径 > 0, 经纬度在合法范围内
//! - sink name 唯一且非空, file sink 必须有 path

use std::collections::HashSet;

use contracts::{ContractError, RatingBlueprint, SinkType};

/// 校验 RatingBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RatingBlueprint) -> Result<(), ContractError> {
    blueprint.engine.check()?;
    validate_zone_names(blueprint)?;
    validate_zone_geometry(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_zone_names(blueprint: &RatingBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, zone) in blueprint.road.zones.iter().enumerate() {
        if zone.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("road.zones[{idx}].name"),
                "zone name cannot be empty",
            ));
        }
        if !seen.insert(zone.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("road.zones[name={}]", zone.name),
                "duplicate zone name",
            ));
        }
    }
    Ok(())
}

fn validate_zone_geometry(blueprint: &RatingBlueprint) -> Result<(), ContractError> {
    for zone in &blueprint.road.zones {
        let field = |name: &str| format!("road.zones[{}].{name}", zone.name);

        if !(zone.radius_m.is_finite() && zone.radius_m > 0.0) {
            return Err(ContractError::config_validation(
                field("radius_m"),
                format!("radius_m must be > 0, got {}", zone.radius_m),
            ));
        }
        if !(-90.0..=90.0).contains(&zone.latitude) {
            return Err(ContractError::config_validation(
                field("latitude"),
                format!("latitude must be in [-90, 90], got {}", zone.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&zone.longitude) {
            return Err(ContractError::config_validation(
                field("longitude"),
                format!("longitude must be in [-180, 180], got {}", zone.longitude),
            ));
        }
        if let Some(limit) = zone.legal_speed_kmh {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(ContractError::config_validation(
                    field("legal_speed_kmh"),
                    format!("legal_speed_kmh must be > 0, got {limit}"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_sinks(blueprint: &RatingBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::File && !sink.params.contains_key("path") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                "file sink requires a 'path' param",
            ));
        }
    }
    Ok(())
}
