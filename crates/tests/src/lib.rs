//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟行程 e2e 测试（mock / replay -> engine -> dispatcher）
//! - 配置到引擎的装配测试

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{EventKind, RatingBlueprint, Sample};

    #[test]
    fn test_default_blueprint_round_trips_through_loader() {
        let blueprint = RatingBlueprint::default();
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let loaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(loaded.version, contracts::ConfigVersion::V1);
        assert_eq!(loaded.engine, blueprint.engine);
    }

    #[test]
    fn test_recording_line_format() {
        let line = r#"{"kind":"position","timestamp":1.0,"latitude":12.97,"longitude":77.59,"speed_mps":25.0,"bearing_deg":0.0,"accuracy_m":4.0}"#;
        let sample: Sample = serde_json::from_str(line).unwrap();
        assert_eq!(sample.kind(), contracts::SampleKind::Position);

        let event = serde_json::to_value(EventKind::OverspeedingNarrow).unwrap();
        assert_eq!(event, "OVERSPEEDING_NARROW");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use contracts::{
        EventKind, MotionSample, PositionSample, Sample, ScoredEvent, SinkConfig, SinkType,
    };
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::create_dispatcher;
    use ingestion::{
        generate_trip, IngestionPipeline, MockSampleSource, MockScenarioConfig, ReplayConfig,
        ReplaySource, ZoneRoadProvider,
    };
    use observability::TripMetricsAggregator;
    use rating_engine::{DrivingEngine, EngineConfig, SharedEngine};
    use tokio::sync::mpsc;

    fn count(events: &[contracts::DrivingEvent], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }

    fn log_sink(name: &str) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 64,
            params: HashMap::new(),
        }
    }

    /// Scripted demo trip straight through the engine
    #[test]
    fn test_demo_trip_events() {
        let trip = generate_trip(&MockScenarioConfig::default());
        let mut engine = DrivingEngine::new(EngineConfig::default()).unwrap();
        let road = ZoneRoadProvider::default();

        let mut previous = engine.score();
        for sample in &trip {
            engine.ingest(sample, &road);
            assert!(engine.score() <= previous, "score must never rise");
            previous = engine.score();
        }

        let log = engine.current_state().event_log;
        assert_eq!(count(&log, EventKind::SuddenBraking), 10);
        assert_eq!(count(&log, EventKind::ZigZag), 20);
        assert_eq!(count(&log, EventKind::Overspeeding), 2);
        assert_eq!(count(&log, EventKind::RashDriving), 0);
        assert_eq!(count(&log, EventKind::OverspeedingNarrow), 0);
        assert_eq!(engine.score(), 0);
    }

    /// End-to-end: MockSampleSource -> IngestionPipeline -> engine -> Dispatcher
    ///
    /// 验证完整的数据流：
    /// 1. MockSampleSource 在后台线程生成样本
    /// 2. 引擎检测事件并评分
    /// 3. Dispatcher 将 ScoredEvent 分发到 sinks
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let config = MockScenarioConfig {
            realtime: false,
            ..Default::default()
        };
        let expected_samples = generate_trip(&config).len() as u64;

        let mut pipeline = IngestionPipeline::new(4096);
        pipeline
            .register_source(Box::new(MockSampleSource::new("trip", config).unwrap()), None)
            .unwrap();

        let (event_tx, event_rx) = mpsc::channel::<ScoredEvent>(256);
        let dispatcher = create_dispatcher(vec![log_sink("console")], event_rx).unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let engine = SharedEngine::new(DrivingEngine::new(EngineConfig::default()).unwrap());
        let road = ZoneRoadProvider::default();
        let mut trip = TripMetricsAggregator::new();

        pipeline.start_all();
        let rx = pipeline.take_receiver().unwrap();

        let consume = async {
            loop {
                match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
                    Ok(Ok(sample)) => {
                        trip.record_sample(&sample);
                        for scored in engine.ingest_scored(&sample, &road) {
                            trip.update(&scored);
                            event_tx.send(scored).await.unwrap();
                        }
                    }
                    Ok(Err(_)) => break,
                    Err(_) if pipeline.all_finished() && rx.is_empty() => break,
                    Err(_) => continue,
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(10), consume)
            .await
            .expect("pipeline timed out");

        pipeline.stop_all();
        drop(event_tx);
        let sinks = tokio::time::timeout(Duration::from_secs(2), dispatcher_handle)
            .await
            .unwrap()
            .unwrap();

        let summary = trip.summary();
        assert_eq!(
            summary.motion_samples + summary.position_samples,
            expected_samples
        );
        assert_eq!(summary.total_events, 32);
        assert_eq!(summary.final_score, 0);
        assert_eq!(sinks[0].1.write_count, 32);
        assert_eq!(engine.stats().events_emitted, 32);
    }

    /// Replay recording -> engine -> file sink, checking the written records
    #[tokio::test]
    async fn test_replay_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scored.jsonl");

        let samples: Vec<Sample> = vec![
            MotionSample {
                timestamp: 0.05,
                accel_x: 0.0,
                accel_y: -13.5,
                accel_z: 9.8,
                gyro_z: 0.0,
            }
            .into(),
            PositionSample {
                timestamp: 1.0,
                latitude: 12.97,
                longitude: 77.59,
                speed_mps: 25.0,
                bearing_deg: 0.0,
                accuracy_m: 4.0,
            }
            .into(),
            MotionSample::at_rest(1.05).into(),
        ];
        let source = ReplaySource::from_samples(
            "recorded",
            samples,
            ReplayConfig {
                speed_multiplier: 0.0,
                loop_playback: false,
            },
        );

        let mut pipeline = IngestionPipeline::new(16);
        pipeline.register_source(Box::new(source), None).unwrap();

        let (event_tx, event_rx) = mpsc::channel::<ScoredEvent>(16);
        let file_sink = SinkConfig {
            name: "archive".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 16,
            params: HashMap::from([("path".to_string(), out.display().to_string())]),
        };
        let handle = create_dispatcher(vec![file_sink], event_rx).unwrap().spawn();

        let engine = SharedEngine::new(DrivingEngine::new(EngineConfig::default()).unwrap());
        pipeline.start_all();
        let rx = pipeline.take_receiver().unwrap();

        let mut received = 0;
        while received < 3 {
            let sample = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            received += 1;
            for scored in engine.ingest_scored(&sample, &contracts::UnknownRoad) {
                event_tx.send(scored).await.unwrap();
            }
        }
        drop(event_tx);
        handle.await.unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        let records: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["sequence"], 1);
        assert_eq!(records[0]["event"]["kind"], "SUDDEN_BRAKING");
        assert_eq!(records[0]["score_after"], 95);
        assert_eq!(records[1]["event"]["kind"], "OVERSPEEDING");
        assert_eq!(records[1]["score_after"], 90);
        assert!(records[1]["recorded_at"].is_string());
    }

    /// Config file zones drive the narrow-lane rule
    #[test]
    fn test_config_zones_drive_location_rules() {
        let toml = r#"
version = "v1"

[engine.location]
narrow_limit_kmh = 40.0
highway_limit_kmh = 80.0

[[road.zones]]
name = "old_town"
latitude = 12.97
longitude = 77.59
radius_m = 250.0
narrow_lane = true

[[road.zones]]
name = "school"
latitude = 13.10
longitude = 77.59
radius_m = 200.0
legal_speed_kmh = 30.0

[[sinks]]
name = "console"
sink_type = "log"
"#;
        let blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let road = ZoneRoadProvider::from_config(&blueprint.road);
        let mut engine = DrivingEngine::new(blueprint.engine.clone()).unwrap();

        let fix = |latitude: f64, speed_mps: f32| PositionSample {
            timestamp: 0.0,
            latitude,
            longitude: 77.59,
            speed_mps,
            bearing_deg: 0.0,
            accuracy_m: 3.0,
        };

        // 12 m/s = 43.2 km/h, over the narrow limit inside old_town
        let events = engine.ingest_position_from(&fix(12.9701, 12.0), &road);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::OverspeedingNarrow);

        // same speed past a 30 km/h school zone limit
        let events = engine.ingest_position_from(&fix(13.10, 12.0), &road);
        assert_eq!(events[0].kind, EventKind::Overspeeding);

        // open road: 12 m/s is legal
        assert!(engine.ingest_position_from(&fix(14.0, 12.0), &road).is_empty());
        assert_eq!(engine.score(), 90);
    }

    /// Dispatcher with multiple sink types
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        let (tx, rx) = mpsc::channel::<ScoredEvent>(10);

        let dispatcher =
            create_dispatcher(vec![log_sink("log1"), log_sink("log2")], rx).unwrap();
        assert_eq!(dispatcher.metrics().len(), 2);

        let handle = dispatcher.spawn();

        let mut engine = DrivingEngine::new(EngineConfig::default()).unwrap();
        for i in 0..5 {
            let sample: Sample = MotionSample {
                timestamp: i as f64,
                accel_x: 0.0,
                accel_y: 0.0,
                accel_z: 9.8,
                gyro_z: 2.5,
            }
            .into();
            for scored in engine.ingest_scored(&sample, &contracts::UnknownRoad) {
                tx.send(scored).await.unwrap();
            }
        }
        drop(tx);

        let sinks = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        for (_, snapshot) in sinks {
            assert_eq!(snapshot.write_count, 5);
        }
    }
}

#[cfg(test)]
mod property_tests {
    use contracts::{EventKind, MotionSample, PositionSample, RoadContext};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rating_engine::{DrivingEngine, EngineConfig};

    /// Random trips: the two overspeeding kinds never co-occur and the
    /// score only falls, floored at zero
    #[test]
    fn test_random_trips_hold_scoring_rules() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..20 {
            let mut engine = DrivingEngine::new(EngineConfig::default()).unwrap();
            let mut previous = engine.score();

            for t in 0..300 {
                let events = if rng.random_bool(0.7) {
                    engine.ingest_motion(&MotionSample {
                        timestamp: t as f64,
                        accel_x: rng.random_range(-6.0..6.0),
                        accel_y: rng.random_range(-20.0..8.0),
                        accel_z: rng.random_range(5.0..15.0),
                        gyro_z: rng.random_range(-3.0..3.0),
                    })
                } else {
                    let ctx = if rng.random_bool(0.5) {
                        RoadContext::narrow()
                    } else {
                        RoadContext::default()
                    };
                    engine.ingest_position(
                        &PositionSample {
                            timestamp: t as f64,
                            latitude: 0.0,
                            longitude: 0.0,
                            speed_mps: rng.random_range(0.0..40.0),
                            bearing_deg: 0.0,
                            accuracy_m: 5.0,
                        },
                        &ctx,
                    )
                };

                let narrow = events.iter().any(|e| e.kind == EventKind::OverspeedingNarrow);
                let highway = events.iter().any(|e| e.kind == EventKind::Overspeeding);
                assert!(!(narrow && highway));

                assert!(engine.score() <= previous);
                previous = engine.score();
            }

            let state = engine.current_state();
            let expected = 100usize.saturating_sub(state.event_log.len() * 5);
            assert_eq!(usize::from(state.score), expected);
        }
    }
}
