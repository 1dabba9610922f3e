#[cfg(test)]
mod tests {
    use crate::commands::WaveCommand;
    use crate::config::SequenceConfig;
    use crate::enums::*;
    use crate::error::ConfigError;
    use crate::events::WaveEvent;
    use crate::state::RunStatistics;
    use crate::types::{ArchetypeId, EnemyId, SimTime};
    use crate::wave::{SpawnEntry, WaveDefinition};

    #[test]
    fn test_default_config_is_valid() {
        let config = SequenceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.balance.first_wave_count, 30);
        assert_eq!(config.balance.hp_step_waves, 10);
        assert!(config.waves.is_empty());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = SequenceConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SequenceConfig::default());
    }

    #[test]
    fn test_partial_json_overrides_section() {
        let json = r#"{
            "seed": 7,
            "balance": { "first_wave_count": 12 },
            "flow": { "loop_sequence": true, "default_archetype": 3 }
        }"#;
        let config = SequenceConfig::from_json_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.balance.first_wave_count, 12);
        assert_eq!(config.balance.growth_per_wave, 1.5);
        assert!(config.flow.loop_sequence);
        assert_eq!(config.flow.default_archetype, Some(ArchetypeId(3)));
    }

    #[test]
    fn test_authored_waves_accept_negative_lane() {
        let json = r#"{
            "waves": [
                {
                    "entries": [
                        { "archetype": 1, "count": 4, "interval_secs": 0.5, "lane": -1, "along_edge": false },
                        { "archetype": 2, "count": 2, "lane": 3, "along_edge": false },
                        { "archetype": null, "count": 9 }
                    ],
                    "manual_shop": true
                }
            ]
        }"#;
        let config = SequenceConfig::from_json_str(json).unwrap();
        let wave = &config.waves[0];
        assert_eq!(wave.entries[0].lane, None);
        assert_eq!(wave.entries[1].lane, Some(3));
        assert!(wave.entries[2].along_edge, "along_edge defaults to true");
        assert!(!wave.entries[2].is_valid());
        assert!(wave.manual_shop);
        assert!(!wave.manual_preparation);
        assert_eq!(wave.total_enemies(), 15);
    }

    #[test]
    fn test_invalid_growth_rejected() {
        let err = SequenceConfig::from_json_str(r#"{ "balance": { "growth_per_wave": 0.5 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "balance.growth_per_wave",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_padding_rejected() {
        let err = SequenceConfig::from_json_str(r#"{ "patterns": { "vertical_padding": 0.5 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("patterns.vertical_padding"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = SequenceConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("bulwark_core_missing_config.json");
        let _ = std::fs::remove_file(&path);
        let err = SequenceConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_spawn_entry_validity() {
        let good = SpawnEntry::along_edge(ArchetypeId(1), 10, 0.0);
        assert!(good.is_valid());

        let mut negative = good;
        negative.interval_secs = -1.0;
        assert!(!negative.is_valid());

        let mut nan = good;
        nan.interval_secs = f32::NAN;
        assert!(!nan.is_valid());

        let lane = SpawnEntry::in_lane(ArchetypeId(2), 3, 1.0, Some(0));
        assert!(lane.is_valid());
        assert!(!lane.along_edge);
    }

    #[test]
    fn test_wave_total_saturates() {
        let wave = WaveDefinition::with_entries(vec![
            SpawnEntry::along_edge(ArchetypeId(1), u32::MAX, 0.0),
            SpawnEntry::along_edge(ArchetypeId(1), 5, 0.0),
        ]);
        assert_eq!(wave.total_enemies(), u32::MAX);
        assert!(!wave.is_empty());
        assert!(WaveDefinition::default().is_empty());
    }

    #[test]
    fn test_first_archetype_skips_broken_entries() {
        let mut broken = SpawnEntry::along_edge(ArchetypeId(0), 1, 0.0);
        broken.archetype = None;
        let wave = WaveDefinition::with_entries(vec![
            broken,
            SpawnEntry::in_lane(ArchetypeId(9), 1, 0.0, None),
        ]);
        assert_eq!(wave.first_archetype(), Some(ArchetypeId(9)));
    }

    #[test]
    fn test_run_statistics_best_is_monotonic() {
        let mut stats = RunStatistics::default();
        stats.record_kill();
        stats.record_kill();
        assert!(stats.capture_end_of_run());
        assert_eq!(stats.best_run_kills, 2);

        stats.begin_run();
        stats.record_kill();
        assert!(!stats.capture_end_of_run());
        assert_eq!(stats.last_run_kills, 1);
        assert_eq!(stats.best_run_kills, 2);
    }

    #[test]
    fn test_phase_countdown_flags() {
        assert!(Phase::Shop.is_countdown());
        assert!(Phase::Preparation.is_countdown());
        assert!(!Phase::Combat.is_countdown());
        assert!(!Phase::Idle.is_countdown());
    }

    #[test]
    fn test_legacy_patterns() {
        let legacy: Vec<_> = SpawnPattern::ALL
            .iter()
            .filter(|p| p.is_legacy())
            .collect();
        assert_eq!(legacy, vec![&SpawnPattern::Column, &SpawnPattern::Diagonal]);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = WaveEvent::PhaseTimerUpdated {
            phase: Phase::Shop,
            remaining_secs: None,
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "PhaseTimerUpdated");
        assert_eq!(json["phase"], "Shop");
        assert!(json["remaining_secs"].is_null());
    }

    #[test]
    fn test_command_json_shape() {
        let command: WaveCommand =
            serde_json::from_str(r#"{ "type": "EnemyDefeated", "enemy": 42 }"#).unwrap();
        assert_eq!(command, WaveCommand::EnemyDefeated { enemy: EnemyId(42) });
    }

    #[test]
    fn test_sim_time_advance() {
        let mut time = SimTime::default();
        time.advance(0.5);
        time.advance(0.25);
        assert_eq!(time.tick, 2);
        assert!((time.elapsed_secs - 0.75).abs() < 1e-9);
    }
}
