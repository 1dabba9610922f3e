#[cfg(test)]
mod tests {
    use bulwark_core::config::{BalanceConfig, PatternConfig};
    use bulwark_core::enums::SpawnPattern;
    use glam::Vec2;

    use crate::balance::{enemy_count_for_wave, hp_multiplier_for_wave, spawn_interval_for_count};
    use crate::patterns::{halton, hash01, sample, spawn_position, EdgeSample};

    fn reference_balance() -> BalanceConfig {
        BalanceConfig {
            first_wave_count: 30,
            growth_per_wave: 1.5,
            hp_step_waves: 10,
            hp_step_multiplier: 1.2,
        }
    }

    /// Padding and jitter disabled, so raw pattern values are observable.
    fn bare_patterns() -> PatternConfig {
        PatternConfig {
            vertical_padding: 0.0,
            micro_jitter: 0.0,
            column_jitter: 0.0,
            ..Default::default()
        }
    }

    // ---- Balance ----

    #[test]
    fn test_first_wave_count_is_exact() {
        let cfg = reference_balance();
        assert_eq!(enemy_count_for_wave(&cfg, 1), 30);
        assert_eq!(enemy_count_for_wave(&cfg, 2), 45);
        assert_eq!(enemy_count_for_wave(&cfg, 3), 68, "ceil(67.5)");
    }

    #[test]
    fn test_wave_zero_is_clamped() {
        let cfg = reference_balance();
        assert_eq!(enemy_count_for_wave(&cfg, 0), enemy_count_for_wave(&cfg, 1));
        assert_eq!(hp_multiplier_for_wave(&cfg, 0), 1.0);
    }

    #[test]
    fn test_enemy_count_monotonic() {
        let cfg = reference_balance();
        let mut previous = enemy_count_for_wave(&cfg, 1);
        for wave in 2..=80 {
            let count = enemy_count_for_wave(&cfg, wave);
            assert!(
                count >= previous,
                "wave {wave}: {count} < previous {previous}"
            );
            previous = count;
        }
    }

    #[test]
    fn test_flat_growth_keeps_count() {
        let cfg = BalanceConfig {
            growth_per_wave: 1.0,
            ..reference_balance()
        };
        for wave in 1..=20 {
            assert_eq!(enemy_count_for_wave(&cfg, wave), 30);
        }
    }

    #[test]
    fn test_enemy_count_saturates() {
        let cfg = reference_balance();
        assert_eq!(enemy_count_for_wave(&cfg, 5_000), u32::MAX);
    }

    #[test]
    fn test_hp_multiplier_steps_every_k_waves() {
        let cfg = reference_balance();
        for wave in 1..=10 {
            assert_eq!(hp_multiplier_for_wave(&cfg, wave), 1.0, "wave {wave}");
        }
        assert!((hp_multiplier_for_wave(&cfg, 11) - 1.2).abs() < 1e-6);
        assert!((hp_multiplier_for_wave(&cfg, 20) - 1.2).abs() < 1e-6);
        assert!((hp_multiplier_for_wave(&cfg, 21) - 1.44).abs() < 1e-5);
    }

    #[test]
    fn test_generated_interval_tiers() {
        assert_eq!(spawn_interval_for_count(10), 0.3);
        assert_eq!(spawn_interval_for_count(80), 0.1);
        assert_eq!(spawn_interval_for_count(250), 0.05);
        assert_eq!(spawn_interval_for_count(1_000), 0.02);
    }

    // ---- Sequences ----

    #[test]
    fn test_halton_reference_values() {
        assert_eq!(halton(1, 2), 0.5);
        assert!((halton(1, 3) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(halton(2, 2), 0.25);
        assert_eq!(halton(3, 2), 0.75);
        assert!((halton(2, 3) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(halton(0, 2), 0.0);
    }

    #[test]
    fn test_hash_is_deterministic_and_bounded() {
        for i in 0..1_000 {
            let a = hash01(17, i);
            assert_eq!(a, hash01(17, i));
            assert!((0.0..1.0).contains(&a));
        }
        let differing = (0..100).filter(|&i| hash01(1, i) != hash01(2, i)).count();
        assert!(differing > 90, "seeds should decorrelate the hash");
    }

    // ---- Patterns ----

    #[test]
    fn test_patterns_are_deterministic() {
        let cfg = PatternConfig::default();
        for pattern in SpawnPattern::ALL {
            let a = sample(pattern, 3, 10, 99, &cfg);
            let b = sample(pattern, 3, 10, 99, &cfg);
            assert_eq!(a, b, "{pattern:?} not deterministic");
        }
    }

    #[test]
    fn test_golden_spiral_raw_values() {
        let cfg = bare_patterns();
        let first = sample(SpawnPattern::GoldenSpiral, 0, 4, 0, &cfg);
        assert!((first.y_norm - 0.618_034).abs() < 1e-5);
        assert!((first.inward - 0.5 * cfg.horizontal_depth).abs() < 1e-5);

        let last = sample(SpawnPattern::GoldenSpiral, 3, 4, 0, &cfg);
        assert!((last.inward - cfg.horizontal_depth).abs() < 1e-5);
    }

    #[test]
    fn test_halton_pattern_uses_bases_two_and_three() {
        let cfg = bare_patterns();
        let s = sample(SpawnPattern::Halton, 0, 8, 0, &cfg);
        assert_eq!(s.y_norm, 0.5);
        assert!((s.inward - cfg.horizontal_depth / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_sine_wave_rows_are_stratified() {
        let cfg = bare_patterns();
        for j in 0..5 {
            let s = sample(SpawnPattern::SineWave, j, 5, 0, &cfg);
            assert!((s.y_norm - (j as f32 + 0.5) / 5.0).abs() < 1e-6);
            assert!(s.inward >= 0.0 && s.inward <= cfg.horizontal_depth);
        }
    }

    #[test]
    fn test_poisson_jitter_stays_near_its_cell() {
        let cfg = bare_patterns();
        let n = 20;
        for j in 0..n {
            let s = sample(SpawnPattern::PoissonJitter, j, n, 5, &cfg);
            let center = (j as f32 + 0.5) / n as f32;
            assert!((s.y_norm - center).abs() <= 0.9 / n as f32 + 1e-6);
            assert!(s.inward >= 0.0 && s.inward < cfg.horizontal_depth);
        }
    }

    #[test]
    fn test_column_shares_one_inset() {
        let cfg = PatternConfig::default();
        let inward = sample(SpawnPattern::Column, 0, 12, 3, &cfg).inward;
        assert!(inward >= 0.0 && inward <= cfg.max_inset);
        for j in 1..12 {
            assert_eq!(sample(SpawnPattern::Column, j, 12, 3, &cfg).inward, inward);
        }
    }

    #[test]
    fn test_diagonal_recedes_per_spawn() {
        let cfg = PatternConfig::default();
        let first = sample(SpawnPattern::Diagonal, 0, 6, 3, &cfg);
        let fourth = sample(SpawnPattern::Diagonal, 3, 6, 3, &cfg);
        assert!((fourth.inward - first.inward - 3.0 * cfg.diagonal_spacing).abs() < 1e-5);
    }

    #[test]
    fn test_padding_bounds_non_legacy_patterns() {
        let cfg = PatternConfig {
            vertical_padding: 0.1,
            micro_jitter: 0.01,
            ..Default::default()
        };
        for pattern in SpawnPattern::ALL.into_iter().filter(|p| !p.is_legacy()) {
            for j in 0..64 {
                let s = sample(pattern, j, 64, 11, &cfg);
                assert!(
                    s.y_norm >= 0.09 - 1e-6 && s.y_norm <= 0.91 + 1e-6,
                    "{pattern:?} j={j} y={}",
                    s.y_norm
                );
            }
        }
    }

    #[test]
    fn test_zero_count_treated_as_one() {
        let cfg = PatternConfig::default();
        for pattern in SpawnPattern::ALL {
            assert_eq!(sample(pattern, 0, 0, 8, &cfg), sample(pattern, 0, 1, 8, &cfg));
        }
    }

    #[test]
    fn test_world_conversion_subtracts_depth() {
        let s = EdgeSample {
            y_norm: 0.25,
            inward: 2.0,
        };
        let world = s.to_world(|t| Vec2::new(50.0, t * 100.0));
        assert_eq!(world, Vec2::new(48.0, 25.0));

        let cfg = bare_patterns();
        let direct = spawn_position(SpawnPattern::Halton, 0, 8, 0, &cfg, |t| {
            Vec2::new(10.0, t * 8.0)
        });
        assert!((direct.y - 4.0).abs() < 1e-5);
        assert!((direct.x - (10.0 - cfg.horizontal_depth / 3.0)).abs() < 1e-5);
    }
}
