//! Admission control: which path a spawn takes and how fast it may go.
//!
//! Large entries and large remaining waves go to the buffering
//! collaborator. Otherwise the rate-limited scheduler is preferred when
//! available, and the world spawns immediately as the last resort.
//! Immediate spawns of big entries are capped per tick.

use bulwark_core::config::AdmissionConfig;
use bulwark_core::enums::AdmissionPath;
use bulwark_core::types::{ArchetypeId, EnemyId, Vec2};
use bulwark_core::wave::SpawnEntry;

use crate::collaborators::{BalanceOverrides, Collaborators, ReceiptQueue};

/// Where a single unit should appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Pattern-derived world position.
    Position(Vec2),
    /// Lane or edge spawn point index.
    Lane(u32),
}

/// One unit to admit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRequest {
    pub archetype: ArchetypeId,
    pub placement: Placement,
}

/// Outcome of admitting one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Spawned synchronously by the world.
    Spawned(EnemyId),
    /// Handed to the buffering collaborator.
    Buffered,
    /// Handed to the rate-limited scheduler.
    Scheduled,
    /// The world refused an immediate spawn.
    Failed,
}

impl Admission {
    /// Whether the unit went through the world synchronously.
    pub fn is_immediate(self) -> bool {
        matches!(self, Admission::Spawned(_) | Admission::Failed)
    }
}

/// Stateless policy over [`AdmissionConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionController {
    config: AdmissionConfig,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Buffer when the entry or the rest of the wave is big enough.
    pub fn should_buffer(&self, entry_count: u32, remaining_wave_count: u32) -> bool {
        self.config.buffering_enabled
            && (entry_count >= self.config.buffer_threshold
                || remaining_wave_count >= self.config.buffer_wave_remaining_threshold)
    }

    /// Path a unit takes given the buffering decision and which deferred
    /// collaborators exist.
    pub fn choose_path(&self, buffer: bool, has_buffered: bool, has_scheduler: bool) -> AdmissionPath {
        if buffer && has_buffered {
            AdmissionPath::Buffered
        } else if self.config.scheduler_enabled && has_scheduler {
            AdmissionPath::Scheduled
        } else {
            AdmissionPath::Immediate
        }
    }

    /// Whether immediate spawns of `entry` are subject to the per-tick cap.
    pub fn throttles(&self, entry: &SpawnEntry) -> bool {
        self.config.max_spawns_per_frame > 0
            && entry.count >= self.config.progressive_spawn_threshold
            && (!self.config.throttle_only_zero_interval || entry.interval_secs == 0.0)
    }

    /// Immediate spawns allowed per tick for throttled entries.
    pub fn frame_cap(&self) -> u32 {
        self.config.max_spawns_per_frame
    }

    /// Dispatch one unit along its path.
    pub fn admit(
        &self,
        collaborators: &mut Collaborators,
        request: UnitRequest,
        buffer: bool,
        overrides: BalanceOverrides,
        receipts: &ReceiptQueue,
        generation: u64,
    ) -> Admission {
        let path = self.choose_path(
            buffer,
            collaborators.buffered.is_some(),
            collaborators.scheduler.is_some(),
        );
        let UnitRequest {
            archetype,
            placement,
        } = request;

        match (path, &mut collaborators.buffered, &mut collaborators.scheduler) {
            (AdmissionPath::Buffered, Some(buffered), _) => {
                let callback = receipts.callback(generation, overrides);
                match placement {
                    Placement::Position(position) => {
                        buffered.enqueue_direct(archetype, position, overrides, callback)
                    }
                    Placement::Lane(lane) => buffered.enqueue_lane(archetype, lane, overrides, callback),
                }
                Admission::Buffered
            }
            (AdmissionPath::Scheduled, _, Some(scheduler)) => {
                let callback = receipts.callback(generation, overrides);
                match placement {
                    Placement::Position(position) => {
                        scheduler.enqueue_position(archetype, position, callback)
                    }
                    Placement::Lane(lane) => scheduler.enqueue_lane(archetype, lane, callback),
                }
                Admission::Scheduled
            }
            _ => {
                let world = &mut collaborators.world;
                let spawned = match placement {
                    Placement::Position(position) => world.spawn_at_position(archetype, position),
                    Placement::Lane(lane) => world.spawn_at_edge_index(archetype, lane as usize),
                };
                spawned.map_or(Admission::Failed, Admission::Spawned)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AdmissionController {
        AdmissionController::new(AdmissionConfig {
            buffer_threshold: 10,
            buffer_wave_remaining_threshold: 300,
            ..Default::default()
        })
    }

    #[test]
    fn test_small_entry_small_wave_not_buffered() {
        assert!(!controller().should_buffer(5, 5));
    }

    #[test]
    fn test_large_entry_buffered() {
        assert!(controller().should_buffer(15, 5));
    }

    #[test]
    fn test_large_remaining_wave_buffered() {
        assert!(controller().should_buffer(1, 300));
    }

    #[test]
    fn test_buffering_disabled() {
        let controller = AdmissionController::new(AdmissionConfig {
            buffering_enabled: false,
            ..Default::default()
        });
        assert!(!controller.should_buffer(10_000, 10_000));
    }

    #[test]
    fn test_path_priority() {
        let c = controller();
        assert_eq!(c.choose_path(true, true, true), AdmissionPath::Buffered);
        assert_eq!(c.choose_path(true, false, true), AdmissionPath::Scheduled);
        assert_eq!(c.choose_path(false, true, true), AdmissionPath::Scheduled);
        assert_eq!(c.choose_path(false, true, false), AdmissionPath::Immediate);
        assert_eq!(c.choose_path(true, false, false), AdmissionPath::Immediate);

        let no_scheduler = AdmissionController::new(AdmissionConfig {
            scheduler_enabled: false,
            ..Default::default()
        });
        assert_eq!(no_scheduler.choose_path(false, false, true), AdmissionPath::Immediate);
    }

    #[test]
    fn test_throttle_rules() {
        let c = AdmissionController::default();
        let big_burst = SpawnEntry::along_edge(ArchetypeId(1), 500, 0.0);
        let paced = SpawnEntry::along_edge(ArchetypeId(1), 500, 0.5);
        let small = SpawnEntry::along_edge(ArchetypeId(1), 10, 0.0);
        assert!(c.throttles(&big_burst));
        assert!(!c.throttles(&paced), "only zero-interval entries are throttled");
        assert!(!c.throttles(&small));

        let any_interval = AdmissionController::new(AdmissionConfig {
            throttle_only_zero_interval: false,
            ..Default::default()
        });
        assert!(any_interval.throttles(&paced));

        let uncapped = AdmissionController::new(AdmissionConfig {
            max_spawns_per_frame: 0,
            ..Default::default()
        });
        assert!(!uncapped.throttles(&big_burst));
    }
}
