//! Interfaces to the host game's spawn, lifecycle and persistence systems.
//!
//! The coordinator never reaches for globals: everything it talks to is
//! injected through [`Collaborators`] at construction.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bulwark_core::error::StatsError;
use bulwark_core::types::{ArchetypeId, EnemyId, Vec2};

/// Wave-relative scalars applied once to every admitted enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceOverrides {
    pub hp_multiplier: f32,
    pub wave_number: u32,
}

/// Synchronous access to the game world.
pub trait WorldSpawner {
    /// Spawn at a world position. `None` when the world refused the spawn.
    fn spawn_at_position(&mut self, archetype: ArchetypeId, position: Vec2) -> Option<EnemyId>;

    /// Spawn at a lane / edge spawn point.
    fn spawn_at_edge_index(&mut self, archetype: ArchetypeId, index: usize) -> Option<EnemyId>;

    /// World point on the far edge at normalized height `t` (0 = bottom).
    fn edge_position_at_normalized_y(&self, t: f32) -> Vec2;

    /// Make sure at least `count` edge spawn points exist; returns how many do.
    fn ensure_edge_spawn_points(&mut self, count: usize) -> usize;

    /// Number of named lanes.
    fn lane_count(&self) -> usize;
}

/// Direct-enqueue spawn buffer that materializes enemies over later frames.
pub trait BufferedSpawner {
    fn enqueue_direct(
        &mut self,
        archetype: ArchetypeId,
        position: Vec2,
        overrides: BalanceOverrides,
        on_spawned: SpawnCallback,
    );

    fn enqueue_lane(
        &mut self,
        archetype: ArchetypeId,
        lane: u32,
        overrides: BalanceOverrides,
        on_spawned: SpawnCallback,
    );

    /// Units enqueued but not yet spawned.
    fn pending_count(&self) -> usize;
}

/// Rate-limited scheduler that releases spawns at its own pace.
pub trait RateLimitedScheduler {
    fn enqueue_position(&mut self, archetype: ArchetypeId, position: Vec2, on_spawned: SpawnCallback);

    fn enqueue_lane(&mut self, archetype: ArchetypeId, lane: u32, on_spawned: SpawnCallback);

    /// Units enqueued but not yet spawned.
    fn pending_count(&self) -> usize;
}

/// Receives per-enemy balance overrides.
pub trait EnemyLifecycle {
    fn apply_balance_overrides(&mut self, enemy: EnemyId, overrides: BalanceOverrides);
}

/// Key/value integer store that survives sessions.
pub trait PersistentStatsStore {
    fn get_int(&self, key: &str, default: i64) -> i64;
    fn set_int(&mut self, key: &str, value: i64);
    fn save(&mut self) -> Result<(), StatsError>;
}

/// Everything the coordinator needs from the host.
pub struct Collaborators {
    pub world: Box<dyn WorldSpawner>,
    pub lifecycle: Box<dyn EnemyLifecycle>,
    pub buffered: Option<Box<dyn BufferedSpawner>>,
    pub scheduler: Option<Box<dyn RateLimitedScheduler>>,
    pub stats: Box<dyn PersistentStatsStore>,
}

impl Collaborators {
    pub fn new(
        world: impl WorldSpawner + 'static,
        lifecycle: impl EnemyLifecycle + 'static,
        stats: impl PersistentStatsStore + 'static,
    ) -> Self {
        Self {
            world: Box::new(world),
            lifecycle: Box::new(lifecycle),
            buffered: None,
            scheduler: None,
            stats: Box::new(stats),
        }
    }

    pub fn with_buffered(mut self, buffered: impl BufferedSpawner + 'static) -> Self {
        self.buffered = Some(Box::new(buffered));
        self
    }

    pub fn with_scheduler(mut self, scheduler: impl RateLimitedScheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Units still queued in the buffering and scheduling collaborators.
    pub fn pending_deferred(&self) -> usize {
        let buffered = self.buffered.as_ref().map_or(0, |b| b.pending_count());
        let scheduled = self.scheduler.as_ref().map_or(0, |s| s.pending_count());
        buffered + scheduled
    }
}

/// A deferred spawn that materialized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnReceipt {
    /// Sequence generation the unit was enqueued under.
    pub generation: u64,
    pub enemy: EnemyId,
    pub overrides: BalanceOverrides,
}

type ReceiptBuffer = Rc<RefCell<Vec<SpawnReceipt>>>;

/// Single-threaded hand-off of deferred spawn receipts to the coordinator.
#[derive(Debug, Default, Clone)]
pub struct ReceiptQueue {
    inner: ReceiptBuffer,
}

impl ReceiptQueue {
    /// Callback for one unit enqueued under `generation`.
    pub fn callback(&self, generation: u64, overrides: BalanceOverrides) -> SpawnCallback {
        SpawnCallback {
            generation,
            overrides,
            queue: Rc::clone(&self.inner),
        }
    }

    /// Take every receipt delivered since the last drain.
    pub fn drain(&self) -> Vec<SpawnReceipt> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// One-shot completion handle handed to deferred collaborators.
///
/// Consuming `spawned` guarantees a unit is reported at most once. Dropping
/// the callback without calling it means the unit never materialized.
pub struct SpawnCallback {
    generation: u64,
    overrides: BalanceOverrides,
    queue: ReceiptBuffer,
}

impl SpawnCallback {
    /// Report the enemy created for this unit.
    pub fn spawned(self, enemy: EnemyId) {
        self.queue.borrow_mut().push(SpawnReceipt {
            generation: self.generation,
            enemy,
            overrides: self.overrides,
        });
    }

    pub fn overrides(&self) -> BalanceOverrides {
        self.overrides
    }
}

impl fmt::Debug for SpawnCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnCallback")
            .field("generation", &self.generation)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}
