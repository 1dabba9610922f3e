//! ECS-backed stand-in for the game world.
//!
//! Enemies are hecs entities; their `EnemyId` is the entity's bit pattern,
//! so the coordinator's ids map straight back to entities.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use bulwark_core::types::{ArchetypeId, EnemyId};
use bulwark_sim::collaborators::{
    BalanceOverrides, BufferedSpawner, EnemyLifecycle, SpawnCallback, WorldSpawner,
};

/// Base hit points before wave scaling.
pub const BASE_HP: f32 = 10.0;

pub type SharedWorld = Rc<RefCell<World>>;

#[derive(Debug, Clone, Copy)]
pub struct Enemy {
    pub archetype: ArchetypeId,
    pub wave_number: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Playfield whose right-hand edge is the spawn edge.
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub lanes: usize,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 20.0,
            lanes: 5,
        }
    }
}

impl Arena {
    pub fn edge_at(&self, t: f32) -> Vec2 {
        Vec2::new(self.width, t.clamp(0.0, 1.0) * self.height)
    }

    /// Centre of slot `index` when the edge is split into `slots`.
    pub fn edge_slot(&self, index: usize, slots: usize) -> Vec2 {
        let slots = slots.max(1);
        let t = ((index % slots) as f32 + 0.5) / slots as f32;
        self.edge_at(t)
    }
}

pub fn enemy_id(entity: Entity) -> EnemyId {
    EnemyId(entity.to_bits().get())
}

pub fn entity_of(enemy: EnemyId) -> Option<Entity> {
    Entity::from_bits(enemy.0)
}

fn spawn_enemy(world: &mut World, archetype: ArchetypeId, position: Vec2) -> EnemyId {
    enemy_id(world.spawn((
        Enemy {
            archetype,
            wave_number: 0,
        },
        Position(position),
        Health {
            current: BASE_HP,
            max: BASE_HP,
        },
    )))
}

/// Immediate spawns straight into the ECS world.
pub struct EcsSpawner {
    world: SharedWorld,
    arena: Arena,
    edge_points: usize,
}

impl EcsSpawner {
    pub fn new(world: SharedWorld, arena: Arena) -> Self {
        Self {
            world,
            arena,
            edge_points: arena.lanes,
        }
    }
}

impl WorldSpawner for EcsSpawner {
    fn spawn_at_position(&mut self, archetype: ArchetypeId, position: Vec2) -> Option<EnemyId> {
        Some(spawn_enemy(&mut self.world.borrow_mut(), archetype, position))
    }

    fn spawn_at_edge_index(&mut self, archetype: ArchetypeId, index: usize) -> Option<EnemyId> {
        let position = self.arena.edge_slot(index, self.edge_points);
        Some(spawn_enemy(&mut self.world.borrow_mut(), archetype, position))
    }

    fn edge_position_at_normalized_y(&self, t: f32) -> Vec2 {
        self.arena.edge_at(t)
    }

    fn ensure_edge_spawn_points(&mut self, count: usize) -> usize {
        self.edge_points = self.edge_points.max(count);
        self.edge_points
    }

    fn lane_count(&self) -> usize {
        self.arena.lanes
    }
}

/// Applies wave scaling to the enemy's health.
pub struct EcsLifecycle {
    world: SharedWorld,
}

impl EcsLifecycle {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl EnemyLifecycle for EcsLifecycle {
    fn apply_balance_overrides(&mut self, enemy: EnemyId, overrides: BalanceOverrides) {
        let Some(entity) = entity_of(enemy) else {
            return;
        };
        let mut world = self.world.borrow_mut();
        if let Ok((tag, health)) = world.query_one_mut::<(&mut Enemy, &mut Health)>(entity) {
            tag.wave_number = overrides.wave_number;
            health.max = BASE_HP * overrides.hp_multiplier;
            health.current = health.max;
        }
    }
}

enum Target {
    Position(Vec2),
    Lane(u32),
}

struct PendingSpawn {
    archetype: ArchetypeId,
    target: Target,
    callback: SpawnCallback,
}

/// Buffered spawner that releases a fixed number of queued units per tick.
///
/// Clones share the queue, so the driver keeps one to call `release`.
#[derive(Clone)]
pub struct TrickleBuffer {
    world: SharedWorld,
    arena: Arena,
    per_tick: usize,
    queue: Rc<RefCell<VecDeque<PendingSpawn>>>,
}

impl TrickleBuffer {
    pub fn new(world: SharedWorld, arena: Arena, per_tick: usize) -> Self {
        Self {
            world,
            arena,
            per_tick: per_tick.max(1),
            queue: Rc::default(),
        }
    }

    /// Spawn up to `per_tick` queued units. Returns how many spawned.
    pub fn release(&self) -> usize {
        let mut released = 0;
        while released < self.per_tick {
            let Some(pending) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            let position = match pending.target {
                Target::Position(position) => position,
                Target::Lane(lane) => self.arena.edge_slot(lane as usize, self.arena.lanes),
            };
            let enemy = spawn_enemy(&mut self.world.borrow_mut(), pending.archetype, position);
            pending.callback.spawned(enemy);
            released += 1;
        }
        released
    }
}

impl BufferedSpawner for TrickleBuffer {
    fn enqueue_direct(
        &mut self,
        archetype: ArchetypeId,
        position: Vec2,
        _overrides: BalanceOverrides,
        on_spawned: SpawnCallback,
    ) {
        self.queue.borrow_mut().push_back(PendingSpawn {
            archetype,
            target: Target::Position(position),
            callback: on_spawned,
        });
    }

    fn enqueue_lane(
        &mut self,
        archetype: ArchetypeId,
        lane: u32,
        _overrides: BalanceOverrides,
        on_spawned: SpawnCallback,
    ) {
        self.queue.borrow_mut().push_back(PendingSpawn {
            archetype,
            target: Target::Lane(lane),
            callback: on_spawned,
        });
    }

    fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }
}

/// Despawn each live enemy with probability `chance`; returns the defeated.
pub fn roll_defeats(world: &SharedWorld, rng: &mut ChaCha8Rng, chance: f64) -> Vec<EnemyId> {
    let mut world = world.borrow_mut();
    let doomed: Vec<Entity> = world
        .query::<&Enemy>()
        .iter()
        .filter_map(|(entity, _)| rng.gen_bool(chance).then_some(entity))
        .collect();
    for entity in &doomed {
        let _ = world.despawn(*entity);
    }
    doomed.into_iter().map(enemy_id).collect()
}

pub fn live_enemies(world: &SharedWorld) -> usize {
    world.borrow().len() as usize
}
