//! Contracts for the host collaborators the engine calls into.
//!
//! The host owns the world simulation, inventories, per-actor persisted data
//! and the task scheduler. The engine only sees them through the traits in
//! this module:
//!
//! - [`World`]: entities, equipment, projectiles, blocks, statuses and the
//!   synchronous event bus
//! - [`ActorDataStore`]: per-actor persisted `key -> i64` map
//! - [`Scheduler`]: deferred tasks
//! - [`Clock`]: wall-clock milliseconds for cooldowns
//!
//! In-memory implementations ([`MemoryStore`], [`TaskQueue`],
//! [`ManualClock`], [`SystemClock`]) are provided for embedding and tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::ShootEvent;
use crate::error::StoreError;
use crate::item::{EquipmentSlot, ItemStack, Material};
use crate::tables::EntityKind;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of any entity in the host world (actors, mobs, projectiles).
///
/// An *actor* is an entity for which [`World::is_actor`] returns true: one
/// that carries equipment and accumulates per-effect state.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// A single addressable block position in the world.
pub type Cell = IVec3;

// =============================================================================
// Statuses and Projectiles
// =============================================================================

/// Timed status effects the sample effects apply.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Movement speed reduced.
    Slowness,
    /// Melee damage increased.
    Strength,
    /// Immune to fire.
    FireResistance,
}

/// A status effect instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Which status.
    pub kind: StatusKind,
    /// Duration in ticks; `u32::MAX` for "until removed".
    pub duration_ticks: u32,
    /// Zero-based strength.
    pub amplifier: u8,
}

/// State of an in-flight arrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Entity that fired the projectile.
    pub shooter: Option<EntityId>,
    /// Current velocity.
    pub velocity: DVec3,
    /// Remaining burn time in ticks.
    pub fire_ticks: u32,
    /// Knockback strength.
    pub knockback: u8,
    /// Critical-hit flag.
    pub critical: bool,
    /// Free-form markers hosts and effects attach (e.g. `"runeforge:spread"`).
    pub tags: Vec<String>,
}

impl Projectile {
    /// A plain, non-burning projectile.
    #[must_use]
    pub fn new(shooter: Option<EntityId>, velocity: DVec3) -> Self {
        Self {
            shooter,
            velocity,
            fire_ticks: 0,
            knockback: 0,
            critical: false,
            tags: Vec::new(),
        }
    }
}

// =============================================================================
// World
// =============================================================================

/// The host world, as seen from effect hooks.
///
/// All methods are called on the simulation thread and must not block.
/// Lookups on entities that no longer exist return `None` (or do nothing for
/// mutators).
pub trait World {
    /// Returns true if the entity is an actor (carries equipment and effect state).
    fn is_actor(&self, entity: EntityId) -> bool;

    /// Returns true if the entity is alive and can be damaged.
    fn is_living(&self, entity: EntityId) -> bool;

    /// Kind of the entity, as named by the host.
    fn entity_kind(&self, entity: EntityId) -> Option<EntityKind>;

    /// Item in an actor's slot.
    fn equipment(&self, actor: EntityId, slot: EquipmentSlot) -> Option<&ItemStack>;

    /// Mutable item in an actor's slot.
    fn equipment_mut(&mut self, actor: EntityId, slot: EquipmentSlot) -> Option<&mut ItemStack>;

    /// Replaces an actor's slot; `None` is the empty-slot marker.
    fn set_equipment(&mut self, actor: EntityId, slot: EquipmentSlot, item: Option<ItemStack>);

    /// Current health.
    fn health(&self, entity: EntityId) -> Option<f64>;

    /// Deals direct damage, bypassing the damage event bus.
    fn damage(&mut self, entity: EntityId, amount: f64);

    /// Foot position.
    fn location(&self, entity: EntityId) -> Option<DVec3>;

    /// Eye position.
    fn eye_location(&self, entity: EntityId) -> Option<DVec3>;

    /// Unit look direction.
    fn facing(&self, entity: EntityId) -> Option<DVec3>;

    /// Current velocity.
    fn velocity(&self, entity: EntityId) -> Option<DVec3>;

    /// Overwrites velocity.
    fn set_velocity(&mut self, entity: EntityId, velocity: DVec3);

    /// Spawns an entity of `kind`.
    fn spawn_entity(&mut self, kind: &EntityKind, at: DVec3) -> EntityId;

    /// Spawns an arrow with the given velocity.
    fn spawn_arrow(&mut self, shooter: EntityId, at: DVec3, velocity: DVec3) -> EntityId;

    /// Projectile state.
    fn projectile(&self, id: EntityId) -> Option<&Projectile>;

    /// Mutable projectile state.
    fn projectile_mut(&mut self, id: EntityId) -> Option<&mut Projectile>;

    /// Removes an entity from the world.
    fn remove_entity(&mut self, entity: EntityId);

    /// Display name given to the entity, if any. Hosts without names keep the default.
    fn custom_name(&self, _entity: EntityId) -> Option<String> {
        None
    }

    /// Sets or clears the entity's display name.
    fn set_custom_name(&mut self, _entity: EntityId, _name: Option<String>) {}

    /// Returns true if the entity has the status.
    fn has_status(&self, entity: EntityId, kind: StatusKind) -> bool;

    /// Adds or replaces a status.
    fn add_status(&mut self, entity: EntityId, status: StatusEffect);

    /// Material of a block.
    fn block(&self, cell: Cell) -> Option<Material>;

    /// Sets a block's material.
    fn set_block(&mut self, cell: Cell, material: Material);

    /// Publishes a shoot event to the host's listeners, which may cancel it.
    fn call_shoot_event(&mut self, event: &mut ShootEvent);

    /// Publishes a zero-side-effect damage query on the host's event bus.
    /// Returns true if no listener cancelled it.
    fn call_damage_event(&mut self, damager: EntityId, victim: EntityId, amount: f64) -> bool;
}

/// Damages the item in an actor's slot, clearing the slot if it breaks.
///
/// Returns true if the item was removed.
pub fn damage_item_in_slot<R: rand::Rng + ?Sized>(
    world: &mut dyn World,
    actor: EntityId,
    slot: EquipmentSlot,
    amount: u32,
    rng: &mut R,
) -> bool {
    let broken = world
        .equipment_mut(actor, slot)
        .is_some_and(|item| item.damage(amount, rng));
    if broken {
        debug!(actor = %actor, slot = %slot, "Item broke");
        world.set_equipment(actor, slot, None);
    }
    broken
}

// =============================================================================
// Per-Actor Store
// =============================================================================

/// Key under which a value is stored for an actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey(String);

impl StoreKey {
    /// Namespace prefix of every key this crate writes.
    pub const NAMESPACE: &'static str = "runeforge";

    /// Deterministic key for an effect's cooldown record.
    #[must_use]
    pub fn for_effect(id: crate::effect::EffectId) -> Self {
        Self(format!("{}:effect/{}", Self::NAMESPACE, id))
    }

    /// A key outside the effect-record space (e.g. `"weight_active"`).
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self(format!("{}:{}", Self::NAMESPACE, name))
    }

    /// The raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-actor persisted `key -> i64` map.
pub trait ActorDataStore {
    /// Reads a value, defaulting to 0 when absent.
    fn get(&self, actor: EntityId, key: &StoreKey) -> i64;

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot persist the value.
    fn set(&mut self, actor: EntityId, key: &StoreKey, value: i64) -> Result<(), StoreError>;
}

/// `HashMap`-backed [`ActorDataStore`].
///
/// Writes for actors listed via [`MemoryStore::reject_writes_for`] fail,
/// which lets tests exercise persistence failures.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<(EntityId, StoreKey), i64>,
    read_only: Vec<EntityId>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write for `actor` fail.
    pub fn reject_writes_for(&mut self, actor: EntityId) {
        self.read_only.push(actor);
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ActorDataStore for MemoryStore {
    fn get(&self, actor: EntityId, key: &StoreKey) -> i64 {
        self.values.get(&(actor, key.clone())).copied().unwrap_or(0)
    }

    fn set(&mut self, actor: EntityId, key: &StoreKey, value: i64) -> Result<(), StoreError> {
        if self.read_only.contains(&actor) {
            return Err(StoreError::Rejected(format!("{key} is read-only for actor {actor}")));
        }
        self.values.insert((actor, key.clone()), value);
        Ok(())
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX - 1))
    }
}

/// Manually advanced clock for deterministic runs.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `start_ms`.
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Sets the clock.
    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Deferred work handed back to the host.
pub type ScheduledTask = Box<dyn FnOnce(&mut dyn World) + Send>;

/// The host's task scheduler.
pub trait Scheduler {
    /// Runs `task` after `delay_ticks` simulation ticks.
    fn run_later(&mut self, delay_ticks: u64, task: ScheduledTask);
}

/// Tick-driven [`Scheduler`] that hosts can pump from their game loop.
#[derive(Default)]
pub struct TaskQueue {
    tick: u64,
    pending: Vec<(u64, ScheduledTask)>,
}

impl TaskQueue {
    /// Creates an empty queue at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Advances by `ticks` and runs every task that became due, in
    /// scheduling order. Returns how many ran.
    pub fn advance(&mut self, ticks: u64, world: &mut dyn World) -> usize {
        self.tick = self.tick.saturating_add(ticks);
        let now = self.tick;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.pending = waiting;

        let count = due.len();
        for (_, task) in due {
            task(world);
        }
        count
    }
}

impl Scheduler for TaskQueue {
    fn run_later(&mut self, delay_ticks: u64, task: ScheduledTask) {
        self.pending.push((self.tick.saturating_add(delay_ticks), task));
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("tick", &self.tick)
            .field("pending", &self.pending.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
