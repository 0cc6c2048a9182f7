//! Test helpers: an in-memory world and a ready-to-dispatch harness.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use glam::{DVec3, IVec3};

use crate::capability::{Capabilities, ShootEvent};
use crate::config::TablesConfig;
use crate::dispatch::{DispatchEngine, DispatchReport, HostServices, WorldEvent};
use crate::effect::{Effect, EffectRegistry, RegistryBuilder};
use crate::effects;
use crate::host::{
    Cell, EntityId, ManualClock, MemoryStore, Projectile, StatusEffect, StatusKind, TaskQueue, World,
};
use crate::item::{EquipmentSlot, ItemStack, Material};
use crate::tables::{Catalog, EntityKind, MagicTables};

pub const PLAYER: EntityId = EntityId::new(1);
pub const ZOMBIE: EntityId = EntityId::new(2);
pub const PIG: EntityId = EntityId::new(3);

/// Engine seed used by every harness.
pub const SEED: u64 = 42;

// =============================================================================
// Test World
// =============================================================================

/// One entity in the [`TestWorld`].
#[derive(Debug, Clone)]
pub struct TestEntity {
    pub kind: EntityKind,
    pub actor: bool,
    pub living: bool,
    pub health: f64,
    pub location: DVec3,
    pub facing: DVec3,
    pub velocity: DVec3,
    pub equipment: HashMap<EquipmentSlot, ItemStack>,
    pub statuses: Vec<StatusEffect>,
    pub projectile: Option<Projectile>,
    pub custom_name: Option<String>,
}

impl TestEntity {
    fn new(kind: &str, actor: bool, living: bool, location: DVec3) -> Self {
        Self {
            kind: EntityKind::new(kind),
            actor,
            living,
            health: 20.0,
            location,
            facing: DVec3::X,
            velocity: DVec3::ZERO,
            equipment: HashMap::new(),
            statuses: Vec::new(),
            projectile: None,
            custom_name: None,
        }
    }
}

/// In-memory [`World`] with listener behaviour that tests can script.
#[derive(Debug, Default)]
pub struct TestWorld {
    pub entities: HashMap<EntityId, TestEntity>,
    pub blocks: HashMap<Cell, Material>,
    /// Every shoot event published, in order.
    pub shoot_events: Vec<ShootEvent>,
    /// Cancel every shoot event from this (zero-based) index on.
    pub cancel_shoots_from: Option<usize>,
    /// Listener verdict for damage queries.
    pub deny_damage_events: bool,
    /// Total damage dealt through [`World::damage`].
    pub damage_dealt: f64,
    next_id: u64,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            ..Self::default()
        }
    }

    /// A player at the origin facing +X, plus a hostile mob and a pig nearby.
    pub fn with_cast() -> Self {
        let mut world = Self::new();
        world.entities.insert(PLAYER, TestEntity::new("PLAYER", true, true, DVec3::ZERO));
        world
            .entities
            .insert(ZOMBIE, TestEntity::new("ZOMBIE", false, true, DVec3::new(3.0, 0.0, 0.0)));
        world
            .entities
            .insert(PIG, TestEntity::new("PIG", false, true, DVec3::new(0.0, 0.0, 3.0)));
        world
    }

    pub fn equip(&mut self, actor: EntityId, slot: EquipmentSlot, item: ItemStack) {
        self.set_equipment(actor, slot, Some(item));
    }

    /// Fires an arrow as the host would before the launch event.
    pub fn launch_arrow(&mut self, shooter: EntityId, velocity: DVec3) -> EntityId {
        let at = self.eye_location(shooter).unwrap_or_default();
        self.spawn_arrow(shooter, at, velocity)
    }

    /// Arrows currently in the world.
    pub fn arrows(&self) -> Vec<(EntityId, &Projectile)> {
        self.entities
            .iter()
            .filter_map(|(&id, e)| e.projectile.as_ref().map(|p| (id, p)))
            .collect()
    }

    pub fn entity(&self, id: EntityId) -> &TestEntity {
        &self.entities[&id]
    }

    fn alloc(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId::new(self.next_id)
    }
}

impl World for TestWorld {
    fn is_actor(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|e| e.actor)
    }

    fn is_living(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|e| e.living)
    }

    fn entity_kind(&self, entity: EntityId) -> Option<EntityKind> {
        self.entities.get(&entity).map(|e| e.kind.clone())
    }

    fn equipment(&self, actor: EntityId, slot: EquipmentSlot) -> Option<&ItemStack> {
        self.entities.get(&actor)?.equipment.get(&slot)
    }

    fn equipment_mut(&mut self, actor: EntityId, slot: EquipmentSlot) -> Option<&mut ItemStack> {
        self.entities.get_mut(&actor)?.equipment.get_mut(&slot)
    }

    fn set_equipment(&mut self, actor: EntityId, slot: EquipmentSlot, item: Option<ItemStack>) {
        if let Some(entity) = self.entities.get_mut(&actor) {
            match item {
                Some(item) => entity.equipment.insert(slot, item),
                None => entity.equipment.remove(&slot),
            };
        }
    }

    fn health(&self, entity: EntityId) -> Option<f64> {
        self.entities.get(&entity).map(|e| e.health)
    }

    fn damage(&mut self, entity: EntityId, amount: f64) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.health -= amount;
            self.damage_dealt += amount;
        }
    }

    fn location(&self, entity: EntityId) -> Option<DVec3> {
        self.entities.get(&entity).map(|e| e.location)
    }

    fn eye_location(&self, entity: EntityId) -> Option<DVec3> {
        self.location(entity).map(|at| at + DVec3::Y * 1.6)
    }

    fn facing(&self, entity: EntityId) -> Option<DVec3> {
        self.entities.get(&entity).map(|e| e.facing)
    }

    fn velocity(&self, entity: EntityId) -> Option<DVec3> {
        self.entities.get(&entity).map(|e| e.velocity)
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: DVec3) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.velocity = velocity;
        }
    }

    fn spawn_entity(&mut self, kind: &EntityKind, at: DVec3) -> EntityId {
        let id = self.alloc();
        let mut entity = TestEntity::new(kind.as_str(), false, true, at);
        entity.kind = kind.clone();
        self.entities.insert(id, entity);
        id
    }

    fn spawn_arrow(&mut self, shooter: EntityId, at: DVec3, velocity: DVec3) -> EntityId {
        let id = self.alloc();
        let mut entity = TestEntity::new("ARROW", false, false, at);
        entity.velocity = velocity;
        entity.projectile = Some(Projectile::new(Some(shooter), velocity));
        self.entities.insert(id, entity);
        id
    }

    fn custom_name(&self, entity: EntityId) -> Option<String> {
        self.entities.get(&entity)?.custom_name.clone()
    }

    fn set_custom_name(&mut self, entity: EntityId, name: Option<String>) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.custom_name = name;
        }
    }

    fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.entities.get(&id)?.projectile.as_ref()
    }

    fn projectile_mut(&mut self, id: EntityId) -> Option<&mut Projectile> {
        self.entities.get_mut(&id)?.projectile.as_mut()
    }

    fn remove_entity(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
    }

    fn has_status(&self, entity: EntityId, kind: StatusKind) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|e| e.statuses.iter().any(|s| s.kind == kind))
    }

    fn add_status(&mut self, entity: EntityId, status: StatusEffect) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.statuses.push(status);
        }
    }

    fn block(&self, cell: Cell) -> Option<Material> {
        self.blocks.get(&cell).cloned()
    }

    fn set_block(&mut self, cell: Cell, material: Material) {
        self.blocks.insert(cell, material);
    }

    fn call_shoot_event(&mut self, event: &mut ShootEvent) {
        if self.cancel_shoots_from.is_some_and(|n| self.shoot_events.len() >= n) {
            event.cancel();
        }
        self.shoot_events.push(event.clone());
    }

    fn call_damage_event(&mut self, _damager: EntityId, _victim: EntityId, _amount: f64) -> bool {
        !self.deny_damage_events
    }
}

// =============================================================================
// Tables and Registry
// =============================================================================

/// Tables with one material per category used in the tests, a dirt to grass
/// spectral conversion and a pig to zombified piglin transformation.
pub fn test_tables() -> MagicTables {
    let catalog = Catalog::new()
        .with_materials([
            "BOW",
            "DIAMOND_SHOVEL",
            "DIAMOND_SWORD",
            "IRON_BOOTS",
            "IRON_HELMET",
            "STICK",
            "DIRT",
            "GRASS_BLOCK",
            "FLINT_AND_STEEL",
        ])
        .with_entity_kinds(["PIG", "ZOMBIFIED_PIGLIN", "ZOMBIE"]);

    let mut tools = BTreeMap::new();
    for (category, material) in [
        ("bow", "BOW"),
        ("shovel", "DIAMOND_SHOVEL"),
        ("sword", "DIAMOND_SWORD"),
        ("boots", "IRON_BOOTS"),
        ("helmet", "IRON_HELMET"),
        ("all", "FLINT_AND_STEEL"),
    ] {
        tools.insert(category.to_string(), vec![material.to_string()]);
    }

    let config = TablesConfig {
        spectral_conversions: vec!["DIRT:GRASS_BLOCK".to_string()],
        transformation: vec!["PIG:ZOMBIFIED_PIGLIN".to_string()],
        tools,
        ..TablesConfig::default()
    };
    MagicTables::load(&config, &catalog)
}

/// Registry with the built-ins plus any extra effects.
pub fn registry_with(extra: Vec<Arc<dyn Effect>>) -> EffectRegistry {
    let mut builder = RegistryBuilder::new();
    builder.register_all(effects::builtin());
    builder.register_all(extra);
    builder.seal()
}

pub fn item(material: &str) -> ItemStack {
    ItemStack::new(Material::new(material), 250)
}

pub fn cell(x: i32, y: i32, z: i32) -> Cell {
    IVec3::new(x, y, z)
}

// =============================================================================
// Harness
// =============================================================================

/// World, host services and an engine, wired together.
pub struct Harness {
    pub world: TestWorld,
    pub store: MemoryStore,
    pub queue: TaskQueue,
    pub clock: ManualClock,
    pub engine: DispatchEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_effects(Vec::new())
    }

    pub fn with_effects(extra: Vec<Arc<dyn Effect>>) -> Self {
        Self::with_capabilities(extra, Capabilities::default())
    }

    pub fn with_capabilities(extra: Vec<Arc<dyn Effect>>, capabilities: Capabilities) -> Self {
        Self {
            world: TestWorld::with_cast(),
            store: MemoryStore::new(),
            queue: TaskQueue::new(),
            clock: ManualClock::new(1_000_000),
            engine: DispatchEngine::new(
                Arc::new(registry_with(extra)),
                Arc::new(capabilities),
                Arc::new(test_tables()),
                SEED,
            ),
        }
    }

    pub fn dispatch(&mut self, event: &mut WorldEvent) -> DispatchReport {
        let mut host = HostServices::new(&mut self.world, &mut self.store, &mut self.queue, &self.clock);
        self.engine.dispatch(event, &mut host)
    }

    /// Runs scheduled tasks for `ticks` ticks.
    pub fn tick(&mut self, ticks: u64) -> usize {
        self.queue.advance(ticks, &mut self.world)
    }
}
