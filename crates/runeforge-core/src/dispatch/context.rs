//! Borrowed host services and the per-candidate hook context.

use std::fmt;

use rand_chacha::ChaCha8Rng;

use crate::capability::Capabilities;
use crate::cooldown::CooldownStore;
use crate::effect::EffectDescriptor;
use crate::host::{damage_item_in_slot, ActorDataStore, Clock, EntityId, ScheduledTask, Scheduler, World};
use crate::item::{EquipmentSlot, Hand, ItemStack};
use crate::tables::MagicTables;

/// Host collaborators lent to the engine for one dispatch.
pub struct HostServices<'a> {
    /// World simulation.
    pub world: &'a mut dyn World,
    /// Per-actor persisted values.
    pub store: &'a mut dyn ActorDataStore,
    /// Deferred task sink.
    pub scheduler: &'a mut dyn Scheduler,
    /// Time source for cooldowns.
    pub clock: &'a dyn Clock,
}

impl<'a> HostServices<'a> {
    /// Bundles the collaborators.
    pub fn new(
        world: &'a mut dyn World,
        store: &'a mut dyn ActorDataStore,
        scheduler: &'a mut dyn Scheduler,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            world,
            store,
            scheduler,
            clock,
        }
    }

    /// Cooldown view over the lent store.
    pub fn cooldowns(&mut self) -> CooldownStore<'_> {
        CooldownStore::new(&mut *self.store, self.clock)
    }
}

impl fmt::Debug for HostServices<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices").finish_non_exhaustive()
    }
}

/// Everything a hook may read or change while handling one candidate.
///
/// Created by the engine for each (slot, effect) pair that passed
/// filtering and dropped when the hook returns.
pub struct HookContext<'a> {
    /// Actor whose equipment triggered the hook.
    pub actor: EntityId,
    /// Slot holding the item.
    pub slot: EquipmentSlot,
    /// Hand holding the item, `None` for armour.
    pub hand: Option<Hand>,
    /// Attached level, at least 1.
    pub level: u8,
    /// Effective descriptor of the effect.
    pub descriptor: &'a EffectDescriptor,
    /// World simulation.
    pub world: &'a mut dyn World,
    /// Deferred task sink.
    pub scheduler: &'a mut dyn Scheduler,
    /// Negotiated host capabilities.
    pub capabilities: &'a Capabilities,
    /// Lookup tables.
    pub tables: &'a MagicTables,
    /// Dispatch RNG.
    pub rng: &'a mut ChaCha8Rng,
    store: &'a mut dyn ActorDataStore,
    clock: &'a dyn Clock,
}

impl<'a> HookContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        actor: EntityId,
        slot: EquipmentSlot,
        level: u8,
        descriptor: &'a EffectDescriptor,
        host: &'a mut HostServices<'_>,
        capabilities: &'a Capabilities,
        tables: &'a MagicTables,
        rng: &'a mut ChaCha8Rng,
    ) -> Self {
        Self {
            actor,
            slot,
            hand: slot.hand(),
            level,
            descriptor,
            world: &mut *host.world,
            scheduler: &mut *host.scheduler,
            capabilities,
            tables,
            rng,
            store: &mut *host.store,
            clock: host.clock,
        }
    }

    /// Power coefficient of the effect.
    #[must_use]
    pub fn power(&self) -> f64 {
        self.descriptor.power()
    }

    /// `level * power`, the usual scaling term.
    #[must_use]
    pub fn scaled_level(&self) -> f64 {
        f64::from(self.level) * self.power()
    }

    /// The item that triggered the hook, if still present.
    #[must_use]
    pub fn item(&self) -> Option<&ItemStack> {
        self.world.equipment(self.actor, self.slot)
    }

    /// Cooldown view for the actor's effects.
    pub fn cooldowns(&mut self) -> CooldownStore<'_> {
        CooldownStore::new(&mut *self.store, self.clock)
    }

    /// Per-actor store, for values outside the cooldown records.
    pub fn store(&mut self) -> &mut dyn ActorDataStore {
        &mut *self.store
    }

    /// Starts a cooldown of `ms` for this effect. Ignored while disabled.
    pub fn set_cooldown(&mut self, ms: u32) {
        let (actor, effect) = (self.actor, self.descriptor.id());
        self.cooldowns().set_cooldown(actor, effect, ms);
    }

    /// Starts the descriptor's default cooldown.
    pub fn apply_cooldown(&mut self) {
        self.set_cooldown(self.descriptor.cooldown_ms());
    }

    /// Damages the triggering item, clearing the slot if it breaks.
    /// Returns true if the item was removed.
    pub fn damage_tool(&mut self, amount: u32) -> bool {
        damage_item_in_slot(&mut *self.world, self.actor, self.slot, amount, &mut *self.rng)
    }

    /// Hands a task to the host scheduler.
    pub fn run_later(&mut self, delay_ticks: u64, task: ScheduledTask) {
        self.scheduler.run_later(delay_ticks, task);
    }
}

impl fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("actor", &self.actor)
            .field("slot", &self.slot)
            .field("hand", &self.hand)
            .field("level", &self.level)
            .field("effect", &self.descriptor.id())
            .finish_non_exhaustive()
    }
}
