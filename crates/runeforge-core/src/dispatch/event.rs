//! World event payloads delivered to the dispatch engine.
//!
//! Each event kind is its own struct, and [`WorldEvent`] is the tagged union
//! the engine matches on. [`WorldEvent::subjects`] turns an event into the
//! actors and equipment slots it implicates, so the engine never inspects
//! payload fields itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::host::{Cell, EntityId};
use crate::item::{EquipmentSlot, Hand};

macro_rules! cancellable {
    ($($event:ident),+ $(,)?) => {
        $(
            impl $event {
                /// Marks the event cancelled. Cancellation is one-way.
                pub fn cancel(&mut self) {
                    self.cancelled = true;
                }

                /// Returns true if the event has been cancelled.
                #[must_use]
                pub fn is_cancelled(&self) -> bool {
                    self.cancelled
                }
            }
        )+
    };
}

// =============================================================================
// Payloads
// =============================================================================

/// An actor launched a projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileLaunch {
    /// Who fired.
    pub shooter: EntityId,
    /// The projectile that was launched.
    pub projectile: EntityId,
    /// Hand holding the launcher.
    pub hand: Hand,
    cancelled: bool,
}

impl ProjectileLaunch {
    /// Creates an uncancelled launch event.
    #[must_use]
    pub fn new(shooter: EntityId, projectile: EntityId, hand: Hand) -> Self {
        Self {
            shooter,
            projectile,
            hand,
            cancelled: false,
        }
    }
}

/// One entity damaged another.
///
/// Dispatches twice: to the damager's main hand ([`HookKind::EntityHit`]) and
/// to the victim's armour ([`HookKind::BeingHit`]).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDamage {
    /// Attacker.
    pub damager: EntityId,
    /// Target.
    pub victim: EntityId,
    /// Damage about to be dealt.
    pub damage: f64,
    cancelled: bool,
}

impl EntityDamage {
    /// Creates an uncancelled damage event.
    #[must_use]
    pub fn new(damager: EntityId, victim: EntityId, damage: f64) -> Self {
        Self {
            damager,
            victim,
            damage,
            cancelled: false,
        }
    }
}

/// Periodic scan over an actor's equipment. Not cancellable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Actor being scanned.
    pub actor: EntityId,
}

impl Scan {
    /// Creates a scan event.
    #[must_use]
    pub fn new(actor: EntityId) -> Self {
        Self { actor }
    }
}

/// Kind of click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractAction {
    /// Left click on a block.
    LeftClickBlock,
    /// Right click on a block.
    RightClickBlock,
    /// Left click on nothing.
    LeftClickAir,
    /// Right click on nothing.
    RightClickAir,
    /// Stepping on a pressure plate or similar.
    Physical,
}

/// An actor clicked a block or the air.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInteract {
    /// Who clicked.
    pub actor: EntityId,
    /// Clicked block, `None` for air clicks.
    pub cell: Option<Cell>,
    /// Hand used.
    pub hand: Hand,
    /// Kind of click.
    pub action: InteractAction,
    cancelled: bool,
}

impl BlockInteract {
    /// Creates an uncancelled interaction event.
    #[must_use]
    pub fn new(actor: EntityId, cell: Option<Cell>, hand: Hand, action: InteractAction) -> Self {
        Self {
            actor,
            cell,
            hand,
            action,
            cancelled: false,
        }
    }
}

/// A block grew. Only dispatched when an actor caused the growth.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrow {
    /// The growing block.
    pub cell: Cell,
    /// Actor responsible, if any.
    pub cause: Option<EntityId>,
    cancelled: bool,
}

impl BlockGrow {
    /// Creates an uncancelled growth event.
    #[must_use]
    pub fn new(cell: Cell, cause: Option<EntityId>) -> Self {
        Self {
            cell,
            cause,
            cancelled: false,
        }
    }
}

/// An actor broke a block with the main-hand tool.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBreak {
    /// Who broke it.
    pub actor: EntityId,
    /// The broken block.
    pub cell: Cell,
    cancelled: bool,
}

impl BlockBreak {
    /// Creates an uncancelled break event.
    #[must_use]
    pub fn new(actor: EntityId, cell: Cell) -> Self {
        Self {
            actor,
            cell,
            cancelled: false,
        }
    }
}

/// An actor placed a block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlace {
    /// Who placed it.
    pub actor: EntityId,
    /// The placed block.
    pub cell: Cell,
    /// Hand used.
    pub hand: Hand,
    cancelled: bool,
}

impl BlockPlace {
    /// Creates an uncancelled place event.
    #[must_use]
    pub fn new(actor: EntityId, cell: Cell, hand: Hand) -> Self {
        Self {
            actor,
            cell,
            hand,
            cancelled: false,
        }
    }
}

/// An entity is about to be set on fire.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCombust {
    /// Entity catching fire.
    pub victim: EntityId,
    /// Entity that lit it, if any.
    pub combuster: Option<EntityId>,
    /// Burn duration.
    pub duration_ticks: u32,
    cancelled: bool,
}

impl EntityCombust {
    /// Creates an uncancelled combust event.
    #[must_use]
    pub fn new(victim: EntityId, combuster: Option<EntityId>, duration_ticks: u32) -> Self {
        Self {
            victim,
            combuster,
            duration_ticks,
            cancelled: false,
        }
    }
}

/// An actor sheared an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityShear {
    /// Who sheared.
    pub actor: EntityId,
    /// Sheared entity.
    pub target: EntityId,
    /// Hand holding the shears.
    pub hand: Hand,
    cancelled: bool,
}

impl EntityShear {
    /// Creates an uncancelled shear event.
    #[must_use]
    pub fn new(actor: EntityId, target: EntityId, hand: Hand) -> Self {
        Self {
            actor,
            target,
            hand,
            cancelled: false,
        }
    }
}

cancellable!(
    ProjectileLaunch,
    EntityDamage,
    BlockInteract,
    BlockGrow,
    BlockBreak,
    BlockPlace,
    EntityCombust,
    EntityShear,
);

// =============================================================================
// Kinds and Subjects
// =============================================================================

/// Event kind, for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// [`ProjectileLaunch`].
    ProjectileLaunch,
    /// [`EntityDamage`].
    EntityDamage,
    /// [`Scan`].
    Scan,
    /// [`BlockInteract`].
    BlockInteract,
    /// [`BlockGrow`].
    BlockGrow,
    /// [`BlockBreak`].
    BlockBreak,
    /// [`BlockPlace`].
    BlockPlace,
    /// [`EntityCombust`].
    EntityCombust,
    /// [`EntityShear`].
    EntityShear,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProjectileLaunch => "projectile_launch",
            Self::EntityDamage => "entity_damage",
            Self::Scan => "scan",
            Self::BlockInteract => "block_interact",
            Self::BlockGrow => "block_grow",
            Self::BlockBreak => "block_break",
            Self::BlockPlace => "block_place",
            Self::EntityCombust => "entity_combust",
            Self::EntityShear => "entity_shear",
        };
        f.write_str(name)
    }
}

/// Which [`Effect`](crate::effect::Effect) hook a subject is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKind {
    /// `on_projectile_launch`.
    ProjectileLaunch,
    /// `on_entity_hit`.
    EntityHit,
    /// `on_being_hit`.
    BeingHit,
    /// `on_scan`.
    Scan,
    /// `on_block_interact`.
    BlockInteract,
    /// `on_block_grow`.
    BlockGrow,
    /// `on_block_break`.
    BlockBreak,
    /// `on_block_place`.
    BlockPlace,
    /// `on_combust`.
    Combust,
    /// `on_shear`.
    Shear,
}

/// Equipment an event implicates on one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScope {
    /// The item in this hand; the other hand's item counts only for effects
    /// that accept either hand.
    Hand(Hand),
    /// Worn armour.
    Armor,
    /// Every slot.
    All,
}

impl SlotScope {
    /// Slots to visit, in dispatch order, each flagged with whether it is
    /// the primary slot of the scope.
    #[must_use]
    pub fn slots(self) -> Vec<(EquipmentSlot, bool)> {
        match self {
            Self::Hand(hand) => vec![(hand.slot(), true), (hand.other().slot(), false)],
            Self::Armor => EquipmentSlot::ARMOR.iter().map(|&s| (s, true)).collect(),
            Self::All => EquipmentSlot::ALL.iter().map(|&s| (s, true)).collect(),
        }
    }
}

/// One actor to dispatch for, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    /// Actor whose equipment is examined.
    pub actor: EntityId,
    /// Hook to invoke.
    pub hook: HookKind,
    /// Slots to examine.
    pub scope: SlotScope,
}

// =============================================================================
// World Event
// =============================================================================

/// Tagged union of every event the engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// See [`ProjectileLaunch`].
    ProjectileLaunch(ProjectileLaunch),
    /// See [`EntityDamage`].
    EntityDamage(EntityDamage),
    /// See [`Scan`].
    Scan(Scan),
    /// See [`BlockInteract`].
    BlockInteract(BlockInteract),
    /// See [`BlockGrow`].
    BlockGrow(BlockGrow),
    /// See [`BlockBreak`].
    BlockBreak(BlockBreak),
    /// See [`BlockPlace`].
    BlockPlace(BlockPlace),
    /// See [`EntityCombust`].
    EntityCombust(EntityCombust),
    /// See [`EntityShear`].
    EntityShear(EntityShear),
}

impl WorldEvent {
    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ProjectileLaunch(_) => EventKind::ProjectileLaunch,
            Self::EntityDamage(_) => EventKind::EntityDamage,
            Self::Scan(_) => EventKind::Scan,
            Self::BlockInteract(_) => EventKind::BlockInteract,
            Self::BlockGrow(_) => EventKind::BlockGrow,
            Self::BlockBreak(_) => EventKind::BlockBreak,
            Self::BlockPlace(_) => EventKind::BlockPlace,
            Self::EntityCombust(_) => EventKind::EntityCombust,
            Self::EntityShear(_) => EventKind::EntityShear,
        }
    }

    /// Actors and slots this event implicates. Empty when no actor is
    /// involved, which makes the event a no-op for dispatch.
    #[must_use]
    pub fn subjects(&self) -> Vec<Subject> {
        let subject = |actor, hook, scope| Subject { actor, hook, scope };
        match self {
            Self::ProjectileLaunch(e) => vec![subject(e.shooter, HookKind::ProjectileLaunch, SlotScope::Hand(e.hand))],
            Self::EntityDamage(e) => vec![
                subject(e.damager, HookKind::EntityHit, SlotScope::Hand(Hand::Main)),
                subject(e.victim, HookKind::BeingHit, SlotScope::Armor),
            ],
            Self::Scan(e) => vec![subject(e.actor, HookKind::Scan, SlotScope::All)],
            Self::BlockInteract(e) => vec![subject(e.actor, HookKind::BlockInteract, SlotScope::Hand(e.hand))],
            Self::BlockGrow(e) => e
                .cause
                .map(|actor| subject(actor, HookKind::BlockGrow, SlotScope::Hand(Hand::Main)))
                .into_iter()
                .collect(),
            Self::BlockBreak(e) => vec![subject(e.actor, HookKind::BlockBreak, SlotScope::Hand(Hand::Main))],
            Self::BlockPlace(e) => vec![subject(e.actor, HookKind::BlockPlace, SlotScope::Hand(e.hand))],
            Self::EntityCombust(e) => vec![subject(e.victim, HookKind::Combust, SlotScope::Armor)],
            Self::EntityShear(e) => vec![subject(e.actor, HookKind::Shear, SlotScope::Hand(e.hand))],
        }
    }

    /// Cancels the event. Returns false for kinds that cannot be cancelled.
    pub fn cancel(&mut self) -> bool {
        match self {
            Self::ProjectileLaunch(e) => e.cancel(),
            Self::EntityDamage(e) => e.cancel(),
            Self::Scan(_) => return false,
            Self::BlockInteract(e) => e.cancel(),
            Self::BlockGrow(e) => e.cancel(),
            Self::BlockBreak(e) => e.cancel(),
            Self::BlockPlace(e) => e.cancel(),
            Self::EntityCombust(e) => e.cancel(),
            Self::EntityShear(e) => e.cancel(),
        }
        true
    }

    /// Returns true if the event has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::ProjectileLaunch(e) => e.is_cancelled(),
            Self::EntityDamage(e) => e.is_cancelled(),
            Self::Scan(_) => false,
            Self::BlockInteract(e) => e.is_cancelled(),
            Self::BlockGrow(e) => e.is_cancelled(),
            Self::BlockBreak(e) => e.is_cancelled(),
            Self::BlockPlace(e) => e.is_cancelled(),
            Self::EntityCombust(e) => e.is_cancelled(),
            Self::EntityShear(e) => e.is_cancelled(),
        }
    }
}

macro_rules! from_payload {
    ($($event:ident),+ $(,)?) => {
        $(
            impl From<$event> for WorldEvent {
                fn from(event: $event) -> Self {
                    Self::$event(event)
                }
            }
        )+
    };
}

from_payload!(
    ProjectileLaunch,
    EntityDamage,
    Scan,
    BlockInteract,
    BlockGrow,
    BlockBreak,
    BlockPlace,
    EntityCombust,
    EntityShear,
);
