//! The per-event decision procedure.

use std::collections::HashSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, trace};

use super::context::{HookContext, HostServices};
use super::event::{EventKind, HookKind, Subject, WorldEvent};
use crate::capability::Capabilities;
use crate::cooldown::CooldownState;
use crate::effect::{Effect, EffectDescriptor, EffectId, EffectRegistry, HandRequirement, HookOutcome, HookResult};
use crate::error::HookError;
use crate::host::EntityId;
use crate::item::{AttachedEffect, CategorySet, EquipmentSlot};
use crate::tables::MagicTables;

// =============================================================================
// Report
// =============================================================================

/// Why a candidate was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The id is not in the registry.
    UnknownEffect,
    /// Attached at level 0.
    LevelZero,
    /// The item's categories are not applicable.
    WrongEquipment,
    /// The item is in a hand the effect does not accept.
    WrongHand,
    /// Disabled for the actor.
    Disabled,
    /// Still cooling down.
    CoolingDown,
}

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Filtered out before invocation.
    Rejected(Rejection),
    /// Hook returned [`HookOutcome::Applied`].
    Applied,
    /// Hook returned [`HookOutcome::Skipped`].
    Skipped,
    /// Hook returned [`HookOutcome::Cancel`].
    Cancelled,
    /// Hook returned an error or panicked.
    Failed,
}

impl Disposition {
    /// Returns true if the hook actually ran.
    #[must_use]
    pub fn invoked(self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// One line of a [`DispatchReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRecord {
    /// Actor whose item carried the effect.
    pub actor: EntityId,
    /// Slot of the item.
    pub slot: EquipmentSlot,
    /// Effect considered.
    pub effect: EffectId,
    /// Hook targeted.
    pub hook: HookKind,
    /// Result.
    pub disposition: Disposition,
}

/// Everything the engine did for one event, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Kind of the dispatched event.
    pub kind: EventKind,
    /// One record per candidate considered.
    pub records: Vec<DispatchRecord>,
}

impl DispatchReport {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    /// Number of times a hook of `effect` ran.
    #[must_use]
    pub fn invocations(&self, effect: EffectId) -> usize {
        self.records
            .iter()
            .filter(|r| r.effect == effect && r.disposition.invoked())
            .count()
    }

    /// Records for `effect`.
    pub fn for_effect(&self, effect: EffectId) -> impl Iterator<Item = &DispatchRecord> {
        self.records.iter().filter(move |r| r.effect == effect)
    }

    /// Returns true if nothing was considered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Routes world events to the hooks of the effects on implicated items.
///
/// The engine is single-threaded and synchronous: [`dispatch`](Self::dispatch)
/// returns once every candidate has been handled. It never applies a
/// cooldown on its own and never clears a cancellation.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use runeforge_core::capability::Capabilities;
/// use runeforge_core::dispatch::{DispatchEngine, Scan, WorldEvent};
/// use runeforge_core::effect::RegistryBuilder;
/// use runeforge_core::effects::Weight;
/// use runeforge_core::tables::MagicTables;
///
/// let mut builder = RegistryBuilder::new();
/// builder.register(Arc::new(Weight)).unwrap();
///
/// let engine = DispatchEngine::new(
///     Arc::new(builder.seal()),
///     Arc::new(Capabilities::default()),
///     Arc::new(MagicTables::default()),
///     42,
/// );
/// assert_eq!(engine.registry().len(), 1);
/// ```
pub struct DispatchEngine {
    registry: Arc<EffectRegistry>,
    capabilities: Arc<Capabilities>,
    tables: Arc<MagicTables>,
    rng: ChaCha8Rng,
}

impl DispatchEngine {
    /// Creates an engine with a deterministically seeded RNG.
    #[must_use]
    pub fn new(
        registry: Arc<EffectRegistry>,
        capabilities: Arc<Capabilities>,
        tables: Arc<MagicTables>,
        seed: u64,
    ) -> Self {
        Self {
            registry,
            capabilities,
            tables,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The sealed registry.
    #[must_use]
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Negotiated capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Lookup tables.
    #[must_use]
    pub fn tables(&self) -> &MagicTables {
        &self.tables
    }

    /// Dispatches one event.
    ///
    /// Subjects are taken from [`WorldEvent::subjects`]; entities that are
    /// not actors are skipped. Within a subject, slots are visited in scope
    /// order and the effects on each item in stored order. A `Cancel`
    /// outcome cancels the event and ends evaluation of that item only.
    pub fn dispatch(&mut self, event: &mut WorldEvent, host: &mut HostServices<'_>) -> DispatchReport {
        let kind = event.kind();
        let mut report = DispatchReport::new(kind);
        let subjects = event.subjects();
        if subjects.is_empty() {
            trace!(event = %kind, "Event implicates no actor");
            return report;
        }

        let mut seen = HashSet::new();
        for subject in subjects {
            if !host.world.is_actor(subject.actor) {
                trace!(event = %kind, entity = %subject.actor, "Not an actor; skipping");
                continue;
            }
            for (slot, primary) in subject.scope.slots() {
                self.dispatch_slot(event, host, &subject, slot, primary, &mut seen, &mut report);
            }
        }

        debug!(
            event = %kind,
            candidates = report.records.len(),
            cancelled = event.is_cancelled(),
            "Dispatch finished"
        );
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_slot(
        &mut self,
        event: &mut WorldEvent,
        host: &mut HostServices<'_>,
        subject: &Subject,
        slot: EquipmentSlot,
        primary: bool,
        seen: &mut HashSet<(EntityId, EquipmentSlot, EffectId)>,
        report: &mut DispatchReport,
    ) {
        let actor = subject.actor;
        let Some(item) = host.world.equipment(actor, slot) else {
            return;
        };
        let attached: Vec<AttachedEffect> = item.attached_effects().to_vec();

        let Self {
            registry,
            capabilities,
            tables,
            rng,
        } = self;

        for AttachedEffect { id, level } in attached {
            // An earlier hook may have broken or swapped out the item.
            let Some(current) = host.world.equipment(actor, slot) else {
                break;
            };
            let categories = tables.equipment().categories_of(&current.material);
            if !seen.insert((actor, slot, id)) {
                continue;
            }
            let mut record = |disposition| {
                report.records.push(DispatchRecord {
                    actor,
                    slot,
                    effect: id,
                    hook: subject.hook,
                    disposition,
                });
            };

            let Some(registered) = registry.effect(id) else {
                trace!(actor = %actor, effect = %id, "Unknown effect on item");
                record(Disposition::Rejected(Rejection::UnknownEffect));
                continue;
            };
            let descriptor = registered.descriptor();
            if let Some(rejection) = check_candidate(host, actor, slot, primary, level, categories, descriptor) {
                trace!(actor = %actor, effect = %id, ?rejection, "Candidate rejected");
                record(Disposition::Rejected(rejection));
                continue;
            }

            let mut ctx = HookContext::new(actor, slot, level, descriptor, host, capabilities, tables, rng);
            let hooks = registered.hooks();
            let result = catch_unwind(AssertUnwindSafe(|| invoke(hooks, subject.hook, &mut ctx, event)));

            let outcome = match result {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    error!(actor = %actor, effect = %id, event = %event.kind(), error = %err, "Effect hook failed");
                    record(Disposition::Failed);
                    continue;
                }
                Err(_) => {
                    error!(actor = %actor, effect = %id, event = %event.kind(), "Effect hook panicked");
                    record(Disposition::Failed);
                    continue;
                }
            };

            match outcome {
                HookOutcome::Applied => record(Disposition::Applied),
                HookOutcome::Skipped => record(Disposition::Skipped),
                HookOutcome::Cancel => {
                    event.cancel();
                    record(Disposition::Cancelled);
                    debug!(actor = %actor, effect = %id, slot = %slot, "Hook cancelled the event");
                    break;
                }
            }
        }
    }
}

impl fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("registry", &self.registry)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Applies the filtering rules to one candidate.
fn check_candidate(
    host: &mut HostServices<'_>,
    actor: EntityId,
    slot: EquipmentSlot,
    primary: bool,
    level: u8,
    categories: CategorySet,
    descriptor: &EffectDescriptor,
) -> Option<Rejection> {
    if level < 1 {
        return Some(Rejection::LevelZero);
    }
    if !categories.intersects(descriptor.applicable()) {
        return Some(Rejection::WrongEquipment);
    }
    let hand_ok = if primary {
        descriptor.hand().matches(slot.hand())
    } else {
        descriptor.hand() == HandRequirement::Either
    };
    if !hand_ok {
        return Some(Rejection::WrongHand);
    }
    match host.cooldowns().state(actor, descriptor.id()) {
        CooldownState::Disabled => Some(Rejection::Disabled),
        CooldownState::CoolingDown { .. } => Some(Rejection::CoolingDown),
        CooldownState::Ready => None,
    }
}

/// Calls the hook matching `hook` with the payload it expects.
fn invoke(effect: &dyn Effect, hook: HookKind, ctx: &mut HookContext<'_>, event: &mut WorldEvent) -> HookResult {
    match (hook, event) {
        (HookKind::ProjectileLaunch, WorldEvent::ProjectileLaunch(e)) => effect.on_projectile_launch(ctx, e),
        (HookKind::EntityHit, WorldEvent::EntityDamage(e)) => effect.on_entity_hit(ctx, e),
        (HookKind::BeingHit, WorldEvent::EntityDamage(e)) => effect.on_being_hit(ctx, e),
        (HookKind::Scan, WorldEvent::Scan(e)) => effect.on_scan(ctx, e),
        (HookKind::BlockInteract, WorldEvent::BlockInteract(e)) => effect.on_block_interact(ctx, e),
        (HookKind::BlockGrow, WorldEvent::BlockGrow(e)) => effect.on_block_grow(ctx, e),
        (HookKind::BlockBreak, WorldEvent::BlockBreak(e)) => effect.on_block_break(ctx, e),
        (HookKind::BlockPlace, WorldEvent::BlockPlace(e)) => effect.on_block_place(ctx, e),
        (HookKind::Combust, WorldEvent::EntityCombust(e)) => effect.on_combust(ctx, e),
        (HookKind::Shear, WorldEvent::EntityShear(e)) => effect.on_shear(ctx, e),
        (hook, event) => Err(HookError::UnexpectedPayload(format!(
            "{hook:?} hook cannot handle a {} event",
            event.kind()
        ))),
    }
}
