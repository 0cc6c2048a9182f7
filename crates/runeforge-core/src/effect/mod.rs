//! Effect model: descriptors, the hook trait and the registry.
//!
//! An effect is a named, leveled capability attached to an item. Each effect
//! is split into two parts:
//!
//! - an immutable [`EffectDescriptor`] (identity, applicable equipment, hand
//!   requirement, level bound, power, conflicts), and
//! - an implementation of the [`Effect`] trait supplying typed hooks, one per
//!   world event kind.
//!
//! Effects are collected in a [`RegistryBuilder`] during start-up and sealed
//! into a read-only [`EffectRegistry`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use runeforge_core::effect::{
//!     Effect, EffectBuilder, EffectDescriptor, EffectId, HandRequirement, HookOutcome,
//!     HookResult, RegistryBuilder,
//! };
//! use runeforge_core::dispatch::{HookContext, Scan};
//! use runeforge_core::item::CategorySet;
//!
//! struct Glow;
//!
//! impl Effect for Glow {
//!     fn defaults(&self) -> EffectBuilder {
//!         EffectDescriptor::builder(EffectId::new(900))
//!             .name("Glow")
//!             .description("Lights up the wearer")
//!             .applicable(CategorySet::HELMET)
//!             .hand(HandRequirement::None)
//!             .max_level(1)
//!     }
//!
//!     fn on_scan(&self, _ctx: &mut HookContext<'_>, _event: &Scan) -> HookResult {
//!         Ok(HookOutcome::Applied)
//!     }
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! builder.register(Arc::new(Glow)).unwrap();
//! let registry = builder.seal();
//!
//! assert_eq!(registry.by_name("glow").unwrap().id(), EffectId::new(900));
//! ```

mod descriptor;
mod registry;

pub use descriptor::{EffectBuilder, EffectDescriptor, EffectId, HandRequirement};
pub use registry::{EffectRegistry, RegisteredEffect, RegistryBuilder};

use crate::dispatch::{
    BlockBreak, BlockGrow, BlockInteract, BlockPlace, EntityCombust, EntityDamage, EntityShear,
    HookContext, ProjectileLaunch, Scan,
};
use crate::error::HookError;

// =============================================================================
// Hook Outcome
// =============================================================================

/// What a hook reports back to the dispatch engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// The effect fired.
    Applied,
    /// The effect did not apply this time (wrong target, already active, ...).
    Skipped,
    /// The triggering event must be treated as cancelled. The engine stops
    /// evaluating further effects on the same item and sets the event's
    /// cancellation flag where the event supports one.
    Cancel,
}

impl HookOutcome {
    /// Boolean success flag of the outcome.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl From<bool> for HookOutcome {
    fn from(applied: bool) -> Self {
        if applied {
            Self::Applied
        } else {
            Self::Skipped
        }
    }
}

/// Result of a hook invocation.
pub type HookResult = Result<HookOutcome, HookError>;

// =============================================================================
// Effect Trait
// =============================================================================

/// Behaviour of one effect.
///
/// [`defaults`](Effect::defaults) supplies the descriptor builder; the
/// registry applies configuration overrides and validates it. Every hook
/// defaults to [`HookOutcome::Skipped`], so an effect only implements the
/// events it reacts to.
///
/// # Implementation Guidelines
///
/// 1. **Non-blocking**: hooks run on the simulation thread. Deferred work
///    goes through [`HookContext::scheduler`].
///
/// 2. **Own cooldowns**: the engine never applies a cooldown. A hook that
///    wants one calls [`HookContext::apply_cooldown`] or
///    [`HookContext::set_cooldown`].
///
/// 3. **Randomness**: use [`HookContext::rng`] so dispatch stays
///    reproducible under a fixed seed.
#[allow(unused_variables)]
pub trait Effect: Send + Sync {
    /// Default descriptor values for this effect.
    fn defaults(&self) -> EffectBuilder;

    /// A projectile was launched by the actor.
    fn on_projectile_launch(&self, ctx: &mut HookContext<'_>, event: &mut ProjectileLaunch) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor struck another entity with the held item.
    fn on_entity_hit(&self, ctx: &mut HookContext<'_>, event: &mut EntityDamage) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor was struck by another entity while wearing the item.
    fn on_being_hit(&self, ctx: &mut HookContext<'_>, event: &mut EntityDamage) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// Periodic scan over the actor's equipment.
    fn on_scan(&self, ctx: &mut HookContext<'_>, event: &Scan) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor clicked a block or the air.
    fn on_block_interact(&self, ctx: &mut HookContext<'_>, event: &mut BlockInteract) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// A block grew because of the actor.
    fn on_block_grow(&self, ctx: &mut HookContext<'_>, event: &mut BlockGrow) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor broke a block.
    fn on_block_break(&self, ctx: &mut HookContext<'_>, event: &mut BlockBreak) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor placed a block.
    fn on_block_place(&self, ctx: &mut HookContext<'_>, event: &mut BlockPlace) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor is about to be set on fire.
    fn on_combust(&self, ctx: &mut HookContext<'_>, event: &mut EntityCombust) -> HookResult {
        Ok(HookOutcome::Skipped)
    }

    /// The actor sheared an entity.
    fn on_shear(&self, ctx: &mut HookContext<'_>, event: &mut EntityShear) -> HookResult {
        Ok(HookOutcome::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_success_flag() {
        assert!(HookOutcome::Applied.is_success());
        assert!(!HookOutcome::Skipped.is_success());
        assert!(!HookOutcome::Cancel.is_success());
        assert_eq!(HookOutcome::from(true), HookOutcome::Applied);
        assert_eq!(HookOutcome::from(false), HookOutcome::Skipped);
    }

    #[test]
    fn effect_is_object_safe() {
        fn _accepts_arc(_effect: std::sync::Arc<dyn Effect>) {}
    }
}
