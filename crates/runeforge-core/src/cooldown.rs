//! Per-actor cooldown and enablement state.
//!
//! Each (actor, effect) pair is one `i64` in the host's [`ActorDataStore`],
//! stored under [`StoreKey::for_effect`]. The value encodes three states:
//!
//! | Stored value            | State                         |
//! |-------------------------|-------------------------------|
//! | `i64::MAX`              | [`CooldownState::Disabled`]   |
//! | `> now`                 | [`CooldownState::CoolingDown`]|
//! | `<= now` (default `0`)  | [`CooldownState::Ready`]      |
//!
//! ```text
//! Ready --set_cooldown--> CoolingDown --time--> Ready
//! Ready | CoolingDown --disable--> Disabled --enable--> Ready
//! ```
//!
//! Write failures on single-key operations are logged and swallowed; a
//! disabled effect silently ignores [`CooldownStore::set_cooldown`] so that
//! hooks may call it unconditionally.
//!
//! # Example
//!
//! ```
//! use runeforge_core::cooldown::{CooldownState, CooldownStore};
//! use runeforge_core::effect::EffectId;
//! use runeforge_core::host::{EntityId, ManualClock, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! let clock = ManualClock::new(10_000);
//! let mut cooldowns = CooldownStore::new(&mut store, &clock);
//! let (actor, spread) = (EntityId::new(1), EffectId::new(57));
//!
//! cooldowns.set_cooldown(actor, spread, 500);
//! assert_eq!(cooldowns.cooldown_end_ms(actor, spread), 10_500);
//! assert_eq!(cooldowns.state(actor, spread), CooldownState::CoolingDown { remaining_ms: 500 });
//!
//! cooldowns.disable(actor, spread);
//! cooldowns.set_cooldown(actor, spread, 500); // ignored
//! assert!(cooldowns.is_disabled(actor, spread));
//!
//! cooldowns.enable(actor, spread);
//! assert_eq!(cooldowns.cooldown_end_ms(actor, spread), 0);
//! ```

use tracing::{debug, warn};

use crate::effect::{EffectId, EffectRegistry};
use crate::error::StoreError;
use crate::host::{ActorDataStore, Clock, EntityId, StoreKey};

/// Stored value marking an effect as administratively disabled.
pub const DISABLED_SENTINEL: i64 = i64::MAX;

// =============================================================================
// State
// =============================================================================

/// Decoded view of one cooldown record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CooldownState {
    /// May fire now.
    Ready,
    /// Fires again once `remaining_ms` has elapsed.
    CoolingDown {
        /// Milliseconds until ready.
        remaining_ms: i64,
    },
    /// Suppressed until explicitly enabled.
    Disabled,
}

/// Outcome of a bulk enable/disable pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Effects visited.
    pub attempted: usize,
    /// Writes that failed, with the error the store returned.
    pub failed: Vec<(EffectId, StoreError)>,
}

impl BulkReport {
    /// Returns true if every write succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Three-state cooldown machine over a borrowed per-actor store.
pub struct CooldownStore<'a> {
    store: &'a mut dyn ActorDataStore,
    clock: &'a dyn Clock,
}

impl<'a> CooldownStore<'a> {
    /// Wraps a store and a clock.
    pub fn new(store: &'a mut dyn ActorDataStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Current time according to the wrapped clock.
    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Returns true if the effect is disabled for the actor.
    #[must_use]
    pub fn is_disabled(&self, actor: EntityId, effect: EffectId) -> bool {
        self.cooldown_end_ms(actor, effect) == DISABLED_SENTINEL
    }

    /// Milliseconds until the effect is ready; zero or negative when ready.
    ///
    /// Not sentinel-aware: for a disabled effect this returns
    /// `i64::MAX - now`. Check [`is_disabled`](Self::is_disabled) first.
    #[must_use]
    pub fn remaining_cooldown_ms(&self, actor: EntityId, effect: EffectId) -> i64 {
        self.cooldown_end_ms(actor, effect)
            .saturating_sub(self.clock.now_ms())
    }

    /// Raw stored value: 0 by default, the sentinel when disabled.
    #[must_use]
    pub fn cooldown_end_ms(&self, actor: EntityId, effect: EffectId) -> i64 {
        self.store.get(actor, &StoreKey::for_effect(effect))
    }

    /// Decodes the record.
    #[must_use]
    pub fn state(&self, actor: EntityId, effect: EffectId) -> CooldownState {
        if self.is_disabled(actor, effect) {
            return CooldownState::Disabled;
        }
        match self.remaining_cooldown_ms(actor, effect) {
            remaining if remaining > 0 => CooldownState::CoolingDown {
                remaining_ms: remaining,
            },
            _ => CooldownState::Ready,
        }
    }

    /// Starts a cooldown of `duration_ms`. Does nothing while disabled.
    ///
    /// The end time never reaches the sentinel.
    pub fn set_cooldown(&mut self, actor: EntityId, effect: EffectId, duration_ms: u32) {
        if self.is_disabled(actor, effect) {
            return;
        }
        let end = self
            .clock
            .now_ms()
            .saturating_add(i64::from(duration_ms))
            .min(DISABLED_SENTINEL - 1);
        self.write(actor, effect, end);
    }

    /// Disables the effect. Idempotent.
    pub fn disable(&mut self, actor: EntityId, effect: EffectId) {
        self.write(actor, effect, DISABLED_SENTINEL);
    }

    /// Re-enables a disabled effect, leaving it ready. No-op otherwise.
    pub fn enable(&mut self, actor: EntityId, effect: EffectId) {
        if self.is_disabled(actor, effect) {
            self.write(actor, effect, 0);
        }
    }

    /// Disables every registered effect for the actor.
    ///
    /// Best-effort: a failed write is logged and recorded, and the loop
    /// moves on to the next effect.
    pub fn disable_all(&mut self, actor: EntityId, registry: &EffectRegistry) -> BulkReport {
        self.bulk(actor, registry, |_| Some(DISABLED_SENTINEL))
    }

    /// Enables every registered effect for the actor. Best-effort, as
    /// [`disable_all`](Self::disable_all).
    pub fn enable_all(&mut self, actor: EntityId, registry: &EffectRegistry) -> BulkReport {
        self.bulk(actor, registry, |disabled| disabled.then_some(0))
    }

    fn bulk(
        &mut self,
        actor: EntityId,
        registry: &EffectRegistry,
        value_for: impl Fn(bool) -> Option<i64>,
    ) -> BulkReport {
        let mut report = BulkReport::default();
        for descriptor in registry.all() {
            let effect = descriptor.id();
            report.attempted += 1;
            let Some(value) = value_for(self.is_disabled(actor, effect)) else {
                continue;
            };
            if let Err(err) = self.store.set(actor, &StoreKey::for_effect(effect), value) {
                warn!(actor = %actor, effect = %effect, error = %err, "Cooldown write failed; continuing");
                report.failed.push((effect, err));
            }
        }
        debug!(
            actor = %actor,
            attempted = report.attempted,
            failed = report.failed.len(),
            "Bulk cooldown update finished"
        );
        report
    }

    fn write(&mut self, actor: EntityId, effect: EffectId, value: i64) {
        if let Err(err) = self.store.set(actor, &StoreKey::for_effect(effect), value) {
            warn!(actor = %actor, effect = %effect, error = %err, "Cooldown write failed");
        }
    }
}

impl std::fmt::Debug for CooldownStore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownStore")
            .field("now_ms", &self.clock.now_ms())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
