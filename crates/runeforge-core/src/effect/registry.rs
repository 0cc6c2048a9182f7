//! Write-once effect registry.
//!
//! Registration happens on a [`RegistryBuilder`]. Calling
//! [`RegistryBuilder::seal`] ends the registration phase and yields an
//! [`EffectRegistry`] that has no mutators, so it can be shared across
//! threads behind an `Arc` without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::{Effect, EffectDescriptor, EffectId};
use crate::config::{EffectOverride, EffectsConfig};
use crate::error::{Result, RuneforgeError};

static GLOBAL: OnceLock<Arc<EffectRegistry>> = OnceLock::new();

// =============================================================================
// Registered Effect
// =============================================================================

/// A validated descriptor paired with the hooks that implement it.
///
/// The descriptor here is authoritative: it already carries any
/// configuration overrides, whereas [`Effect::defaults`] does not.
#[derive(Clone)]
pub struct RegisteredEffect {
    descriptor: EffectDescriptor,
    hooks: Arc<dyn Effect>,
}

impl RegisteredEffect {
    /// The effective descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &EffectDescriptor {
        &self.descriptor
    }

    /// The hook implementation.
    #[must_use]
    pub fn hooks(&self) -> &dyn Effect {
        self.hooks.as_ref()
    }
}

impl fmt::Debug for RegisteredEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredEffect")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registry Builder
// =============================================================================

/// Registration-phase registry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use runeforge_core::effect::{EffectId, RegistryBuilder};
/// use runeforge_core::effects::{Spread, Weight};
///
/// let mut builder = RegistryBuilder::new();
/// builder.register(Arc::new(Spread)).unwrap();
/// builder.register(Arc::new(Weight)).unwrap();
///
/// // Same id again: rejected, the first registration stays.
/// assert!(builder.register(Arc::new(Spread)).is_err());
///
/// let registry = builder.seal();
/// assert_eq!(registry.len(), 2);
/// assert!(registry.by_id(EffectId::new(57)).is_some());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<RegisteredEffect>,
    by_id: HashMap<EffectId, usize>,
    by_name: HashMap<String, usize>,
    overrides: EffectsConfig,
}

impl RegistryBuilder {
    /// Creates an empty builder with no configuration overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that applies per-effect overrides on registration.
    ///
    /// Override keys are effect names, compared case-insensitively.
    #[must_use]
    pub fn with_overrides(overrides: EffectsConfig) -> Self {
        Self {
            overrides,
            ..Self::default()
        }
    }

    /// Validates and registers an effect.
    ///
    /// An effect switched off in configuration is skipped (logged, `Ok`).
    ///
    /// # Errors
    ///
    /// - [`RuneforgeError::InvalidDescriptor`] if the defaults fail validation
    /// - [`RuneforgeError::DuplicateId`] / [`RuneforgeError::DuplicateName`]
    ///   if the id or name is taken; the earlier registration is kept
    pub fn register(&mut self, effect: Arc<dyn Effect>) -> Result<()> {
        let descriptor = match effect.defaults().build() {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(error = %err, "Rejected effect with invalid defaults");
                return Err(err);
            }
        };

        let key = descriptor.name().to_lowercase();
        let descriptor = match self.override_for(&key) {
            Some(over) if !over.enabled => {
                info!(effect = %descriptor.id(), name = descriptor.name(), "Effect disabled by configuration");
                return Ok(());
            }
            Some(over) => apply_override(descriptor, over),
            None => descriptor,
        };

        let id = descriptor.id();
        if let Some(&existing) = self.by_id.get(&id) {
            warn!(
                effect = %id,
                name = descriptor.name(),
                existing = self.entries[existing].descriptor.name(),
                "Duplicate effect id; keeping the first registration"
            );
            return Err(RuneforgeError::DuplicateId(id));
        }
        if self.by_name.contains_key(&key) {
            warn!(effect = %id, name = descriptor.name(), "Duplicate effect name; keeping the first registration");
            return Err(RuneforgeError::DuplicateName(descriptor.name().to_string()));
        }

        debug!(effect = %id, name = descriptor.name(), "Registered effect");
        let index = self.entries.len();
        self.by_id.insert(id, index);
        self.by_name.insert(key, index);
        self.entries.push(RegisteredEffect {
            descriptor,
            hooks: effect,
        });
        Ok(())
    }

    /// Registers every effect, logging and skipping the ones that fail.
    ///
    /// Returns the number of effects actually registered.
    pub fn register_all(&mut self, effects: impl IntoIterator<Item = Arc<dyn Effect>>) -> usize {
        let before = self.entries.len();
        for effect in effects {
            // Failures are already logged by `register`.
            let _ = self.register(effect);
        }
        self.entries.len() - before
    }

    /// Number of effects registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ends the registration phase.
    #[must_use]
    pub fn seal(self) -> EffectRegistry {
        info!(effects = self.entries.len(), "Effect registry sealed");
        EffectRegistry {
            entries: self.entries,
            by_id: self.by_id,
            by_name: self.by_name,
        }
    }

    fn override_for(&self, key: &str) -> Option<&EffectOverride> {
        self.overrides
            .iter()
            .find(|(name, _)| name.to_lowercase() == key)
            .map(|(_, over)| over)
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("registered", &self.entries.len())
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

/// Applies configured values on top of validated defaults. An override that
/// breaks an invariant is dropped and the defaults are kept.
fn apply_override(descriptor: EffectDescriptor, over: &EffectOverride) -> EffectDescriptor {
    let mut builder = descriptor.to_builder();
    if let Some(power) = over.power {
        builder = builder.power(power);
    }
    if let Some(max_level) = over.max_level {
        builder = builder.max_level(max_level);
    }
    if let Some(cooldown_ms) = over.cooldown_ms {
        builder = builder.cooldown_ms(cooldown_ms);
    }

    match builder.build() {
        Ok(updated) => updated,
        Err(err) => {
            warn!(effect = %descriptor.id(), error = %err, "Ignoring invalid configuration override");
            descriptor
        }
    }
}

// =============================================================================
// Sealed Registry
// =============================================================================

/// Read-only lookup table of registered effects, by id and by name.
pub struct EffectRegistry {
    entries: Vec<RegisteredEffect>,
    by_id: HashMap<EffectId, usize>,
    by_name: HashMap<String, usize>,
}

impl EffectRegistry {
    /// Looks up a descriptor by id.
    #[must_use]
    pub fn by_id(&self, id: EffectId) -> Option<&EffectDescriptor> {
        self.effect(id).map(RegisteredEffect::descriptor)
    }

    /// Looks up a descriptor by name, ignoring case.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&EffectDescriptor> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.entries[index].descriptor)
    }

    /// Looks up the descriptor and hooks for an id.
    #[must_use]
    pub fn effect(&self, id: EffectId) -> Option<&RegisteredEffect> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }

    /// Iterates every registered descriptor.
    pub fn all(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.entries.iter().map(RegisteredEffect::descriptor)
    }

    /// Number of registered effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no effects are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Publishes this registry as the process-wide instance.
    ///
    /// # Errors
    ///
    /// Returns [`RuneforgeError::RegistrySealed`] if a registry was already
    /// installed; the installed one is left untouched.
    pub fn install_global(self: Arc<Self>) -> Result<Arc<Self>> {
        GLOBAL
            .set(Arc::clone(&self))
            .map_err(|_| RuneforgeError::RegistrySealed)?;
        Ok(self)
    }

    /// Returns the process-wide registry, if one was installed.
    #[must_use]
    pub fn global() -> Option<Arc<Self>> {
        GLOBAL.get().cloned()
    }
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.entries.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
