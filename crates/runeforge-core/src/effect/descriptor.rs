//! Effect identity and immutable descriptor metadata.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuneforgeError};
use crate::item::{CategorySet, Hand};

// =============================================================================
// Effect Identification
// =============================================================================

/// Unique, stable identifier of an effect.
///
/// Ids are external-facing (commands, saved items) and seed the per-actor
/// persistence key, so they must never be renumbered.
///
/// # Example
///
/// ```
/// use runeforge_core::effect::EffectId;
///
/// let spread = EffectId::new(57);
/// assert_eq!(spread.as_u32(), 57);
/// assert_eq!(spread.to_string(), "57");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(u32);

impl EffectId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectId({})", self.0)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EffectId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// Hand Requirement
// =============================================================================

/// Whether the triggering hand matters for an effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandRequirement {
    /// Only fires from the off hand.
    Left,
    /// Only fires from the main hand.
    Right,
    /// Fires from either hand, but not from worn armour.
    Either,
    /// Hand is irrelevant (armour and passive effects).
    None,
}

impl HandRequirement {
    /// Checks the requirement against the acting hand (`None` for armour slots).
    #[must_use]
    pub const fn matches(self, hand: Option<Hand>) -> bool {
        match (self, hand) {
            (Self::None, _)
            | (Self::Either, Some(_))
            | (Self::Right, Some(Hand::Main))
            | (Self::Left, Some(Hand::Off)) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Immutable metadata describing one effect.
///
/// Built through [`EffectBuilder`], which validates the invariants:
/// `max_level >= 1`, at least one applicable category, a non-empty name and
/// a finite power.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDescriptor {
    id: EffectId,
    name: String,
    description: String,
    applicable: CategorySet,
    hand: HandRequirement,
    max_level: u8,
    power: f64,
    conflicts: BTreeSet<EffectId>,
    cooldown_ms: u32,
}

impl EffectDescriptor {
    /// Starts building a descriptor for `id`.
    #[must_use]
    pub fn builder(id: EffectId) -> EffectBuilder {
        EffectBuilder::new(id)
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short player-facing description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Equipment categories this effect may attach to.
    #[must_use]
    pub fn applicable(&self) -> CategorySet {
        self.applicable
    }

    /// Hand requirement.
    #[must_use]
    pub fn hand(&self) -> HandRequirement {
        self.hand
    }

    /// Highest attachable level.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Per-level scaling coefficient, interpreted by the effect's hooks.
    #[must_use]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Mutually exclusive effects.
    #[must_use]
    pub fn conflicts(&self) -> &BTreeSet<EffectId> {
        &self.conflicts
    }

    /// Returns true if `other` is listed as conflicting.
    #[must_use]
    pub fn conflicts_with(&self, other: EffectId) -> bool {
        self.conflicts.contains(&other)
    }

    /// Default cooldown a hook applies after firing, in milliseconds.
    #[must_use]
    pub fn cooldown_ms(&self) -> u32 {
        self.cooldown_ms
    }

    /// Returns a builder pre-filled with this descriptor's values.
    #[must_use]
    pub fn to_builder(&self) -> EffectBuilder {
        EffectBuilder {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            applicable: self.applicable,
            hand: self.hand,
            max_level: self.max_level,
            power: self.power,
            conflicts: self.conflicts.clone(),
            cooldown_ms: self.cooldown_ms,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent, construction-time-only builder for [`EffectDescriptor`].
///
/// # Example
///
/// ```
/// use runeforge_core::effect::{EffectDescriptor, EffectId, HandRequirement};
/// use runeforge_core::item::CategorySet;
///
/// let spread = EffectDescriptor::builder(EffectId::new(57))
///     .name("Spread")
///     .description("Fires an array of arrows simultaneously")
///     .applicable(CategorySet::BOW)
///     .hand(HandRequirement::Right)
///     .max_level(5)
///     .power(1.0)
///     .conflicts([EffectId::new(6)])
///     .build()
///     .unwrap();
///
/// assert_eq!(spread.max_level(), 5);
/// assert!(spread.conflicts_with(EffectId::new(6)));
///
/// let broken = EffectDescriptor::builder(EffectId::new(1)).name("Nothing").build();
/// assert!(broken.is_err());
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct EffectBuilder {
    id: EffectId,
    name: String,
    description: String,
    applicable: CategorySet,
    hand: HandRequirement,
    max_level: u8,
    power: f64,
    conflicts: BTreeSet<EffectId>,
    cooldown_ms: u32,
}

impl EffectBuilder {
    fn new(id: EffectId) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            applicable: CategorySet::empty(),
            hand: HandRequirement::None,
            max_level: 1,
            power: 1.0,
            conflicts: BTreeSet::new(),
            cooldown_ms: 0,
        }
    }

    /// Sets the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the applicable equipment categories.
    pub fn applicable(mut self, categories: CategorySet) -> Self {
        self.applicable = categories;
        self
    }

    /// Sets the hand requirement.
    pub fn hand(mut self, hand: HandRequirement) -> Self {
        self.hand = hand;
        self
    }

    /// Sets the highest level.
    pub fn max_level(mut self, max_level: u8) -> Self {
        self.max_level = max_level;
        self
    }

    /// Sets the power coefficient.
    pub fn power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    /// Adds conflicting effects.
    pub fn conflicts(mut self, conflicts: impl IntoIterator<Item = EffectId>) -> Self {
        self.conflicts.extend(conflicts);
        self
    }

    /// Sets the default cooldown.
    pub fn cooldown_ms(mut self, cooldown_ms: u32) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    /// Validates the accumulated values and produces the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RuneforgeError::InvalidDescriptor`] naming the first violated
    /// invariant.
    pub fn build(self) -> Result<EffectDescriptor> {
        let reason = if self.name.trim().is_empty() {
            Some("name must not be empty")
        } else if self.max_level < 1 {
            Some("max_level must be at least 1")
        } else if self.applicable.is_empty() {
            Some("applicable equipment must not be empty")
        } else if !self.power.is_finite() {
            Some("power must be finite")
        } else if self.conflicts.contains(&self.id) {
            Some("an effect cannot conflict with itself")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(RuneforgeError::InvalidDescriptor {
                id: self.id,
                reason: reason.to_string(),
            });
        }

        Ok(EffectDescriptor {
            id: self.id,
            name: self.name,
            description: self.description,
            applicable: self.applicable,
            hand: self.hand,
            max_level: self.max_level,
            power: self.power,
            conflicts: self.conflicts,
            cooldown_ms: self.cooldown_ms,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
