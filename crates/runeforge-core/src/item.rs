//! Item model: hands, equipment slots, equipment categories and item stacks.
//!
//! Items are owned by the host's inventory storage; the engine only reads
//! the effects attached to an [`ItemStack`] and applies durability damage
//! through [`ItemStack::damage`].
//!
//! # Example
//!
//! ```
//! use runeforge_core::item::{CategorySet, EquipmentCategory, ItemStack, Material};
//! use runeforge_core::effect::EffectId;
//!
//! let mut bow = ItemStack::new(Material::new("BOW"), 384);
//! bow.push_effect(EffectId::new(57), 5);
//!
//! assert_eq!(bow.attached_effects()[0].level, 5);
//! assert!(CategorySet::from(EquipmentCategory::Bow).contains(CategorySet::BOW));
//! ```

use std::fmt;

use bitflags::bitflags;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::effect::{EffectDescriptor, EffectId, EffectRegistry};
use crate::error::{Result, RuneforgeError};

// =============================================================================
// Material
// =============================================================================

/// Host material name (e.g. `"DIAMOND_PICKAXE"`, `"DIRT"`).
///
/// The engine never interprets material names beyond equality; the host
/// [`Catalog`](crate::tables::Catalog) decides which names exist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(String);

impl Material {
    /// Creates a material from its host name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the host name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Hands and Slots
// =============================================================================

/// The hand an actor used for an interaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    /// Main (right) hand.
    Main,
    /// Off (left) hand.
    Off,
}

impl Hand {
    /// Returns the opposite hand.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Main => Self::Off,
            Self::Off => Self::Main,
        }
    }

    /// Returns the equipment slot held by this hand.
    #[must_use]
    pub const fn slot(self) -> EquipmentSlot {
        match self {
            Self::Main => EquipmentSlot::MainHand,
            Self::Off => EquipmentSlot::OffHand,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main hand"),
            Self::Off => write!(f, "off hand"),
        }
    }
}

/// An equipment slot on an actor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    /// Item held in the main hand.
    MainHand,
    /// Item held in the off hand.
    OffHand,
    /// Boots.
    Feet,
    /// Leggings.
    Legs,
    /// Chestplate or wings.
    Chest,
    /// Helmet.
    Head,
}

impl EquipmentSlot {
    /// Every slot, in dispatch order.
    pub const ALL: [Self; 6] = [
        Self::MainHand,
        Self::OffHand,
        Self::Feet,
        Self::Legs,
        Self::Chest,
        Self::Head,
    ];

    /// Worn armour slots, in dispatch order.
    pub const ARMOR: [Self; 4] = [Self::Feet, Self::Legs, Self::Chest, Self::Head];

    /// Returns the hand holding this slot, or `None` for armour.
    #[must_use]
    pub const fn hand(self) -> Option<Hand> {
        match self {
            Self::MainHand => Some(Hand::Main),
            Self::OffHand => Some(Hand::Off),
            Self::Feet | Self::Legs | Self::Chest | Self::Head => None,
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainHand => write!(f, "MainHand"),
            Self::OffHand => write!(f, "OffHand"),
            Self::Feet => write!(f, "Feet"),
            Self::Legs => write!(f, "Legs"),
            Self::Chest => write!(f, "Chest"),
            Self::Head => write!(f, "Head"),
        }
    }
}

// =============================================================================
// Equipment Categories
// =============================================================================

/// Classification of an item governing which effects may attach to it.
///
/// The mapping from [`Material`] to category is configuration, held by
/// [`EquipmentTables`](crate::tables::EquipmentTables).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    /// Axes.
    Axe,
    /// Pickaxes.
    Pickaxe,
    /// Shovels.
    Shovel,
    /// Hoes.
    Hoe,
    /// Helmets.
    Helmet,
    /// Chestplates.
    Chestplate,
    /// Elytra-style wings.
    Wings,
    /// Leggings.
    Leggings,
    /// Boots.
    Boots,
    /// Swords.
    Sword,
    /// Bows and crossbows.
    Bow,
    /// Fishing rods.
    Rod,
    /// Shears.
    Shears,
    /// Items listed under `tools.all`, for effects that suit any tool.
    All,
}

impl EquipmentCategory {
    /// Every category.
    pub const ALL: [Self; 14] = [
        Self::Axe,
        Self::Pickaxe,
        Self::Shovel,
        Self::Hoe,
        Self::Helmet,
        Self::Chestplate,
        Self::Wings,
        Self::Leggings,
        Self::Boots,
        Self::Sword,
        Self::Bow,
        Self::Rod,
        Self::Shears,
        Self::All,
    ];

    /// Configuration key for this category (`tools.<key>`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Axe => "axe",
            Self::Pickaxe => "pickaxe",
            Self::Shovel => "shovel",
            Self::Hoe => "hoe",
            Self::Helmet => "helmet",
            Self::Chestplate => "chestplate",
            Self::Wings => "wings",
            Self::Leggings => "leggings",
            Self::Boots => "boots",
            Self::Sword => "sword",
            Self::Bow => "bow",
            Self::Rod => "rod",
            Self::Shears => "shears",
            Self::All => "all",
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

bitflags! {
    /// A set of [`EquipmentCategory`] values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CategorySet: u16 {
        /// Axes.
        const AXE = 1 << 0;
        /// Pickaxes.
        const PICKAXE = 1 << 1;
        /// Shovels.
        const SHOVEL = 1 << 2;
        /// Hoes.
        const HOE = 1 << 3;
        /// Helmets.
        const HELMET = 1 << 4;
        /// Chestplates.
        const CHESTPLATE = 1 << 5;
        /// Wings.
        const WINGS = 1 << 6;
        /// Leggings.
        const LEGGINGS = 1 << 7;
        /// Boots.
        const BOOTS = 1 << 8;
        /// Swords.
        const SWORD = 1 << 9;
        /// Bows.
        const BOW = 1 << 10;
        /// Fishing rods.
        const ROD = 1 << 11;
        /// Shears.
        const SHEARS = 1 << 12;
        /// Items listed under `tools.all`.
        const ALL = 1 << 13;

        /// Every armour piece.
        const ARMOR = Self::HELMET.bits() | Self::CHESTPLATE.bits()
            | Self::WINGS.bits() | Self::LEGGINGS.bits() | Self::BOOTS.bits();
        /// Digging and chopping tools.
        const TOOLS = Self::AXE.bits() | Self::PICKAXE.bits()
            | Self::SHOVEL.bits() | Self::HOE.bits();
    }
}

impl From<EquipmentCategory> for CategorySet {
    fn from(category: EquipmentCategory) -> Self {
        match category {
            EquipmentCategory::Axe => Self::AXE,
            EquipmentCategory::Pickaxe => Self::PICKAXE,
            EquipmentCategory::Shovel => Self::SHOVEL,
            EquipmentCategory::Hoe => Self::HOE,
            EquipmentCategory::Helmet => Self::HELMET,
            EquipmentCategory::Chestplate => Self::CHESTPLATE,
            EquipmentCategory::Wings => Self::WINGS,
            EquipmentCategory::Leggings => Self::LEGGINGS,
            EquipmentCategory::Boots => Self::BOOTS,
            EquipmentCategory::Sword => Self::SWORD,
            EquipmentCategory::Bow => Self::BOW,
            EquipmentCategory::Rod => Self::ROD,
            EquipmentCategory::Shears => Self::SHEARS,
            EquipmentCategory::All => Self::ALL,
        }
    }
}

impl FromIterator<EquipmentCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = EquipmentCategory>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, category| set | Self::from(category))
    }
}

// =============================================================================
// Item Stack
// =============================================================================

/// An effect attached to an item, as stored in the item's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedEffect {
    /// Which effect.
    pub id: EffectId,
    /// Attached level. Level 0 is representable and never dispatches.
    pub level: u8,
}

/// A concrete item held or worn by an actor.
///
/// `damage` counts used durability; the item is worn out once
/// `damage >= max_durability`. A `max_durability` of 0 marks an item without
/// durability, which can never break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Host material of the item.
    pub material: Material,
    /// Durability used so far.
    pub damage: u32,
    /// Durability at which the item breaks (0 = not damageable).
    pub max_durability: u32,
    /// Unbreakable items ignore durability damage.
    pub unbreakable: bool,
    /// Level of the host's durability-saving enchantment.
    pub unbreaking: u8,
    effects: Vec<AttachedEffect>,
}

impl ItemStack {
    /// Creates an undamaged item with no attached effects.
    #[must_use]
    pub fn new(material: Material, max_durability: u32) -> Self {
        Self {
            material,
            damage: 0,
            max_durability,
            unbreakable: false,
            unbreaking: 0,
            effects: Vec::new(),
        }
    }

    /// Effects attached to this item, in stored order.
    #[must_use]
    pub fn attached_effects(&self) -> &[AttachedEffect] {
        &self.effects
    }

    /// Returns the attached level of `id`, if present.
    #[must_use]
    pub fn level_of(&self, id: EffectId) -> Option<u8> {
        self.effects.iter().find(|e| e.id == id).map(|e| e.level)
    }

    /// Appends raw metadata without any validation.
    ///
    /// This mirrors what a host finds on an item it did not create (old
    /// saves, other plugins), so dispatch must cope with whatever lands here.
    pub fn push_effect(&mut self, id: EffectId, level: u8) {
        self.effects.push(AttachedEffect { id, level });
    }

    /// Attaches an effect, enforcing level bounds and conflicts.
    ///
    /// Re-attaching an effect already present replaces its level in place.
    ///
    /// # Errors
    ///
    /// Returns [`RuneforgeError::LevelOutOfRange`] for a level outside
    /// `1..=max_level`, and [`RuneforgeError::Conflict`] when the new effect
    /// and an attached one list each other as conflicting.
    pub fn attach(
        &mut self,
        descriptor: &EffectDescriptor,
        level: u8,
        registry: &EffectRegistry,
    ) -> Result<()> {
        let id = descriptor.id();
        if level == 0 || level > descriptor.max_level() {
            return Err(RuneforgeError::LevelOutOfRange {
                effect: id,
                level,
                max: descriptor.max_level(),
            });
        }

        for existing in &self.effects {
            if existing.id == id {
                continue;
            }
            let reverse = registry
                .by_id(existing.id)
                .is_some_and(|other| other.conflicts_with(id));
            if descriptor.conflicts_with(existing.id) || reverse {
                return Err(RuneforgeError::Conflict {
                    effect: id,
                    existing: existing.id,
                });
            }
        }

        match self.effects.iter_mut().find(|e| e.id == id) {
            Some(slot) => slot.level = level,
            None => self.effects.push(AttachedEffect { id, level }),
        }
        Ok(())
    }

    /// Removes an attached effect. Returns true if it was present.
    pub fn detach(&mut self, id: EffectId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        self.effects.len() != before
    }

    /// Returns true if this item takes durability damage at all.
    #[must_use]
    pub fn is_damageable(&self) -> bool {
        !self.unbreakable && self.max_durability > 0
    }

    /// Applies a durability damage attempt and reports whether the item
    /// should be removed.
    ///
    /// The attempt lands with probability `1 / (unbreaking + 1)`. Items that
    /// are not damageable never break.
    pub fn damage<R: Rng + ?Sized>(&mut self, amount: u32, rng: &mut R) -> bool {
        if !self.is_damageable() {
            return false;
        }
        let threshold = 1000 / (u32::from(self.unbreaking) + 1);
        if rng.gen_range(0..1000) <= threshold {
            self.damage = self.damage.saturating_add(amount);
        }
        self.damage >= self.max_durability
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectDescriptor, HandRequirement, RegistryBuilder};
    use crate::effects::StaticEffect;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn descriptor(id: u32, name: &str, conflicts: &[u32]) -> EffectDescriptor {
        EffectDescriptor::builder(EffectId::new(id))
            .name(name)
            .description("test")
            .applicable(CategorySet::BOOTS)
            .hand(HandRequirement::None)
            .max_level(4)
            .power(1.0)
            .conflicts(conflicts.iter().copied().map(EffectId::new))
            .build()
            .unwrap()
    }

    fn registry(descriptors: Vec<EffectDescriptor>) -> EffectRegistry {
        let mut builder = RegistryBuilder::new();
        for d in descriptors {
            builder.register(Arc::new(StaticEffect::new(d))).unwrap();
        }
        builder.seal()
    }

    mod slot_tests {
        use super::*;

        #[test]
        fn hands_map_to_slots() {
            assert_eq!(Hand::Main.slot(), EquipmentSlot::MainHand);
            assert_eq!(Hand::Off.slot(), EquipmentSlot::OffHand);
            assert_eq!(Hand::Main.other(), Hand::Off);
        }

        #[test]
        fn armor_has_no_hand() {
            for slot in EquipmentSlot::ARMOR {
                assert!(slot.hand().is_none());
            }
            assert_eq!(EquipmentSlot::OffHand.hand(), Some(Hand::Off));
        }
    }

    mod category_tests {
        use super::*;

        #[test]
        fn collect_into_set() {
            let set: CategorySet = [EquipmentCategory::Bow, EquipmentCategory::Boots]
                .into_iter()
                .collect();
            assert!(set.contains(CategorySet::BOW));
            assert!(set.contains(CategorySet::BOOTS));
            assert!(!set.contains(CategorySet::SWORD));
        }

        #[test]
        fn every_category_has_a_distinct_flag() {
            let all: CategorySet = EquipmentCategory::ALL.into_iter().collect();
            assert_eq!(all.bits().count_ones() as usize, EquipmentCategory::ALL.len());
        }

        #[test]
        fn armor_group() {
            assert!(CategorySet::ARMOR.contains(CategorySet::BOOTS));
            assert!(!CategorySet::ARMOR.intersects(CategorySet::TOOLS));
        }
    }

    mod attach_tests {
        use super::*;

        #[test]
        fn rejects_level_zero_and_above_max() {
            let weight = descriptor(67, "Weight", &[]);
            let reg = registry(vec![weight.clone()]);
            let mut boots = ItemStack::new(Material::new("IRON_BOOTS"), 195);

            assert!(matches!(
                boots.attach(&weight, 0, &reg),
                Err(RuneforgeError::LevelOutOfRange { .. })
            ));
            assert!(matches!(
                boots.attach(&weight, 5, &reg),
                Err(RuneforgeError::LevelOutOfRange { max: 4, .. })
            ));
            assert!(boots.attached_effects().is_empty());
        }

        #[test]
        fn rejects_conflicts_in_both_directions() {
            let weight = descriptor(67, "Weight", &[68]);
            let speed = descriptor(68, "Speed", &[]);
            let reg = registry(vec![weight.clone(), speed.clone()]);

            let mut boots = ItemStack::new(Material::new("IRON_BOOTS"), 195);
            boots.attach(&speed, 1, &reg).unwrap();
            assert!(matches!(
                boots.attach(&weight, 1, &reg),
                Err(RuneforgeError::Conflict { .. })
            ));

            let mut other = ItemStack::new(Material::new("IRON_BOOTS"), 195);
            other.attach(&weight, 1, &reg).unwrap();
            assert!(matches!(
                other.attach(&speed, 1, &reg),
                Err(RuneforgeError::Conflict { .. })
            ));
        }

        #[test]
        fn reattach_replaces_level() {
            let weight = descriptor(67, "Weight", &[]);
            let reg = registry(vec![weight.clone()]);
            let mut boots = ItemStack::new(Material::new("IRON_BOOTS"), 195);

            boots.attach(&weight, 1, &reg).unwrap();
            boots.attach(&weight, 3, &reg).unwrap();

            assert_eq!(boots.attached_effects().len(), 1);
            assert_eq!(boots.level_of(EffectId::new(67)), Some(3));
            assert!(boots.detach(EffectId::new(67)));
            assert!(!boots.detach(EffectId::new(67)));
        }
    }

    mod durability_tests {
        use super::*;

        #[test]
        fn unbreakable_never_breaks() {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut item = ItemStack::new(Material::new("BOW"), 1);
            item.unbreakable = true;
            assert!(!item.damage(100, &mut rng));
            assert_eq!(item.damage, 0);
        }

        #[test]
        fn no_durability_never_breaks() {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut item = ItemStack::new(Material::new("STICK"), 0);
            assert!(!item.damage(100, &mut rng));
        }

        #[test]
        fn without_unbreaking_damage_always_lands() {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let mut item = ItemStack::new(Material::new("BOW"), 10);
            for _ in 0..4 {
                assert!(!item.damage(2, &mut rng));
            }
            assert_eq!(item.damage, 8);
            assert!(item.damage(2, &mut rng));
        }

        #[test]
        fn unbreaking_skips_some_attempts() {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            let mut item = ItemStack::new(Material::new("BOW"), u32::MAX);
            item.unbreaking = 3;
            for _ in 0..1000 {
                item.damage(1, &mut rng);
            }
            assert!(item.damage > 150 && item.damage < 350, "got {}", item.damage);
        }
    }
}
