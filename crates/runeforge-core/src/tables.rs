//! Lookup tables consulted by effects: equipment categories, named material
//! and biome sets, and conversion maps.
//!
//! Tables are loaded once from [`TablesConfig`] and validated against a host
//! [`Catalog`] of known names. Invalid entries are logged with the offending
//! text and skipped; loading itself never fails.
//!
//! # Example
//!
//! ```
//! use runeforge_core::config::TablesConfig;
//! use runeforge_core::item::{CategorySet, Material};
//! use runeforge_core::tables::{Catalog, MagicTables};
//!
//! let catalog = Catalog::new()
//!     .with_materials(["DIRT", "GRASS_BLOCK", "BOW"]);
//! let mut config = TablesConfig::default();
//! config.spectral_conversions = vec!["DIRT:GRASS_BLOCK".into(), "DIRT:NOPE".into()];
//! config.tools.insert("bow".into(), vec!["BOW".into()]);
//!
//! let tables = MagicTables::load(&config, &catalog);
//! assert_eq!(
//!     tables.spectral().get(&Material::new("DIRT")),
//!     Some(&Material::new("GRASS_BLOCK"))
//! );
//! assert_eq!(tables.spectral().len(), 1);
//! assert_eq!(tables.equipment().categories_of(&Material::new("BOW")), CategorySet::BOW);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TablesConfig;
use crate::item::{CategorySet, EquipmentCategory, Material};

// =============================================================================
// Names
// =============================================================================

/// Host entity-kind name (e.g. `"PIG"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    /// Creates a kind from its host name.
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

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host biome name (e.g. `"DESERT"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Biome(String);

impl Biome {
    /// Creates a biome from its host name.
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

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names the host knows about. Lookups ignore case and surrounding
/// whitespace.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    materials: BTreeSet<String>,
    biomes: BTreeSet<String>,
    entity_kinds: BTreeSet<String>,
    tags: BTreeMap<String, BTreeSet<Material>>,
}

impl Catalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds material names.
    #[must_use]
    pub fn with_materials<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.materials.extend(names.into_iter().map(normalize));
        self
    }

    /// Adds biome names.
    #[must_use]
    pub fn with_biomes<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.biomes.extend(names.into_iter().map(normalize));
        self
    }

    /// Adds entity-kind names.
    #[must_use]
    pub fn with_entity_kinds<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.entity_kinds.extend(names.into_iter().map(normalize));
        self
    }

    /// Adds a named material tag (e.g. `"LOGS"`). Repeated calls extend it.
    #[must_use]
    pub fn with_tag<'a>(mut self, name: &str, materials: impl IntoIterator<Item = &'a str>) -> Self {
        self.tags
            .entry(normalize(name))
            .or_default()
            .extend(materials.into_iter().map(|m| Material::new(normalize(m))));
        self
    }

    /// Members of a material tag, or `None` if the host has no such tag.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<impl Iterator<Item = &Material>> {
        self.tags.get(&normalize(name)).map(|materials| materials.iter())
    }

    /// Resolves a material name.
    #[must_use]
    pub fn material(&self, name: &str) -> Option<Material> {
        let name = normalize(name);
        self.materials.contains(&name).then(|| Material::new(name))
    }

    /// Resolves a biome name.
    #[must_use]
    pub fn biome(&self, name: &str) -> Option<Biome> {
        let name = normalize(name);
        self.biomes.contains(&name).then(|| Biome::new(name))
    }

    /// Resolves an entity-kind name.
    #[must_use]
    pub fn entity_kind(&self, name: &str) -> Option<EntityKind> {
        let name = normalize(name);
        self.entity_kinds.contains(&name).then(|| EntityKind::new(name))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

// =============================================================================
// Conversion Table
// =============================================================================

/// A one-way `from -> to` map.
#[derive(Debug, Clone)]
pub struct ConversionTable<K, V> {
    map: HashMap<K, V>,
}

impl<K: Eq + Hash, V> ConversionTable<K, V> {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Adds or replaces a conversion.
    pub fn insert(&mut self, from: K, to: V) {
        self.map.insert(from, to);
    }

    /// Conversion target for `from`.
    #[must_use]
    pub fn get(&self, from: &K) -> Option<&V> {
        self.map.get(from)
    }

    /// Number of conversions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates every conversion.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }
}

impl<K: Eq + Hash, V> Default for ConversionTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses `"KEY:VALUE"` entries, skipping and logging the invalid ones.
fn parse_conversions<K, V>(
    list: &str,
    entries: &[String],
    key: impl Fn(&str) -> Option<K>,
    value: impl Fn(&str) -> Option<V>,
) -> ConversionTable<K, V>
where
    K: Eq + Hash,
{
    let mut table = ConversionTable::new();
    for entry in entries {
        let Some((raw_key, raw_value)) = entry.split_once(':') else {
            warn!(list, entry = entry.as_str(), "Malformed entry (expected KEY:VALUE); skipping");
            continue;
        };
        match (key(raw_key), value(raw_value)) {
            (Some(k), Some(v)) => table.insert(k, v),
            (None, None) => {
                warn!(list, entry = entry.as_str(), "Both key and value of the entry are invalid; skipping");
            }
            (None, Some(_)) => warn!(list, entry = entry.as_str(), "The key of the entry is invalid; skipping"),
            (Some(_), None) => warn!(list, entry = entry.as_str(), "The value of the entry is invalid; skipping"),
        }
    }
    table
}

// =============================================================================
// Equipment Tables
// =============================================================================

/// Materials belonging to each [`EquipmentCategory`].
#[derive(Debug, Clone, Default)]
pub struct EquipmentTables {
    by_category: BTreeMap<EquipmentCategory, BTreeSet<Material>>,
}

impl EquipmentTables {
    /// Empty tables: no material belongs to any category.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds materials to a category.
    pub fn insert(&mut self, category: EquipmentCategory, materials: impl IntoIterator<Item = Material>) {
        self.by_category.entry(category).or_default().extend(materials);
    }

    /// Materials in a category.
    pub fn materials(&self, category: EquipmentCategory) -> impl Iterator<Item = &Material> {
        self.by_category.get(&category).into_iter().flatten()
    }

    /// Every category a material belongs to.
    #[must_use]
    pub fn categories_of(&self, material: &Material) -> CategorySet {
        self.by_category
            .iter()
            .filter(|(_, materials)| materials.contains(material))
            .map(|(&category, _)| category)
            .collect()
    }
}

// =============================================================================
// Magic Tables
// =============================================================================

/// Named material sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaterialSet {
    /// Fully grown crops.
    GrownCrops,
    /// Melon and pumpkin blocks.
    MelonCrops,
    /// Air-like blocks.
    Airs,
    /// Ores.
    Ores,
    /// Blocks never broken by effects.
    Unbreakable,
    /// Blocks a laser must not cut.
    LaserDenylist,
    /// Blocks a terraformer may place.
    TerraformerAllowlist,
    /// Blocks shred may break with a pickaxe.
    ShredPickaxes,
    /// Blocks shred may break with a shovel.
    ShredShovels,
    /// Tree trunks.
    LumberTrunks,
    /// Blocks lumber may clear.
    LumberAllowlist,
}

impl MaterialSet {
    /// Every set.
    pub const ALL: [Self; 11] = [
        Self::GrownCrops,
        Self::MelonCrops,
        Self::Airs,
        Self::Ores,
        Self::Unbreakable,
        Self::LaserDenylist,
        Self::TerraformerAllowlist,
        Self::ShredPickaxes,
        Self::ShredShovels,
        Self::LumberTrunks,
        Self::LumberAllowlist,
    ];

    /// Configuration key of the set.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::GrownCrops => "grown_crops",
            Self::MelonCrops => "melon_crops",
            Self::Airs => "airs",
            Self::Ores => "ores",
            Self::Unbreakable => "unbreakable",
            Self::LaserDenylist => "laser_denylist",
            Self::TerraformerAllowlist => "terraformer_allowlist",
            Self::ShredPickaxes => "shred_allowlist_pickaxes",
            Self::ShredShovels => "shred_allowlist_shovels",
            Self::LumberTrunks => "lumber_trunks",
            Self::LumberAllowlist => "lumber_allowlist",
        }
    }

    fn entries(self, config: &TablesConfig) -> &[String] {
        match self {
            Self::GrownCrops => &config.grown_crops,
            Self::MelonCrops => &config.melon_crops,
            Self::Airs => &config.airs,
            Self::Ores => &config.ores,
            Self::Unbreakable => &config.unbreakable,
            Self::LaserDenylist => &config.laser_denylist,
            Self::TerraformerAllowlist => &config.terraformer_allowlist,
            Self::ShredPickaxes => &config.shred_allowlist_pickaxes,
            Self::ShredShovels => &config.shred_allowlist_shovels,
            Self::LumberTrunks => &config.lumber_trunks,
            Self::LumberAllowlist => &config.lumber_allowlist,
        }
    }
}

/// Every table the sample effects consult.
#[derive(Debug, Clone, Default)]
pub struct MagicTables {
    sets: BTreeMap<MaterialSet, BTreeSet<Material>>,
    dry_biomes: BTreeSet<Biome>,
    spectral: ConversionTable<Material, Material>,
    transformation: ConversionTable<EntityKind, EntityKind>,
    equipment: EquipmentTables,
}

impl MagicTables {
    /// Validates raw configuration against the host catalog.
    #[must_use]
    pub fn load(config: &TablesConfig, catalog: &Catalog) -> Self {
        let mut sets: BTreeMap<MaterialSet, BTreeSet<Material>> = MaterialSet::ALL
            .into_iter()
            .map(|set| (set, material_list(set.key(), set.entries(config), catalog)))
            .collect();

        let allowlist = sets.entry(MaterialSet::TerraformerAllowlist).or_default();
        for name in &config.terraformer_allowlist_tags {
            match catalog.tag(name) {
                Some(materials) => allowlist.extend(materials.cloned()),
                None => warn!(list = "terraformer_allowlist_tags", entry = name.as_str(), "Unknown tag; skipping"),
            }
        }

        let dry_biomes = config
            .dry_biomes
            .iter()
            .filter_map(|name| {
                let biome = catalog.biome(name);
                if biome.is_none() {
                    warn!(list = "dry_biomes", entry = name.as_str(), "Unknown biome; skipping");
                }
                biome
            })
            .collect();

        let spectral = parse_conversions(
            "spectral_conversions",
            &config.spectral_conversions,
            |k| catalog.material(k),
            |v| catalog.material(v),
        );
        let transformation = parse_conversions(
            "transformation",
            &config.transformation,
            |k| catalog.entity_kind(k),
            |v| catalog.entity_kind(v),
        );

        let mut equipment = EquipmentTables::new();
        for (key, names) in &config.tools {
            match EquipmentCategory::ALL.into_iter().find(|c| c.key() == key.as_str()) {
                Some(category) => {
                    let list = format!("tools.{key}");
                    equipment.insert(category, material_list(&list, names, catalog));
                }
                None => warn!(category = key.as_str(), "Unknown equipment category; skipping"),
            }
        }

        let tables = Self {
            sets,
            dry_biomes,
            spectral,
            transformation,
            equipment,
        };
        info!(
            spectral = tables.spectral.len(),
            transformation = tables.transformation.len(),
            "Loaded magic tables"
        );
        tables
    }

    /// Materials in a named set.
    pub fn materials(&self, set: MaterialSet) -> impl Iterator<Item = &Material> {
        self.sets.get(&set).into_iter().flatten()
    }

    /// Returns true if `material` is in the named set.
    #[must_use]
    pub fn contains(&self, set: MaterialSet, material: &Material) -> bool {
        self.sets.get(&set).is_some_and(|s| s.contains(material))
    }

    /// Returns true if the biome is dry.
    #[must_use]
    pub fn is_dry(&self, biome: &Biome) -> bool {
        self.dry_biomes.contains(biome)
    }

    /// Block conversions used by the spectral effect.
    #[must_use]
    pub fn spectral(&self) -> &ConversionTable<Material, Material> {
        &self.spectral
    }

    /// Entity-kind conversions used by the transformation effect.
    #[must_use]
    pub fn transformation(&self) -> &ConversionTable<EntityKind, EntityKind> {
        &self.transformation
    }

    /// Equipment category tables.
    #[must_use]
    pub fn equipment(&self) -> &EquipmentTables {
        &self.equipment
    }

    /// Mutable equipment tables, for hosts that register categories in code.
    pub fn equipment_mut(&mut self) -> &mut EquipmentTables {
        &mut self.equipment
    }
}

fn material_list(list: &str, names: &[String], catalog: &Catalog) -> BTreeSet<Material> {
    names
        .iter()
        .filter_map(|name| {
            let material = catalog.material(name);
            if material.is_none() {
                warn!(list, entry = name.as_str(), "Unknown material; skipping");
            }
            material
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
