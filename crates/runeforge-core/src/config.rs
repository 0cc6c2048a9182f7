//! Configuration for the Runeforge engine.
//!
//! Maps directly to `runeforge.toml`. Every section is optional; missing
//! sections and fields take their defaults.
//!
//! ```toml
//! [general]
//! seed = 42
//!
//! [tables]
//! spectral_conversions = ["DIRT:GRASS_BLOCK", "SAND:RED_SAND"]
//! transformation = ["PIG:ZOMBIFIED_PIGLIN"]
//!
//! [tables.tools]
//! bow = ["BOW", "CROSSBOW"]
//!
//! [effects.spread]
//! power = 0.5
//! cooldown_ms = 500
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuneforgeError};

/// Top-level Runeforge configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuneforgeConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Equipment, conversion and material tables.
    #[serde(default)]
    pub tables: TablesConfig,
    /// Per-effect overrides, keyed by effect name (case-insensitive).
    #[serde(default)]
    pub effects: EffectsConfig,
}

impl RuneforgeConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `RuneforgeError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| RuneforgeError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seed for the dispatch RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Suggested log level for the host's subscriber: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            log_level: default_log_level(),
        }
    }
}

/// Raw table entries, validated by [`MagicTables::load`](crate::tables::MagicTables::load).
///
/// Conversion entries use the `"KEY:VALUE"` form. Names are host names and
/// are checked against the host [`Catalog`](crate::tables::Catalog).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Crops that count as fully grown.
    pub grown_crops: Vec<String>,
    /// Melon and pumpkin blocks.
    pub melon_crops: Vec<String>,
    /// Air-like blocks.
    pub airs: Vec<String>,
    /// Ore blocks.
    pub ores: Vec<String>,
    /// Blocks that effects must never break.
    pub unbreakable: Vec<String>,
    /// Blocks a laser must not cut.
    pub laser_denylist: Vec<String>,
    /// Blocks a terraformer may place.
    pub terraformer_allowlist: Vec<String>,
    /// Host material tags whose members join the terraformer allowlist.
    pub terraformer_allowlist_tags: Vec<String>,
    /// Blocks shred may break with a pickaxe.
    pub shred_allowlist_pickaxes: Vec<String>,
    /// Blocks shred may break with a shovel.
    pub shred_allowlist_shovels: Vec<String>,
    /// Tree trunk blocks.
    pub lumber_trunks: Vec<String>,
    /// Blocks lumber may clear.
    pub lumber_allowlist: Vec<String>,
    /// Biomes considered dry.
    pub dry_biomes: Vec<String>,
    /// `"FROM:TO"` material conversions used by the spectral effect.
    pub spectral_conversions: Vec<String>,
    /// `"FROM:TO"` entity-kind conversions used by the transformation effect.
    pub transformation: Vec<String>,
    /// Materials per equipment category, keyed by category key (`bow`, `boots`, ...).
    pub tools: BTreeMap<String, Vec<String>>,
}

/// Per-effect overrides, keyed by effect name.
pub type EffectsConfig = BTreeMap<String, EffectOverride>;

/// Configured values replacing an effect's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectOverride {
    /// Set to false to keep the effect out of the registry entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Power coefficient.
    #[serde(default)]
    pub power: Option<f64>,
    /// Highest attachable level.
    #[serde(default)]
    pub max_level: Option<u8>,
    /// Default cooldown in milliseconds.
    #[serde(default)]
    pub cooldown_ms: Option<u32>,
}

impl Default for EffectOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            power: None,
            max_level: None,
            cooldown_ms: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_seed() -> u64 {
    0x5eed
}
fn default_log_level() -> String {
    "info".to_string()
}
