//! Runtime capability negotiation with the host.
//!
//! Hosts differ in which shoot-event constructor they expose and in which
//! optional permission providers (region/claim plugins) are installed. This
//! module resolves both once at start-up and freezes the answer in an
//! immutable [`Capabilities`] value. Call sites switch on the recorded
//! [`ShootEventShape`] instead of probing again.
//!
//! # Architecture
//!
//! ```text
//! HostProbe ──► probe_event_construction_shape ──┐
//!          └──► detect_optional_provider ────────┴──► Capabilities (Arc, read-only)
//!                                                       ├─ construct_shoot_event
//!                                                       └─ query_build_permission
//! ```
//!
//! Probe failures are never fatal: a missing or inaccessible modern
//! constructor downgrades to [`ShootEventShape::Legacy`] with a warning, and a
//! missing provider is simply left out.
//!
//! # Example
//!
//! ```
//! use runeforge_core::capability::{ApiVersion, Capabilities, ShootEventShape, StaticProbe};
//!
//! let old_host = StaticProbe::for_version(ApiVersion::new(1, 15, 2));
//! let caps = Capabilities::negotiate(&old_host, Vec::new());
//! assert_eq!(caps.shoot_shape(), ShootEventShape::Legacy);
//!
//! let new_host = StaticProbe::for_version(ApiVersion::new(1, 17, 1));
//! assert_eq!(Capabilities::negotiate(&new_host, Vec::new()).shoot_shape(), ShootEventShape::Modern);
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::host::{Cell, EntityId};
use crate::item::{Hand, ItemStack};

// =============================================================================
// Shapes and Probing
// =============================================================================

/// Which shoot-event constructor the host supports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShootEventShape {
    /// Full constructor: shooter, bow, consumable, projectile, hand, force,
    /// consume flag.
    Modern,
    /// Older constructor: shooter, bow, projectile, force.
    Legacy,
}

impl ShootEventShape {
    /// Constructor signature resolved through [`HostProbe::resolve`].
    #[must_use]
    pub const fn signature(self) -> &'static str {
        match self {
            Self::Modern => "ShootEvent(shooter, bow, consumable, projectile, hand, force, consume_item)",
            Self::Legacy => "ShootEvent(shooter, bow, projectile, force)",
        }
    }
}

impl fmt::Display for ShootEventShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modern => write!(f, "modern"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Why a signature could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The host does not have the symbol.
    #[error("symbol not found: {0}")]
    Missing(String),
    /// The symbol exists but may not be used.
    #[error("access denied to symbol: {0}")]
    AccessDenied(String),
}

/// Introspection surface of the host.
pub trait HostProbe {
    /// Tries to resolve a constructor or method signature.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] if the signature is absent or inaccessible.
    fn resolve(&self, signature: &str) -> Result<(), ProbeError>;

    /// Returns true if a named integration is loaded.
    fn has_symbol(&self, symbol: &str) -> bool;
}

/// Host API version.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Major.
    pub major: u16,
    /// Minor.
    pub minor: u16,
    /// Patch.
    pub patch: u16,
}

impl ApiVersion {
    /// First version with the modern shoot-event constructor.
    pub const MODERN_SHOOT_EVENT: Self = Self::new(1, 16, 2);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// [`HostProbe`] over a declared symbol set.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    symbols: BTreeSet<String>,
    denied: BTreeSet<String>,
}

impl StaticProbe {
    /// An empty probe: nothing resolves.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A probe exposing the constructors available in `version`.
    #[must_use]
    pub fn for_version(version: ApiVersion) -> Self {
        let probe = Self::new().with_symbol(ShootEventShape::Legacy.signature());
        if version >= ApiVersion::MODERN_SHOOT_EVENT {
            probe.with_symbol(ShootEventShape::Modern.signature())
        } else {
            probe
        }
    }

    /// Adds a resolvable symbol.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbols.insert(symbol.into());
        self
    }

    /// Marks a symbol as present but inaccessible.
    #[must_use]
    pub fn deny(mut self, symbol: impl Into<String>) -> Self {
        self.denied.insert(symbol.into());
        self
    }
}

impl HostProbe for StaticProbe {
    fn resolve(&self, signature: &str) -> Result<(), ProbeError> {
        if self.denied.contains(signature) {
            Err(ProbeError::AccessDenied(signature.to_string()))
        } else if self.symbols.contains(signature) {
            Ok(())
        } else {
            Err(ProbeError::Missing(signature.to_string()))
        }
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol) && !self.denied.contains(symbol)
    }
}

/// Resolves the shoot-event constructor, falling back to the legacy shape.
///
/// Never fails; a downgrade is logged as a warning.
pub fn probe_event_construction_shape(probe: &dyn HostProbe) -> ShootEventShape {
    match probe.resolve(ShootEventShape::Modern.signature()) {
        Ok(()) => ShootEventShape::Modern,
        Err(err) => {
            warn!(
                error = %err,
                "Enabling legacy mode for the shoot event; extra event fields will be dropped"
            );
            ShootEventShape::Legacy
        }
    }
}

/// Returns true if the named optional integration is present.
pub fn detect_optional_provider(probe: &dyn HostProbe, provider_id: &str) -> bool {
    let found = probe.has_symbol(provider_id);
    if found {
        info!(provider = provider_id, "Permission integration found");
    } else {
        info!(provider = provider_id, "Permission integration not found");
    }
    found
}

// =============================================================================
// Permission Providers
// =============================================================================

/// An optional companion that guards world modification.
pub trait PermissionProvider: Send + Sync {
    /// Symbol used to detect the provider.
    fn id(&self) -> &str;

    /// May the actor build at `cell`?
    fn allows_build(&self, actor: EntityId, cell: Cell) -> bool;

    /// May the actor destroy at `cell`?
    fn allows_destroy(&self, actor: EntityId, cell: Cell) -> bool;
}

// =============================================================================
// Shoot Event
// =============================================================================

/// Everything a caller knows about a shot.
#[derive(Debug, Clone)]
pub struct ShootEventArgs {
    /// Who fired.
    pub shooter: EntityId,
    /// Launcher item.
    pub bow: Option<ItemStack>,
    /// Ammunition consumed.
    pub consumable: Option<ItemStack>,
    /// Spawned projectile.
    pub projectile: EntityId,
    /// Hand holding the launcher.
    pub hand: Hand,
    /// Draw force in `0.0..=1.0`.
    pub force: f32,
    /// Whether ammunition is consumed.
    pub consume_item: bool,
}

/// Shoot event published on the host bus.
///
/// Fields the legacy constructor cannot carry are `None`.
#[derive(Debug, Clone)]
pub struct ShootEvent {
    /// Constructor used.
    pub shape: ShootEventShape,
    /// Who fired.
    pub shooter: EntityId,
    /// Launcher item.
    pub bow: Option<ItemStack>,
    /// Ammunition consumed (modern only).
    pub consumable: Option<ItemStack>,
    /// Spawned projectile.
    pub projectile: EntityId,
    /// Hand holding the launcher (modern only).
    pub hand: Option<Hand>,
    /// Draw force.
    pub force: f32,
    /// Whether ammunition is consumed (modern only).
    pub consume_item: Option<bool>,
    cancelled: bool,
}

impl ShootEvent {
    /// Marks the event cancelled. There is no way back.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns true if a listener cancelled the event.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Negotiated host capabilities. Immutable once built.
#[derive(Clone)]
pub struct Capabilities {
    shoot_shape: ShootEventShape,
    providers: Vec<Arc<dyn PermissionProvider>>,
}

impl Capabilities {
    /// Builds capabilities from already-known facts.
    #[must_use]
    pub fn new(shoot_shape: ShootEventShape, providers: Vec<Arc<dyn PermissionProvider>>) -> Self {
        Self {
            shoot_shape,
            providers,
        }
    }

    /// Probes the host once and keeps the providers it reports as present.
    #[must_use]
    pub fn negotiate(probe: &dyn HostProbe, candidates: Vec<Arc<dyn PermissionProvider>>) -> Self {
        let shoot_shape = probe_event_construction_shape(probe);
        let providers = candidates
            .into_iter()
            .filter(|p| detect_optional_provider(probe, p.id()))
            .collect();
        let caps = Self::new(shoot_shape, providers);
        info!(capabilities = %caps.summary(), "Host capabilities negotiated");
        caps
    }

    /// The live shoot-event shape.
    #[must_use]
    pub fn shoot_shape(&self) -> ShootEventShape {
        self.shoot_shape
    }

    /// Ids of active permission providers.
    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.id())
    }

    /// One-line description for start-up logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let ids: Vec<&str> = self.provider_ids().collect();
        if ids.is_empty() {
            format!("shoot_event={}, providers=none", self.shoot_shape)
        } else {
            format!("shoot_event={}, providers={}", self.shoot_shape, ids.join(","))
        }
    }

    /// Builds a shoot event for the live shape. In legacy shape the
    /// consumable, hand and consume flag are dropped.
    #[must_use]
    pub fn construct_shoot_event(&self, args: ShootEventArgs) -> ShootEvent {
        let legacy = self.shoot_shape == ShootEventShape::Legacy;
        ShootEvent {
            shape: self.shoot_shape,
            shooter: args.shooter,
            bow: args.bow,
            consumable: if legacy { None } else { args.consumable },
            projectile: args.projectile,
            hand: (!legacy).then_some(args.hand),
            force: args.force,
            consume_item: (!legacy).then_some(args.consume_item),
            cancelled: false,
        }
    }

    /// Returns true if every active provider allows the actor to both build
    /// and destroy at `cell`. With no providers, everything is allowed.
    #[must_use]
    pub fn query_build_permission(&self, actor: EntityId, cell: Cell) -> bool {
        self.providers
            .iter()
            .all(|p| p.allows_build(actor, cell) && p.allows_destroy(actor, cell))
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new(ShootEventShape::Modern, Vec::new())
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("shoot_shape", &self.shoot_shape)
            .field("providers", &self.provider_ids().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
