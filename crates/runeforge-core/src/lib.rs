//! # Runeforge Core
//!
//! Leveled item effects for a host-driven world simulation.
//!
//! Items carry effects at levels. When the host reports a world event, the
//! dispatch engine finds the actors and equipment the event implicates,
//! filters each attached effect against its descriptor and the actor's
//! cooldown state, and calls the matching hook.
//!
//! ## Architecture
//!
//! - **Capabilities** ([`capability`]): one-time negotiation of host API
//!   shape and optional permission providers
//! - **Registry** ([`effect`]): sealed, read-only table of effect
//!   descriptors and their hooks
//! - **Cooldowns** ([`cooldown`]): per-actor, per-effect readiness kept in a
//!   host-provided store
//! - **Dispatch** ([`dispatch`]): the per-event decision procedure
//! - **Tables** ([`tables`]): material sets and conversion maps loaded from
//!   configuration
//!
//! The host side of the boundary is a set of traits in [`host`]: the world,
//! the per-actor store, the clock and the scheduler.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runeforge_core::{effects, RuneforgeConfig};
//! use runeforge_core::capability::Capabilities;
//! use runeforge_core::dispatch::DispatchEngine;
//! use runeforge_core::effect::RegistryBuilder;
//! use runeforge_core::tables::{Catalog, MagicTables};
//!
//! let config = RuneforgeConfig::from_file("runeforge.toml".as_ref())?;
//! let mut builder = RegistryBuilder::with_overrides(config.effects.clone());
//! builder.register_all(effects::builtin());
//!
//! let engine = DispatchEngine::new(
//!     Arc::new(builder.seal()),
//!     Arc::new(Capabilities::negotiate(&probe, providers)),
//!     Arc::new(MagicTables::load(&config.tables, &catalog)),
//!     config.general.seed,
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod capability;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod effect;
pub mod effects;
pub mod error;
pub mod host;
pub mod item;
pub mod tables;

pub use config::RuneforgeConfig;
pub use error::{HookError, Result, RuneforgeError, StoreError};

#[cfg(test)]
mod tests;
