//! Error types for the Runeforge core library.

use thiserror::Error;

use crate::effect::EffectId;

/// Top-level error type for registry, configuration and persistence operations.
#[derive(Error, Debug)]
pub enum RuneforgeError {
    /// A descriptor failed validation in [`EffectBuilder::build`](crate::effect::EffectBuilder::build).
    #[error("Invalid descriptor for effect {id}: {reason}")]
    InvalidDescriptor {
        /// Id of the rejected descriptor.
        id: EffectId,
        /// Which invariant was violated.
        reason: String,
    },

    /// An effect with the same id is already registered.
    #[error("Duplicate effect id: {0}")]
    DuplicateId(EffectId),

    /// An effect with the same name is already registered.
    #[error("Duplicate effect name: {0}")]
    DuplicateName(String),

    /// The process-wide registry slot has already been filled.
    #[error("Effect registry is already sealed")]
    RegistrySealed,

    /// Attaching an effect would combine two mutually exclusive effects.
    #[error("Effect {effect} conflicts with effect {existing} already on the item")]
    Conflict {
        /// Effect being attached.
        effect: EffectId,
        /// Effect already present on the item.
        existing: EffectId,
    },

    /// Attached level outside `1..=max_level`.
    #[error("Level {level} is out of range for effect {effect} (max {max})")]
    LevelOutOfRange {
        /// Effect being attached.
        effect: EffectId,
        /// Requested level.
        level: u8,
        /// Descriptor maximum.
        max: u8,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Per-actor store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reported by an [`ActorDataStore`](crate::host::ActorDataStore) write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The actor has no backing record (e.g. went offline mid-tick).
    #[error("No data record for actor {0}")]
    UnknownActor(crate::host::EntityId),

    /// The backend refused the write.
    #[error("Store write rejected: {0}")]
    Rejected(String),
}

/// Unexpected failure inside an effect hook.
///
/// Contained at the dispatch boundary: the failing candidate is treated as
/// having had no effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// An entity the hook relies on no longer exists.
    #[error("Entity {0} is missing")]
    MissingEntity(crate::host::EntityId),

    /// The event payload did not have the shape the hook expected.
    #[error("Unexpected event payload: {0}")]
    UnexpectedPayload(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RuneforgeError>;
