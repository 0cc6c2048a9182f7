//! Hook dispatch: world events in, effect hooks out.
//!
//! # Architecture
//!
//! ```text
//! WorldEvent ──subjects()──► (actor, hook, slot scope)
//!                                │
//!                     for each slot, for each attached effect
//!                                │
//!           ┌── unknown id / level 0 / wrong equipment / wrong hand ──► rejected
//!           ├── disabled / cooling down (CooldownStore) ──────────────► rejected
//!           └── Effect hook(HookContext, payload) ──► Applied | Skipped | Cancel
//! ```
//!
//! Hooks own their side effects. The engine only records outcomes, sets the
//! event's cancellation flag on `Cancel`, and contains hook failures: an
//! `Err` or a panic is logged and the next candidate runs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use runeforge_core::capability::Capabilities;
//! use runeforge_core::dispatch::{DispatchEngine, HostServices, Scan, WorldEvent};
//! use runeforge_core::effect::RegistryBuilder;
//! use runeforge_core::host::{EntityId, ManualClock, MemoryStore, TaskQueue, World};
//! use runeforge_core::tables::MagicTables;
//!
//! fn scan(world: &mut dyn World, engine: &mut DispatchEngine) -> bool {
//!     let mut store = MemoryStore::new();
//!     let mut scheduler = TaskQueue::new();
//!     let clock = ManualClock::new(0);
//!     let mut host = HostServices::new(world, &mut store, &mut scheduler, &clock);
//!
//!     let mut event = WorldEvent::from(Scan::new(EntityId::new(1)));
//!     let report = engine.dispatch(&mut event, &mut host);
//!     report.is_empty()
//! }
//! # let _ = scan;
//! ```

mod context;
mod engine;
mod event;

pub use context::{HookContext, HostServices};
pub use engine::{DispatchEngine, DispatchRecord, DispatchReport, Disposition, Rejection};
pub use event::{
    BlockBreak, BlockGrow, BlockInteract, BlockPlace, EntityCombust, EntityDamage, EntityShear,
    EventKind, HookKind, InteractAction, ProjectileLaunch, Scan, SlotScope, Subject, WorldEvent,
};
