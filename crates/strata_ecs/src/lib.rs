//! # STRATA ECS
//!
//! Data-oriented Entity Component System storage and query engine:
//! - Component kinds, tags, signatures and systems fixed at compile time
//! - One contiguous column per component kind
//! - In-place compaction that never moves component payloads
//! - Generation-checked handles that survive compaction
//!
//! ## Architecture Rules
//!
//! 1. **Kinds are closed** - Using an undeclared kind does not compile
//! 2. **Growth is the only allocation** - Geometric, reported as an error on failure
//! 3. **Iteration is a plain loop** - Signature test, then direct column access
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_ecs::{schema, Manager, Row, System};
//!
//! schema! {
//!     pub struct Game {
//!         components { position: Position, velocity: Velocity }
//!         tags { Frozen }
//!         signatures { Moving = [Position, Velocity] + []; }
//!         systems { mover: Mover }
//!     }
//! }
//!
//! let mut manager = Manager::<Game>::new()?;
//! let handle = manager.create_handle()?;
//! manager.add_component(handle, Velocity([1.0, 0.0, 0.0]))?;
//! manager.add_component(handle, Position::default())?;
//!
//! manager.refresh();
//! manager.update_system::<Mover>(&mut 0.016);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod sync;

pub use config::{GrowthOptions, ManagerConfig};
pub use ecs::{
    reserve_column, signature_mask, tag_bit, words_for, Bits, Bitset, Component, ComponentInfo,
    ComponentOf, ComponentSet, EntityKey, EntityMut, EntityRecord, EntityStore, Handle,
    HandleRecord, HandleTable, Manager, ManagerId, Row, RowRef, Schema, SchemaInfo, SignatureOf,
    System, SystemOf, TagOf, TagSet,
};
pub use error::{EcsError, EcsResult};
pub use sync::SharedManager;
