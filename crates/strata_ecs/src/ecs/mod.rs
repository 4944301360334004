//! # Entity Component System
//!
//! Column storage and signature-matched iteration over a schema resolved at
//! compile time.
//!
//! ## Design
//!
//! - Kinds (components, tags, signatures, systems) are fixed by `schema!`
//! - One `Vec` column per component kind, indexed by data index
//! - Entity records are compacted in place; payloads never move
//! - Handles are generation-checked and follow their entity
//! - No dynamic dispatch in hot paths

mod bitset;
mod entity;
mod fetch;
mod handle;
mod macros;
mod manager;
mod schema;
mod system;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bitset::{words_for, Bits, Bitset};
pub use entity::{EntityRecord, EntityStore};
pub use fetch::{ComponentSet, Row, RowRef, TagSet};
pub use handle::{EntityKey, EntityMut, Handle, HandleRecord, HandleTable, ManagerId};
pub use manager::Manager;
pub use schema::{
    reserve_column, signature_mask, tag_bit, Component, ComponentInfo, ComponentOf, Schema,
    SchemaInfo, SignatureOf, SystemOf, TagOf,
};
pub use system::System;
