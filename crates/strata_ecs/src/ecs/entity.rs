//! # Entity Records
//!
//! Entities are slots in a struct-of-arrays store. Each slot carries:
//! - An alive flag
//! - A data index into the component columns
//! - A handle slot into the handle table
//! - A signature of attached components and tags
//!
//! Compaction swaps whole records between slots. The data index travels with
//! the record, so component payloads never move.

use std::collections::TryReserveError;

use super::bitset::Bits;

/// Snapshot of one entity slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRecord<B> {
    /// Whether the slot holds a live entity.
    pub alive: bool,
    /// Row of the entity's payloads in every component column.
    pub data_index: usize,
    /// Handle record that tracks this entity.
    pub handle_slot: usize,
    /// Attached components and tags.
    pub signature: B,
}

impl<B: Bits> EntityRecord<B> {
    /// A dead record pointing at row and handle record `slot`.
    #[inline]
    #[must_use]
    pub fn dead(slot: usize) -> Self {
        Self {
            alive: false,
            data_index: slot,
            handle_slot: slot,
            signature: B::default(),
        }
    }
}

/// Per-slot entity records, stored column-wise.
#[derive(Clone, Debug, Default)]
pub struct EntityStore<B> {
    alive: Vec<bool>,
    data: Vec<usize>,
    handle: Vec<usize>,
    signature: Vec<B>,
}

impl<B: Bits> EntityStore<B> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alive: Vec::new(),
            data: Vec::new(),
            handle: Vec::new(),
            signature: Vec::new(),
        }
    }

    /// Number of slots (the manager's capacity).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Returns `true` if no slot has been allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Alive flags by slot.
    #[must_use]
    pub fn alive_flags(&self) -> &[bool] {
        &self.alive
    }

    /// Data indices by slot.
    #[must_use]
    pub fn data_indices(&self) -> &[usize] {
        &self.data
    }

    /// Handle record indices by slot.
    #[must_use]
    pub fn handle_slots(&self) -> &[usize] {
        &self.handle
    }

    /// Signatures by slot.
    #[must_use]
    pub fn signatures(&self) -> &[B] {
        &self.signature
    }

    /// Record at `slot`, if allocated.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<EntityRecord<B>> {
        Some(EntityRecord {
            alive: *self.alive.get(slot)?,
            data_index: self.data[slot],
            handle_slot: self.handle[slot],
            signature: self.signature[slot],
        })
    }

    #[inline]
    pub(crate) fn is_alive(&self, slot: usize) -> bool {
        self.alive.get(slot).copied().unwrap_or(false)
    }

    #[inline]
    pub(crate) fn data_index(&self, slot: usize) -> usize {
        self.data[slot]
    }

    #[inline]
    pub(crate) fn handle_slot(&self, slot: usize) -> usize {
        self.handle[slot]
    }

    #[inline]
    pub(crate) fn signature(&self, slot: usize) -> &B {
        &self.signature[slot]
    }

    #[inline]
    pub(crate) fn signature_mut(&mut self, slot: usize) -> &mut B {
        &mut self.signature[slot]
    }

    #[inline]
    pub(crate) fn set_alive(&mut self, slot: usize, alive: bool) {
        self.alive[slot] = alive;
    }

    /// Marks `slot` alive with an empty signature.
    #[inline]
    pub(crate) fn revive(&mut self, slot: usize) {
        self.alive[slot] = true;
        self.signature[slot].reset();
    }

    /// Swaps the full records of two slots.
    #[inline]
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.alive.swap(a, b);
        self.data.swap(a, b);
        self.handle.swap(a, b);
        self.signature.swap(a, b);
    }

    pub(crate) fn reserve(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        let additional = capacity.saturating_sub(self.len());
        self.alive.try_reserve_exact(additional)?;
        self.data.try_reserve_exact(additional)?;
        self.handle.try_reserve_exact(additional)?;
        self.signature.try_reserve_exact(additional)
    }

    /// Appends dead identity records up to `capacity` slots.
    pub(crate) fn extend_to(&mut self, capacity: usize) {
        for slot in self.len()..capacity {
            let record = EntityRecord::<B>::dead(slot);
            self.alive.push(record.alive);
            self.data.push(record.data_index);
            self.handle.push(record.handle_slot);
            self.signature.push(record.signature);
        }
    }

    /// Resets every slot to a dead identity record.
    pub(crate) fn reset(&mut self) {
        for slot in 0..self.len() {
            let record = EntityRecord::<B>::dead(slot);
            self.alive[slot] = record.alive;
            self.data[slot] = record.data_index;
            self.handle[slot] = record.handle_slot;
            self.signature[slot] = record.signature;
        }
    }
}
