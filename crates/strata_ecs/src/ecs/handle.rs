//! # Generation-Checked Handles
//!
//! Raw slots are only meaningful until the next `refresh`, which may move
//! any alive entity. Handles survive compaction:
//!
//! ```text
//! Handle { manager, record, generation }
//!                     |
//!                     v
//! HandleTable[record] = { entity: slot, generation }
//!                                 |
//!                                 v
//!                 EntityStore[slot] (handle_slot == record)
//! ```
//!
//! The record index travels with the entity through compaction and the
//! record follows it. A record's generation is bumped exactly when its
//! entity is reclaimed by `refresh` or the manager is cleared; every handle
//! still holding the old generation is then stale.

use std::collections::TryReserveError;
use std::sync::atomic::{AtomicU64, Ordering};

use super::manager::Manager;
use super::schema::{ComponentOf, Schema, SignatureOf, SystemOf, TagOf};
use crate::error::{EcsError, EcsResult};

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ManagerId(u64);

impl ManagerId {
    /// Allocates a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// External reference to a logical entity.
///
/// Valid while its generation equals the generation of its handle record.
/// Copying a handle is free; validity is checked on every use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    manager: ManagerId,
    entity: usize,
    record: usize,
    generation: u64,
}

impl Handle {
    /// Manager that issued the handle.
    #[inline]
    #[must_use]
    pub const fn manager(&self) -> ManagerId {
        self.manager
    }

    /// Slot the entity occupied when the handle was issued.
    ///
    /// Compaction may have moved the entity since; the manager resolves the
    /// current slot through the handle record.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> usize {
        self.entity
    }

    /// Handle record the handle points at.
    #[inline]
    #[must_use]
    pub const fn record(&self) -> usize {
        self.record
    }

    /// Generation captured when the handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// One entry of the handle table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandleRecord {
    entity: usize,
    generation: u64,
}

impl HandleRecord {
    /// Slot of the tracked entity.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> usize {
        self.entity
    }

    /// Current generation.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle records, one per slot of capacity.
#[derive(Clone, Debug, Default)]
pub struct HandleTable {
    records: Vec<HandleRecord>,
}

impl HandleTable {
    /// Number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records.
    #[must_use]
    pub fn records(&self) -> &[HandleRecord] {
        &self.records
    }

    /// Record at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HandleRecord> {
        self.records.get(index)
    }

    /// Issues a handle for the entity tracked by `record`.
    pub(crate) fn issue(&self, manager: ManagerId, record: usize) -> Handle {
        let entry = self.records[record];
        Handle {
            manager,
            entity: entry.entity,
            record,
            generation: entry.generation,
        }
    }

    /// Points `record` at the entity's new slot.
    #[inline]
    pub(crate) fn repoint(&mut self, record: usize, slot: usize) {
        self.records[record].entity = slot;
    }

    /// Invalidates every handle issued from `record`.
    #[inline]
    pub(crate) fn invalidate(&mut self, record: usize, slot: usize) {
        let entry = &mut self.records[record];
        entry.generation = entry.generation.wrapping_add(1);
        entry.entity = slot;
    }

    /// Invalidates every record and resets it to the identity.
    pub(crate) fn reset_all(&mut self) {
        for (slot, entry) in self.records.iter_mut().enumerate() {
            entry.generation = entry.generation.wrapping_add(1);
            entry.entity = slot;
        }
    }

    pub(crate) fn reserve(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        self.records
            .try_reserve_exact(capacity.saturating_sub(self.records.len()))
    }

    /// Appends identity records up to `capacity`.
    pub(crate) fn extend_to(&mut self, capacity: usize) {
        let start = self.records.len();
        self.records.extend((start..capacity).map(|entity| HandleRecord {
            entity,
            generation: 0,
        }));
    }
}

/// Anything that identifies an entity of a manager: a raw slot or a handle.
pub trait EntityKey: Copy {
    /// Resolves the key to a slot in `[0, size_next)`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::SlotOutOfRange`] for a raw slot that is not allocated
    /// - [`EcsError::ForeignHandle`] for a handle of another manager
    /// - [`EcsError::StaleHandle`] for a handle whose entity was reclaimed
    fn resolve<S: Schema>(self, manager: &Manager<S>) -> EcsResult<usize>;
}

impl EntityKey for usize {
    #[inline]
    fn resolve<S: Schema>(self, manager: &Manager<S>) -> EcsResult<usize> {
        if self < manager.size_next() {
            Ok(self)
        } else {
            Err(EcsError::SlotOutOfRange {
                slot: self,
                size_next: manager.size_next(),
            })
        }
    }
}

impl EntityKey for Handle {
    #[inline]
    fn resolve<S: Schema>(self, manager: &Manager<S>) -> EcsResult<usize> {
        if self.manager != manager.id() {
            return Err(EcsError::ForeignHandle {
                expected: manager.id().get(),
                found: self.manager.get(),
            });
        }
        let record = manager
            .handles()
            .get(self.record)
            .ok_or(EcsError::SlotOutOfRange {
                slot: self.record,
                size_next: manager.handles().len(),
            })?;
        if record.generation != self.generation {
            return Err(EcsError::StaleHandle {
                record: self.record,
                held: self.generation,
                current: record.generation,
            });
        }
        Ok(record.entity)
    }
}

impl EntityKey for &Handle {
    #[inline]
    fn resolve<S: Schema>(self, manager: &Manager<S>) -> EcsResult<usize> {
        (*self).resolve(manager)
    }
}

/// A handle bound to its manager, for chained calls.
///
/// ```rust,ignore
/// manager
///     .entity(handle)?
///     .add_component(Position::default())?
///     .add_tag::<Frozen>()?;
/// ```
///
/// Every method re-checks the handle, so a chain that kills the entity
/// keeps working until the next `refresh`.
pub struct EntityMut<'m, S: Schema> {
    manager: &'m mut Manager<S>,
    handle: Handle,
}

impl<'m, S: Schema> EntityMut<'m, S> {
    pub(crate) fn new(manager: &'m mut Manager<S>, handle: Handle) -> Self {
        Self { manager, handle }
    }

    /// The bound handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Returns `true` if the handle still refers to its entity.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.manager.is_valid_handle(&self.handle)
    }

    /// Returns `true` if the handle is valid and its entity alive.
    #[must_use]
    pub fn alive(&self) -> bool {
        self.manager.is_alive(self.handle)
    }

    /// Kills the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn kill(&mut self) -> EcsResult<&mut Self> {
        self.manager.kill(self.handle)?;
        Ok(self)
    }

    /// Adds tag `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn add_tag<T: TagOf<S>>(&mut self) -> EcsResult<&mut Self> {
        self.manager.add_tag::<T>(self.handle)?;
        Ok(self)
    }

    /// Removes tag `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn del_tag<T: TagOf<S>>(&mut self) -> EcsResult<&mut Self> {
        self.manager.del_tag::<T>(self.handle)?;
        Ok(self)
    }

    /// Returns `true` if the entity carries tag `T`.
    #[must_use]
    pub fn has_tag<T: TagOf<S>>(&self) -> bool {
        self.manager.has_tag::<T>(self.handle)
    }

    /// Attaches `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn add_component<C: ComponentOf<S>>(&mut self, value: C) -> EcsResult<&mut Self> {
        self.manager.add_component(self.handle, value)?;
        Ok(self)
    }

    /// Detaches component `C`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn del_component<C: ComponentOf<S>>(&mut self) -> EcsResult<&mut Self> {
        self.manager.del_component::<C>(self.handle)?;
        Ok(self)
    }

    /// Payload of component `C`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn get_component<C: ComponentOf<S>>(&self) -> EcsResult<&C> {
        self.manager.get_component::<C>(self.handle)
    }

    /// Payload of component `C`, mutably.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn get_component_mut<C: ComponentOf<S>>(&mut self) -> EcsResult<&mut C> {
        self.manager.get_component_mut::<C>(self.handle)
    }

    /// Returns `true` if component `C` is attached.
    #[must_use]
    pub fn has_component<C: ComponentOf<S>>(&self) -> bool {
        self.manager.has_component::<C>(self.handle)
    }

    /// Returns `true` if the entity matches signature `Sig`.
    #[must_use]
    pub fn matches_signature<Sig: SignatureOf<S>>(&self) -> bool {
        self.manager.matches_signature::<Sig>(self.handle)
    }

    /// Returns `true` if the entity matches the signature of system `X`.
    #[must_use]
    pub fn matches_system<X: SystemOf<S>>(&self) -> bool {
        self.manager.matches_system::<X>(self.handle)
    }

    /// Attached components and tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn signature(&self) -> EcsResult<S::Bits> {
        self.manager.signature(self.handle)
    }
}

impl<S: Schema> std::fmt::Debug for EntityMut<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMut")
            .field("handle", &self.handle)
            .field("valid", &self.valid())
            .finish()
    }
}
