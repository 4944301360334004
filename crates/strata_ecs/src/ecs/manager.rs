//! # Entity Manager
//!
//! Owns and coordinates all storage of one schema:
//! - Entity records (struct of arrays)
//! - Handle table
//! - One component column per component kind
//! - One instance per system kind
//!
//! ## Slot Ranges
//!
//! ```text
//! 0            size        size_next            capacity
//! |  iterated   |  created   |     allocated      |
//! |  (compact)  |  since the |     not in use     |
//! |             |  last      |                    |
//! |             |  refresh   |                    |
//! ```
//!
//! Iteration visits `[0, size)`. New entities are appended at `size_next`
//! and become visible to iteration after the next [`Manager::refresh`].
//! Killed entities stay in place until that refresh reclaims them.

use std::any::Any;
use std::fmt;

use tracing::{debug, trace};

use super::bitset::Bits;
use super::entity::EntityStore;
use super::fetch::{ColumnPass, ComponentSet, Row, RowRef};
use super::handle::{EntityKey, EntityMut, Handle, HandleTable, ManagerId};
use super::schema::{tag_bit, ComponentInfo, ComponentOf, Schema, SignatureOf, SystemOf, TagOf};
use crate::config::ManagerConfig;
use crate::error::{EcsError, EcsResult};

/// Entity manager over schema `S`.
///
/// # Example
///
/// ```rust,ignore
/// let mut manager = Manager::<Game>::new()?;
///
/// let player = manager.create_handle()?;
/// manager.add_component(player, Position::default())?;
/// manager.add_component(player, Velocity([1.0, 0.0, 0.0]))?;
///
/// manager.refresh();
/// manager.update_system::<Mover>(&mut frame_time);
/// ```
pub struct Manager<S: Schema> {
    pub(crate) id: ManagerId,
    pub(crate) config: ManagerConfig,
    pub(crate) capacity: usize,
    pub(crate) size: usize,
    pub(crate) size_next: usize,
    pub(crate) entities: EntityStore<S::Bits>,
    pub(crate) handles: HandleTable,
    pub(crate) storage: S,
}

impl<S: Schema> Manager<S> {
    /// Creates a manager with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Allocation`] if the start capacity cannot be
    /// allocated.
    pub fn new() -> EcsResult<Self> {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates a manager with `config.start_capacity` slots pre-allocated.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidConfig`] if the growth policy is invalid
    /// - [`EcsError::Allocation`] if the start capacity cannot be allocated
    pub fn with_config(config: ManagerConfig) -> EcsResult<Self> {
        config.validate()?;
        let mut manager = Self {
            id: ManagerId::next(),
            config,
            capacity: 0,
            size: 0,
            size_next: 0,
            entities: EntityStore::new(),
            handles: HandleTable::default(),
            storage: S::new_storage(),
        };
        manager.grow_to(config.start_capacity)?;
        Ok(manager)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Identity of this manager.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    /// Configuration the manager was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Allocated slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots visited by iteration.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots in use, including entities created since the last refresh.
    #[inline]
    #[must_use]
    pub fn size_next(&self) -> usize {
        self.size_next
    }

    /// Entity records.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &EntityStore<S::Bits> {
        &self.entities
    }

    /// Handle table.
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Column and system storage.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Column of component `C`, indexed by data index.
    #[inline]
    #[must_use]
    pub fn column<C: ComponentOf<S>>(&self) -> &[C] {
        C::column(&self.storage)
    }

    /// Column of a plain-old-data component as raw bytes.
    #[must_use]
    pub fn column_bytes<C: ComponentOf<S> + bytemuck::Pod>(&self) -> &[u8] {
        bytemuck::cast_slice(C::column(&self.storage))
    }

    /// Instance of system `X`.
    #[inline]
    #[must_use]
    pub fn system<X: SystemOf<S>>(&self) -> &X {
        X::instance(&self.storage)
    }

    /// Instance of system `X`, mutably.
    #[inline]
    #[must_use]
    pub fn system_mut<X: SystemOf<S>>(&mut self) -> &mut X {
        X::instance_mut(&mut self.storage)
    }

    // =========================================================================
    // Storage lifecycle
    // =========================================================================

    /// Grows every store to `capacity` slots. No-op if not larger.
    ///
    /// New slots are dead, with identity data indices and handle records.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Allocation`] if the allocator refuses; the
    /// manager's slots are left as they were.
    pub fn grow_to(&mut self, capacity: usize) -> EcsResult<()> {
        if capacity <= self.capacity {
            return Ok(());
        }

        let refused = move |_| EcsError::Allocation {
            requested: capacity,
        };
        self.entities.reserve(capacity).map_err(refused)?;
        self.handles.reserve(capacity).map_err(refused)?;
        self.storage.reserve_columns(capacity).map_err(refused)?;

        self.entities.extend_to(capacity);
        self.handles.extend_to(capacity);
        self.storage.resize_columns(capacity);

        debug!(from = self.capacity, to = capacity, "grew entity storage");
        self.capacity = capacity;
        Ok(())
    }

    /// Kills every entity and invalidates every handle.
    ///
    /// Capacity is kept; data indices and handle records return to the
    /// identity layout.
    pub fn clear(&mut self) {
        let cleared = self.size_next;
        self.entities.reset();
        self.handles.reset_all();
        self.size = 0;
        self.size_next = 0;
        debug!(cleared, capacity = self.capacity, "cleared entity storage");
    }

    /// Reclaims killed entities.
    ///
    /// Afterwards the alive entities occupy `[0, size)` and
    /// `size == size_next`. Handles to reclaimed entities become stale;
    /// handles to survivors follow them to their new slots. Component
    /// payloads are not moved.
    pub fn refresh(&mut self) {
        let used = self.size_next;
        let mut left = 0;
        let mut right = used;
        let mut swaps = 0usize;

        loop {
            while left < right && self.entities.is_alive(left) {
                left += 1;
            }
            while left < right && !self.entities.is_alive(right - 1) {
                right -= 1;
            }
            if left >= right {
                break;
            }
            self.swap_slots(left, right - 1);
            swaps += 1;
            left += 1;
            right -= 1;
        }

        let alive = left;
        for slot in alive..used {
            self.handles
                .invalidate(self.entities.handle_slot(slot), slot);
        }

        self.size = alive;
        self.size_next = alive;
        trace!(alive, reclaimed = used - alive, swaps, "refreshed entities");
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.entities.swap(a, b);
        self.handles.repoint(self.entities.handle_slot(a), a);
        self.handles.repoint(self.entities.handle_slot(b), b);
    }

    // =========================================================================
    // Entities and handles
    // =========================================================================

    /// Creates an alive entity with an empty signature.
    ///
    /// # Returns
    ///
    /// The new entity's slot. It is visited by iteration after the next
    /// [`Manager::refresh`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityOverflow`] or [`EcsError::Allocation`] if
    /// the store is full and cannot grow.
    pub fn create_entity(&mut self) -> EcsResult<usize> {
        if self.size_next == self.capacity {
            let next = self
                .config
                .growth
                .next_capacity(self.capacity)
                .ok_or(EcsError::CapacityOverflow {
                    capacity: self.capacity,
                })?;
            self.grow_to(next)?;
        }

        let slot = self.size_next;
        self.entities.revive(slot);
        self.size_next += 1;
        Ok(slot)
    }

    /// Creates an entity and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Same as [`Manager::create_entity`].
    pub fn create_handle(&mut self) -> EcsResult<Handle> {
        let slot = self.create_entity()?;
        Ok(self.issue(slot))
    }

    /// Returns a handle to the entity at `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SlotOutOfRange`] if `slot` is not allocated.
    pub fn handle(&self, slot: usize) -> EcsResult<Handle> {
        let slot = slot.resolve(self)?;
        Ok(self.issue(slot))
    }

    fn issue(&self, slot: usize) -> Handle {
        self.handles.issue(self.id, self.entities.handle_slot(slot))
    }

    /// Binds `key` to this manager for chained calls.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn entity(&mut self, key: impl EntityKey) -> EcsResult<EntityMut<'_, S>> {
        let slot = key.resolve(self)?;
        let handle = self.issue(slot);
        Ok(EntityMut::new(self, handle))
    }

    /// Kills an entity. Idempotent; the slot is reclaimed on the next
    /// [`Manager::refresh`].
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn kill(&mut self, key: impl EntityKey) -> EcsResult<()> {
        let slot = key.resolve(self)?;
        self.entities.set_alive(slot, false);
        Ok(())
    }

    /// Returns `true` if `key` resolves to an alive entity.
    #[must_use]
    pub fn is_alive(&self, key: impl EntityKey) -> bool {
        key.resolve(self)
            .is_ok_and(|slot| self.entities.is_alive(slot))
    }

    /// Returns `true` if `handle` was issued by this manager and its entity
    /// has not been reclaimed.
    #[must_use]
    pub fn is_valid_handle(&self, handle: &Handle) -> bool {
        handle.resolve(self).is_ok()
    }

    /// Signature of an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn signature(&self, key: impl EntityKey) -> EcsResult<S::Bits> {
        let slot = key.resolve(self)?;
        Ok(*self.entities.signature(slot))
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Adds tag `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn add_tag<T: TagOf<S>>(&mut self, key: impl EntityKey) -> EcsResult<()> {
        let slot = key.resolve(self)?;
        self.entities.signature_mut(slot).set(tag_bit::<S, T>());
        Ok(())
    }

    /// Removes tag `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn del_tag<T: TagOf<S>>(&mut self, key: impl EntityKey) -> EcsResult<()> {
        let slot = key.resolve(self)?;
        self.entities.signature_mut(slot).clear(tag_bit::<S, T>());
        Ok(())
    }

    /// Returns `true` if the entity carries tag `T`.
    #[must_use]
    pub fn has_tag<T: TagOf<S>>(&self, key: impl EntityKey) -> bool {
        self.has_bit(key, tag_bit::<S, T>())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches `value` and returns the stored payload.
    ///
    /// Overwrites the payload if the component is already attached.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn add_component<C: ComponentOf<S>>(
        &mut self,
        key: impl EntityKey,
        value: C,
    ) -> EcsResult<&mut C> {
        let slot = key.resolve(self)?;
        self.entities
            .signature_mut(slot)
            .set(<C as ComponentOf<S>>::INDEX);
        let payload = &mut C::column_mut(&mut self.storage)[self.entities.data_index(slot)];
        *payload = value;
        Ok(payload)
    }

    /// Detaches component `C`. The payload stays in its column.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn del_component<C: ComponentOf<S>>(&mut self, key: impl EntityKey) -> EcsResult<()> {
        let slot = key.resolve(self)?;
        self.entities
            .signature_mut(slot)
            .clear(<C as ComponentOf<S>>::INDEX);
        Ok(())
    }

    /// Payload of component `C`.
    ///
    /// The payload is only meaningful while the component is attached; see
    /// [`Manager::has_component`].
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn get_component<C: ComponentOf<S>>(&self, key: impl EntityKey) -> EcsResult<&C> {
        let slot = key.resolve(self)?;
        Ok(&C::column(&self.storage)[self.entities.data_index(slot)])
    }

    /// Payload of component `C`, mutably.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn get_component_mut<C: ComponentOf<S>>(
        &mut self,
        key: impl EntityKey,
    ) -> EcsResult<&mut C> {
        let slot = key.resolve(self)?;
        let index = self.entities.data_index(slot);
        Ok(&mut C::column_mut(&mut self.storage)[index])
    }

    /// Returns `true` if component `C` is attached.
    #[must_use]
    pub fn has_component<C: ComponentOf<S>>(&self, key: impl EntityKey) -> bool {
        self.has_bit(key, <C as ComponentOf<S>>::INDEX)
    }

    fn has_bit(&self, key: impl EntityKey, bit: usize) -> bool {
        key.resolve(self)
            .is_ok_and(|slot| self.entities.signature(slot).read(bit))
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Returns `true` if the entity carries every kind of signature `Sig`.
    #[must_use]
    pub fn matches_signature<Sig: SignatureOf<S>>(&self, key: impl EntityKey) -> bool {
        let mask = S::info().signature_mask(Sig::INDEX);
        key.resolve(self)
            .is_ok_and(|slot| self.entities.signature(slot).contains(mask))
    }

    /// Returns `true` if the entity matches the signature of system `X`.
    #[must_use]
    pub fn matches_system<X: SystemOf<S>>(&self, key: impl EntityKey) -> bool {
        self.matches_signature::<X::Signature>(key)
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Calls `f` with every slot in `[0, size)`, ascending.
    pub fn for_entities(&self, mut f: impl FnMut(usize)) {
        for slot in 0..self.size {
            f(slot);
        }
    }

    /// Calls `f` with every attached component of one entity, in schema
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn for_components(
        &self,
        key: impl EntityKey,
        mut f: impl FnMut(ComponentInfo, &dyn Any),
    ) -> EcsResult<()> {
        let slot = key.resolve(self)?;
        self.storage.visit_components(
            self.entities.data_index(slot),
            self.entities.signature(slot),
            &mut f,
        );
        Ok(())
    }

    /// Calls `f` with every attached component of one entity, in schema
    /// order, allowing in-place edits.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not resolve.
    pub fn for_components_mut(
        &mut self,
        key: impl EntityKey,
        mut f: impl FnMut(ComponentInfo, &mut dyn Any),
    ) -> EcsResult<()> {
        let slot = key.resolve(self)?;
        let data_index = self.entities.data_index(slot);
        self.storage
            .visit_components_mut(data_index, self.entities.signature(slot), &mut f);
        Ok(())
    }

    /// Calls `f` with the slot and the components of `Sig` of every entity
    /// in `[0, size)` that matches `Sig`, ascending.
    ///
    /// # Returns
    ///
    /// The number of entities visited.
    pub fn for_matching<Sig: SignatureOf<S>>(
        &mut self,
        mut f: impl FnMut(usize, Row<'_, S, Sig>),
    ) -> usize {
        let mask = S::info().signature_mask(Sig::INDEX);
        let mut pass = ColumnPass::<S, Sig::Components>::begin(&mut self.storage);
        let mut visited = 0;
        for slot in 0..self.size {
            if self.entities.signature(slot).contains(mask) {
                f(slot, pass.fetch(self.entities.data_index(slot)));
                visited += 1;
            }
        }
        visited
    }

    /// Read-only [`Manager::for_matching`].
    ///
    /// Takes `&self`, so several threads may run it at once through a
    /// [`SharedManager`](crate::SharedManager) read guard.
    ///
    /// # Returns
    ///
    /// The number of entities visited.
    pub fn for_matching_ref<Sig: SignatureOf<S>>(
        &self,
        mut f: impl FnMut(usize, RowRef<'_, S, Sig>),
    ) -> usize {
        let mask = S::info().signature_mask(Sig::INDEX);
        let mut visited = 0;
        for slot in 0..self.size {
            if self.entities.signature(slot).contains(mask) {
                let row = <Sig::Components as ComponentSet<S>>::fetch_ref(
                    &self.storage,
                    self.entities.data_index(slot),
                );
                f(slot, row);
                visited += 1;
            }
        }
        visited
    }
}

impl<S: Schema> Clone for Manager<S> {
    /// Deep copy under a new manager id.
    ///
    /// Handles of the source are foreign to the copy. System instances are
    /// created fresh.
    fn clone(&self) -> Self {
        Self {
            id: ManagerId::next(),
            config: self.config,
            capacity: self.capacity,
            size: self.size,
            size_next: self.size_next,
            entities: self.entities.clone(),
            handles: self.handles.clone(),
            storage: self.storage.clone_columns(),
        }
    }
}

impl<S: Schema> fmt::Debug for Manager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("size", &self.size)
            .field("size_next", &self.size_next)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrowthOptions;
    use crate::ecs::fixtures::{Demo, C0, C1, C2, C3, C4, S1, S2, S3, T0, T1, T2};

    fn small(start_capacity: usize) -> Manager<Demo> {
        Manager::with_config(ManagerConfig::default().with_start_capacity(start_capacity)).unwrap()
    }

    #[test]
    fn test_new_preallocates() {
        let manager = Manager::<Demo>::new().unwrap();
        assert_eq!(manager.capacity(), ManagerConfig::DEFAULT_START_CAPACITY);
        assert_eq!(manager.size(), 0);
        assert_eq!(manager.size_next(), 0);
        assert_eq!(manager.column::<C3>().len(), manager.capacity());
        assert_eq!(manager.handles().len(), manager.capacity());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ManagerConfig::default().with_growth(GrowthOptions::new(5, 1, 0));
        assert!(matches!(
            Manager::<Demo>::with_config(config),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_create_grows_when_full() {
        let mut manager = small(0);
        assert_eq!(manager.capacity(), 0);

        manager.create_entity().unwrap();
        // (0 + 5) * 2
        assert_eq!(manager.capacity(), 10);

        for _ in 1..10 {
            manager.create_entity().unwrap();
        }
        assert_eq!(manager.capacity(), 10);

        manager.create_entity().unwrap();
        // (10 + 5) * 2
        assert_eq!(manager.capacity(), 30);
        assert_eq!(manager.size_next(), 11);
        assert_eq!(manager.column::<C0>().len(), 30);
    }

    #[test]
    fn test_grow_preserves_payloads() {
        let mut manager = small(2);
        let a = manager.create_handle().unwrap();
        let b = manager.create_handle().unwrap();
        manager.add_component(a, C2(20)).unwrap();
        manager.add_component(b, C2(21)).unwrap();

        let c = manager.create_handle().unwrap();
        assert!(manager.capacity() > 2);

        assert_eq!(manager.get_component::<C2>(a).unwrap().0, 20);
        assert_eq!(manager.get_component::<C2>(b).unwrap().0, 21);
        assert!(!manager.has_component::<C2>(c));
    }

    #[test]
    fn test_grow_to_is_monotonic() {
        let mut manager = small(8);
        manager.grow_to(4).unwrap();
        assert_eq!(manager.capacity(), 8);
        manager.grow_to(16).unwrap();
        assert_eq!(manager.capacity(), 16);
        assert_eq!(manager.entities().len(), 16);
    }

    #[test]
    fn test_failed_grow_leaves_manager_intact() {
        let mut manager = small(4);
        let handle = manager.create_handle().unwrap();
        manager.add_component(handle, C2(99)).unwrap();

        let huge = usize::MAX / 64;
        assert_eq!(
            manager.grow_to(huge),
            Err(EcsError::Allocation { requested: huge })
        );

        assert_eq!(manager.capacity(), 4);
        assert_eq!(manager.entities().len(), 4);
        assert_eq!(manager.handles().len(), 4);
        assert_eq!(manager.column::<C0>().len(), 4);
        assert_eq!(manager.column::<C1>().len(), 4);
        assert_eq!(manager.column::<C2>().len(), 4);
        assert_eq!(manager.column::<C3>().len(), 4);
        assert_eq!(manager.column::<C4>().len(), 4);
        assert_eq!(manager.get_component::<C2>(handle).unwrap().0, 99);

        assert_eq!(manager.create_entity().unwrap(), 1);
        assert_eq!(manager.size_next(), 2);
    }

    #[test]
    fn test_new_entities_visible_after_refresh() {
        let mut manager = small(4);
        manager.create_entity().unwrap();
        manager.create_entity().unwrap();

        let mut seen = Vec::new();
        manager.for_entities(|slot| seen.push(slot));
        assert!(seen.is_empty());

        manager.refresh();
        manager.for_entities(|slot| seen.push(slot));
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut manager = small(4);
        let slot = manager.create_entity().unwrap();
        manager.kill(slot).unwrap();
        manager.kill(slot).unwrap();
        assert!(!manager.is_alive(slot));

        manager.refresh();
        assert_eq!(manager.size(), 0);
        assert_eq!(manager.size_next(), 0);
    }

    #[test]
    fn test_refresh_compacts_and_repoints() {
        let mut manager = small(8);
        let handles: Vec<Handle> = (0..6).map(|_| manager.create_handle().unwrap()).collect();
        for (value, handle) in handles.iter().enumerate() {
            manager.add_component(handle, C1(value as u32)).unwrap();
        }
        manager.kill(handles[0]).unwrap();
        manager.kill(handles[2]).unwrap();
        manager.kill(handles[3]).unwrap();

        manager.refresh();
        assert_eq!(manager.size(), 3);

        for dead in [0, 2, 3] {
            assert!(!manager.is_valid_handle(&handles[dead]));
        }
        for alive in [1, 4, 5] {
            let handle = &handles[alive];
            assert!(manager.is_alive(handle));
            assert_eq!(manager.get_component::<C1>(handle).unwrap().0, alive as u32);
        }
        for slot in 0..manager.size() {
            let record = manager.entities().handle_slots()[slot];
            assert_eq!(manager.handles().get(record).unwrap().entity(), slot);
        }
    }

    #[test]
    fn test_unrelated_death_keeps_handle() {
        let mut manager = small(4);
        let keep = manager.create_handle().unwrap();
        let doomed = manager.create_handle().unwrap();
        manager.kill(doomed).unwrap();
        manager.refresh();

        assert!(manager.is_valid_handle(&keep));
        assert!(!manager.is_valid_handle(&doomed));
    }

    #[test]
    fn test_handle_survives_reuse_of_slot() {
        let mut manager = small(4);
        let old = manager.create_handle().unwrap();
        manager.kill(old).unwrap();
        manager.refresh();

        let new = manager.create_handle().unwrap();
        assert_eq!(new.entity(), old.entity());
        assert!(manager.is_valid_handle(&new));
        assert!(!manager.is_valid_handle(&old));
        assert!(matches!(
            manager.add_tag::<T1>(old),
            Err(EcsError::StaleHandle { .. })
        ));
    }

    #[test]
    fn test_tags() {
        let mut manager = small(4);
        let slot = manager.create_entity().unwrap();
        manager.add_tag::<T2>(slot).unwrap();
        assert!(manager.has_tag::<T2>(slot));
        assert!(!manager.has_tag::<T0>(slot));

        manager.del_tag::<T2>(slot).unwrap();
        assert!(!manager.has_tag::<T2>(slot));
        assert!(!manager.has_tag::<T2>(99usize));
    }

    #[test]
    fn test_component_round_trip() {
        let mut manager = small(4);
        let handle = manager.create_handle().unwrap();

        *manager.add_component(handle, C3(5)).unwrap() = C3(6);
        assert_eq!(manager.get_component::<C3>(handle).unwrap(), &C3(6));

        manager.get_component_mut::<C3>(handle).unwrap().0 += 1;
        assert_eq!(manager.get_component::<C3>(handle).unwrap().0, 7);

        manager.del_component::<C3>(handle).unwrap();
        assert!(!manager.has_component::<C3>(handle));
        // Payload is retained after removal.
        assert_eq!(manager.get_component::<C3>(handle).unwrap().0, 7);
    }

    #[test]
    fn test_matches_signature() {
        let mut manager = small(4);
        let slot = manager.create_entity().unwrap();
        manager.add_component(slot, C0(0)).unwrap();
        manager.add_component(slot, C4(0)).unwrap();
        assert!(!manager.matches_signature::<S2>(slot));

        manager.add_tag::<T0>(slot).unwrap();
        assert!(manager.matches_signature::<S2>(slot));
        assert!(!manager.matches_signature::<S1>(slot));
        assert!(!manager.matches_signature::<S3>(slot));
        assert!(!manager.matches_signature::<S2>(7usize));
    }

    #[test]
    fn test_for_matching_visits_matches_in_order() {
        let mut manager = small(8);
        for value in 0..6u32 {
            let slot = manager.create_entity().unwrap();
            manager.add_component(slot, C0(value)).unwrap();
            if value % 2 == 0 {
                manager.add_component(slot, C1(value * 10)).unwrap();
            }
        }
        manager.refresh();

        let mut seen = Vec::new();
        let visited = manager.for_matching::<S1>(|slot: usize, (c0, c1): (&mut C0, &mut C1)| {
            c1.0 += c0.0;
            seen.push(slot);
        });
        assert_eq!(visited, 3);
        assert_eq!(seen, vec![0, 2, 4]);
        assert_eq!(manager.get_component::<C1>(4usize).unwrap().0, 44);

        let mut total = 0;
        manager.for_matching_ref::<S1>(|_slot: usize, (_, c1): (&C0, &C1)| total += c1.0);
        assert_eq!(total, 66);
    }

    #[test]
    fn test_for_components_schema_order() {
        let mut manager = small(4);
        let slot = manager.create_entity().unwrap();
        manager.add_component(slot, C4(4)).unwrap();
        manager.add_component(slot, C1(1)).unwrap();
        manager.add_tag::<T0>(slot).unwrap();

        let mut names = Vec::new();
        manager
            .for_components(slot, |info: ComponentInfo, value: &dyn Any| {
                names.push(info.name);
                if let Some(c4) = value.downcast_ref::<C4>() {
                    assert_eq!(c4.0, 4);
                }
            })
            .unwrap();
        assert_eq!(names, vec!["C1", "C4"]);
    }

    #[test]
    fn test_for_components_mut_edits_in_place() {
        let mut manager = small(4);
        let handle = manager.create_handle().unwrap();
        manager.add_component(handle, C0(1)).unwrap();
        manager.add_component(handle, C3(-3)).unwrap();

        let mut seen = 0;
        manager
            .for_components_mut(handle, |info: ComponentInfo, value: &mut dyn Any| {
                seen += 1;
                if let Some(c0) = value.downcast_mut::<C0>() {
                    assert_eq!(info.index, 0);
                    c0.0 += 10;
                } else if let Some(c3) = value.downcast_mut::<C3>() {
                    c3.0 *= 2;
                }
            })
            .unwrap();

        assert_eq!(seen, 2);
        assert_eq!(manager.get_component::<C0>(handle).unwrap().0, 11);
        assert_eq!(manager.get_component::<C3>(handle).unwrap().0, -6);
        assert_eq!(manager.column::<C4>()[0], C4(0));

        manager.kill(handle).unwrap();
        manager.refresh();
        assert!(manager.for_components_mut(handle, |_, _| {}).is_err());
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut manager = small(4);
        let handles: Vec<Handle> = (0..3).map(|_| manager.create_handle().unwrap()).collect();
        manager.refresh();
        manager.clear();

        assert_eq!(manager.size(), 0);
        assert_eq!(manager.size_next(), 0);
        assert_eq!(manager.capacity(), 4);
        for handle in &handles {
            assert!(!manager.is_valid_handle(handle));
        }
        assert_eq!(manager.entities().data_indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut manager = small(4);
        let handle = manager.create_handle().unwrap();
        manager.add_component(handle, C0(1)).unwrap();

        let mut copy = manager.clone();
        assert_ne!(copy.id(), manager.id());
        assert!(!copy.is_valid_handle(&handle));

        let slot = handle.entity();
        copy.get_component_mut::<C0>(slot).unwrap().0 = 2;
        assert_eq!(manager.get_component::<C0>(handle).unwrap().0, 1);
        assert_eq!(copy.get_component::<C0>(slot).unwrap().0, 2);
    }

    #[test]
    fn test_column_bytes() {
        let mut manager = small(2);
        let slot = manager.create_entity().unwrap();
        manager.add_component(slot, C0(0x0102_0304)).unwrap();

        let bytes = manager.column_bytes::<C0>();
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<C0>());
        assert_eq!(&bytes[..4], &0x0102_0304u32.to_ne_bytes());
    }
}
