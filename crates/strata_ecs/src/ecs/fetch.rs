//! # Component and Tag Sets
//!
//! Tuples of component kinds and tuples of tag kinds, as used by signatures.
//!
//! A [`ComponentSet`] knows how to:
//! - set its bits in a signature mask
//! - move its columns out of the storage for the length of a pass
//! - hand out one row of references per entity
//!
//! ## Column Passes
//!
//! `for_matching` and `update_system` need `&mut` access to several columns
//! at once. The required columns are moved out of the storage with
//! `mem::take` (a pointer swap, no copy), borrowed disjointly from the tuple,
//! and moved back when the pass is dropped, even on unwind.
//!
//! ```text
//! storage: [c0][c1][c2][c3][c4]      pass for (C0, C4):
//!            |               |
//!            +---> ( c0 ,  c4 ) ---> (&mut C0, &mut C4) per matching row
//! ```

use std::mem;

use super::bitset::Bits;
use super::schema::{tag_bit, ComponentOf, Schema, SignatureOf, TagOf};

/// An ordered tuple of component kinds of schema `S`.
///
/// Implemented for tuples of up to eight [`ComponentOf`] kinds.
pub trait ComponentSet<S: Schema>: 'static {
    /// The columns of the set, moved out of the storage.
    type Columns: Default + 'static;

    /// Mutable references to one row of the set.
    type Item<'a>
    where
        Self: 'a;

    /// Shared references to one row of the set.
    type Ref<'a>
    where
        Self: 'a;

    /// Sets the bit of every kind in the set.
    fn set_bits(bits: &mut S::Bits);

    /// Moves the set's columns out of `storage`, leaving empty columns.
    fn take(storage: &mut S) -> Self::Columns;

    /// Moves the columns back into `storage`.
    fn restore(storage: &mut S, columns: Self::Columns);

    /// Borrows the payloads at `index` from taken columns.
    fn fetch(columns: &mut Self::Columns, index: usize) -> Self::Item<'_>;

    /// Borrows the payloads at `index` straight from the storage.
    fn fetch_ref(storage: &S, index: usize) -> Self::Ref<'_>;
}

/// A tuple of tag kinds of schema `S`.
pub trait TagSet<S: Schema>: 'static {
    /// Sets the bit of every tag in the set.
    fn set_bits(bits: &mut S::Bits);
}

/// Mutable row handed to `for_matching` callbacks and `System::update`.
pub type Row<'a, S, Sig> = <<Sig as SignatureOf<S>>::Components as ComponentSet<S>>::Item<'a>;

/// Read-only row handed to `for_matching_ref` callbacks.
pub type RowRef<'a, S, Sig> = <<Sig as SignatureOf<S>>::Components as ComponentSet<S>>::Ref<'a>;

macro_rules! impl_sets {
    ($($name:ident),*) => {
        #[allow(unused_variables, non_snake_case, clippy::unused_unit)]
        impl<S: Schema, $($name: ComponentOf<S>),*> ComponentSet<S> for ($($name,)*) {
            type Columns = ($(Vec<$name>,)*);
            type Item<'a> = ($(&'a mut $name,)*) where Self: 'a;
            type Ref<'a> = ($(&'a $name,)*) where Self: 'a;

            #[inline]
            fn set_bits(bits: &mut S::Bits) {
                $(bits.set(<$name as ComponentOf<S>>::INDEX);)*
            }

            #[inline]
            fn take(storage: &mut S) -> Self::Columns {
                ($(mem::take(<$name as ComponentOf<S>>::column_mut(storage)),)*)
            }

            #[inline]
            fn restore(storage: &mut S, columns: Self::Columns) {
                let ($($name,)*) = columns;
                $(*<$name as ComponentOf<S>>::column_mut(storage) = $name;)*
            }

            #[inline]
            fn fetch(columns: &mut Self::Columns, index: usize) -> Self::Item<'_> {
                let ($($name,)*) = columns;
                ($(&mut $name[index],)*)
            }

            #[inline]
            fn fetch_ref(storage: &S, index: usize) -> Self::Ref<'_> {
                ($(&<$name as ComponentOf<S>>::column(storage)[index],)*)
            }
        }

        #[allow(unused_variables)]
        impl<S: Schema, $($name: TagOf<S>),*> TagSet<S> for ($($name,)*) {
            #[inline]
            fn set_bits(bits: &mut S::Bits) {
                $(bits.set(tag_bit::<S, $name>());)*
            }
        }
    };
}

impl_sets!();
impl_sets!(A);
impl_sets!(A, B);
impl_sets!(A, B, C);
impl_sets!(A, B, C, D);
impl_sets!(A, B, C, D, E);
impl_sets!(A, B, C, D, E, F);
impl_sets!(A, B, C, D, E, F, G);
impl_sets!(A, B, C, D, E, F, G, H);

/// Columns of `Set` moved out of a storage for the length of one pass.
///
/// Dropping the pass moves the columns back.
pub(crate) struct ColumnPass<'s, S: Schema, Set: ComponentSet<S>> {
    storage: &'s mut S,
    columns: Set::Columns,
}

impl<'s, S: Schema, Set: ComponentSet<S>> ColumnPass<'s, S, Set> {
    /// Takes the columns of `Set` out of `storage`.
    pub(crate) fn begin(storage: &'s mut S) -> Self {
        let columns = Set::take(storage);
        Self { storage, columns }
    }

    /// Row at `index`.
    #[inline]
    pub(crate) fn fetch(&mut self, index: usize) -> Set::Item<'_> {
        Set::fetch(&mut self.columns, index)
    }

    /// Row at `index` together with the rest of the storage.
    ///
    /// The columns of `Set` are empty in the returned storage.
    #[inline]
    pub(crate) fn split(&mut self, index: usize) -> (&mut S, Set::Item<'_>) {
        (&mut *self.storage, Set::fetch(&mut self.columns, index))
    }
}

impl<S: Schema, Set: ComponentSet<S>> Drop for ColumnPass<'_, S, Set> {
    fn drop(&mut self) {
        let columns = mem::take(&mut self.columns);
        Set::restore(self.storage, columns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::fixtures::{Demo, C0, C1, C4, T0, T2};
    use crate::ecs::{Bitset, Manager};

    #[test]
    fn test_set_bits() {
        let mut bits = Bitset::<1>::new();
        <(C0, C4) as ComponentSet<Demo>>::set_bits(&mut bits);
        <(T0, T2) as TagSet<Demo>>::set_bits(&mut bits);
        assert_eq!(bits.to_bit_string(8), "10001101");

        let mut empty = Bitset::<1>::new();
        <() as ComponentSet<Demo>>::set_bits(&mut empty);
        assert_eq!(empty.count_ones(), 0);
    }

    #[test]
    fn test_pass_restores_columns() {
        let mut manager = Manager::<Demo>::new().unwrap();
        let capacity = manager.capacity();
        {
            let mut pass = ColumnPass::<Demo, (C0, C1)>::begin(&mut manager.storage);
            let (c0, c1) = pass.fetch(3);
            c0.0 = 7;
            c1.0 = 9;
            let (storage, _) = pass.split(0);
            assert!(C0::column(storage).is_empty());
        }
        assert_eq!(manager.column::<C0>().len(), capacity);
        assert_eq!(manager.column::<C0>()[3].0, 7);
        assert_eq!(manager.column::<C1>()[3].0, 9);
    }

    #[test]
    fn test_fetch_ref() {
        let mut manager = Manager::<Demo>::new().unwrap();
        let slot = manager.create_entity().unwrap();
        manager.add_component(slot, C4(11)).unwrap();

        let (c0, c4) = <(C0, C4) as ComponentSet<Demo>>::fetch_ref(manager.storage(), slot);
        assert_eq!(c0.0, 0);
        assert_eq!(c4.0, 11);
    }
}
