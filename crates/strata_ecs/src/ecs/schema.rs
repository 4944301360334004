//! # Schema Resolution
//!
//! A schema is the configuration-time universe of a manager: its ordered
//! component kinds, tag kinds, query signatures and system kinds.
//!
//! Schemas are declared with [`schema!`](crate::schema), which turns the
//! declaration into trait implementations:
//!
//! - every component gets [`ComponentOf::INDEX`] (its column and its bit)
//! - every tag gets [`TagOf::INDEX`] (bit `COMPONENT_COUNT + INDEX`)
//! - every signature gets [`SignatureOf::INDEX`] and a cached mask
//! - every system gets [`SystemOf::INDEX`] and a persistent instance
//!
//! Using a kind the schema never declared does not compile, because the
//! corresponding trait is not implemented for it.

use std::any::Any;
use std::collections::TryReserveError;

use super::bitset::Bits;
use super::fetch::{ComponentSet, TagSet};
use super::system::System;

/// Marker trait for component payloads.
///
/// Components are plain data:
/// - `Default`: columns are pre-filled when storage grows
/// - `Clone`: managers can be deep-copied
/// - `Send + Sync`: read phases may run on several threads
///
/// Every such type is a component; whether it belongs to a given schema is
/// decided by [`ComponentOf`].
pub trait Component: Default + Clone + Send + Sync + 'static {}

impl<T: Default + Clone + Send + Sync + 'static> Component for T {}

/// Storage layout and kind universe of a manager.
///
/// Implemented by the struct generated by [`schema!`](crate::schema), which
/// holds one column per component kind and one instance per system kind.
pub trait Schema: Sized + 'static {
    /// Signature bit vector, wide enough for every component and tag bit.
    type Bits: Bits;

    /// Number of declared component kinds.
    const COMPONENT_COUNT: usize;
    /// Number of declared tag kinds.
    const TAG_COUNT: usize;
    /// Number of declared signatures.
    const SIGNATURE_COUNT: usize;
    /// Number of declared system kinds.
    const SYSTEM_COUNT: usize;
    /// Signature width.
    const BIT_COUNT: usize = Self::COMPONENT_COUNT + Self::TAG_COUNT;

    /// Resolved schema metadata, computed once per schema type.
    fn info() -> &'static SchemaInfo<Self::Bits>;

    /// Creates empty columns and default system instances.
    fn new_storage() -> Self;

    /// Reserves room for `capacity` payloads in every column.
    ///
    /// # Errors
    ///
    /// Returns the allocator error of the first column that cannot grow.
    fn reserve_columns(&mut self, capacity: usize) -> Result<(), TryReserveError>;

    /// Resizes every column to exactly `capacity`, filling with defaults.
    fn resize_columns(&mut self, capacity: usize);

    /// Clones every column; system instances are created fresh.
    #[must_use]
    fn clone_columns(&self) -> Self;

    /// Calls `f` for each component present in `signature`, in schema order,
    /// with the payload stored at `data_index`.
    fn visit_components(
        &self,
        data_index: usize,
        signature: &Self::Bits,
        f: &mut dyn FnMut(ComponentInfo, &dyn Any),
    );

    /// Like [`Schema::visit_components`], with mutable payloads.
    fn visit_components_mut(
        &mut self,
        data_index: usize,
        signature: &Self::Bits,
        f: &mut dyn FnMut(ComponentInfo, &mut dyn Any),
    );
}

/// A component kind declared in schema `S`.
pub trait ComponentOf<S: Schema>: Component {
    /// Position in the schema's component list; also the signature bit.
    const INDEX: usize;

    /// The column holding this kind's payloads.
    fn column(storage: &S) -> &[Self];

    /// The column holding this kind's payloads, mutably.
    fn column_mut(storage: &mut S) -> &mut Vec<Self>;
}

/// A tag kind declared in schema `S`.
pub trait TagOf<S: Schema>: 'static {
    /// Position in the schema's tag list.
    const INDEX: usize;
}

/// A query signature declared in schema `S`.
pub trait SignatureOf<S: Schema>: 'static {
    /// Position in the schema's signature list.
    const INDEX: usize;

    /// Required components, in schema order.
    type Components: ComponentSet<S>;

    /// Required tags.
    type Tags: TagSet<S>;
}

/// A system kind declared in schema `S`.
pub trait SystemOf<S: Schema>: System<S> {
    /// Position in the schema's system list.
    const INDEX: usize;

    /// The persistent instance.
    fn instance(storage: &S) -> &Self;

    /// The persistent instance, mutably.
    fn instance_mut(storage: &mut S) -> &mut Self;
}

/// Static description of one component kind, for inspectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Component index (and signature bit).
    pub index: usize,
    /// Declared type name.
    pub name: &'static str,
    /// Payload size in bytes.
    pub size: usize,
    /// Payload alignment in bytes.
    pub align: usize,
}

impl ComponentInfo {
    /// Describes component type `C`.
    #[inline]
    #[must_use]
    pub const fn of<C>(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            size: std::mem::size_of::<C>(),
            align: std::mem::align_of::<C>(),
        }
    }
}

/// Resolved metadata of a schema.
///
/// Built once per schema type and immutable afterwards.
#[derive(Clone, Debug)]
pub struct SchemaInfo<B> {
    components: Vec<&'static str>,
    tags: Vec<&'static str>,
    signatures: Vec<&'static str>,
    masks: Vec<B>,
    systems: Vec<&'static str>,
    system_signatures: Vec<usize>,
}

impl<B: Bits> SchemaInfo<B> {
    /// Assembles schema metadata from its ordered parts.
    #[must_use]
    pub fn new(
        components: Vec<&'static str>,
        tags: Vec<&'static str>,
        signatures: Vec<(&'static str, B)>,
        systems: Vec<(&'static str, usize)>,
    ) -> Self {
        let (signatures, masks) = signatures.into_iter().unzip();
        let (systems, system_signatures) = systems.into_iter().unzip();
        Self {
            components,
            tags,
            signatures,
            masks,
            systems,
            system_signatures,
        }
    }

    /// Number of component kinds.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of tag kinds.
    #[inline]
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Number of signatures.
    #[inline]
    #[must_use]
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Number of system kinds.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Signature width: component bits followed by tag bits.
    #[inline]
    #[must_use]
    pub fn bit_count(&self) -> usize {
        self.components.len() + self.tags.len()
    }

    /// Component type names, in schema order.
    #[must_use]
    pub fn component_names(&self) -> &[&'static str] {
        &self.components
    }

    /// Tag type names, in schema order.
    #[must_use]
    pub fn tag_names(&self) -> &[&'static str] {
        &self.tags
    }

    /// Signature names, in schema order.
    #[must_use]
    pub fn signature_names(&self) -> &[&'static str] {
        &self.signatures
    }

    /// System type names, in schema order.
    #[must_use]
    pub fn system_names(&self) -> &[&'static str] {
        &self.systems
    }

    /// Mask of the signature at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declared signature index.
    #[inline]
    #[must_use]
    pub fn signature_mask(&self, index: usize) -> &B {
        &self.masks[index]
    }

    /// Signature index bound to the system at `index`.
    #[must_use]
    pub fn system_signature(&self, index: usize) -> Option<usize> {
        self.system_signatures.get(index).copied()
    }

    /// Name of the kind owning `bit`, component bits first.
    #[must_use]
    pub fn bit_name(&self, bit: usize) -> Option<&'static str> {
        self.components
            .get(bit)
            .or_else(|| self.tags.get(bit.checked_sub(self.components.len())?))
            .copied()
    }

    /// Renders `bits` over the schema's signature width, bit 0 first.
    #[must_use]
    pub fn format_bits(&self, bits: &B) -> String {
        bits.to_bit_string(self.bit_count())
    }
}

/// Builds the mask of signature `Sig` in schema `S`.
#[must_use]
pub fn signature_mask<S: Schema, Sig: SignatureOf<S>>() -> S::Bits {
    let mut bits = S::Bits::default();
    <Sig::Components as ComponentSet<S>>::set_bits(&mut bits);
    <Sig::Tags as TagSet<S>>::set_bits(&mut bits);
    bits
}

/// Signature bit of tag `T` in schema `S`.
#[inline]
#[must_use]
pub fn tag_bit<S: Schema, T: TagOf<S>>() -> usize {
    S::COMPONENT_COUNT + T::INDEX
}

/// Reserves room for `capacity` entries in a component column.
///
/// # Errors
///
/// Returns the allocator error if the reservation fails.
pub fn reserve_column<C>(column: &mut Vec<C>, capacity: usize) -> Result<(), TryReserveError> {
    column.try_reserve_exact(capacity.saturating_sub(column.len()))
}
