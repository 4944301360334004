//! # ECS Error Types
//!
//! All errors that can occur while operating an entity manager.
//!
//! Referencing a kind that the schema never declared is not in this list:
//! it fails to compile, because the required `ComponentOf`/`TagOf`/
//! `SignatureOf` implementation does not exist.

use thiserror::Error;

/// Errors that can occur in the entity manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A raw slot outside the allocated range `0..size_next` was used.
    #[error("entity slot {slot} is outside the allocated range 0..{size_next}")]
    SlotOutOfRange {
        /// The slot that was supplied.
        slot: usize,
        /// The end of the allocated range at the time of the call.
        size_next: usize,
    },

    /// A handle outlived the entity it referred to.
    #[error("stale handle: record {record} is at generation {current}, handle holds {held}")]
    StaleHandle {
        /// Handle record the handle points at.
        record: usize,
        /// Generation captured by the handle.
        held: u64,
        /// Generation currently stored in the record.
        current: u64,
    },

    /// A handle issued by another manager was used.
    #[error("handle belongs to manager {found}, not manager {expected}")]
    ForeignHandle {
        /// Id of the manager the handle was presented to.
        expected: u64,
        /// Id of the manager that issued the handle.
        found: u64,
    },

    /// Growth arithmetic overflowed `usize`.
    #[error("capacity overflow while growing from {capacity} slots")]
    CapacityOverflow {
        /// Capacity before the attempted growth.
        capacity: usize,
    },

    /// The allocator refused to provide storage for the requested capacity.
    #[error("allocation failed while growing to {requested} slots")]
    Allocation {
        /// Capacity that was requested.
        requested: usize,
    },

    /// Invalid manager configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for entity manager operations.
pub type EcsResult<T> = Result<T, EcsError>;
