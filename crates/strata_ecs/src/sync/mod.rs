//! # Phase Synchronization
//!
//! The manager itself is single-threaded. Sharing it between threads splits
//! each frame into phases:
//!
//! ```text
//! Frame N:
//!   read phase      many threads  for_matching_ref, get_component, ...
//!   mutation phase  one thread    create, kill, add/del, refresh, update
//! ```
//!
//! Structural mutation never overlaps iteration: the write guard excludes
//! every read guard.

mod shared;

pub use shared::SharedManager;
