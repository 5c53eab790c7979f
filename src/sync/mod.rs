//! Synchronization primitives for the folder tree.
//!
//! The only primitive defined here is [`NodeSync`] (see [`rwlock`]), the
//! per-node reader/writer synchronizer that the tree core uses for
//! hand-over-hand traversal. There is no global lock anywhere in this crate.

pub mod rwlock;

pub use rwlock::NodeSync;
