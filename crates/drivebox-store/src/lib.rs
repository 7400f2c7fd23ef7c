//! # drivebox-store
//!
//! The authoritative in-memory node arena ([`FileSystemStore`]), read-only
//! path projections ([`PathResolver`]), and the snapshot persistence
//! collaborator ([`persist::SnapshotStore`]).

pub mod persist;
pub mod resolver;
pub mod store;

pub use persist::{JsonSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use resolver::PathResolver;
pub use store::{FileSystemStore, RemovedSubtree};
