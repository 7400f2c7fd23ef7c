//! # drivebox-service
//!
//! The validated mutation layer over the node store: folder creation,
//! rename, move, and cascading delete, with name/conflict/cycle validation.
//! The store itself stays a dumb primitive; every invariant is enforced
//! here before anything is committed.

pub mod naming;
pub mod service;

pub use service::DriveService;
