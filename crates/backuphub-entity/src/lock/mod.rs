//! Cluster lock records.

pub mod model;

pub use model::LockRecord;
