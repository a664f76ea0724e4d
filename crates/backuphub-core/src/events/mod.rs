//! Lifecycle and configuration events consumed by BackupHub services.
//!
//! Events are delivered by explicit calls on registered listeners
//! (see [`crate::traits::ConfigListener`]); there is no implicit discovery.

pub mod config;

pub use config::{ConfigUpdateEvent, ConfigValidateEvent};
