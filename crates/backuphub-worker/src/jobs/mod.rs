//! Job handler implementations.

pub mod backup;
