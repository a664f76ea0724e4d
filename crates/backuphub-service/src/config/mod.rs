//! Dynamic system configuration services.

pub mod loader;
pub mod service;

pub use loader::FileConfigProvider;
pub use service::ConfigService;
