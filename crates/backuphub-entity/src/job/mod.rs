//! Background job domain entities.

pub mod model;
pub mod state;

pub use model::{CreateJob, Job};
pub use state::JobState;
