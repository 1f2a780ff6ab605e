//! Shared types for the persistence layer.

pub mod errors;

pub use errors::{CoreError, CoreResult};
