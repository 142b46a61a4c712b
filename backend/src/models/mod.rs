//! Domain models for the ReStock backend
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
