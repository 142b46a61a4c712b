//! Shared types and models for ReStock
//!
//! This crate contains the domain model shared between the backend's
//! store adapters, core services, and HTTP surface.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;
