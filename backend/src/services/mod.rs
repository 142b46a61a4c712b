//! Core services
//!
//! Business logic lives here, behind the store ports. Handlers stay
//! thin and delegate.

pub mod batch;
pub mod lifecycle;
pub mod migrate;
pub mod pricing;
pub mod reconcile;
pub mod reporting;
