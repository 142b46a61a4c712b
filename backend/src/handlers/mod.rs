//! HTTP handlers for the ReStock API

mod batches;
mod health;
mod import;
mod items;
mod reports;

pub use batches::*;
pub use health::*;
pub use import::*;
pub use items::*;
pub use reports::*;
