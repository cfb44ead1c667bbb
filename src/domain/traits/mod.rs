//! Domain traits - Abstractions for infrastructure implementations

pub mod gateway;
pub mod marketplace;

pub use gateway::{EventHandler, ReplySink};
pub use marketplace::FloorPriceSource;
