//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod health;
pub mod message;
pub mod quote;

pub use command::Command;
pub use health::HealthStatus;
pub use message::{MessageEvent, ReadyInfo};
pub use quote::FloorPriceQuote;
