//! Application services - Business logic orchestration

pub mod controller;

pub use controller::BotController;
