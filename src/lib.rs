//! floorbot - a command-triggered floor-price chat bot
//!
//! Maintains a persistent gateway connection to the chat platform, parses
//! trigger-word commands out of message events, looks up collection floor
//! prices on the marketplace API, and replies in the originating channel.
//! A minimal HTTP liveness endpoint keeps an external scheduler happy.

pub mod application;
pub mod domain;
pub mod infrastructure;
