//! Domain model for sessions and the wire protocol.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod membership;
pub mod store;
