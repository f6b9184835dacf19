//! Storyhall — narration service.
//!
//! The narration service turns a player's words plus recent campaign context
//! into DM narration. Remote services can fail or stall, so callers go
//! through [`guarded::GuardedNarrator`], which bounds every call in time and
//! in concurrency and substitutes rule-based text on any failure.

pub mod error;
pub mod guarded;
pub mod narrator;
pub mod openai;
pub mod rule_based;
