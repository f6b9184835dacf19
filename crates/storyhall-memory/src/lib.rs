//! Storyhall — campaign memory.
//!
//! Each session owns a bounded, ordered log of narration, speech and dice
//! entries (the newest 100 are retained) plus append-only lore collections.
//! Snapshots expose the 20 most recent entries and a freshly computed summary;
//! they are what the narration service sees as context.

pub mod campaign;
pub mod entry;
pub mod memory;
