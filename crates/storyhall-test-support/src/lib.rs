//! Shared test doubles for the Storyhall server.

mod clock;
mod narrator;
mod rng;

pub use clock::FixedClock;
pub use narrator::{FailingNarrator, GatedNarrator, ScriptedNarrator, StalledNarrator};
pub use rng::{MockRng, SequenceRng};
