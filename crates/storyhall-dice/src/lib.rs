//! Storyhall — dice engine.
//!
//! Parses `<count>d<sides>[±modifier]` notation and rolls it against an
//! injected [`DeterministicRng`](storyhall_core::rng::DeterministicRng), so
//! every outcome can be replayed from a scripted draw sequence.

pub mod notation;
pub mod roll;
