//! Storyhall Core — shared abstractions.
//!
//! This crate defines the clock, randomness and error types every other
//! Storyhall crate depends on. It contains no networking code.

pub mod clock;
pub mod command;
pub mod error;
pub mod rng;
