//! Storyhall API — HTTP and WebSocket surface for live sessions.
//!
//! Exposes session management over plain HTTP and the real-time protocol
//! over a WebSocket at `/ws`. All protocol semantics live in
//! `storyhall-session`; this crate only adapts transports to it.

pub mod config;
pub mod error;
pub mod qr;
pub mod routes;
pub mod state;
