//! Storyhall — sessions and the real-time protocol.
//!
//! Responsible for the session registry, tracking which connection belongs
//! to which session in which role, and routing inbound protocol commands to
//! state changes and outbound broadcasts.

pub mod application;
pub mod domain;
