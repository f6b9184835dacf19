//! Application layer: the connection router and read-only views.

pub mod query_handlers;
pub mod router;
