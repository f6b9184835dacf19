//! Command abstractions.

/// Trait implemented by every inbound protocol command.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;
}
