//! Command handlers for the docchat CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod serve;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
