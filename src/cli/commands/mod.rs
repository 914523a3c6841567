//! Subcommand implementations.

/// Translation (and dictionary add) command handler.
pub mod translate;
