//! Subcommand implementations

pub mod classify;
pub mod history;
pub mod publish;
pub mod status;
