//! Subcommand implementations.

pub mod config;
pub mod hash;
pub mod parse;
