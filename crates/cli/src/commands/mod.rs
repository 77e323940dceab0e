//! Subcommand implementations.

pub mod admin;
pub mod gallery;
pub mod migrate;
