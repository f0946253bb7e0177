//! Library exports for ticketbook-cli.
//!
//! Exposes the CLI definition so tests and tooling can inspect it.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
