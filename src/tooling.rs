//! Tooling & Integration Layer
//!
//! Command-line front end for the admin session.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
