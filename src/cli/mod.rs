//! CLI module for the Strato deployment tool.
//!
//! This module provides the command-line interface for rendering and
//! deploying stacks.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
