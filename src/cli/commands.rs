//! CLI command definitions.
//!
//! This module defines all CLI verbs and their arguments using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strato - declarative CloudFormation stack deployment.
#[derive(Parser, Debug)]
#[command(name = "strato")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project root directory.
    #[arg(long, global = true, default_value = ".", env = "STRATO_PROJECT_DIR")]
    pub project_dir: PathBuf,

    /// AWS region override.
    #[arg(long, global = true, env = "STRATO_REGION")]
    pub region: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output formats for command results.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Available CLI verbs.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the stack template into the build directory.
    Build {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Create or update the stack and wait for it to settle.
    Deploy {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Delete the stack and clear its persisted record.
    Remove {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Scaffold a new stack folder from a template tree.
    Create {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,

        /// Template tree under templates/ to copy from.
        #[arg(short = 't', long = "template")]
        template: Option<String>,
    },

    /// Show the remote stack's status and outputs.
    Describe {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Push the rendered template to storage without deploying.
    Upload {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Re-read the remote stack into the persisted state.
    Sync {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Push fresh function code without a full stack update.
    UpdateCode {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: String,
    },

    /// Dump the resolved arguments and parameters without acting.
    Test {
        /// Stack folder under stacks/.
        #[arg(short = 's', long = "stack")]
        stack: Option<String>,
    },
}
