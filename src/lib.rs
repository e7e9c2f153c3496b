// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Strato
//!
//! A declarative, idempotent deployment tool for AWS CloudFormation stacks.
//!
//! ## Overview
//!
//! Strato renders parameterized templates and drives the full stack
//! lifecycle against CloudFormation:
//!
//! - Resolve layered JSON parameters (project, build-computed, stack-local)
//! - Render `${file(...)}` inclusions and `${variable}` substitutions
//! - Package function code into deployable archives
//! - Create or update stacks idempotently, polling to completion
//! - Persist each stack's resolved parameters and remote metadata
//!
//! ## Architecture
//!
//! One run is one sequential pipeline:
//!
//! 1. **Resolve**: merge parameter layers, derive the stack identity
//! 2. **Render**: produce the final template document
//! 3. **Package & upload**: bundle auxiliary files when required
//! 4. **Reconcile**: create-or-update remotely, wait, persist the record
//!
//! ## Modules
//!
//! - [`params`]: layered parameter loading, merging, and derivation
//! - [`render`]: template scanning and two-pass rendering
//! - [`package`]: code artifact packaging
//! - [`state`]: persisted build state
//! - [`aws`]: S3, CloudFormation, and Lambda client wrappers
//! - [`deploy`]: deployment orchestration and planning
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```json
//! {
//!   "projectName": "Acme"
//! }
//! ```
//!
//! With the project parameters above, a stack folder `api` deploys as the
//! remote stack `Acme-api`, and `Hello ${projectName}` in its template
//! renders as `Hello Acme`.

// ============================================================================
// Modules
// ============================================================================

pub mod aws;
pub mod cli;
pub mod deploy;
pub mod error;
pub mod layout;
pub mod package;
pub mod params;
pub mod render;
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use aws::{AwsSettings, FunctionApi, ObjectStore, RemoteStack, StackApi, StackTag};
pub use cli::{Cli, Commands, OutputFormat, OutputFormatter};
pub use deploy::{plan_stack_action, DeploymentOrchestrator, StackAction};
pub use error::{Result, StratoError};
pub use layout::Workspace;
pub use package::{ArchiveSummary, ArtifactPackager};
pub use params::{ParameterStore, ResolvedParameters, StackType};
pub use render::TemplateRenderer;
pub use state::{BuildState, LocalStateStore, StackRecord, StateStore};
