//! AWS service clients.
//!
//! Thin wrappers around the official SDK clients, each constructed from
//! an explicit [`AwsSettings`] threaded in by the caller. There is no
//! process-wide mutable client configuration.

mod functions;
mod settings;
mod stacks;
mod storage;

pub use functions::FunctionApi;
pub use settings::AwsSettings;
pub use stacks::{RemoteStack, StackApi, StackTag, UpdateOutcome};
pub use storage::ObjectStore;
