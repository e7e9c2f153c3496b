//! Deployment orchestration.
//!
//! Drives the stack lifecycle: plan create-or-update from observed remote
//! state, execute against the provider, wait for the operation to settle,
//! and persist the resulting stack record.

mod orchestrator;
mod plan;
mod scaffold;

pub use orchestrator::DeploymentOrchestrator;
pub use plan::{plan_stack_action, StackAction};
pub use scaffold::copy_template_tree;
