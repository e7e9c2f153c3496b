//! CloudFormation stack operations.
//!
//! Describe failures are treated as absence: in normal operation the only
//! cause of a failed describe is that the stack does not exist, so the
//! negative result flows back as `None` rather than an error. Create,
//! update, delete, and wait failures always surface.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, Stack, Tag};
use aws_sdk_cloudformation::Client;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{CloudError, Result};

/// Interval between settle polls.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Deadline for a stack operation to settle.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A stack tag key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Snapshot of a remote stack.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteStack {
    /// Provider-assigned stack identity.
    pub stack_id: String,
    /// Stack name.
    pub name: String,
    /// Current status, e.g. `CREATE_COMPLETE`.
    pub status: String,
    /// Stack description, when one was set by the template.
    pub description: Option<String>,
    /// Output key/value mapping.
    pub outputs: BTreeMap<String, String>,
    /// Tags on the stack.
    pub tags: Vec<StackTag>,
}

impl RemoteStack {
    /// Whether the stack is mid-operation.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.status.ends_with("_IN_PROGRESS")
    }

    /// Whether the last create/update settled successfully.
    #[must_use]
    pub fn is_settled_ok(&self) -> bool {
        matches!(self.status.as_str(), "CREATE_COMPLETE" | "UPDATE_COMPLETE")
    }
}

/// Outcome of an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The provider accepted the update and is applying it.
    Started,
    /// The rendered template matches the deployed stack; nothing to do.
    NoChanges,
}

/// CloudFormation stack API wrapper.
#[derive(Debug, Clone)]
pub struct StackApi {
    /// CloudFormation client.
    client: Client,
}

impl StackApi {
    /// Creates a stack API from the shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Describes a stack by name.
    ///
    /// Returns `None` when the stack does not exist. Any describe failure
    /// is folded into absence, which is the only legitimate cause in
    /// normal operation.
    ///
    /// # Errors
    ///
    /// Never fails; the signature is fallible for interface symmetry with
    /// the mutating calls.
    pub async fn describe(&self, stack_name: &str) -> Result<Option<RemoteStack>> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.stacks().first().map(snapshot)),
            Err(e) => {
                debug!("Describe of {stack_name} failed, treating as absent: {e}");
                Ok(None)
            }
        }
    }

    /// Describes a stack, distinguishing absence from other failures.
    ///
    /// Used while polling a running operation, where an error cannot be
    /// folded into "the stack is gone": only the provider's own
    /// does-not-exist answer counts as absence.
    async fn describe_checked(&self, stack_name: &str) -> Result<Option<RemoteStack>> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.stacks().first().map(snapshot)),
            Err(e) => {
                let service_error = e.into_service_error();
                let message = service_error.message().unwrap_or_default();
                if message.contains("does not exist") {
                    return Ok(None);
                }
                Err(CloudError::stack(format!(
                    "Failed to describe stack {stack_name}: {service_error}"
                ))
                .into())
            }
        }
    }

    /// Creates a stack from a template body.
    ///
    /// # Errors
    ///
    /// Returns an error if the create request is rejected.
    pub async fn create(
        &self,
        stack_name: &str,
        template_body: &str,
        tags: &[StackTag],
    ) -> Result<()> {
        info!("Creating stack {stack_name}");

        self.client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .set_tags(Some(to_sdk_tags(tags)?))
            .send()
            .await
            .map_err(|e| {
                error!("Create of {stack_name} failed: {e}");
                CloudError::stack(format!("Failed to create stack {stack_name}: {e}"))
            })?;

        Ok(())
    }

    /// Updates a stack with a template body.
    ///
    /// A no-op update (the provider reports there is nothing to change)
    /// is a normal outcome, not an error: re-running `deploy` must be
    /// safe.
    ///
    /// # Errors
    ///
    /// Returns an error if the update request is rejected for any other
    /// reason.
    pub async fn update(
        &self,
        stack_name: &str,
        template_body: &str,
        tags: &[StackTag],
    ) -> Result<UpdateOutcome> {
        info!("Updating stack {stack_name}");

        let result = self
            .client
            .update_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .set_tags(Some(to_sdk_tags(tags)?))
            .send()
            .await;

        match result {
            Ok(_) => Ok(UpdateOutcome::Started),
            Err(e) => {
                let service_error = e.into_service_error();
                let message = service_error.message().unwrap_or_default();
                if message.contains("No updates are to be performed") {
                    info!("Stack {stack_name} is already up to date");
                    return Ok(UpdateOutcome::NoChanges);
                }
                error!("Update of {stack_name} failed: {service_error}");
                Err(CloudError::stack(format!(
                    "Failed to update stack {stack_name}: {service_error}"
                ))
                .into())
            }
        }
    }

    /// Deletes a stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete request is rejected.
    pub async fn delete(&self, stack_name: &str) -> Result<()> {
        info!("Deleting stack {stack_name}");

        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| {
                error!("Delete of {stack_name} failed: {e}");
                CloudError::stack(format!("Failed to delete stack {stack_name}: {e}"))
            })?;

        Ok(())
    }

    /// Polls until the stack leaves every `*_IN_PROGRESS` status.
    ///
    /// Returns the settled snapshot, or `None` if the provider reports
    /// the stack gone (the delete path). A transient describe failure
    /// mid-poll is retried, never read as absence: the outcome of a
    /// running operation must come from the provider, not from a dropped
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an error if the deadline passes before the stack settles.
    pub async fn wait_for_settled(&self, stack_name: &str) -> Result<Option<RemoteStack>> {
        let deadline = Instant::now() + SETTLE_TIMEOUT;

        loop {
            match self.describe_checked(stack_name).await {
                Ok(None) => return Ok(None),
                Ok(Some(stack)) if !stack.is_in_progress() => {
                    info!("Stack {stack_name} settled: {}", stack.status);
                    return Ok(Some(stack));
                }
                Ok(Some(stack)) => {
                    debug!("Stack {stack_name} is {}", stack.status);
                }
                Err(e) => {
                    warn!("Describe of {stack_name} failed while waiting, retrying: {e}");
                }
            }

            if Instant::now() >= deadline {
                return Err(CloudError::Timeout {
                    stack: stack_name.to_string(),
                }
                .into());
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

fn snapshot(stack: &Stack) -> RemoteStack {
    RemoteStack {
        stack_id: stack.stack_id().unwrap_or_default().to_string(),
        name: stack.stack_name().unwrap_or_default().to_string(),
        status: stack
            .stack_status()
            .map_or_else(|| "UNKNOWN".to_string(), |status| status.as_str().to_string()),
        description: stack.description().map(str::to_string),
        outputs: stack
            .outputs()
            .iter()
            .filter_map(|output| {
                let key = output.output_key()?.to_string();
                let value = output.output_value()?.to_string();
                Some((key, value))
            })
            .collect(),
        tags: stack
            .tags()
            .iter()
            .filter_map(|tag| {
                let key = tag.key()?.to_string();
                let value = tag.value()?.to_string();
                Some(StackTag { key, value })
            })
            .collect(),
    }
}

fn to_sdk_tags(tags: &[StackTag]) -> Result<Vec<Tag>> {
    Ok(tags
        .iter()
        .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
        .collect())
}
