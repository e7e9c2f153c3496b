//! The deployment orchestrator.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aws::{AwsSettings, FunctionApi, ObjectStore, RemoteStack, StackApi, UpdateOutcome};
use crate::error::{CloudError, ParamsError, Result};
use crate::layout::Workspace;
use crate::package::ArtifactPackager;
use crate::params::{
    ParameterStore, ResolvedParameters, StackType, KEY_DEPLOYMENT_BUCKET,
    KEY_FUNCTION_CODE_BUCKET_KEY, KEY_FUNCTION_NAME, KEY_TEMPLATE_BUCKET_KEY,
};
use crate::render::TemplateRenderer;
use crate::state::{LocalStateStore, StackRecord, StateStore};

use super::plan::{plan_stack_action, StackAction};
use super::scaffold::copy_template_tree;

/// Actor recorded in the `createdBy`/`updatedBy` stack tags.
const ACTOR: &str = concat!("strato/", env!("CARGO_PKG_VERSION"));

/// Drives the stack deployment lifecycle end to end.
///
/// One sequential pipeline per verb: parameters resolve, the template
/// renders, artifacts upload, and only then does the provider see a
/// create, update, or delete. Each step's output is the next step's
/// input, so there is no internal parallelism to reason about.
pub struct DeploymentOrchestrator {
    /// The project workspace.
    workspace: Workspace,
    /// Layered parameter resolution.
    params: ParameterStore,
    /// Template rendering.
    renderer: TemplateRenderer,
    /// Code artifact packaging.
    packager: ArtifactPackager,
    /// Persisted build state.
    state: Box<dyn StateStore>,
    /// S3 artifact storage.
    storage: ObjectStore,
    /// CloudFormation stack API.
    stacks: StackApi,
    /// Lambda function API.
    functions: FunctionApi,
}

impl DeploymentOrchestrator {
    /// Builds an orchestrator with clients from the given settings.
    pub async fn connect(workspace: Workspace, settings: AwsSettings) -> Self {
        let config = settings.load().await;
        let region = AwsSettings::region_name(&config);

        let state: Box<dyn StateStore> = Box::new(LocalStateStore::new(workspace.state_path()));
        let params = ParameterStore::new(workspace.clone());
        let renderer = TemplateRenderer::new(workspace.root());

        Self {
            storage: ObjectStore::new(&config, region),
            stacks: StackApi::new(&config),
            functions: FunctionApi::new(&config),
            packager: ArtifactPackager::new(),
            workspace,
            params,
            renderer,
            state,
        }
    }

    /// Creates or updates the stack, waits for it to settle, and persists
    /// the resulting record.
    ///
    /// # Errors
    ///
    /// Returns an error if any pipeline step fails or the stack settles
    /// in a failure status. A failed run leaves partial progress in
    /// place; re-running the verb is safe and picks up where the provider
    /// left off.
    pub async fn deploy(&self, stack_folder: &str) -> Result<StackRecord> {
        let resolved = self.resolve(stack_folder).await?;
        let body = self.render_stack(&resolved)?;

        let bucket = resolved.require(KEY_DEPLOYMENT_BUCKET)?;
        self.storage.ensure_bucket(bucket).await?;

        if resolved.stack_type == StackType::FunctionCompute {
            let key = resolved.require(KEY_FUNCTION_CODE_BUCKET_KEY)?;
            let summary = self
                .packager
                .package(
                    self.workspace.stack_dir(stack_folder),
                    self.workspace.archive_path(&resolved.stack_name),
                )
                .await?;
            self.storage.put_file(bucket, key, &summary.path).await?;
        }

        let existing = self.stacks.describe(&resolved.stack_name).await?;
        match plan_stack_action(existing.as_ref(), ACTOR, Utc::now()) {
            StackAction::Create { tags } => {
                self.stacks.create(&resolved.stack_name, &body, &tags).await?;
            }
            StackAction::Update { tags } => {
                let outcome = self.stacks.update(&resolved.stack_name, &body, &tags).await?;
                if outcome == UpdateOutcome::NoChanges {
                    debug!("No template changes for {}", resolved.stack_name);
                }
            }
        }

        let settled = self.stacks.wait_for_settled(&resolved.stack_name).await?;

        let record = settled.as_ref().map_or_else(
            || StackRecord::new(&resolved.stack_name, resolved.parameters.clone()),
            |stack| record_from_remote(&resolved, stack),
        );
        self.params
            .persist_stack_record(self.state.as_ref(), stack_folder, Some(record.clone()))
            .await?;

        if let Some(stack) = settled {
            if !stack.is_settled_ok() {
                return Err(CloudError::OperationFailed {
                    stack: resolved.stack_name,
                    status: stack.status,
                }
                .into());
            }
        }

        info!("Deployed stack {}", record.stack_name);
        Ok(record)
    }

    /// Deletes the stack when present and clears its persisted record.
    ///
    /// Absence is a no-op with a logged notice; the stale record is
    /// cleared either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails or settles badly.
    pub async fn remove(&self, stack_folder: &str) -> Result<()> {
        let resolved = self.resolve(stack_folder).await?;

        match self.stacks.describe(&resolved.stack_name).await? {
            Some(_) => {
                self.stacks.delete(&resolved.stack_name).await?;
                if let Some(stack) = self.stacks.wait_for_settled(&resolved.stack_name).await? {
                    if stack.status != "DELETE_COMPLETE" {
                        return Err(CloudError::OperationFailed {
                            stack: resolved.stack_name,
                            status: stack.status,
                        }
                        .into());
                    }
                }
                info!("Removed stack {}", resolved.stack_name);
            }
            None => {
                info!("Stack {} does not exist, nothing to delete", resolved.stack_name);
            }
        }

        self.params
            .persist_stack_record(self.state.as_ref(), stack_folder, None)
            .await
    }

    /// Materializes a new stack working directory from a template tree.
    ///
    /// Refuses with a logged warning, not an error, when the remote stack
    /// already exists, the target folder exists, or inputs are missing.
    ///
    /// # Errors
    ///
    /// Returns an error only when the copy itself fails.
    pub async fn scaffold(&self, stack_folder: &str, template: Option<&str>) -> Result<()> {
        let resolved = self.resolve(stack_folder).await?;

        let Some(template) = template else {
            warn!("A template name is required to scaffold a stack");
            return Ok(());
        };

        if self.stacks.describe(&resolved.stack_name).await?.is_some() {
            warn!("Stack {} already exists", resolved.stack_name);
            return Ok(());
        }

        let target = self.workspace.stack_dir(stack_folder);
        if target.exists() {
            warn!("There is already a stack folder at {}", target.display());
            return Ok(());
        }

        let source = self.workspace.scaffold_template_dir(template);
        if !source.is_dir() {
            warn!("Template '{template}' not found at {}", source.display());
            return Ok(());
        }

        copy_template_tree(&source, &target)?;
        info!("Created stack {} from template {template}", resolved.stack_name);
        Ok(())
    }

    /// Reads the remote stack's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if parameters cannot be resolved.
    pub async fn describe(&self, stack_folder: &str) -> Result<Option<RemoteStack>> {
        let resolved = self.resolve(stack_folder).await?;
        self.stacks.describe(&resolved.stack_name).await
    }

    /// Renders the template and pushes it to storage without deploying.
    ///
    /// Returns the object key the template was uploaded under.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or the upload fails.
    pub async fn upload(&self, stack_folder: &str) -> Result<String> {
        let resolved = self.resolve(stack_folder).await?;
        let body = self.render_stack(&resolved)?;

        let bucket = resolved.require(KEY_DEPLOYMENT_BUCKET)?;
        let key = resolved.require(KEY_TEMPLATE_BUCKET_KEY)?;

        self.storage.ensure_bucket(bucket).await?;
        self.storage
            .put_bytes(bucket, key, body.into_bytes())
            .await?;

        Ok(key.to_string())
    }

    /// Re-reads the remote stack into the persisted record.
    ///
    /// A remotely absent stack clears the stale record, so local state
    /// converges on remote truth either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be updated.
    pub async fn sync(&self, stack_folder: &str) -> Result<Option<StackRecord>> {
        let resolved = self.resolve(stack_folder).await?;

        match self.stacks.describe(&resolved.stack_name).await? {
            Some(stack) => {
                let record = record_from_remote(&resolved, &stack);
                self.params
                    .persist_stack_record(self.state.as_ref(), stack_folder, Some(record.clone()))
                    .await?;
                Ok(Some(record))
            }
            None => {
                warn!(
                    "Stack {} not found remotely, clearing its record",
                    resolved.stack_name
                );
                self.params
                    .persist_stack_record(self.state.as_ref(), stack_folder, None)
                    .await?;
                Ok(None)
            }
        }
    }

    /// Renders, repackages, and pushes function code without a stack
    /// update.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is not a function-compute stack or
    /// any pipeline step fails.
    pub async fn update_code(&self, stack_folder: &str) -> Result<()> {
        let resolved = self.resolve(stack_folder).await?;

        if resolved.stack_type != StackType::FunctionCompute {
            return Err(ParamsError::NotFunctionCompute {
                stack: stack_folder.to_string(),
            }
            .into());
        }

        self.render_stack(&resolved)?;

        let bucket = resolved.require(KEY_DEPLOYMENT_BUCKET)?;
        let key = resolved.require(KEY_FUNCTION_CODE_BUCKET_KEY)?;
        let function = resolved.require(KEY_FUNCTION_NAME)?;

        self.storage.ensure_bucket(bucket).await?;
        let summary = self
            .packager
            .package(
                self.workspace.stack_dir(stack_folder),
                self.workspace.archive_path(&resolved.stack_name),
            )
            .await?;
        self.storage.put_file(bucket, key, &summary.path).await?;

        self.functions.update_code(function, bucket, key).await
    }

    /// Resolves the effective parameters for a stack folder.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails.
    pub async fn resolve(&self, stack_folder: &str) -> Result<ResolvedParameters> {
        self.params.resolve(self.state.as_ref(), stack_folder).await
    }

    fn render_stack(&self, resolved: &ResolvedParameters) -> Result<String> {
        self.renderer.render_file(
            &self.workspace.stack_template_path(&resolved.stack_folder),
            &resolved.flattened(),
            &self.workspace.rendered_template_path(&resolved.stack_name),
        )
    }
}

fn record_from_remote(resolved: &ResolvedParameters, stack: &RemoteStack) -> StackRecord {
    StackRecord {
        parameters: resolved.parameters.clone(),
        stack_name: resolved.stack_name.clone(),
        stack_id: Some(stack.stack_id.clone()),
        description: stack.description.clone(),
        outputs: stack.outputs.clone(),
        stack_status: Some(stack.status.clone()),
    }
}
