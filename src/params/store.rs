//! Layered parameter loading and resolution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ParamsError, Result};
use crate::layout::{Workspace, BUILD_DIR};
use crate::render::substitute;
use crate::state::{StackRecord, StateStore};

use super::set::{flatten, merge, ParameterSet};
use super::stack_type::StackType;
use super::{
    KEY_DEPLOYMENT_BUCKET, KEY_PROJECT_NAME, KEY_STACK_FOLDER, KEY_STACK_ID, KEY_STACK_NAME,
    KEY_TEMPLATE_BUCKET_KEY, KEY_TEMPLATE_OUTPUT_PATH,
};

/// The fully resolved parameter set for one run against one stack.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedParameters {
    /// The stack's working directory name under `stacks/`.
    pub stack_folder: String,
    /// The derived remote stack name (`<projectName>-<stackId>`).
    pub stack_name: String,
    /// The stack's type.
    pub stack_type: StackType,
    /// The effective merged parameter set, synthetic fields included.
    pub parameters: ParameterSet,
}

impl ResolvedParameters {
    /// The flattened view used for template substitution.
    #[must_use]
    pub fn flattened(&self) -> HashMap<String, String> {
        flatten(&self.parameters)
    }

    /// Looks up a string-valued parameter.
    #[must_use]
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Looks up a string-valued parameter, failing when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::MissingKey`] when the key has no string value.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.str_value(key).ok_or_else(|| {
            ParamsError::MissingKey {
                key: key.to_string(),
            }
            .into()
        })
    }
}

/// Loads, merges, and persists the layered parameter configuration.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    /// The workspace the layers are read from.
    workspace: Workspace,
}

impl ParameterStore {
    /// Creates a parameter store over a workspace.
    #[must_use]
    pub const fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Loads one parameter layer from a JSON file.
    ///
    /// The raw text is run through the template variable-substitution
    /// pass against `context` before parsing, so configuration files can
    /// reference previously-resolved values. A missing or unparseable
    /// file yields an empty layer with a logged warning: deployment
    /// tooling must tolerate first-run absence of generated files.
    #[must_use]
    pub fn load_layer(&self, path: &Path, context: &HashMap<String, String>) -> ParameterSet {
        let raw = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                warn!("{} does not exist, using an empty layer", path.display());
                return ParameterSet::new();
            }
        };

        let substituted = substitute(&raw, context);

        match serde_json::from_str::<Value>(&substituted) {
            Ok(Value::Object(map)) => {
                debug!("Loaded parameter layer: {}", path.display());
                map
            }
            Ok(_) => {
                warn!(
                    "{} is not a JSON object, using an empty layer",
                    path.display()
                );
                ParameterSet::new()
            }
            Err(e) => {
                warn!(
                    "Failed to parse {}, using an empty layer: {e}",
                    path.display()
                );
                ParameterSet::new()
            }
        }
    }

    /// Resolves the effective parameter set for a stack folder.
    ///
    /// Loads the project layer, seeds it into the persisted build-state
    /// layer, loads the stack layer (substituting against the build
    /// layer), merges in precedence order (stack over build over
    /// project), derives the stack identity and synthetic fields, and
    /// applies the stack type's own derivation.
    ///
    /// # Errors
    ///
    /// Returns an error if the build state cannot be read or written, or
    /// if no project name is configured anywhere.
    pub async fn resolve(
        &self,
        state: &dyn StateStore,
        stack_folder: &str,
    ) -> Result<ResolvedParameters> {
        let project = self.load_layer(&self.workspace.project_parameters_path(), &HashMap::new());

        let mut build_state = state.load().await?.unwrap_or_default();
        build_state.absorb(&project);
        state.save(&build_state).await?;

        let context = flatten(&build_state.parameters);
        let stack = self.load_layer(&self.workspace.stack_parameters_path(stack_folder), &context);

        let mut parameters = merge(&[&project, &build_state.parameters, &stack]);

        let project_name = parameters
            .get(KEY_PROJECT_NAME)
            .and_then(Value::as_str)
            .ok_or_else(|| ParamsError::MissingKey {
                key: KEY_PROJECT_NAME.to_string(),
            })?
            .to_string();

        let stack_id = parameters
            .get(KEY_STACK_ID)
            .and_then(Value::as_str)
            .unwrap_or(stack_folder)
            .to_string();
        let stack_name = format!("{project_name}-{stack_id}");

        parameters.insert(
            KEY_STACK_FOLDER.to_string(),
            Value::String(stack_folder.to_string()),
        );
        parameters.insert(KEY_STACK_NAME.to_string(), Value::String(stack_name.clone()));
        parameters.insert(
            KEY_DEPLOYMENT_BUCKET.to_string(),
            Value::String(format!(
                "{}-deploymentbucket",
                project_name.to_lowercase()
            )),
        );
        parameters.insert(
            KEY_TEMPLATE_BUCKET_KEY.to_string(),
            Value::String(format!("{stack_folder}/{stack_name}.yml")),
        );
        parameters.insert(
            KEY_TEMPLATE_OUTPUT_PATH.to_string(),
            Value::String(format!("{BUILD_DIR}/{stack_name}.yml")),
        );

        let stack_type = StackType::from_parameters(&parameters);
        stack_type.derive(&mut parameters);

        info!("Resolved parameters for stack {stack_name} ({stack_type})");

        Ok(ResolvedParameters {
            stack_folder: stack_folder.to_string(),
            stack_name,
            stack_type,
            parameters,
        })
    }

    /// Upserts or deletes the persisted record for a stack key.
    ///
    /// `None` clears the record, which is what `remove` uses. Every call
    /// rewrites the whole build-state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the build state cannot be read or written.
    pub async fn persist_stack_record(
        &self,
        state: &dyn StateStore,
        stack_key: &str,
        record: Option<StackRecord>,
    ) -> Result<()> {
        let mut build_state = state.load().await?.unwrap_or_default();

        match record {
            Some(record) => {
                info!("Persisting stack record: {stack_key}");
                build_state.upsert_stack(stack_key, record);
            }
            None => {
                if build_state.remove_stack(stack_key).is_some() {
                    info!("Cleared stack record: {stack_key}");
                } else {
                    debug!("No stack record to clear for: {stack_key}");
                }
            }
        }

        state.save(&build_state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BuildState, LocalStateStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn workspace_with_project(project: &Value) -> (Workspace, LocalStateStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let workspace = Workspace::new(temp.path());
        fs::write(
            workspace.project_parameters_path(),
            serde_json::to_string_pretty(project).expect("serialize"),
        )
        .expect("write project parameters");
        let store = LocalStateStore::new(workspace.state_path());
        (workspace, store, temp)
    }

    fn write_stack_parameters(workspace: &Workspace, folder: &str, value: &Value) {
        let dir = workspace.stack_dir(folder);
        fs::create_dir_all(&dir).expect("create stack dir");
        fs::write(
            workspace.stack_parameters_path(folder),
            serde_json::to_string_pretty(value).expect("serialize"),
        )
        .expect("write stack parameters");
    }

    #[tokio::test]
    async fn test_resolve_derives_stack_identity() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "projectName": "Acme" }));
        let store = ParameterStore::new(workspace);

        let resolved = store.resolve(&state, "api").await.expect("resolve");

        assert_eq!(resolved.stack_name, "Acme-api");
        assert_eq!(resolved.str_value("stackFolder"), Some("api"));
        assert_eq!(
            resolved.str_value("deploymentBucketName"),
            Some("acme-deploymentbucket")
        );
        assert_eq!(
            resolved.str_value("templateBucketKey"),
            Some("api/Acme-api.yml")
        );
        assert_eq!(resolved.stack_type, StackType::Generic);
    }

    #[tokio::test]
    async fn test_layer_precedence_stack_over_build_over_project() {
        let (workspace, state, _temp) = workspace_with_project(
            &json!({ "projectName": "Acme", "shared": "project", "base": "project" }),
        );

        // Pre-existing accumulated build value for "shared".
        let mut build_state = BuildState::default();
        let Value::Object(accumulated) = json!({ "shared": "build", "stage": "build" }) else {
            unreachable!()
        };
        build_state.absorb(&accumulated);
        state.save(&build_state).await.expect("seed state");

        write_stack_parameters(&workspace, "api", &json!({ "stage": "stack" }));

        let store = ParameterStore::new(workspace);
        let resolved = store.resolve(&state, "api").await.expect("resolve");

        assert_eq!(resolved.str_value("shared"), Some("build"));
        assert_eq!(resolved.str_value("stage"), Some("stack"));
        assert_eq!(resolved.str_value("base"), Some("project"));
    }

    #[tokio::test]
    async fn test_stack_layer_substitutes_against_lower_layers() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "projectName": "Acme" }));
        write_stack_parameters(
            &workspace,
            "api",
            &json!({ "tableName": "${projectName}-records" }),
        );

        let store = ParameterStore::new(workspace);
        let resolved = store.resolve(&state, "api").await.expect("resolve");

        assert_eq!(resolved.str_value("tableName"), Some("Acme-records"));
    }

    #[tokio::test]
    async fn test_missing_stack_layer_is_soft() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "projectName": "Acme" }));
        let store = ParameterStore::new(workspace);

        // No stacks/api directory at all: first-run scaffolding case.
        let resolved = store.resolve(&state, "api").await.expect("resolve");
        assert_eq!(resolved.stack_name, "Acme-api");
    }

    #[tokio::test]
    async fn test_missing_project_name_is_fatal() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "region": "us-east-1" }));
        let store = ParameterStore::new(workspace);

        assert!(store.resolve(&state, "api").await.is_err());
    }

    #[tokio::test]
    async fn test_explicit_stack_id_overrides_folder() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "projectName": "Acme" }));
        write_stack_parameters(&workspace, "api-v2", &json!({ "stackId": "api" }));

        let store = ParameterStore::new(workspace);
        let resolved = store.resolve(&state, "api-v2").await.expect("resolve");

        assert_eq!(resolved.stack_name, "Acme-api");
        // The folder keeps driving storage keys.
        assert_eq!(
            resolved.str_value("templateBucketKey"),
            Some("api-v2/Acme-api.yml")
        );
    }

    #[tokio::test]
    async fn test_function_compute_resolution() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "projectName": "Acme" }));
        write_stack_parameters(&workspace, "worker", &json!({ "stackType": "AWS_LAMBDA" }));

        let store = ParameterStore::new(workspace);
        let resolved = store.resolve(&state, "worker").await.expect("resolve");

        assert_eq!(resolved.stack_type, StackType::FunctionCompute);
        assert_eq!(resolved.str_value("functionName"), Some("Acme-worker"));
        assert_eq!(
            resolved.str_value("functionCodeBucketKey"),
            Some("worker/Acme-worker.zip")
        );
    }

    #[tokio::test]
    async fn test_persist_and_clear_stack_record() {
        let (workspace, state, _temp) = workspace_with_project(&json!({ "projectName": "Acme" }));
        let store = ParameterStore::new(workspace);

        store
            .persist_stack_record(
                &state,
                "api",
                Some(StackRecord::new("Acme-api", ParameterSet::new())),
            )
            .await
            .expect("persist");

        let loaded = state.load().await.expect("load").expect("state exists");
        assert!(loaded.stacks.contains_key("api"));

        // Clearing an absent record is a no-op that still rewrites state.
        store
            .persist_stack_record(&state, "api", None)
            .await
            .expect("clear");
        store
            .persist_stack_record(&state, "api", None)
            .await
            .expect("clear again");

        let loaded = state.load().await.expect("load").expect("state exists");
        assert!(loaded.stacks.is_empty());
    }
}
