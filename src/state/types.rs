//! Build state types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::{ParameterSet, KEY_PROJECT_NAME};

/// The persisted build state document.
///
/// The accumulated parameters sit flattened at the top level of the JSON
/// document (`projectName`, ...), with the per-stack records under the
/// `stacks` key. `stacks` is therefore a reserved parameter name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildState {
    /// Parameters accumulated across runs, lowest-but-one precedence layer.
    #[serde(flatten)]
    pub parameters: ParameterSet,

    /// Last-known record per stack key.
    #[serde(default)]
    pub stacks: BTreeMap<String, StackRecord>,
}

impl BuildState {
    /// Seeds the accumulated parameters with a lower-precedence layer.
    ///
    /// Keys already accumulated keep their value: the build layer sits
    /// above the project layer in precedence, so absorbing the project
    /// file must never shadow a value computed on an earlier run.
    pub fn absorb(&mut self, layer: &ParameterSet) {
        for (key, value) in layer {
            self.parameters
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// The project name, when one has been absorbed.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.parameters.get(KEY_PROJECT_NAME).and_then(Value::as_str)
    }

    /// Inserts or replaces the record for a stack key.
    pub fn upsert_stack(&mut self, key: &str, record: StackRecord) {
        self.stacks.insert(key.to_string(), record);
    }

    /// Removes the record for a stack key, returning it if present.
    pub fn remove_stack(&mut self, key: &str) -> Option<StackRecord> {
        self.stacks.remove(key)
    }
}

/// Last-known metadata for one deployed stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackRecord {
    /// The resolved parameters the stack was last deployed with.
    pub parameters: ParameterSet,

    /// The remote stack name.
    pub stack_name: String,

    /// The remote-assigned stack identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,

    /// The stack description reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Output key/value mapping reported by the provider.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,

    /// The last observed stack status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_status: Option<String>,
}

impl StackRecord {
    /// Creates a record holding only resolved parameters, before any
    /// remote metadata is known.
    #[must_use]
    pub fn new(stack_name: &str, parameters: ParameterSet) -> Self {
        Self {
            parameters,
            stack_name: stack_name.to_string(),
            stack_id: None,
            description: None,
            outputs: BTreeMap::new(),
            stack_status: None,
        }
    }
}
