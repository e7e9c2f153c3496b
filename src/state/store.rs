//! Build state storage.
//!
//! The build state is one JSON file rewritten in full on every mutation.
//! Writes go through a temporary file and an atomic rename so a killed
//! process never leaves a half-written document. There is no
//! cross-process locking: the tool assumes a single operator or CI job
//! per workspace, and concurrent writers are last-writer-wins. That is a
//! documented constraint of the design, not an oversight.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, StateError};

use super::types::BuildState;

/// Trait for build state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the build state.
    ///
    /// Returns `None` if no state has been written yet.
    async fn load(&self) -> Result<Option<BuildState>>;

    /// Saves the build state, replacing the previous document.
    async fn save(&self, state: &BuildState) -> Result<()>;

    /// Deletes the build state.
    async fn delete(&self) -> Result<()>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl StateStore for Box<dyn StateStore> {
    async fn load(&self) -> Result<Option<BuildState>> {
        (**self).load().await
    }

    async fn save(&self, state: &BuildState) -> Result<()> {
        (**self).save(state).await
    }

    async fn delete(&self) -> Result<()> {
        (**self).delete().await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}

/// File-based build state store.
#[derive(Debug)]
pub struct LocalStateStore {
    /// Path to the state file.
    state_path: PathBuf,
}

impl LocalStateStore {
    /// Creates a store backed by the given state file path.
    #[must_use]
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.state_path.parent() {
            if !parent.exists() {
                debug!("Creating state directory: {}", parent.display());
                fs::create_dir_all(parent).await.map_err(|e| {
                    StateError::WriteFailed {
                        message: format!("Failed to create state directory: {e}"),
                    }
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<Option<BuildState>> {
        if !self.state_path.exists() {
            debug!("State file does not exist: {}", self.state_path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.state_path).await.map_err(|e| {
            StateError::corrupted(format!("Failed to read state file: {e}"))
        })?;

        let state: BuildState = serde_json::from_str(&content).map_err(|e| {
            StateError::corrupted(format!("Failed to parse state file: {e}"))
        })?;

        debug!("Loaded build state from: {}", self.state_path.display());
        Ok(Some(state))
    }

    async fn save(&self, state: &BuildState) -> Result<()> {
        self.ensure_parent_dir().await?;

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            StateError::serialization(format!("Failed to serialize state: {e}"))
        })?;

        // Write to a temporary file first, then rename for atomicity.
        let temp_path = self.state_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            StateError::WriteFailed {
                message: format!("Failed to create temp state file: {e}"),
            }
        })?;

        file.write_all(content.as_bytes()).await.map_err(|e| {
            StateError::WriteFailed {
                message: format!("Failed to write state file: {e}"),
            }
        })?;

        file.sync_all().await.map_err(|e| StateError::WriteFailed {
            message: format!("Failed to sync state file: {e}"),
        })?;

        fs::rename(&temp_path, &self.state_path).await.map_err(|e| {
            StateError::WriteFailed {
                message: format!("Failed to rename state file: {e}"),
            }
        })?;

        info!("Build state saved: {}", self.state_path.display());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        if self.state_path.exists() {
            info!("Deleting state file: {}", self.state_path.display());
            fs::remove_file(&self.state_path).await.map_err(|e| {
                StateError::WriteFailed {
                    message: format!("Failed to delete state file: {e}"),
                }
            })?;
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;
    use crate::state::StackRecord;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn create_test_store() -> (LocalStateStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = LocalStateStore::new(temp_dir.path().join("build").join("state.json"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = create_test_store();

        let mut state = BuildState::default();
        let Value::Object(layer) = json!({ "projectName": "Acme" }) else {
            unreachable!()
        };
        state.absorb(&layer);
        store.save(&state).await.expect("Failed to save state");

        let loaded = store
            .load()
            .await
            .expect("Failed to load state")
            .expect("State should exist");

        assert_eq!(loaded.project_name(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _temp) = create_test_store();

        let result = store.load().await.expect("Load should not fail");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_remove_record_persist() {
        let (store, _temp) = create_test_store();

        let mut state = BuildState::default();
        state.upsert_stack("api", StackRecord::new("Acme-api", ParameterSet::new()));
        store.save(&state).await.expect("save");

        let mut loaded = store.load().await.expect("load").expect("state exists");
        assert!(loaded.stacks.contains_key("api"));

        loaded.remove_stack("api");
        store.save(&loaded).await.expect("save");

        let final_state = store.load().await.expect("load").expect("state exists");
        assert!(final_state.stacks.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = create_test_store();

        store.save(&BuildState::default()).await.expect("save");
        store.delete().await.expect("delete");

        assert!(store.load().await.expect("load").is_none());
    }
}
