//! Workspace layout and path derivation.
//!
//! Every file the tool reads or writes is located relative to the project
//! root through this module, so the storage-key and build-path scheme that
//! makes deployments idempotent lives in exactly one place.

use std::path::{Path, PathBuf};

/// Project-wide parameter file name.
pub const PROJECT_PARAMETERS_FILE: &str = "parameters.json";

/// Per-stack parameter file name.
pub const STACK_PARAMETERS_FILE: &str = "parameters.json";

/// Stack template source file name.
pub const STACK_TEMPLATE_FILE: &str = "template.yml";

/// Directory holding stack working directories.
pub const STACKS_DIR: &str = "stacks";

/// Directory receiving rendered templates, archives, and build state.
pub const BUILD_DIR: &str = "build";

/// Directory holding scaffold template trees for the `create` verb.
pub const TEMPLATES_DIR: &str = "templates";

/// Build state file name, inside [`BUILD_DIR`].
pub const STATE_FILE: &str = "state.json";

/// A project workspace rooted at a directory on disk.
///
/// The layout mirrors the persisted interface of the tool:
///
/// ```text
/// parameters.json              project parameter layer
/// stacks/<folder>/             one working directory per stack
///   parameters.json            stack parameter layer
///   template.yml               template source
///   ...                        function code payload
/// build/state.json             persisted build state
/// build/<stackName>.yml        rendered template
/// build/<stackName>.zip        packaged code artifact
/// templates/<name>/            scaffold sources
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Project root directory.
    root: PathBuf,
}

impl Workspace {
    /// Creates a workspace rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the project-wide parameter file.
    #[must_use]
    pub fn project_parameters_path(&self) -> PathBuf {
        self.root.join(PROJECT_PARAMETERS_FILE)
    }

    /// Path to a stack's working directory.
    #[must_use]
    pub fn stack_dir(&self, folder: &str) -> PathBuf {
        self.root.join(STACKS_DIR).join(folder)
    }

    /// Path to a stack's parameter file.
    #[must_use]
    pub fn stack_parameters_path(&self, folder: &str) -> PathBuf {
        self.stack_dir(folder).join(STACK_PARAMETERS_FILE)
    }

    /// Path to a stack's template source file.
    #[must_use]
    pub fn stack_template_path(&self, folder: &str) -> PathBuf {
        self.stack_dir(folder).join(STACK_TEMPLATE_FILE)
    }

    /// Path to the build output directory.
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Path to the persisted build state file.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.build_dir().join(STATE_FILE)
    }

    /// Path the rendered template for a stack is written to.
    #[must_use]
    pub fn rendered_template_path(&self, stack_name: &str) -> PathBuf {
        self.build_dir().join(format!("{stack_name}.yml"))
    }

    /// Path the packaged code artifact for a stack is written to.
    #[must_use]
    pub fn archive_path(&self, stack_name: &str) -> PathBuf {
        self.build_dir().join(format!("{stack_name}.zip"))
    }

    /// Path to a scaffold template tree.
    #[must_use]
    pub fn scaffold_template_dir(&self, template: &str) -> PathBuf {
        self.root.join(TEMPLATES_DIR).join(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_derivation() {
        let ws = Workspace::new("/proj");

        assert_eq!(
            ws.project_parameters_path(),
            PathBuf::from("/proj/parameters.json")
        );
        assert_eq!(
            ws.stack_parameters_path("api"),
            PathBuf::from("/proj/stacks/api/parameters.json")
        );
        assert_eq!(
            ws.stack_template_path("api"),
            PathBuf::from("/proj/stacks/api/template.yml")
        );
        assert_eq!(ws.state_path(), PathBuf::from("/proj/build/state.json"));
        assert_eq!(
            ws.rendered_template_path("Acme-api"),
            PathBuf::from("/proj/build/Acme-api.yml")
        );
        assert_eq!(
            ws.archive_path("Acme-api"),
            PathBuf::from("/proj/build/Acme-api.zip")
        );
        assert_eq!(
            ws.scaffold_template_dir("lambda-basic"),
            PathBuf::from("/proj/templates/lambda-basic")
        );
    }
}
