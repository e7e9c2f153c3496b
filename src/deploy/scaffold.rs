//! Stack scaffolding from template trees.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, StratoError};

/// Recursively copies a scaffold template tree into a new stack folder.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be copied. Existence
/// checks are the caller's responsibility; this function overwrites
/// nothing because the caller refuses existing targets up front.
pub fn copy_template_tree(source: &Path, target: &Path) -> Result<()> {
    info!(
        "Copying template tree {} -> {}",
        source.display(),
        target.display()
    );

    fs::create_dir_all(target)?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| StratoError::internal(format!("Walk failed: {e}")))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| StratoError::internal(format!("Path outside template tree: {e}")))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
            debug!("Copied {}", relative.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copies_nested_tree() {
        let temp = TempDir::new().expect("temp dir");
        let source = temp.path().join("templates").join("lambda-basic");
        fs::create_dir_all(source.join("src")).expect("create source");
        fs::write(source.join("template.yml"), "Resources: {}").expect("write template");
        fs::write(source.join("parameters.json"), "{}").expect("write parameters");
        fs::write(source.join("src/index.js"), "exports.handler = () => {};")
            .expect("write code");

        let target = temp.path().join("stacks").join("worker");
        copy_template_tree(&source, &target).expect("copy");

        assert!(target.join("template.yml").exists());
        assert!(target.join("parameters.json").exists());
        assert!(target.join("src/index.js").exists());
    }
}
