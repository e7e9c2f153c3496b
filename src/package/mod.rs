//! Code artifact packaging.
//!
//! A stack's working directory is archived into one zip artifact for
//! upload. The stack's parameter and template source files are inputs to
//! the build, not runtime payload, so they are excluded. The archive is
//! finished and flushed to disk before this module returns: callers may
//! treat a returned summary as proof the artifact is complete.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PackageError, Result, StratoError};
use crate::layout::{STACK_PARAMETERS_FILE, STACK_TEMPLATE_FILE};

/// Summary of a produced archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Number of files archived.
    pub entries: usize,
    /// Archive size in bytes.
    pub bytes: u64,
    /// Hex-encoded SHA-256 digest of the archive.
    pub digest: String,
}

/// Packages a stack working directory into a deployable archive.
#[derive(Debug, Clone)]
pub struct ArtifactPackager {
    /// File names excluded from the archive.
    excluded: Vec<String>,
}

impl Default for ArtifactPackager {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactPackager {
    /// Creates a packager excluding the stack control files.
    #[must_use]
    pub fn new() -> Self {
        Self {
            excluded: vec![
                STACK_PARAMETERS_FILE.to_string(),
                STACK_TEMPLATE_FILE.to_string(),
            ],
        }
    }

    /// Archives `stack_dir` into a zip at `archive_path`.
    ///
    /// Runs on the blocking pool; resolves only after the archive has
    /// been finished and synced to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack directory is missing or the archive
    /// cannot be written.
    pub async fn package(&self, stack_dir: PathBuf, archive_path: PathBuf) -> Result<ArchiveSummary> {
        let excluded = self.excluded.clone();

        let summary = tokio::task::spawn_blocking(move || {
            build_archive(&stack_dir, &archive_path, &excluded)
        })
        .await
        .map_err(|e| StratoError::internal(format!("Archive task failed: {e}")))??;

        info!(
            "Packaged {} files ({} bytes) into {} (sha256 {})",
            summary.entries,
            summary.bytes,
            summary.path.display(),
            summary.digest
        );

        Ok(summary)
    }
}

fn build_archive(
    stack_dir: &Path,
    archive_path: &Path,
    excluded: &[String],
) -> Result<ArchiveSummary> {
    if !stack_dir.is_dir() {
        return Err(PackageError::SourceNotFound {
            path: stack_dir.to_path_buf(),
        }
        .into());
    }

    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut entries = 0usize;

    for entry in WalkDir::new(stack_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(stack_dir)
            .map_err(|e| PackageError::archive(format!("Path outside stack dir: {e}")))?;

        // Control files are inputs to the build, not payload.
        let is_control = relative.components().count() == 1
            && relative
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| excluded.iter().any(|ex| ex == name));
        if is_control {
            debug!("Excluding control file: {}", relative.display());
            continue;
        }

        let name = relative.to_string_lossy().replace('\\', "/");
        writer
            .start_file(name, options)
            .map_err(|e| PackageError::archive(format!("Failed to start entry: {e}")))?;

        let mut source = File::open(entry.path())?;
        std::io::copy(&mut source, &mut writer)
            .map_err(|e| PackageError::archive(format!("Failed to write entry: {e}")))?;

        entries += 1;
    }

    // The finish + sync below is the completion point: the caller may
    // upload the artifact as soon as this function returns.
    let file = writer
        .finish()
        .map_err(|e| PackageError::archive(format!("Failed to finalize archive: {e}")))?;
    file.sync_all()?;

    let (bytes, digest) = digest_file(archive_path)?;

    Ok(ArchiveSummary {
        path: archive_path.to_path_buf(),
        entries,
        bytes,
        digest,
    })
}

fn digest_file(path: &Path) -> Result<(u64, String)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut total = 0u64;

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    Ok((total, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn populate_stack_dir(dir: &Path) {
        fs::create_dir_all(dir.join("src")).expect("create src");
        fs::write(dir.join("parameters.json"), "{}").expect("write parameters");
        fs::write(dir.join("template.yml"), "Resources: {}").expect("write template");
        fs::write(dir.join("index.js"), "exports.handler = () => {};").expect("write code");
        fs::write(dir.join("src/util.js"), "module.exports = {};").expect("write nested code");
    }

    #[tokio::test]
    async fn test_package_excludes_control_files() {
        let temp = TempDir::new().expect("temp dir");
        let stack_dir = temp.path().join("stacks").join("worker");
        fs::create_dir_all(&stack_dir).expect("create stack dir");
        populate_stack_dir(&stack_dir);

        let archive_path = temp.path().join("build").join("worker.zip");
        let packager = ArtifactPackager::new();
        let summary = packager
            .package(stack_dir, archive_path.clone())
            .await
            .expect("package");

        assert_eq!(summary.entries, 2);
        assert!(summary.bytes > 0);
        assert_eq!(summary.digest.len(), 64);

        let archive = zip::ZipArchive::new(File::open(&archive_path).expect("open archive"))
            .expect("read archive");
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"index.js"));
        assert!(names.contains(&"src/util.js"));
        assert!(!names.contains(&"parameters.json"));
        assert!(!names.contains(&"template.yml"));
    }

    #[tokio::test]
    async fn test_nested_control_file_names_are_kept() {
        let temp = TempDir::new().expect("temp dir");
        let stack_dir = temp.path().join("worker");
        fs::create_dir_all(stack_dir.join("config")).expect("create dir");
        // Only top-level control files are excluded.
        fs::write(stack_dir.join("config/parameters.json"), "{}").expect("write nested");

        let packager = ArtifactPackager::new();
        let summary = packager
            .package(stack_dir, temp.path().join("worker.zip"))
            .await
            .expect("package");

        assert_eq!(summary.entries, 1);
    }

    #[tokio::test]
    async fn test_missing_stack_dir_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let packager = ArtifactPackager::new();

        let result = packager
            .package(temp.path().join("absent"), temp.path().join("out.zip"))
            .await;
        assert!(result.is_err());
    }
}
