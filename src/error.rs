//! Error types for the Strato deployment tool.
//!
//! This module provides the error hierarchy for all operations in the
//! deployment lifecycle: parameter resolution, template rendering, build
//! state management, artifact packaging, and AWS calls.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Strato deployment tool.
#[derive(Debug, Error)]
pub enum StratoError {
    /// Parameter resolution errors.
    #[error("Parameter error: {0}")]
    Params(#[from] ParamsError),

    /// Template rendering errors.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Build state errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// AWS service errors.
    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),

    /// Artifact packaging errors.
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Parameter resolution errors.
///
/// A missing or unparseable parameter file is deliberately NOT an error:
/// the store recovers it as an empty layer so a first run against a fresh
/// workspace succeeds. These variants cover conditions the tool cannot
/// proceed past.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// A required parameter key is absent after merging all layers.
    #[error("Missing required parameter: {key}")]
    MissingKey {
        /// Name of the missing key.
        key: String,
    },

    /// A verb was invoked against a stack whose type does not support it.
    #[error("Stack '{stack}' is not a function-compute stack")]
    NotFunctionCompute {
        /// The stack folder.
        stack: String,
    },
}

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The stack's template source file was not found.
    #[error("Template not found: {path}")]
    TemplateNotFound {
        /// Path to the missing template.
        path: PathBuf,
    },

    /// A `${file(...)}` inclusion target was not found.
    ///
    /// The rendered document would be incomplete without it, so this is
    /// fatal, unlike an unresolved variable.
    #[error("Included file not found: {path}")]
    IncludeNotFound {
        /// Path to the missing inclusion.
        path: PathBuf,
    },

    /// The rendered output could not be written.
    #[error("Failed to write rendered template to {path}: {message}")]
    OutputFailed {
        /// Destination path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Build state errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state file exists but could not be parsed.
    #[error("Build state is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// The state could not be serialized.
    #[error("Build state serialization failed: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The state file could not be written.
    #[error("Failed to write build state: {message}")]
    WriteFailed {
        /// Description of the write failure.
        message: String,
    },
}

/// AWS service errors.
///
/// A failed describe/existence check is never surfaced through this type;
/// absence is a normal negative result. Everything else is logged and
/// re-raised to abort the current verb.
#[derive(Debug, Error)]
pub enum CloudError {
    /// An S3 operation failed.
    #[error("Object storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },

    /// A CloudFormation operation failed.
    #[error("Stack API error: {message}")]
    Stack {
        /// Description of the failure.
        message: String,
    },

    /// A Lambda operation failed.
    #[error("Function API error: {message}")]
    Function {
        /// Description of the failure.
        message: String,
    },

    /// A stack operation settled in a failure status.
    #[error("Stack '{stack}' settled in status {status}")]
    OperationFailed {
        /// The stack name.
        stack: String,
        /// The terminal status reported by the provider.
        status: String,
    },

    /// A stack operation did not settle within the polling deadline.
    #[error("Timed out waiting for stack '{stack}' to settle")]
    Timeout {
        /// The stack name.
        stack: String,
    },
}

/// Artifact packaging errors.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The archive could not be produced.
    #[error("Failed to build archive: {message}")]
    Archive {
        /// Description of the failure.
        message: String,
    },

    /// The source directory to package does not exist.
    #[error("Stack directory not found: {path}")]
    SourceNotFound {
        /// Path to the missing directory.
        path: PathBuf,
    },
}

/// Result type alias for Strato operations.
pub type Result<T> = std::result::Result<T, StratoError>;

impl StratoError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl CloudError {
    /// Creates an object storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a stack API error with the given message.
    #[must_use]
    pub fn stack(message: impl Into<String>) -> Self {
        Self::Stack {
            message: message.into(),
        }
    }

    /// Creates a function API error with the given message.
    #[must_use]
    pub fn function(message: impl Into<String>) -> Self {
        Self::Function {
            message: message.into(),
        }
    }
}

impl StateError {
    /// Creates a corruption error with the given message.
    #[must_use]
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl PackageError {
    /// Creates an archive error with the given message.
    #[must_use]
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }
}
