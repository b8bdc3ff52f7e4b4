//! Error types for the apiscope engine crate (spec.md §7): manifest I/O and
//! registry-conflict failures, separate from `apiscope_ir::AstError`'s
//! per-file parse-recovery concerns.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("manifest file malformed: {path}: {message}")]
    ManifestMalformed { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// spec.md §4.2, §7: duplicate plugin name at registration time — fatal
    /// at startup, never recovered from.
    #[error("duplicate plugin registered: {0}")]
    RegistryConflict(String),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        EngineError::InvalidConfig(message.into())
    }

    pub fn manifest_malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EngineError::ManifestMalformed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub trait ResultExt<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(ctx))
    }
}
