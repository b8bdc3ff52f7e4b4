//! Error types for apiscope-ir.
//!
//! Parsing of a single framework call-site is recoverable: a malformed
//! route declaration should not abort the whole scan, only be skipped with
//! a diagnostic (spec.md §6, §9). `ParseError` therefore carries no partial
//! payload of its own — callers collect `Vec<AstError>` per file and keep
//! going, the same recoverable-error posture `pm_encoder`'s `AstError`
//! takes with its `ParseError { partial, .. }` variant.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AstError>;

#[derive(Error, Debug, Clone)]
pub enum AstError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("parse error in {file}: {message}")]
    ParseError { file: String, message: String },

    #[error("tree-sitter error: {0}")]
    TreeSitterError(String),

    #[error("schema translation error: {0}")]
    SchemaError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AstError>,
    },
}

impl AstError {
    pub fn parse_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        AstError::ParseError {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn with_context(self, context: impl Into<String>) -> Self {
        AstError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for attaching context to a `Result<T, AstError>`,
/// mirroring the teacher's `ResultExt::context`.
pub trait ResultExt<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_file_and_message() {
        let err = AstError::parse_error("app.ts", "unexpected token");
        let rendered = err.to_string();
        assert!(rendered.contains("app.ts"));
        assert!(rendered.contains("unexpected token"));
    }

    #[test]
    fn context_wraps_without_losing_source() {
        let err: Result<()> = Err(AstError::UnsupportedLanguage("kotlin-native".into()));
        let wrapped = err.context("extracting routes").unwrap_err();
        assert!(wrapped.to_string().contains("extracting routes"));
        assert!(wrapped.to_string().contains("kotlin-native"));
    }
}
