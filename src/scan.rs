//! Directory traversal for apiscope (spec.md §6's scanner collaborator,
//! supplied here as a convenience driver — SPEC_FULL.md's Driver Layer
//! module). Modeled directly on `pm_encoder`'s `core::walker::FileWalker`/
//! `DefaultWalker`: same ignore-pattern/size/binary-detection pipeline,
//! emitting `SourceFile` records instead of `FileEntry` records.

use crate::error::{EngineError, Result};
use apiscope_ir::{Language, SourceFile};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait FileWalker: Send + Sync {
    fn walk(&self, root: &str, config: &WalkConfig) -> Result<Vec<SourceFile>>;
    fn should_ignore(&self, path: &str, patterns: &[String]) -> bool;
}

#[derive(Debug, Clone)]
pub struct WalkConfig {
    pub ignore_patterns: Vec<String>,
    pub include_patterns: Vec<String>,
    pub max_file_size: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "vendor".to_string(),
                "target".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".DS_Store".to_string(),
            ],
            include_patterns: vec![],
            max_file_size: 2_097_152,
        }
    }
}

pub struct DefaultWalker;

impl DefaultWalker {
    pub fn new() -> Self {
        Self
    }

    fn build_globset(patterns: &[String]) -> Option<GlobSet> {
        if patterns.is_empty() {
            return None;
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }
        builder.build().ok()
    }

    fn matches_patterns(path: &str, patterns: &[String]) -> bool {
        for pattern in patterns {
            if path == pattern {
                return true;
            }
            if path.split('/').any(|component| component == pattern) {
                return true;
            }
            if let Ok(glob) = Glob::new(pattern) {
                if glob.compile_matcher().is_match(path) {
                    return true;
                }
            }
            if path.starts_with(&format!("{pattern}/")) {
                return true;
            }
        }
        false
    }
}

impl Default for DefaultWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWalker for DefaultWalker {
    fn walk(&self, root: &str, config: &WalkConfig) -> Result<Vec<SourceFile>> {
        let root_path = Path::new(root);
        if !root_path.exists() {
            return Err(EngineError::DirectoryNotFound {
                path: root_path.to_path_buf(),
            });
        }
        if !root_path.is_dir() {
            return Err(EngineError::invalid_config(format!("'{root}' is not a directory")));
        }

        let include_set = Self::build_globset(&config.include_patterns);
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(root).follow_links(false).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let relative_path = path.strip_prefix(root).unwrap_or(path).to_string_lossy().to_string();

            if self.should_ignore(&relative_path, &config.ignore_patterns) {
                continue;
            }
            if let Some(ref include_set) = include_set {
                if !include_set.is_match(&relative_path) {
                    continue;
                }
            }

            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let language = Language::from_extension(extension);
            if language == Language::Other {
                continue;
            }

            let metadata = entry.metadata().ok();
            if let Some(meta) = metadata {
                if meta.len() > config.max_file_size {
                    continue;
                }
            }

            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(_) => continue,
            };
            if is_binary(&bytes) {
                continue;
            }

            files.push(SourceFile::new(relative_path, language, bytes));
        }

        Ok(files)
    }

    fn should_ignore(&self, path: &str, patterns: &[String]) -> bool {
        Self::matches_patterns(path, patterns)
    }
}

/// First-8KB null-byte heuristic, same threshold `pm_encoder::core::walker`
/// uses for its own `is_binary`.
pub fn is_binary(content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    let check_len = content.len().min(8192);
    content[..check_len].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn walk_config_default_ignores_vendor_dirs() {
        let config = WalkConfig::default();
        assert!(config.ignore_patterns.contains(&"node_modules".to_string()));
    }

    #[test]
    fn is_binary_detects_null_bytes() {
        assert!(!is_binary(&[]));
        assert!(is_binary(&[0x00, 0x01]));
        assert!(!is_binary(b"hello"));
    }

    #[test]
    fn default_walker_errors_on_missing_root() {
        let walker = DefaultWalker::new();
        let result = walker.walk("/nonexistent/apiscope/xyz", &WalkConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn default_walker_classifies_language_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.ts"), "const app = 1;").unwrap();
        fs::write(temp_dir.path().join("README.md"), "ignored, unsupported extension").unwrap();

        let walker = DefaultWalker::new();
        let files = walker.walk(temp_dir.path().to_str().unwrap(), &WalkConfig::default()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].language, Language::TypeScript);
    }

    #[test]
    fn should_ignore_matches_directory_components() {
        let walker = DefaultWalker::new();
        assert!(walker.should_ignore("node_modules/pkg/index.js", &["node_modules".to_string()]));
        assert!(!walker.should_ignore("src/main.ts", &[".git".to_string()]));
    }
}
