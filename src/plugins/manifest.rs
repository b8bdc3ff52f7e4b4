//! Manifest detection helpers (spec.md §4.1's `Detect`, §6's bit-exact
//! manifest keys, §7's error taxonomy). Shared by every plugin so the
//! missing-manifest-is-not-an-error rule is enforced in exactly one place.

use crate::error::{EngineError, Result};
use std::path::Path;

/// Read a manifest file relative to `project_root`. A missing file is
/// folded into `Ok(None)` (spec.md §7: "manifest-missing: silently treated
/// as framework not detected"); any other I/O failure is surfaced.
fn read_manifest(project_root: &str, relative_path: &str) -> Result<Option<String>> {
    let path = Path::new(project_root).join(relative_path);
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(EngineError::from(e).with_context(format!("reading {relative_path}"))),
    }
}

/// `package.json`'s `dependencies`/`devDependencies` contain `package_name`,
/// or (when `prefix_match` is set) any key starting with it.
pub fn package_json_has_dependency(project_root: &str, package_name: &str) -> Result<bool> {
    let Some(contents) = read_manifest(project_root, "package.json")? else {
        return Ok(false);
    };
    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| EngineError::manifest_malformed("package.json", e.to_string()))?;

    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(section).and_then(|v| v.as_object()) {
            if deps.contains_key(package_name) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Same as [`package_json_has_dependency`] but matches any dependency key
/// starting with `prefix` (e.g. `elysia/`, `@elysiajs/`).
pub fn package_json_has_dependency_prefix(project_root: &str, prefix: &str) -> Result<bool> {
    let Some(contents) = read_manifest(project_root, "package.json")? else {
        return Ok(false);
    };
    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| EngineError::manifest_malformed("package.json", e.to_string()))?;

    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(section).and_then(|v| v.as_object()) {
            if deps.keys().any(|k| k.starts_with(prefix)) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// `go.mod`: any line containing `import_path_prefix`.
pub fn go_mod_has_import(project_root: &str, import_path_prefix: &str) -> Result<bool> {
    let Some(contents) = read_manifest(project_root, "go.mod")? else {
        return Ok(false);
    };
    Ok(contents.lines().any(|line| line.contains(import_path_prefix)))
}

/// `Gemfile`: a `gem 'name'` or `gem "name"` line.
pub fn gemfile_has_gem(project_root: &str, gem_name: &str) -> Result<bool> {
    let Some(contents) = read_manifest(project_root, "Gemfile")? else {
        return Ok(false);
    };
    let single = format!("gem '{gem_name}'");
    let double = format!("gem \"{gem_name}\"");
    Ok(contents.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with(&single) || trimmed.starts_with(&double)
    }))
}

/// Presence of a file relative to the project root (e.g. `config/routes.rb`,
/// sufficient alone per spec.md §6).
pub fn file_exists(project_root: &str, relative_path: &str) -> bool {
    Path::new(project_root).join(relative_path).is_file()
}

/// `build.sbt` / `build.sc`: case-insensitive substring match.
pub fn sbt_file_contains(project_root: &str, needle: &str) -> Result<bool> {
    for filename in ["build.sbt", "build.sc"] {
        if let Some(contents) = read_manifest(project_root, filename)? {
            if contents.to_lowercase().contains(&needle.to_lowercase()) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// `build.gradle` / `build.gradle.kts`: substring match.
pub fn gradle_file_contains(project_root: &str, needle: &str) -> Result<bool> {
    for filename in ["build.gradle", "build.gradle.kts"] {
        if let Some(contents) = read_manifest(project_root, filename)? {
            if contents.contains(needle) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
