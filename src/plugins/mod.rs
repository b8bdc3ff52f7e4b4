//! Framework plugin contract and registry (spec.md §4.1, §4.2). Mirrors the
//! teacher's `PluginEngine` discover→execute→collect lifecycle split, but
//! the "plugins" here are compiled-in extractors, not dynamically loaded
//! modules — `MustRegister` plays the role of
//! `PluginEngine`'s discovery phase.

pub mod manifest;

pub mod echo;
pub mod elysia;
pub mod express;
pub mod koa;
pub mod ktor;
pub mod nestjs;
pub mod rails;
pub mod tapir;

use crate::error::{EngineError, Result};
use apiscope_ir::{Route, Schema, SchemaRegistry, SourceFile};
use std::sync::OnceLock;

/// `{Name, Version, Description, SupportedFrameworks}` (spec.md §6).
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub supported_frameworks: &'static [&'static str],
}

/// One {host language × web framework} extractor (spec.md §4.1).
pub trait FrameworkPlugin: Send + Sync {
    fn info(&self) -> PluginInfo;

    fn name(&self) -> &'static str {
        self.info().name
    }

    /// File extensions this plugin may consume, e.g. `[".ts", ".tsx"]`.
    fn extensions(&self) -> &'static [&'static str];

    /// Inspect conventional manifest files to decide whether the framework
    /// is in use. Only manifest-malformed errors are surfaced; a missing
    /// manifest yields `Ok(false)` (spec.md §7).
    fn detect(&self, project_root: &str) -> Result<bool>;

    /// Never fatal: per-file parse errors are swallowed, other files
    /// continue (spec.md §4.1, §4.7).
    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route>;

    /// May register named schemas into `registry` as a side effect
    /// (spec.md §4.5).
    fn extract_schemas(&self, files: &[SourceFile], registry: &SchemaRegistry) -> Vec<Schema>;
}

/// Process-wide ordered collection of registered plugins (spec.md §3, §4.2).
/// Registration order is preserved so multi-framework monoliths produce
/// deterministic dispatch order.
pub struct Registry {
    plugins: Vec<Box<dyn FrameworkPlugin>>,
}

impl Registry {
    fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    /// Panics on a duplicate plugin name — spec.md §4.2's "fails fast if a
    /// plugin name repeats", §7's "registry-conflict: fatal at startup".
    pub fn must_register(&mut self, plugin: Box<dyn FrameworkPlugin>) {
        let name = plugin.name();
        if self.plugins.iter().any(|p| p.name() == name) {
            panic!("{}", EngineError::RegistryConflict(name.to_string()));
        }
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Box<dyn FrameworkPlugin>] {
        &self.plugins
    }

    /// Runs `Detect` for every registered plugin, then `ExtractRoutes`/
    /// `ExtractSchemas` for the ones that apply, merging results in
    /// registration order (spec.md §4.2).
    pub fn dispatch(&self, project_root: &str, files: &[SourceFile]) -> Result<DispatchResult> {
        let registry = SchemaRegistry::new();
        let mut routes = Vec::new();
        let mut applied = Vec::new();

        for plugin in &self.plugins {
            let relevant: Vec<SourceFile> = files
                .iter()
                .filter(|f| plugin.extensions().iter().any(|ext| f.path.ends_with(ext)))
                .cloned()
                .collect();
            if relevant.is_empty() {
                continue;
            }
            if !plugin.detect(project_root)? {
                continue;
            }

            routes.extend(plugin.extract_routes(&relevant));
            // `ExtractSchemas` registers named schemas into `registry` as a
            // side effect (spec.md §4.5); the returned list is redundant
            // with what lands in the registry, so only the registry's
            // snapshot feeds the final output.
            let _ = plugin.extract_schemas(&relevant, &registry);
            applied.push(plugin.name());
        }

        Ok(DispatchResult {
            routes,
            schemas: registry.snapshot().into_iter().collect(),
            applied_plugins: applied,
        })
    }
}

pub struct DispatchResult {
    pub routes: Vec<Route>,
    pub schemas: Vec<(String, Schema)>,
    pub applied_plugins: Vec<&'static str>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, built once with every plugin this build
/// carries (spec.md §3's "populated once at startup").
pub fn global_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut registry = Registry::new();
        registry.must_register(Box::new(express::ExpressPlugin));
        registry.must_register(Box::new(elysia::ElysiaPlugin));
        registry.must_register(Box::new(koa::KoaPlugin));
        registry.must_register(Box::new(nestjs::NestJsPlugin));
        registry.must_register(Box::new(echo::EchoPlugin));
        registry.must_register(Box::new(rails::RailsPlugin));
        registry.must_register(Box::new(tapir::TapirPlugin));
        registry.must_register(Box::new(ktor::KtorPlugin));
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiscope_ir::Language;

    struct StubPlugin(&'static str);

    impl FrameworkPlugin for StubPlugin {
        fn info(&self) -> PluginInfo {
            PluginInfo {
                name: self.0,
                version: "0.1.0",
                description: "stub",
                supported_frameworks: &["stub"],
            }
        }
        fn extensions(&self) -> &'static [&'static str] {
            &[".ts"]
        }
        fn detect(&self, _project_root: &str) -> Result<bool> {
            Ok(true)
        }
        fn extract_routes(&self, _files: &[SourceFile]) -> Vec<Route> {
            Vec::new()
        }
        fn extract_schemas(&self, _files: &[SourceFile], _registry: &SchemaRegistry) -> Vec<Schema> {
            Vec::new()
        }
    }

    #[test]
    #[should_panic(expected = "duplicate plugin registered")]
    fn must_register_panics_on_duplicate_name() {
        let mut registry = Registry::new();
        registry.must_register(Box::new(StubPlugin("dup")));
        registry.must_register(Box::new(StubPlugin("dup")));
    }

    #[test]
    fn dispatch_skips_plugins_with_no_matching_extensions() {
        let mut registry = Registry::new();
        registry.must_register(Box::new(StubPlugin("stub")));
        let files = vec![SourceFile::new("main.rb", Language::Ruby, "puts 1")];
        let result = registry.dispatch(".", &files).unwrap();
        assert!(result.applied_plugins.is_empty());
        assert!(result.routes.is_empty());
    }
}
