//! Rails plugin (spec.md §4.4): wraps [`apiscope_ir::parser::line_oriented`]'s
//! `namespace`/`scope`/`resources` routes-DSL extractor.

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::{Language, Method, Parameter, Route, Schema, SchemaRegistry, SourceFile};

pub struct RailsPlugin;

impl FrameworkPlugin for RailsPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "rails",
            version: "1.0.0",
            description: "Ruby on Rails routes.rb extractor",
            supported_frameworks: &["rails"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".rb"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        if manifest::file_exists(project_root, "config/routes.rb") {
            return Ok(true);
        }
        manifest::gemfile_has_gem(project_root, "rails")
    }

    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route> {
        let mut routes = Vec::new();
        for file in files {
            if file.language != Language::Ruby {
                continue;
            }
            let text = file.text();
            if !text.contains("routes.draw") {
                continue;
            }
            for raw in apiscope_ir::parser::line_oriented::parse_rails_routes(&text) {
                let Some(method) = Method::from_str_loose(&raw.verb) else {
                    continue;
                };
                let converted = apiscope_ir::path_utils::convert_path_params(&raw.path);
                let mut route = Route::new(method, &converted, &file.path, raw.line).with_handler(raw.handler);
                for name in route.path_param_names() {
                    route = route.push_param(Parameter::path(name, Schema::string()));
                }
                routes.push(route);
            }
        }
        routes
    }

    fn extract_schemas(&self, _files: &[SourceFile], _registry: &SchemaRegistry) -> Vec<Schema> {
        Vec::new()
    }
}
