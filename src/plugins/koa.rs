//! koa-router plugin (spec.md §4.4): `new Router({ prefix })` or `Router()`
//! instances, prefix from the constructor option plus `.use(...)` mounts.
//! Shares its structure with [`super::express`] — a flat-identifier,
//! non-chained instance model.

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::parser::treesitter::{self, ParsedFile};
use apiscope_ir::{Language, Method, Parameter, RequestBody, Route, Schema, SchemaRegistry, SourceFile};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tree_sitter::Node;

const VERBS: &[&str] = &["get", "post", "put", "delete", "patch", "all"];

/// Middleware callees recognized as request-body validators, the same
/// marker set express.rs uses (spec.md §4.4 step 7).
const VALIDATOR_MARKERS: &[&str] = &["celebrate", "validate"];

lazy_static! {
    /// `koa-joi-router`/zod-middleware field access, inferred by regex the
    /// same way express.rs reads express-validator chains.
    static ref VALIDATOR_FIELD: Regex = Regex::new(r#"(?:body|check)\(\s*['"](\w+)['"]\s*\)"#).unwrap();
}

pub struct KoaPlugin;

impl FrameworkPlugin for KoaPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "koa",
            version: "1.0.0",
            description: "koa-router route extractor",
            supported_frameworks: &["koa"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ts", ".tsx", ".js", ".jsx"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        for name in ["koa", "koa-router", "@koa/router"] {
            if manifest::package_json_has_dependency(project_root, name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route> {
        let mut routes = Vec::new();
        for file in files {
            if !matches!(file.language, Language::TypeScript | Language::JavaScript) {
                continue;
            }
            let Ok(pf) = treesitter::parse(&file.path, file.language, &file.content) else {
                continue;
            };
            routes.extend(extract_file_routes(&pf, &file.path));
        }
        routes
    }

    fn extract_schemas(&self, _files: &[SourceFile], _registry: &SchemaRegistry) -> Vec<Schema> {
        Vec::new()
    }
}

#[derive(Default)]
struct Instance {
    prefix: String,
}

fn constructor_prefix(pf: &ParsedFile, args: &[Node<'_>]) -> String {
    let Some(first) = args.first() else {
        return String::new();
    };
    if first.kind() != "object" {
        return String::new();
    }
    let mut cursor = first.walk();
    for pair in first.named_children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let Some(key) = pair.child_by_field_name("key") else { continue };
        if pf.node_text(key) != "prefix" {
            continue;
        }
        let Some(value) = pair.child_by_field_name("value") else { continue };
        if let Some(s) = treesitter::extract_string_literal(pf, value) {
            return s;
        }
    }
    String::new()
}

fn extract_file_routes(pf: &ParsedFile, path: &str) -> Vec<Route> {
    let mut instances: HashMap<String, Instance> = HashMap::new();
    let calls = treesitter::find_call_expressions(pf.root());

    if !calls.iter().any(|c| treesitter::get_callee_text(pf, *c).contains("Router")) {
        return Vec::new();
    }

    // Discover instances: `new Router({...})`, `Router()`, `new Router()`.
    let mut stack = vec![pf.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "variable_declarator" {
            if let (Some(name), Some(value)) = (node.child_by_field_name("name"), node.child_by_field_name("value")) {
                let (ctor_args, is_router) = match value.kind() {
                    "new_expression" => {
                        let ctor_matches = value
                            .child_by_field_name("constructor")
                            .map(|c| pf.node_text(c) == "Router")
                            .unwrap_or(false);
                        (treesitter::get_call_arguments(value), ctor_matches)
                    }
                    "call_expression" => {
                        let callee_matches = treesitter::get_callee_text(pf, value) == "Router";
                        (treesitter::get_call_arguments(value), callee_matches)
                    }
                    _ => (Vec::new(), false),
                };
                if is_router {
                    let prefix = constructor_prefix(pf, &ctor_args);
                    instances.insert(pf.node_text(name), Instance { prefix });
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }

    // Prefix propagation through `.use('/prefix', router)` mounts.
    for call in &calls {
        let Some((object, method)) = treesitter::get_member_expression_parts(
            pf,
            call.child_by_field_name("function").unwrap_or(*call),
        ) else {
            continue;
        };
        if method != "use" || !instances.contains_key(&object) {
            continue;
        }
        let args = treesitter::get_call_arguments(*call);
        if args.len() < 2 {
            continue;
        }
        let Some(mount_prefix) = treesitter::extract_string_literal(pf, args[0]) else {
            continue;
        };
        if args[1].kind() != "identifier" {
            continue;
        }
        let mounted_name = pf.node_text(args[1]);
        let base_prefix = instances.get(&object).map(|i| i.prefix.clone()).unwrap_or_default();
        let combined = apiscope_ir::path_utils::combine_path(&base_prefix, &mount_prefix);
        instances.entry(mounted_name).or_default().prefix = combined;
    }

    let mut routes = Vec::new();
    for call in &calls {
        let function = call.child_by_field_name("function").unwrap_or(*call);
        let Some((object, method)) = treesitter::get_member_expression_parts(pf, function) else {
            continue;
        };
        if method == "use" || !VERBS.contains(&method.as_str()) {
            continue;
        }
        let Some(instance) = instances.get(&object) else {
            continue;
        };
        let Some(http_method) = Method::from_str_loose(&method) else {
            continue;
        };

        let args = treesitter::get_call_arguments(*call);
        let Some(raw_path) = args.first().and_then(|a| treesitter::extract_string_literal(pf, *a)) else {
            continue;
        };
        let full_path = apiscope_ir::path_utils::combine_path(&instance.prefix, &raw_path);
        let converted = apiscope_ir::path_utils::convert_path_params(&full_path);

        let mut route = Route::new(http_method, &converted, path, pf.line_of(*call));
        for name in route.path_param_names() {
            route = route.push_param(Parameter::path(name, Schema::string()));
        }

        let middleware_args: &[Node<'_>] = if args.len() >= 2 { &args[1..args.len() - 1] } else { &[] };
        route.request_body = locate_request_body(pf, middleware_args);
        routes.push(route);
    }

    routes
}

fn locate_request_body(pf: &ParsedFile, middleware_args: &[Node<'_>]) -> Option<RequestBody> {
    for arg in middleware_args {
        let text = pf.node_text(*arg);
        let trimmed = text.trim_start();
        if VALIDATOR_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
            return Some(RequestBody::json(Schema::object(), true));
        }
    }

    let mut schema = Schema::object();
    let mut found = false;
    for arg in middleware_args {
        let text = pf.node_text(*arg);
        if let Some(caps) = VALIDATOR_FIELD.captures(&text) {
            schema.set_property(caps[1].to_string(), Schema::string(), true);
            found = true;
        }
    }
    if found {
        Some(RequestBody::json(schema, true))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn koa_router_with_prefix() {
        let source = "const Router = require('koa-router'); const r = new Router({ prefix: '/api' });\n\
             r.get('/items/:id', h); r.post('/items', h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "app.ts");

        assert!(routes.iter().any(|r| r.path == "/api/items/{id}" && r.method == Method::Get));
        assert!(routes.iter().any(|r| r.path == "/api/items" && r.method == Method::Post));
    }

    #[test]
    fn no_routes_without_router_marker() {
        let source = "const app = someOther(); app.get('/x', h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        assert!(extract_file_routes(&pf, "app.ts").is_empty());
    }

    #[test]
    fn validator_middleware_produces_placeholder_body() {
        let source = "const Router = require('koa-router'); const r = new Router();\n\
             r.post('/items', validate({ body: schema }), h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "app.ts");

        let route = routes.iter().find(|r| r.path == "/items").unwrap();
        let body = route.request_body.as_ref().expect("request body");
        let schema = &body.content.get("application/json").unwrap().schema;
        assert_eq!(schema.r#type, Some(apiscope_ir::SchemaType::Object));
        assert!(schema.properties.is_empty());
    }
}
