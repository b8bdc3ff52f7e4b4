//! Elysia plugin (spec.md §4.4): `new Elysia()` instances, prefixes from
//! chained `.group('/pfx', app => { ... })` callbacks.

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::parser::treesitter::{self, ParsedFile};
use apiscope_ir::{Language, Method, Parameter, RequestBody, Route, Schema, SchemaRegistry, SourceFile};
use std::collections::HashSet;
use tree_sitter::Node;

const VERBS: &[&str] = &["get", "post", "put", "delete", "patch", "all"];

pub struct ElysiaPlugin;

impl FrameworkPlugin for ElysiaPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "elysia",
            version: "1.0.0",
            description: "Elysia route extractor",
            supported_frameworks: &["elysia"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ts", ".tsx", ".js"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        if manifest::package_json_has_dependency(project_root, "elysia")? {
            return Ok(true);
        }
        manifest::package_json_has_dependency_prefix(project_root, "@elysiajs/")
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

fn extract_file_routes(pf: &ParsedFile, path: &str) -> Vec<Route> {
    let calls = treesitter::find_call_expressions(pf.root());
    if !calls
        .iter()
        .any(|c| treesitter::get_callee_text(pf, *c).contains("Elysia"))
    {
        return Vec::new();
    }

    let instances = discover_instances(pf);
    if instances.is_empty() {
        return Vec::new();
    }

    let mut routes = Vec::new();
    let mut prefix_stack: Vec<String> = Vec::new();
    walk(pf, pf.root(), &instances, &mut prefix_stack, &mut routes, path);
    routes
}

/// `const app = new Elysia()` declarations.
fn discover_instances(pf: &ParsedFile) -> HashSet<String> {
    let mut instances = HashSet::new();
    let mut stack = vec![pf.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "variable_declarator" {
            if let (Some(name), Some(value)) = (node.child_by_field_name("name"), node.child_by_field_name("value")) {
                if value.kind() == "new_expression" {
                    if let Some(ctor) = value.child_by_field_name("constructor") {
                        if pf.node_text(ctor) == "Elysia" {
                            instances.insert(pf.node_text(name));
                        }
                    }
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    instances
}

fn walk(
    pf: &ParsedFile,
    node: Node<'_>,
    instances: &HashSet<String>,
    prefix_stack: &mut Vec<String>,
    routes: &mut Vec<Route>,
    path: &str,
) {
    if node.kind() == "call_expression" {
        if let Some(function) = node.child_by_field_name("function") {
            if let Some((_, method)) = treesitter::get_member_expression_parts(pf, function) {
                let grounds = treesitter::chain_root_identifier(pf, function)
                    .map(|root| instances.contains(&root))
                    .unwrap_or(false);

                if grounds && method == "group" {
                    let args = treesitter::get_call_arguments(node);
                    let prefix = args
                        .first()
                        .and_then(|a| treesitter::extract_string_literal(pf, *a))
                        .unwrap_or_default();
                    prefix_stack.push(prefix);
                    walk(pf, function, instances, prefix_stack, routes, path);
                    if let Some(callback) = args.get(1) {
                        walk(pf, *callback, instances, prefix_stack, routes, path);
                    }
                    prefix_stack.pop();
                    return;
                }

                if grounds && VERBS.contains(&method.as_str()) {
                    if let Some(route) = build_route(pf, node, &method, prefix_stack, path) {
                        routes.push(route);
                    }
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(pf, child, instances, prefix_stack, routes, path);
    }
}

fn build_route(pf: &ParsedFile, call: Node<'_>, method: &str, prefix_stack: &[String], path: &str) -> Option<Route> {
    let args = treesitter::get_call_arguments(call);
    let raw_path = args.first().and_then(|a| treesitter::extract_string_literal(pf, *a))?;
    let prefix: String = prefix_stack.iter().map(|p| p.as_str()).collect();
    let full_path = apiscope_ir::path_utils::combine_path(&prefix, &raw_path);
    let converted = apiscope_ir::path_utils::convert_path_params(&full_path);
    let http_method = Method::from_str_loose(method)?;

    let mut route = Route::new(http_method, &converted, path, pf.line_of(call));
    for name in route.path_param_names() {
        route = route.push_param(Parameter::path(name, Schema::string()));
    }

    // Locate request body: a trailing options object with a `body` key
    // whose value is a validator-DSL chain (spec.md §4.4 step 7).
    for arg in &args[1..] {
        if arg.kind() != "object" {
            continue;
        }
        let mut cursor = arg.walk();
        for pair in arg.named_children(&mut cursor) {
            if pair.kind() != "pair" {
                continue;
            }
            let Some(key) = pair.child_by_field_name("key") else { continue };
            if pf.node_text(key) != "body" {
                continue;
            }
            let Some(value) = pair.child_by_field_name("value") else { continue };
            if let Some(chain) = treesitter::build_chain_call(pf, value) {
                let schema = apiscope_ir::validator_dsl::interpret(&chain);
                route.request_body = Some(RequestBody::json(schema, true));
            }
        }
    }

    Some(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_elysia_chained_routes() {
        let source = "import { Elysia, t } from 'elysia'\n\
            const app = new Elysia()\n\
            .get('/users', () => [])\n\
            .get('/users/:id', () => ({}))\n\
            .post('/users', ({ body }) => ({}), { body: t.Object({ name: t.String(), email: t.String() }) })\n\
            .delete('/users/:id', () => {})\n";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "app.ts");

        assert!(routes.iter().any(|r| r.path == "/users" && r.method == Method::Get));
        assert!(routes.iter().any(|r| r.path == "/users/{id}" && r.method == Method::Get));
        assert!(routes.iter().any(|r| r.path == "/users/{id}" && r.method == Method::Delete));

        let post = routes.iter().find(|r| r.method == Method::Post).expect("post route");
        assert_eq!(post.path, "/users");
        assert!(post.request_body.is_some());
        assert!(routes.iter().all(|r| r.tags == vec!["users".to_string()]));
    }
}
