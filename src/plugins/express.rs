//! Express plugin (spec.md §4.4): `express()`/`express.Router()` instances,
//! prefixes contributed by `app.use('/prefix', router)` mounts.

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::parser::treesitter::{self, ParsedFile};
use apiscope_ir::{Language, Method, Parameter, RequestBody, Route, Schema, SchemaRegistry, SourceFile};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

const VERBS: &[&str] = &["get", "post", "put", "delete", "patch", "all", "use"];

/// Middleware callees recognized as request-body validators (spec.md §4.4
/// step 7). `celebrate`/`validate`/`zValidator` bodies are not walked —
/// spec.md §9 names preserving the placeholder as acceptable.
const VALIDATOR_MARKERS: &[&str] = &["celebrate", "validate", "zValidator"];

lazy_static! {
    /// express-validator's `body('field')` / `check('field')` chains,
    /// inferred by regex over the surrounding call text rather than walked
    /// structurally (spec.md §9: either is acceptable).
    static ref EXPRESS_VALIDATOR_FIELD: Regex = Regex::new(r#"(?:body|check)\(\s*['"](\w+)['"]\s*\)"#).unwrap();
}

pub struct ExpressPlugin;

impl FrameworkPlugin for ExpressPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "express",
            version: "1.0.0",
            description: "Express.js route extractor",
            supported_frameworks: &["express"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ts", ".tsx", ".js", ".jsx"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        manifest::package_json_has_dependency(project_root, "express")
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

    fn extract_schemas(&self, files: &[SourceFile], registry: &SchemaRegistry) -> Vec<Schema> {
        let mut schemas = Vec::new();
        for file in files {
            if !matches!(file.language, Language::TypeScript | Language::JavaScript) {
                continue;
            }
            let Ok(pf) = treesitter::parse(&file.path, file.language, &file.content) else {
                continue;
            };
            for decl in treesitter::find_validator_declarations(&pf, apiscope_ir::validator_dsl::KNOWN_ROOTS) {
                let Some(chain) = treesitter::build_chain_call(&pf, decl.init) else {
                    continue;
                };
                apiscope_ir::validator_dsl::register(registry, &decl.name, &chain);
                if let Some(schema) = registry.get(&decl.name) {
                    schemas.push(schema);
                }
            }
        }
        schemas
    }
}

#[derive(Default)]
struct Instance {
    prefix: String,
}

fn extract_file_routes(pf: &ParsedFile, path: &str) -> Vec<Route> {
    let mut instances: HashMap<String, Instance> = HashMap::new();
    let calls = treesitter::find_call_expressions(pf.root());

    // Gate: a relevant import/symbol marker must be present.
    if !calls.iter().any(|c| treesitter::get_callee_text(pf, *c).contains("express")) {
        return Vec::new();
    }

    // Discover instances: `const app = express()` / `const r = express.Router()`.
    for call in &calls {
        let callee = treesitter::get_callee_text(pf, *call);
        if callee == "express" || callee == "express.Router" {
            if let Some(name) = declared_variable_name(pf, *call) {
                instances.insert(name, Instance::default());
            }
        }
    }

    // Prefix propagation: `app.use('/prefix', router)` mounts.
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

    // Walk for verb calls grounded in a known instance.
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

        let handler = args.last().map(|a| pf.node_text(*a)).unwrap_or_default();
        let handler = if handler == raw_path { String::new() } else { handler };

        let mut route = Route::new(http_method, &converted, path, pf.line_of(*call)).with_handler(handler);
        for name in route.path_param_names() {
            route = route.push_param(Parameter::path(name, Schema::string()));
        }

        let middleware_args: &[tree_sitter::Node<'_>] = if args.len() >= 2 { &args[1..args.len() - 1] } else { &[] };
        route.request_body = locate_request_body(pf, middleware_args);
        routes.push(route);
    }

    routes
}

/// spec.md §4.4 step 7: an options-object `body` key (not applicable to
/// Express's flat middleware-array shape), a validator middleware call
/// (`celebrate`/`validate`/`zValidator`), or an express-validator chain
/// (`body('field')`/`check('field')`).
fn locate_request_body(pf: &ParsedFile, middleware_args: &[tree_sitter::Node<'_>]) -> Option<RequestBody> {
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
        if let Some(caps) = EXPRESS_VALIDATOR_FIELD.captures(&text) {
            schema.set_property(caps[1].to_string(), Schema::string(), true);
            found = true;
        }
    }
    if found {
        return Some(RequestBody::json(schema, true));
    }
    None
}

fn declared_variable_name(pf: &ParsedFile, call: tree_sitter::Node<'_>) -> Option<String> {
    let declarator = call.parent()?;
    if declarator.kind() != "variable_declarator" {
        return None;
    }
    declarator.child_by_field_name("name").map(|n| pf.node_text(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_express_mounted_router() {
        let source = "const express=require('express'); const app=express(); const r=express.Router();\n\
             app.use('/api', r); r.get('/items/:id', h); r.post('/items', h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "app.ts");

        assert!(routes.iter().any(|r| r.path == "/api/items/{id}" && r.method == Method::Get));
        assert!(routes.iter().any(|r| r.path == "/api/items" && r.method == Method::Post));
        assert!(routes.iter().all(|r| r.tags == vec!["items".to_string()]));
    }

    #[test]
    fn no_routes_without_express_marker() {
        let source = "const app = koaApp(); app.get('/x', h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        assert!(extract_file_routes(&pf, "app.ts").is_empty());
    }

    #[test]
    fn celebrate_body_is_placeholder_object() {
        let source = "const express=require('express'); const app=express();\n\
             app.post('/items', celebrate({ body: Joi.object({ name: Joi.string() }) }), h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "app.ts");

        let route = routes.iter().find(|r| r.path == "/items").unwrap();
        let body = route.request_body.as_ref().expect("request body");
        let schema = &body.content.get("application/json").unwrap().schema;
        assert_eq!(schema.r#type, Some(apiscope_ir::SchemaType::Object));
        assert!(body.required);
        assert!(schema.properties.is_empty(), "celebrate body stays a placeholder, not a walked Joi schema");
    }

    #[test]
    fn express_validator_chain_fields_inferred_by_regex() {
        let source = "const express=require('express'); const app=express();\n\
             app.post('/items', body('email').isEmail(), body('name').notEmpty(), h);";
        let pf = treesitter::parse("app.ts", Language::TypeScript, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "app.ts");

        let route = routes.iter().find(|r| r.path == "/items").unwrap();
        let body = route.request_body.as_ref().expect("request body");
        let schema = &body.content.get("application/json").unwrap().schema;
        assert!(schema.properties.contains_key("email"));
        assert!(schema.properties.contains_key("name"));
        assert!(schema.required.contains(&"email".to_string()));
    }

    #[test]
    fn s6_validator_combinator_schema_is_recovered_from_source() {
        let source = "const UserSchema = z.object({\n\
             \u{20}id: z.string().uuid(),\n\
             \u{20}name: z.string().min(1).max(100),\n\
             \u{20}email: z.string().email(),\n\
             \u{20}age: z.number().int().positive().optional(),\n\
             });\n";
        let files = vec![SourceFile::new("schema.ts", Language::TypeScript, source)];
        let registry = SchemaRegistry::new();
        let schemas = ExpressPlugin.extract_schemas(&files, &registry);

        assert_eq!(schemas.len(), 1);
        assert!(registry.has("UserSchema"));
        let schema = registry.get("UserSchema").unwrap();
        assert_eq!(schema.required, vec!["id".to_string(), "name".to_string(), "email".to_string()]);
        assert_eq!(schema.properties["id"].format.as_deref(), Some("uuid"));
        assert_eq!(schema.properties["name"].min_length, Some(1));
        assert_eq!(schema.properties["name"].max_length, Some(100));
        assert_eq!(schema.properties["email"].format.as_deref(), Some("email"));
        assert_eq!(schema.properties["age"].minimum, Some(1.0));
    }
}
