//! Echo plugin (spec.md §4.4): host-AST walking for Go's `echo.New()`
//! receiver and chained `.Group("/pfx")` sub-routers. Anonymous handlers
//! fall back to path-derived operation IDs (spec.md §9 open question).

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::parser::treesitter::{self, GoStructField, ParsedFile};
use apiscope_ir::struct_translate::{FieldDescriptor, PrimitiveKind, TypeDescriptor};
use apiscope_ir::{Language, Method, Parameter, Route, Schema, SchemaRegistry, SourceFile};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tree_sitter::Node;

const VERBS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "Any", "HEAD", "OPTIONS"];

lazy_static! {
    static ref JSON_TAG: Regex = Regex::new(r#"json:"([^"]*)""#).unwrap();
    static ref VALIDATE_TAG: Regex = Regex::new(r#"validate:"([^"]*)""#).unwrap();
}

pub struct EchoPlugin;

impl FrameworkPlugin for EchoPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "echo",
            version: "1.0.0",
            description: "Echo (Go) route extractor",
            supported_frameworks: &["echo"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        manifest::go_mod_has_import(project_root, "github.com/labstack/echo")
    }

    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route> {
        let mut routes = Vec::new();
        for file in files {
            if file.language != Language::Go {
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
            if file.language != Language::Go {
                continue;
            }
            let Ok(pf) = treesitter::parse(&file.path, file.language, &file.content) else {
                continue;
            };
            for raw_struct in treesitter::extract_structs(&pf) {
                let fields: Vec<FieldDescriptor> = raw_struct.fields.iter().map(go_field_descriptor).collect();
                let schema = apiscope_ir::struct_translate::translate_struct(None, &fields);
                registry.add(&raw_struct.name, schema.clone());
                schemas.push(schema);
            }
        }
        schemas
    }
}

/// Translate one Go struct field, reading its `json`/`validate` struct tags
/// (spec.md §4.5's validation-tag mapping table).
fn go_field_descriptor(field: &GoStructField) -> FieldDescriptor {
    let mut descriptor = FieldDescriptor::new(&field.name, go_type_to_descriptor(&field.type_text));

    if let Some(tag) = &field.tag_text {
        if let Some(caps) = JSON_TAG.captures(tag) {
            let mut parts = caps[1].split(',');
            if let Some(name) = parts.next() {
                if !name.is_empty() {
                    descriptor = descriptor.with_serialized_name(name);
                }
            }
            if parts.any(|flag| flag == "omitempty") {
                descriptor = descriptor.omit_if_empty();
            }
        }
        if let Some(caps) = VALIDATE_TAG.captures(tag) {
            for rule in caps[1].split(',') {
                if rule == "required" {
                    descriptor = descriptor.required();
                    continue;
                }
                match rule.split_once('=') {
                    Some((key, value)) => descriptor = descriptor.with_tag(key, value),
                    None if !rule.is_empty() => descriptor = descriptor.with_tag(rule, ""),
                    None => {}
                }
            }
        }
    }

    descriptor
}

/// Go type syntax (`string`, `int`, `[]T`, `map[K]V`, `*T`, `time.Time`,
/// `interface{}`, a named struct) into a [`TypeDescriptor`].
fn go_type_to_descriptor(type_text: &str) -> TypeDescriptor {
    let type_text = type_text.trim();

    if let Some(inner) = type_text.strip_prefix('*') {
        return TypeDescriptor::Pointer(Box::new(go_type_to_descriptor(inner)));
    }
    if let Some(inner) = type_text.strip_prefix("[]") {
        return TypeDescriptor::Sequence(Box::new(go_type_to_descriptor(inner)));
    }
    if let Some(rest) = type_text.strip_prefix("map[") {
        if let Some(close) = rest.find(']') {
            let key = go_type_to_descriptor(&rest[..close]);
            let value = go_type_to_descriptor(&rest[close + 1..]);
            return TypeDescriptor::Mapping(Box::new(key), Box::new(value));
        }
    }

    match type_text {
        "string" => TypeDescriptor::Primitive(PrimitiveKind::String),
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32" | "uint64" => {
            TypeDescriptor::Primitive(PrimitiveKind::Integer)
        }
        "float32" | "float64" => TypeDescriptor::Primitive(PrimitiveKind::Number),
        "bool" => TypeDescriptor::Primitive(PrimitiveKind::Boolean),
        "time.Time" => TypeDescriptor::Time,
        "interface{}" | "any" => TypeDescriptor::PolymorphicAny,
        other => TypeDescriptor::Record(apiscope_ir::struct_translate::RecordRef::Named(
            other.rsplit('.').next().unwrap_or(other).to_string(),
        )),
    }
}

/// Go's `selector_expression` — `echo.New`, `e.Group`, `api.GET` — the Go
/// grammar's equivalent of JS/TS `member_expression`.
fn selector_parts(pf: &ParsedFile, node: Node<'_>) -> Option<(String, String)> {
    if node.kind() != "selector_expression" {
        return None;
    }
    let operand = node.child_by_field_name("operand")?;
    let field = node.child_by_field_name("field")?;
    Some((pf.node_text(operand), pf.node_text(field)))
}

/// The variable a `short_var_declaration` (`api := e.Group(...)`) or plain
/// `assignment_statement` binds a call's result to.
fn declared_variable_name(pf: &ParsedFile, call: Node<'_>) -> Option<String> {
    let parent = call.parent()?;
    match parent.kind() {
        "short_var_declaration" => {
            let left = parent.child_by_field_name("left")?;
            left.named_child(0).map(|n| pf.node_text(n))
        }
        _ => None,
    }
}

fn extract_file_routes(pf: &ParsedFile, path: &str) -> Vec<Route> {
    if !treesitter::has_import(pf, "github.com/labstack/echo/v4")
        && !treesitter::has_import(pf, "github.com/labstack/echo")
    {
        return Vec::new();
    }

    let mut instances: HashMap<String, String> = HashMap::new();
    let calls = treesitter::find_call_expressions(pf.root());

    // Discover the base instance: `e := echo.New()`.
    for call in &calls {
        let function = call.child_by_field_name("function").unwrap_or(*call);
        if let Some((object, method)) = selector_parts(pf, function) {
            if object == "echo" && method == "New" {
                if let Some(name) = declared_variable_name(pf, *call) {
                    instances.insert(name, String::new());
                }
            }
        }
    }

    // `.Group("/pfx")` sub-routers chained off a known instance.
    let mut changed = true;
    while changed {
        changed = false;
        for call in &calls {
            let function = call.child_by_field_name("function").unwrap_or(*call);
            let Some((object, method)) = selector_parts(pf, function) else {
                continue;
            };
            if method != "Group" || !instances.contains_key(&object) {
                continue;
            }
            let Some(name) = declared_variable_name(pf, *call) else {
                continue;
            };
            if instances.contains_key(&name) {
                continue;
            }
            let args = treesitter::get_call_arguments(*call);
            let Some(segment) = args.first().and_then(|a| treesitter::extract_string_literal(pf, *a)) else {
                continue;
            };
            let base = instances.get(&object).cloned().unwrap_or_default();
            instances.insert(name, apiscope_ir::path_utils::combine_path(&base, &segment));
            changed = true;
        }
    }

    let mut routes = Vec::new();
    for call in &calls {
        let function = call.child_by_field_name("function").unwrap_or(*call);
        let Some((object, method)) = selector_parts(pf, function) else {
            continue;
        };
        if method == "Group" || !VERBS.contains(&method.as_str()) {
            continue;
        }
        let Some(prefix) = instances.get(&object) else {
            continue;
        };
        let Some(http_method) = Method::from_str_loose(&method) else {
            continue;
        };

        let args = treesitter::get_call_arguments(*call);
        let Some(raw_path) = args.first().and_then(|a| treesitter::extract_string_literal(pf, *a)) else {
            continue;
        };
        let full_path = apiscope_ir::path_utils::combine_path(prefix, &raw_path);
        let converted = apiscope_ir::path_utils::convert_path_params(&full_path);

        let handler = args
            .get(1)
            .map(|h| pf.node_text(*h))
            .filter(|t| t.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_'))
            .unwrap_or_default();

        let mut route = Route::new(http_method, &converted, path, pf.line_of(*call)).with_handler(handler);
        for name in route.path_param_names() {
            route = route.push_param(Parameter::path(name, Schema::string()));
        }
        routes.push(route);
    }

    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_group_nested_routes() {
        let source = r#"package main
import "github.com/labstack/echo/v4"
func main() {
	e := echo.New()
	api := e.Group("/api")
	api.GET("/items/:id", getItem)
	api.POST("/items", createItem)
}
"#;
        let pf = treesitter::parse("main.go", Language::Go, source.as_bytes()).unwrap();
        let routes = extract_file_routes(&pf, "main.go");

        assert!(routes.iter().any(|r| r.path == "/api/items/{id}" && r.method == Method::Get));
        assert!(routes.iter().any(|r| r.path == "/api/items" && r.method == Method::Post));
    }

    #[test]
    fn no_routes_without_echo_import() {
        let source = "package main\nfunc main() { e := echo.New(); e.GET(\"/x\", h) }\n";
        let pf = treesitter::parse("main.go", Language::Go, source.as_bytes()).unwrap();
        assert!(extract_file_routes(&pf, "main.go").is_empty());
    }

    #[test]
    fn struct_tags_translate_to_schema() {
        let source = r#"package main
type User struct {
	ID    int    `json:"id" validate:"required"`
	Email string `json:"email" validate:"required,email"`
	Bio   string `json:"bio,omitempty"`
}
"#;
        let files = vec![SourceFile::new("user.go", Language::Go, source)];
        let registry = SchemaRegistry::new();
        let schemas = EchoPlugin.extract_schemas(&files, &registry);

        assert_eq!(schemas.len(), 1);
        assert!(registry.has("User"));
        let schema = registry.get("User").unwrap();
        assert!(schema.required.contains(&"id".to_string()));
        assert!(schema.required.contains(&"email".to_string()));
        assert_eq!(schema.properties["email"].format.as_deref(), Some("email"));
        assert!(!schema.required.contains(&"bio".to_string()));
    }
}
