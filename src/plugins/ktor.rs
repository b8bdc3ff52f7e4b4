//! Ktor plugin (spec.md §4.4): wraps
//! [`apiscope_ir::parser::line_oriented`]'s nested `route { }` block walker.

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::struct_translate::{FieldDescriptor, PrimitiveKind, RecordRef, TypeDescriptor};
use apiscope_ir::{Language, Method, Parameter, Route, Schema, SchemaRegistry, SourceFile};

pub struct KtorPlugin;

impl FrameworkPlugin for KtorPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "ktor",
            version: "1.0.0",
            description: "Ktor (Kotlin) routing DSL extractor",
            supported_frameworks: &["ktor"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".kt"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        manifest::gradle_file_contains(project_root, "io.ktor")
    }

    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route> {
        let mut routes = Vec::new();
        for file in files {
            if file.language != Language::Kotlin {
                continue;
            }
            let text = file.text();
            if !text.contains("routing") {
                continue;
            }
            for raw in apiscope_ir::parser::line_oriented::parse_ktor_routes(&text) {
                let Some(method) = Method::from_str_loose(&raw.verb) else {
                    continue;
                };
                let converted = apiscope_ir::path_utils::convert_path_params(&raw.path);
                let mut route = Route::new(method, &converted, &file.path, raw.line);
                for name in route.path_param_names() {
                    route = route.push_param(Parameter::path(name, Schema::string()));
                }
                routes.push(route);
            }
        }
        routes
    }

    fn extract_schemas(&self, files: &[SourceFile], registry: &SchemaRegistry) -> Vec<Schema> {
        let mut schemas = Vec::new();
        for file in files {
            if file.language != Language::Kotlin {
                continue;
            }
            let text = file.text();
            for (name, fields) in apiscope_ir::parser::line_oriented::parse_kotlin_data_class_fields(&text) {
                let descriptors: Vec<FieldDescriptor> =
                    fields.iter().map(|(field, type_name)| kotlin_field_descriptor(field, type_name)).collect();
                let schema = apiscope_ir::struct_translate::translate_struct(None, &descriptors);
                registry.add(&name, schema.clone());
                schemas.push(schema);
            }
        }
        schemas
    }
}

/// One `data class` field (`name: Type`), a trailing `?` marking the field
/// nullable/optional and stripped before resolving the underlying type.
fn kotlin_field_descriptor(name: &str, type_name: &str) -> FieldDescriptor {
    if let Some(inner) = type_name.strip_suffix('?') {
        return FieldDescriptor::new(name, kotlin_type_to_descriptor(inner)).optional();
    }
    FieldDescriptor::new(name, kotlin_type_to_descriptor(type_name)).required()
}

fn kotlin_type_to_descriptor(type_name: &str) -> TypeDescriptor {
    if let Some(inner) = type_name.strip_prefix("List[").or_else(|| type_name.strip_prefix("List<")).and_then(|s| s.strip_suffix([']', '>'])) {
        return TypeDescriptor::Sequence(Box::new(kotlin_type_to_descriptor(inner)));
    }
    match type_name {
        "Long" | "Int" | "Short" | "Byte" => TypeDescriptor::Primitive(PrimitiveKind::Integer),
        "Double" | "Float" => TypeDescriptor::Primitive(PrimitiveKind::Number),
        "Boolean" => TypeDescriptor::Primitive(PrimitiveKind::Boolean),
        "String" => TypeDescriptor::Primitive(PrimitiveKind::String),
        other => TypeDescriptor::Record(RecordRef::Named(other.to_string())),
    }
}
