//! Tapir plugin (spec.md §4.4): wraps
//! [`apiscope_ir::parser::line_oriented`]'s endpoint-chain extractor,
//! translating `path[T]`/`query[T]` segments into Parameters.

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::parser::line_oriented::{self, PathSegment};
use apiscope_ir::struct_translate::{FieldDescriptor, PrimitiveKind, RecordRef, TypeDescriptor};
use apiscope_ir::{Language, Method, Parameter, Route, Schema, SchemaRegistry, SourceFile};

pub struct TapirPlugin;

impl FrameworkPlugin for TapirPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "tapir",
            version: "1.0.0",
            description: "Tapir (Scala) endpoint extractor",
            supported_frameworks: &["tapir"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".scala"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        for needle in ["sttp.tapir", "tapir-core", "tapir-"] {
            if manifest::sbt_file_contains(project_root, needle)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route> {
        let mut routes = Vec::new();
        for file in files {
            if file.language != Language::Scala {
                continue;
            }
            let text = file.text();
            if !text.contains("endpoint.") {
                continue;
            }
            for raw in line_oriented::parse_tapir_endpoints(&text) {
                let Some(method) = Method::from_str_loose(&raw.verb) else {
                    continue;
                };

                let mut path_buf = String::new();
                let mut params = Vec::new();
                for segment in &raw.path_segments {
                    match segment {
                        PathSegment::Literal(lit) => path_buf.push_str(&format!("/{lit}")),
                        PathSegment::Path { name, type_name } => {
                            path_buf.push_str(&format!("/{{{name}}}"));
                            params.push(Parameter::path(name.clone(), scala_type_schema(type_name)));
                        }
                        PathSegment::Query { name, type_name, optional } => {
                            params.push(Parameter::query(name.clone(), !optional, scala_type_schema(type_name)));
                        }
                    }
                }
                let path = apiscope_ir::path_utils::normalize_path(&path_buf);

                let mut route = Route::new(method, &path, &file.path, raw.line).with_handler(raw.name);
                for param in params {
                    route = route.push_param(param);
                }
                routes.push(route);
            }
        }
        routes
    }

    fn extract_schemas(&self, files: &[SourceFile], registry: &SchemaRegistry) -> Vec<Schema> {
        let mut schemas = Vec::new();
        for file in files {
            if file.language != Language::Scala {
                continue;
            }
            let text = file.text();
            for (name, fields) in line_oriented::parse_scala_case_class_fields(&text) {
                let descriptors: Vec<FieldDescriptor> =
                    fields.iter().map(|(field, type_name)| scala_field_descriptor(field, type_name)).collect();
                let schema = apiscope_ir::struct_translate::translate_struct(None, &descriptors);
                registry.add(&name, schema.clone());
                schemas.push(schema);
            }
        }
        schemas
    }
}

fn scala_type_schema(type_name: &str) -> Schema {
    match type_name {
        "Long" => Schema::integer().with_format("int64"),
        "Int" => Schema::integer().with_format("int32"),
        "Boolean" => Schema::boolean(),
        "Double" | "Float" => Schema::number(),
        _ => Schema::string(),
    }
}

/// One `case class` field (`name: Type`), `Option[T]` marking the field
/// optional and unwrapping to `T` for the underlying descriptor.
fn scala_field_descriptor(name: &str, type_name: &str) -> FieldDescriptor {
    if let Some(inner) = type_name.strip_prefix("Option[").and_then(|s| s.strip_suffix(']')) {
        return FieldDescriptor::new(name, scala_type_to_descriptor(inner)).optional();
    }
    FieldDescriptor::new(name, scala_type_to_descriptor(type_name)).required()
}

fn scala_type_to_descriptor(type_name: &str) -> TypeDescriptor {
    if let Some(inner) = type_name.strip_prefix("Seq[").or_else(|| type_name.strip_prefix("List[")).and_then(|s| s.strip_suffix(']')) {
        return TypeDescriptor::Sequence(Box::new(scala_type_to_descriptor(inner)));
    }
    match type_name {
        "Long" | "Int" | "Short" => TypeDescriptor::Primitive(PrimitiveKind::Integer),
        "Double" | "Float" => TypeDescriptor::Primitive(PrimitiveKind::Number),
        "Boolean" => TypeDescriptor::Primitive(PrimitiveKind::Boolean),
        "String" => TypeDescriptor::Primitive(PrimitiveKind::String),
        other => TypeDescriptor::Record(RecordRef::Named(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_tapir_path_and_query() {
        let source = "val getUser = endpoint.get.in(\"users\" / path[Long](\"id\")).out(jsonBody[User])\n\
            val search = endpoint.get.in(\"search\").in(query[String](\"q\")).in(query[Option[Int]](\"limit\"))\n";
        let files = vec![SourceFile::new("Routes.scala", Language::Scala, source)];
        let routes = TapirPlugin.extract_routes(&files);

        let get_user = routes.iter().find(|r| r.handler == "getUser").unwrap();
        assert_eq!(get_user.path, "/users/{id}");
        let id_param = get_user.parameters.iter().find(|p| p.name == "id").unwrap();
        assert_eq!(id_param.schema.format.as_deref(), Some("int64"));

        let search = routes.iter().find(|r| r.handler == "search").unwrap();
        assert_eq!(search.path, "/search");
        let q = search.parameters.iter().find(|p| p.name == "q").unwrap();
        assert!(q.required);
        let limit = search.parameters.iter().find(|p| p.name == "limit").unwrap();
        assert!(!limit.required);
    }

    #[test]
    fn case_class_translates_to_schema() {
        let source = "case class User(id: Long, name: String, nickname: Option[String])\n";
        let files = vec![SourceFile::new("User.scala", Language::Scala, source)];
        let registry = SchemaRegistry::new();
        let schemas = TapirPlugin.extract_schemas(&files, &registry);

        assert_eq!(schemas.len(), 1);
        assert!(registry.has("User"));
        let schema = registry.get("User").unwrap();
        assert!(schema.required.contains(&"id".to_string()));
        assert!(schema.required.contains(&"name".to_string()));
        assert!(!schema.required.contains(&"nickname".to_string()));
        assert_eq!(schema.properties["id"].r#type, Some(apiscope_ir::SchemaType::Integer));
    }
}
