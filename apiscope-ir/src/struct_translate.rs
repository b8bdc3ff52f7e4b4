//! Struct/interface/case-class → [`Schema`] translation (spec.md §4.5).
//!
//! Two independent resolvers live here: [`translate_struct`] for nominal
//! record types carrying per-field tags (Go structs, Kotlin data classes,
//! Scala case classes), and [`resolve_type_string`] for TypeScript's
//! structural interface syntax. They share the same [`Schema`] target but
//! never the same source shape, so they stay separate functions rather than
//! forcing one input type to fit both — the same choice
//! `voyager_ast::ir::DeclarationKind` makes by giving each host-language
//! shape its own variant instead of a single generic "member" type.

use crate::schema::{Schema, SchemaType};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

// ============================================================================
// Struct/case-class/data-class translation
// ============================================================================

#[derive(Debug, Clone)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone)]
pub enum RecordRef {
    Named(String),
    Inline(Vec<FieldDescriptor>),
}

#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Time,
    Sequence(Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Record(RecordRef),
    PolymorphicAny,
    Pointer(Box<TypeDescriptor>),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub host_name: String,
    pub serialized_name: String,
    pub type_descriptor: TypeDescriptor,
    pub optional: bool,
    pub omit_if_empty: bool,
    pub required_marker: bool,
    /// Validation-tag key → raw tag value, e.g. `{"min": "1", "email": ""}`.
    pub validation_tags: BTreeMap<String, String>,
}

impl FieldDescriptor {
    pub fn new(host_name: impl Into<String>, type_descriptor: TypeDescriptor) -> Self {
        let host_name = host_name.into();
        Self {
            serialized_name: host_name.clone(),
            host_name,
            type_descriptor,
            optional: false,
            omit_if_empty: false,
            required_marker: false,
            validation_tags: BTreeMap::new(),
        }
    }

    pub fn with_serialized_name(mut self, name: impl Into<String>) -> Self {
        self.serialized_name = name.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn omit_if_empty(mut self) -> Self {
        self.omit_if_empty = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required_marker = true;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.validation_tags.insert(key.into(), value.into());
        self
    }

    /// Required-ness policy, spec.md §4.5 (checked in the listed priority
    /// order; the first matching rule wins).
    fn is_required(&self) -> bool {
        if self.required_marker {
            return true;
        }
        if self.optional {
            return false;
        }
        if self.omit_if_empty {
            return false;
        }
        if matches!(
            self.type_descriptor,
            TypeDescriptor::Sequence(_) | TypeDescriptor::Mapping(_, _)
        ) {
            return false;
        }
        // Conservative default (spec.md §4.5): not required.
        false
    }
}

fn descriptor_to_schema(descriptor: &TypeDescriptor) -> Schema {
    match descriptor {
        TypeDescriptor::Primitive(PrimitiveKind::String) => Schema::string(),
        TypeDescriptor::Primitive(PrimitiveKind::Integer) => Schema::integer(),
        TypeDescriptor::Primitive(PrimitiveKind::Number) => Schema::number(),
        TypeDescriptor::Primitive(PrimitiveKind::Boolean) => Schema::boolean(),
        TypeDescriptor::Time => Schema::string().with_format("date-time"),
        TypeDescriptor::Sequence(inner) => Schema::array(descriptor_to_schema(inner)),
        TypeDescriptor::Mapping(_key, value) => Schema {
            r#type: Some(SchemaType::Object),
            additional_properties: Some(Box::new(descriptor_to_schema(value))),
            ..Default::default()
        },
        TypeDescriptor::Record(RecordRef::Named(name)) => Schema::reference(name),
        TypeDescriptor::Record(RecordRef::Inline(fields)) => {
            let mut schema = Schema::object();
            for field in fields {
                schema.set_property(
                    field.serialized_name.clone(),
                    field_to_schema(field),
                    field.is_required(),
                );
            }
            schema
        }
        TypeDescriptor::PolymorphicAny => Schema::default(),
        // Pointer to primitive -> nullable primitive; pointer to record -> reference.
        TypeDescriptor::Pointer(inner) => {
            let mut schema = descriptor_to_schema(inner);
            schema.nullable = true;
            schema
        }
    }
}

fn field_to_schema(field: &FieldDescriptor) -> Schema {
    let mut schema = descriptor_to_schema(&field.type_descriptor);
    apply_validation_tags(&mut schema, &field.validation_tags);
    schema
}

/// Validation-tag → semantic-constraint mapping table, spec.md §4.5.
fn apply_validation_tags(schema: &mut Schema, tags: &BTreeMap<String, String>) {
    for (key, value) in tags {
        match key.as_str() {
            "min" => apply_bound(schema, value, true),
            "max" => apply_bound(schema, value, false),
            "len" => apply_len(schema, value),
            "email" | "url" | "uri" | "uuid" | "datetime" | "ip" | "ipv4" | "ipv6" | "hostname" => {
                schema.format = Some(key.clone());
            }
            "alphanum" | "alpha" | "numeric" => {
                schema.pattern = Some(pattern_for(key));
            }
            "oneof" => {
                schema.r#enum = value
                    .split_whitespace()
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .collect();
            }
            "required" => {
                // Handled by FieldDescriptor::is_required / caller-side
                // required-list construction; no schema-local effect.
            }
            _ => {}
        }
    }
}

fn pattern_for(tag: &str) -> String {
    match tag {
        "alphanum" => r"^[A-Za-z0-9]+$".to_string(),
        "alpha" => r"^[A-Za-z]+$".to_string(),
        "numeric" => r"^[0-9]+$".to_string(),
        _ => String::new(),
    }
}

fn apply_bound(schema: &mut Schema, raw: &str, is_min: bool) {
    let Ok(n) = raw.parse::<f64>() else { return };
    match schema.r#type {
        Some(SchemaType::String) => {
            if is_min {
                schema.min_length = Some(n as u64);
            } else {
                schema.max_length = Some(n as u64);
            }
        }
        Some(SchemaType::Array) => {
            if is_min {
                schema.min_items = Some(n as u64);
            } else {
                schema.max_items = Some(n as u64);
            }
        }
        _ => {
            if is_min {
                schema.minimum = Some(n);
            } else {
                schema.maximum = Some(n);
            }
        }
    }
}

fn apply_len(schema: &mut Schema, raw: &str) {
    let Ok(n) = raw.parse::<u64>() else { return };
    match schema.r#type {
        Some(SchemaType::Array) => {
            schema.min_items = Some(n);
            schema.max_items = Some(n);
        }
        _ => {
            schema.min_length = Some(n);
            schema.max_length = Some(n);
        }
    }
}

/// Translate a nominal record declaration (Go struct, Kotlin data class,
/// Scala case class) into an object [`Schema`]. Fields whose serialized
/// name is `-` are skipped (spec.md §4.5).
pub fn translate_struct(description: Option<&str>, fields: &[FieldDescriptor]) -> Schema {
    let mut schema = Schema::object();
    if let Some(desc) = description {
        schema.description = Some(desc.to_string());
    }
    for field in fields {
        if field.serialized_name == "-" {
            continue;
        }
        schema.set_property(field.serialized_name.clone(), field_to_schema(field), field.is_required());
    }
    schema
}

// ============================================================================
// Interface-style structural type-string resolution
// ============================================================================

lazy_static! {
    static ref ARRAY_SUFFIX: Regex = Regex::new(r"^(.+)\[\]$").unwrap();
    static ref ARRAY_GENERIC: Regex = Regex::new(r"^Array<(.+)>$").unwrap();
    static ref STRING_LITERAL: Regex = Regex::new(r#"^'([^']*)'$|^"([^"]*)"$"#).unwrap();
}

/// Resolve a TypeScript-interface-shaped type string into a [`Schema`],
/// per spec.md §4.5's interface-style rules.
pub fn resolve_type_string(raw: &str) -> Schema {
    let type_str = raw.trim();

    if let Some(caps) = ARRAY_SUFFIX.captures(type_str) {
        return Schema::array(resolve_type_string(&caps[1]));
    }
    if let Some(caps) = ARRAY_GENERIC.captures(type_str) {
        return Schema::array(resolve_type_string(&caps[1]));
    }

    if type_str.contains('|') {
        return resolve_union(type_str);
    }

    if let Some(caps) = STRING_LITERAL.captures(type_str) {
        let literal = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
        let mut schema = Schema::string();
        schema.r#enum = vec![serde_json::Value::String(literal.to_string())];
        return schema;
    }

    match type_str {
        "string" => Schema::string(),
        "number" => Schema::number(),
        "boolean" => Schema::boolean(),
        "Date" => Schema::string().with_format("date-time"),
        "any" | "unknown" | "void" => Schema::default(),
        "null" => Schema {
            r#type: Some(SchemaType::Null),
            ..Default::default()
        },
        other => Schema::reference(other),
    }
}

fn split_union_arms(type_str: &str) -> Vec<String> {
    let mut arms = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in type_str.chars() {
        match ch {
            '<' | '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            '>' | ']' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            '|' if depth == 0 => {
                arms.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        arms.push(current.trim().to_string());
    }
    arms
}

fn resolve_union(type_str: &str) -> Schema {
    let arms = split_union_arms(type_str);
    let mut members: Vec<Schema> = arms.iter().map(|a| resolve_type_string(a)).collect();

    if members.len() == 2 {
        if let Some(pos) = members.iter().position(|m| m.r#type == Some(SchemaType::Null)) {
            let mut remainder = members.remove(1 - pos);
            remainder.nullable = true;
            return remainder;
        }
    }

    Schema {
        one_of: members,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_suffix_and_generic_resolve_to_same_shape() {
        let a = resolve_type_string("string[]");
        let b = resolve_type_string("Array<string>");
        assert_eq!(a.r#type, Some(SchemaType::Array));
        assert_eq!(b.r#type, Some(SchemaType::Array));
        assert_eq!(a.items.unwrap().r#type, Some(SchemaType::String));
        assert_eq!(b.items.unwrap().r#type, Some(SchemaType::String));
    }

    #[test]
    fn two_arm_union_with_null_collapses_to_nullable() {
        let schema = resolve_type_string("string | null");
        assert!(schema.nullable);
        assert_eq!(schema.r#type, Some(SchemaType::String));
    }

    #[test]
    fn three_arm_union_stays_one_of() {
        let schema = resolve_type_string("string | number | boolean");
        assert_eq!(schema.one_of.len(), 3);
    }

    #[test]
    fn string_literal_arms_become_enum() {
        let schema = resolve_type_string("'admin'");
        assert_eq!(schema.r#type, Some(SchemaType::String));
        assert_eq!(schema.r#enum, vec![serde_json::Value::String("admin".to_string())]);
    }

    #[test]
    fn unknown_identifier_becomes_reference() {
        let schema = resolve_type_string("CreateItemDto");
        assert_eq!(schema.r#ref.as_deref(), Some("#/components/schemas/CreateItemDto"));
    }

    #[test]
    fn struct_field_required_ness_policy() {
        let fields = vec![
            FieldDescriptor::new("ID", TypeDescriptor::Primitive(PrimitiveKind::Integer)).required(),
            FieldDescriptor::new("Name", TypeDescriptor::Primitive(PrimitiveKind::String)),
            FieldDescriptor::new("Tags", TypeDescriptor::Sequence(Box::new(TypeDescriptor::Primitive(PrimitiveKind::String)))),
            FieldDescriptor::new("Internal", TypeDescriptor::Primitive(PrimitiveKind::String)).with_serialized_name("-"),
        ];
        let schema = translate_struct(None, &fields);
        assert_eq!(schema.required, vec!["ID".to_string()]);
        assert!(!schema.properties.contains_key("-"));
        assert_eq!(schema.properties.len(), 3);
    }

    #[test]
    fn pointer_to_primitive_is_nullable() {
        let field = FieldDescriptor::new(
            "Nickname",
            TypeDescriptor::Pointer(Box::new(TypeDescriptor::Primitive(PrimitiveKind::String))),
        );
        let schema = field_to_schema(&field);
        assert!(schema.nullable);
        assert_eq!(schema.r#type, Some(SchemaType::String));
    }

    #[test]
    fn validation_tags_map_to_constraints() {
        let field = FieldDescriptor::new("Email", TypeDescriptor::Primitive(PrimitiveKind::String))
            .with_tag("email", "")
            .with_tag("min", "5");
        let schema = field_to_schema(&field);
        assert_eq!(schema.format.as_deref(), Some("email"));
        assert_eq!(schema.min_length, Some(5));
    }
}
