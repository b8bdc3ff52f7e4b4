//! Validator-combinator chain interpreter (spec.md §4.5), for Zod- and
//! TypeBox-shaped fluent schema DSLs (`z.object({...})`, `t.Object({...})`).
//!
//! The tree-sitter parser layer turns a `call_expression` node into a
//! [`ChainCall`] before this module ever sees it — this keeps syntax-tree
//! walking (language-specific) separate from chain semantics
//! (language-neutral), the same separation `voyager_ast::ir::Call` draws
//! between "a call happened" and what that call means.

use crate::schema::{Schema, SchemaType};

/// One argument passed to a chain segment, already resolved from whatever
/// concrete-syntax node produced it.
#[derive(Debug, Clone)]
pub enum ChainArg {
    Str(String),
    Num(f64),
    Bool(bool),
    Ident(String),
    Regex(String),
    Array(Vec<ChainArg>),
    /// Object literal, e.g. the argument to `z.object({...})`; values are
    /// themselves chains so nested validator expressions recurse.
    Object(Vec<(String, ChainCall)>),
    Chain(Box<ChainCall>),
}

#[derive(Debug, Clone)]
pub struct CallSegment {
    pub name: String,
    pub args: Vec<ChainArg>,
}

/// A full method chain, e.g. `z.string().min(1).max(100)`: `root = "z"`,
/// `segments = [string(), min(1), max(100)]`.
#[derive(Debug, Clone)]
pub struct ChainCall {
    pub root: String,
    pub segments: Vec<CallSegment>,
}

impl ChainCall {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    pub fn call(mut self, name: impl Into<String>, args: Vec<ChainArg>) -> Self {
        self.segments.push(CallSegment { name: name.into(), args });
        self
    }
}

/// Known validator roots a variable declaration must be initialized from to
/// be considered a schema declaration (spec.md §4.3's pre-indexing rule).
pub const KNOWN_ROOTS: &[&str] = &["z", "t"];

/// Interpret a chain rooted at a known validator namespace into a [`Schema`].
/// Unknown base calls degrade to an empty `Schema::default()` rather than
/// failing — spec.md §4.7's "best partial schema" posture.
pub fn interpret(chain: &ChainCall) -> Schema {
    let mut segments = chain.segments.iter();
    let base = match segments.next() {
        Some(seg) => seg,
        None => return Schema::default(),
    };

    let mut schema = interpret_base(base);
    for seg in segments {
        apply_modifier(&mut schema, seg);
    }
    schema
}

fn interpret_base(seg: &CallSegment) -> Schema {
    match seg.name.as_str() {
        "string" => Schema::string(),
        "number" => Schema::number(),
        "int" => Schema::integer(),
        "bigint" => Schema::string().with_format("bigint"),
        "boolean" => Schema::boolean(),
        "date" => Schema::string().with_format("date-time"),
        "object" => interpret_object(seg),
        "array" => interpret_array(seg),
        "enum" => interpret_enum(seg),
        "nativeEnum" => interpret_enum(seg),
        "literal" => interpret_literal(seg),
        "union" => interpret_union(seg),
        "intersection" => interpret_intersection(seg),
        "tuple" => interpret_tuple(seg),
        "record" => interpret_record(seg),
        "optional" | "nullable" | "lazy" => interpret_wrapped(seg),
        "Object" => interpret_object(seg), // TypeBox capitalization
        "String" => Schema::string(),
        "Number" => Schema::number(),
        "Integer" => Schema::integer(),
        "Boolean" => Schema::boolean(),
        "Array" => interpret_array(seg),
        _ => Schema::default(),
    }
}

fn interpret_object(seg: &CallSegment) -> Schema {
    let mut schema = Schema::object();
    if let Some(ChainArg::Object(props)) = seg.args.first() {
        for (name, value_chain) in props {
            let value_schema = interpret(value_chain);
            let required = !chain_is_optional(value_chain);
            schema.set_property(name.clone(), value_schema, required);
        }
    }
    schema
}

fn chain_is_optional(chain: &ChainCall) -> bool {
    chain.segments.iter().any(|s| s.name == "optional")
}

fn interpret_array(seg: &CallSegment) -> Schema {
    let items = match seg.args.first() {
        Some(ChainArg::Chain(inner)) => interpret(inner),
        _ => Schema::default(),
    };
    Schema::array(items)
}

fn interpret_enum(seg: &CallSegment) -> Schema {
    let mut schema = Schema::string();
    if let Some(ChainArg::Array(items)) = seg.args.first() {
        schema.r#enum = items
            .iter()
            .filter_map(|a| match a {
                ChainArg::Str(s) => Some(serde_json::Value::String(s.clone())),
                ChainArg::Num(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
                _ => None,
            })
            .collect();
    }
    schema
}

fn interpret_literal(seg: &CallSegment) -> Schema {
    match seg.args.first() {
        Some(ChainArg::Str(s)) => {
            let mut schema = Schema::string();
            schema.r#enum = vec![serde_json::Value::String(s.clone())];
            schema
        }
        Some(ChainArg::Num(n)) => {
            let mut schema = Schema::number();
            if let Some(v) = serde_json::Number::from_f64(*n) {
                schema.r#enum = vec![serde_json::Value::Number(v)];
            }
            schema
        }
        Some(ChainArg::Bool(b)) => {
            let mut schema = Schema::boolean();
            schema.r#enum = vec![serde_json::Value::Bool(*b)];
            schema
        }
        _ => Schema::default(),
    }
}

fn interpret_union(seg: &CallSegment) -> Schema {
    let members: Vec<Schema> = match seg.args.first() {
        Some(ChainArg::Array(items)) => items
            .iter()
            .filter_map(|a| match a {
                ChainArg::Chain(c) => Some(interpret(c)),
                ChainArg::Ident(name) if name == "null" => Some(Schema {
                    r#type: Some(SchemaType::Null),
                    ..Default::default()
                }),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    // Two-armed union with a null member collapses into `nullable` per
    // spec.md §4.5's interface-style union rule, reused here for symmetry.
    if members.len() == 2 {
        if let Some(pos) = members.iter().position(|m| m.r#type == Some(SchemaType::Null)) {
            let mut remainder = members[1 - pos].clone();
            remainder.nullable = true;
            return remainder;
        }
    }

    Schema {
        one_of: members,
        ..Default::default()
    }
}

fn interpret_intersection(seg: &CallSegment) -> Schema {
    let members: Vec<Schema> = seg
        .args
        .iter()
        .filter_map(|a| match a {
            ChainArg::Chain(c) => Some(interpret(c)),
            _ => None,
        })
        .collect();
    Schema {
        all_of: members,
        ..Default::default()
    }
}

fn interpret_tuple(seg: &CallSegment) -> Schema {
    let members: Vec<Schema> = match seg.args.first() {
        Some(ChainArg::Array(items)) => items
            .iter()
            .filter_map(|a| match a {
                ChainArg::Chain(c) => Some(interpret(c)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let len = members.len() as u64;
    Schema {
        r#type: Some(SchemaType::Array),
        one_of: members,
        min_items: Some(len),
        max_items: Some(len),
        ..Default::default()
    }
}

fn interpret_record(seg: &CallSegment) -> Schema {
    let value_schema = seg
        .args
        .iter()
        .rev()
        .find_map(|a| match a {
            ChainArg::Chain(c) => Some(interpret(c)),
            _ => None,
        })
        .unwrap_or_default();
    Schema {
        r#type: Some(SchemaType::Object),
        additional_properties: Some(Box::new(value_schema)),
        ..Default::default()
    }
}

fn interpret_wrapped(seg: &CallSegment) -> Schema {
    let mut inner = seg
        .args
        .iter()
        .find_map(|a| match a {
            ChainArg::Chain(c) => Some(interpret(c)),
            _ => None,
        })
        .unwrap_or_default();
    if seg.name == "nullable" {
        inner.nullable = true;
    }
    inner
}

fn first_num(args: &[ChainArg]) -> Option<f64> {
    args.iter().find_map(|a| match a {
        ChainArg::Num(n) => Some(*n),
        _ => None,
    })
}

fn first_str(args: &[ChainArg]) -> Option<String> {
    args.iter().find_map(|a| match a {
        ChainArg::Str(s) => Some(s.clone()),
        _ => None,
    })
}

/// Apply one chained modifier call (everything after the base) in place,
/// per spec.md §4.5's modifier table.
fn apply_modifier(schema: &mut Schema, seg: &CallSegment) {
    match seg.name.as_str() {
        "min" => {
            if let Some(n) = first_num(&seg.args) {
                match schema.r#type {
                    Some(SchemaType::String) => schema.min_length = Some(n as u64),
                    Some(SchemaType::Array) => schema.min_items = Some(n as u64),
                    _ => schema.minimum = Some(n),
                }
            }
        }
        "max" => {
            if let Some(n) = first_num(&seg.args) {
                match schema.r#type {
                    Some(SchemaType::String) => schema.max_length = Some(n as u64),
                    Some(SchemaType::Array) => schema.max_items = Some(n as u64),
                    _ => schema.maximum = Some(n),
                }
            }
        }
        "length" => {
            if let Some(n) = first_num(&seg.args) {
                let n = n as u64;
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
        }
        "email" | "url" | "uri" | "uuid" | "cuid" | "cuid2" | "ulid" | "datetime" | "date"
        | "time" | "duration" | "ip" | "ipv4" | "ipv6" => {
            schema.format = Some(seg.name.clone());
        }
        "int" => schema.r#type = Some(SchemaType::Integer),
        "positive" => schema.minimum = Some(schema.minimum.unwrap_or(0.0).max(1.0)),
        "negative" => schema.maximum = Some(schema.maximum.unwrap_or(0.0).min(-1.0)),
        "nonnegative" => schema.minimum = Some(0.0),
        "nonpositive" => schema.maximum = Some(0.0),
        "multipleOf" => schema.multiple_of = first_num(&seg.args),
        "regex" => {
            if let Some(ChainArg::Regex(pattern)) = seg.args.first() {
                schema.pattern = Some(pattern.clone());
            }
        }
        "nullable" => schema.nullable = true,
        "optional" => {}
        "default" => {
            schema.default = seg.args.first().and_then(chain_arg_to_json);
        }
        "describe" => {
            if let Some(s) = first_str(&seg.args) {
                schema.description = Some(s);
            }
        }
        "readonly" => schema.read_only = true,
        // spec.md §4.5: semantics-neutral modifiers are acknowledged and ignored.
        "trim" | "transform" | "refine" | "superRefine" | "catch" | "brand" | "pipe" => {}
        _ => {}
    }
}

fn chain_arg_to_json(arg: &ChainArg) -> Option<serde_json::Value> {
    match arg {
        ChainArg::Str(s) => Some(serde_json::Value::String(s.clone())),
        ChainArg::Num(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
        ChainArg::Bool(b) => Some(serde_json::Value::Bool(*b)),
        _ => None,
    }
}

/// `ExtractSchemas` glue: register an `object(...)` chain under `name`
/// (spec.md §4.5 "schema registry stores all extracted schemas").
pub fn register(registry: &crate::schema::SchemaRegistry, name: &str, chain: &ChainCall) {
    registry.add(name, interpret(chain));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn str_chain(segments: &[(&str, Vec<ChainArg>)]) -> ChainCall {
        let mut chain = ChainCall::new("z");
        for (name, args) in segments {
            chain = chain.call(*name, args.clone());
        }
        chain
    }

    #[test]
    fn string_uuid_schema() {
        let chain = str_chain(&[("string", vec![]), ("uuid", vec![])]);
        let schema = interpret(&chain);
        assert_eq!(schema.r#type, Some(SchemaType::String));
        assert_eq!(schema.format.as_deref(), Some("uuid"));
    }

    #[test]
    fn string_min_max_schema() {
        let chain = str_chain(&[
            ("string", vec![]),
            ("min", vec![ChainArg::Num(1.0)]),
            ("max", vec![ChainArg::Num(100.0)]),
        ]);
        let schema = interpret(&chain);
        assert_eq!(schema.min_length, Some(1));
        assert_eq!(schema.max_length, Some(100));
    }

    #[test]
    fn number_int_positive_optional_is_not_required_by_caller() {
        let chain = str_chain(&[
            ("number", vec![]),
            ("int", vec![]),
            ("positive", vec![]),
            ("optional", vec![]),
        ]);
        let schema = interpret(&chain);
        assert_eq!(schema.r#type, Some(SchemaType::Integer));
        assert_eq!(schema.minimum, Some(1.0));
        assert!(chain_is_optional(&chain));
    }

    #[test]
    fn object_schema_s6_user() {
        let id = str_chain(&[("string", vec![]), ("uuid", vec![])]);
        let name = str_chain(&[
            ("string", vec![]),
            ("min", vec![ChainArg::Num(1.0)]),
            ("max", vec![ChainArg::Num(100.0)]),
        ]);
        let email = str_chain(&[("string", vec![]), ("email", vec![])]);
        let age = str_chain(&[
            ("number", vec![]),
            ("int", vec![]),
            ("positive", vec![]),
            ("optional", vec![]),
        ]);

        let object = ChainCall::new("z").call(
            "object",
            vec![ChainArg::Object(vec![
                ("id".to_string(), id),
                ("name".to_string(), name),
                ("email".to_string(), email),
                ("age".to_string(), age),
            ])],
        );

        let schema = interpret(&object);
        assert_eq!(schema.r#type, Some(SchemaType::Object));
        assert_eq!(
            schema.required,
            vec!["id".to_string(), "name".to_string(), "email".to_string()]
        );
        assert_eq!(schema.properties.len(), 4);
        assert_eq!(schema.properties["age"].r#type, Some(SchemaType::Integer));
    }

    #[test]
    fn nullable_union_collapses_to_nullable_remainder() {
        let chain = ChainCall::new("z").call(
            "union",
            vec![ChainArg::Array(vec![
                ChainArg::Chain(Box::new(str_chain(&[("string", vec![])]))),
                ChainArg::Ident("null".to_string()),
            ])],
        );
        let schema = interpret(&chain);
        assert!(schema.nullable);
        assert_eq!(schema.r#type, Some(SchemaType::String));
    }
}
