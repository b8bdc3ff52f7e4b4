//! JSON-Schema-shaped `Schema` record and the thread-safe `SchemaRegistry`
//! (spec.md §3, §9: "Tagged schema kinds over inheritance" — `Schema` is a
//! single record with optional fields, not a trait hierarchy, so kind is
//! expressed by which fields are populated).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// A JSON-Schema-shaped record. Every attribute from spec.md §3 is present;
/// all but `type` are optional so a single struct can represent every
/// schema kind the engine recovers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub r#enum: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
}

impl Schema {
    pub fn typed(t: SchemaType) -> Self {
        Self {
            r#type: Some(t),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::typed(SchemaType::String)
    }

    pub fn integer() -> Self {
        Self::typed(SchemaType::Integer)
    }

    pub fn number() -> Self {
        Self::typed(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::typed(SchemaType::Boolean)
    }

    pub fn object() -> Self {
        Self::typed(SchemaType::Object)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            r#type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// `#/components/schemas/<name>` reference, per spec.md §3.
    pub fn reference(name: &str) -> Self {
        Self {
            r#ref: Some(format!("#/components/schemas/{name}")),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn set_property(&mut self, name: impl Into<String>, schema: Schema, required: bool) {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
    }
}

/// Shared, thread-safe registry of named schemas (spec.md §3, §5).
///
/// Readers and writers may interleave across files; writes are serialized
/// through the `RwLock`, exactly as spec.md §5 requires. `BTreeMap`
/// guarantees `names()`/`snapshot()` are deterministically ordered, the
/// same discipline `voyager_ast::provider::PlanetariumModel` applies to its
/// own file index.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<BTreeMap<String, Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: impl Into<String>, schema: Schema) {
        let mut guard = self.schemas.write().expect("schema registry poisoned");
        guard.insert(name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Option<Schema> {
        self.schemas.read().expect("schema registry poisoned").get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.schemas.read().expect("schema registry poisoned").contains_key(name)
    }

    /// Sorted schema names (BTreeMap keys are already sorted).
    pub fn names(&self) -> Vec<String> {
        self.schemas.read().expect("schema registry poisoned").keys().cloned().collect()
    }

    /// Merge another registry's entries into this one. Later entries with
    /// the same name overwrite earlier ones; callers relying on
    /// idempotent re-extraction (spec.md §8.7) should register the same
    /// structural Schema on every pass.
    pub fn merge(&self, other: &SchemaRegistry) {
        let incoming = other.snapshot();
        let mut guard = self.schemas.write().expect("schema registry poisoned");
        for (name, schema) in incoming {
            guard.insert(name, schema);
        }
    }

    pub fn remove(&self, name: &str) -> Option<Schema> {
        self.schemas.write().expect("schema registry poisoned").remove(name)
    }

    pub fn clear(&self) {
        self.schemas.write().expect("schema registry poisoned").clear();
    }

    pub fn count(&self) -> usize {
        self.schemas.read().expect("schema registry poisoned").len()
    }

    /// A full copy, safe against further external mutation (spec.md §9).
    pub fn snapshot(&self) -> BTreeMap<String, Schema> {
        self.schemas.read().expect("schema registry poisoned").clone()
    }

    pub fn to_vec(&self) -> Vec<(String, Schema)> {
        self.snapshot().into_iter().collect()
    }
}
