//! Core data model — Route, Parameter, RequestBody, Response, SourceFile.
//!
//! All types mirror spec.md §3 exactly; they are defined here rather than
//! as a hierarchy of trait objects because the attributes are closed and
//! uniform across every framework plugin (the same discipline
//! `voyager_ast::ir` applies to `Declaration`/`DeclarationKind`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Language
// ============================================================================

/// Host language tag carried by a [`SourceFile`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Go,
    Ruby,
    Scala,
    Kotlin,
    /// Reserved per spec.md §6; no plugin currently consumes it.
    Python,
    Other,
}

impl Language {
    /// Detect language from a lowercase string tag, as provided by the
    /// scanner collaborator (spec.md §6).
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "typescript" => Self::TypeScript,
            "javascript" => Self::JavaScript,
            "go" => Self::Go,
            "ruby" => Self::Ruby,
            "scala" => Self::Scala,
            "kotlin" => Self::Kotlin,
            "python" => Self::Python,
            _ => Self::Other,
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "ts" | "mts" | "cts" | "tsx" => Self::TypeScript,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "go" => Self::Go,
            "rb" | "rake" | "gemspec" => Self::Ruby,
            "scala" | "sc" => Self::Scala,
            "kt" | "kts" => Self::Kotlin,
            "py" | "pyi" => Self::Python,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Go => "go",
            Self::Ruby => "ruby",
            Self::Scala => "scala",
            Self::Kotlin => "kotlin",
            Self::Python => "python",
            Self::Other => "other",
        }
    }
}

// ============================================================================
// Source input (spec.md §3, §6)
// ============================================================================

/// A single source file handed to the engine by the scanner collaborator.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub language: Language,
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, language: Language, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            language,
            content: content.into(),
        }
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

// ============================================================================
// HTTP method
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    All,
    Any,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::All => "ALL",
            Self::Any => "ANY",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "ALL" => Some(Self::All),
            "ANY" | "USE" => Some(Self::Any),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Parameters, request bodies, responses
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: crate::schema::Schema,
}

impl Parameter {
    pub fn path(name: impl Into<String>, schema: crate::schema::Schema) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Path,
            required: true,
            schema,
        }
    }

    pub fn query(name: impl Into<String>, required: bool, schema: crate::schema::Schema) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Query,
            required,
            schema,
        }
    }
}

/// One media-type entry inside a [`RequestBody`] or [`Response`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaTypeContent {
    pub schema: crate::schema::Schema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaTypeContent>,
}

impl RequestBody {
    /// A request body with a single `application/json` schema.
    pub fn json(schema: crate::schema::Schema, required: bool) -> Self {
        let mut content = BTreeMap::new();
        content.insert("application/json".to_string(), MediaTypeContent { schema });
        Self { required, content }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaTypeContent>>,
}

impl Response {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            content: None,
        }
    }

    pub fn with_json_body(description: impl Into<String>, schema: crate::schema::Schema) -> Self {
        let mut content = BTreeMap::new();
        content.insert("application/json".to_string(), MediaTypeContent { schema });
        Self {
            description: description.into(),
            content: Some(content),
        }
    }
}

// ============================================================================
// Route
// ============================================================================

/// A contiguous source-code region, 1-indexed lines only (spec.md §3
/// provenance needs nothing finer-grained than the declaring line).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self { start_line, end_line }
    }

    pub fn point(line: usize) -> Self {
        Self { start_line: line, end_line: line }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub handler: String,
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<BTreeMap<String, Response>>,
    pub source_file: String,
    pub source_line: usize,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, source_file: impl Into<String>, source_line: usize) -> Self {
        let path = path.into();
        let operation_id = crate::path_utils::operation_id(method, &path, "");
        let tags = crate::path_utils::infer_tags(&path);
        Self {
            method,
            path,
            handler: String::new(),
            operation_id,
            tags,
            parameters: Vec::new(),
            request_body: None,
            responses: None,
            source_file: source_file.into(),
            source_line,
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        let handler = handler.into();
        if !handler.is_empty() {
            self.operation_id = crate::path_utils::operation_id(self.method, &self.path, &handler);
        }
        self.handler = handler;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        if !tags.is_empty() {
            self.tags = tags;
        }
        self
    }

    pub fn push_param(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Every `{name}` placeholder in `path`, in left-to-right order.
    pub fn path_param_names(&self) -> Vec<String> {
        crate::path_utils::extract_path_param_names(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trips() {
        for m in [Method::Get, Method::Post, Method::Delete, Method::Any] {
            assert_eq!(Method::from_str_loose(m.as_str()), Some(m));
        }
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension(".rb"), Language::Ruby);
        assert_eq!(Language::from_extension("xyz"), Language::Other);
    }

    #[test]
    fn route_derives_operation_id_and_tags() {
        let route = Route::new(Method::Get, "/users/{id}", "app.ts", 5);
        assert_eq!(route.operation_id, "getUsersByid");
        assert_eq!(route.tags, vec!["users".to_string()]);
    }
}
