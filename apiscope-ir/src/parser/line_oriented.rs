//! Line-oriented, regex-grammar parsers (spec.md §4.3) for Ruby (Rails
//! routes DSL), Scala (Tapir endpoint chains, case-class fields) and Kotlin
//! (Ktor routing DSL, data-class fields) — languages the dependency stack
//! carries no tree-sitter grammar for, matching the teacher's own grammar
//! set (`core::syntax::adapter::get_tree_sitter_language` has no Scala/
//! Kotlin arm either).

use lazy_static::lazy_static;
use regex::Regex;

// ============================================================================
// Rails routes DSL
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RawRoute {
    pub verb: String,
    pub path: String,
    pub handler: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
enum ScopeKind {
    Namespace(String),
    Scope(String),
}

lazy_static! {
    static ref RAILS_VERB: Regex =
        Regex::new(r#"^\s*(get|post|put|patch|delete)\s+['"]([^'"]+)['"](?:\s*,\s*to:\s*['"]([^'"]+)['"])?"#).unwrap();
    static ref RAILS_NAMESPACE: Regex = Regex::new(r#"^\s*namespace\s+:(\w+)\s+do"#).unwrap();
    static ref RAILS_SCOPE: Regex = Regex::new(r#"^\s*scope\s+['"]([^'"]+)['"]\s+do"#).unwrap();
    static ref RAILS_RESOURCES: Regex =
        Regex::new(r#"^\s*resources?\s+:(\w+)(?:.*only:\s*\[([^\]]*)\])?"#).unwrap();
    static ref RAILS_END: Regex = Regex::new(r#"^\s*end\s*$"#).unwrap();
}

/// Parse a `Rails.application.routes.draw do ... end` body into routes,
/// maintaining a `namespace`/`scope` prefix stack (spec.md §9's chain-walker
/// discipline applied to a line-oriented grammar) and expanding
/// `resources :name` per spec.md §8's S3 scenario.
pub fn parse_rails_routes(content: &str) -> Vec<RawRoute> {
    let mut routes = Vec::new();
    let mut stack: Vec<ScopeKind> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(caps) = RAILS_NAMESPACE.captures(line) {
            stack.push(ScopeKind::Namespace(caps[1].to_string()));
            continue;
        }
        if let Some(caps) = RAILS_SCOPE.captures(line) {
            stack.push(ScopeKind::Scope(caps[1].to_string()));
            continue;
        }
        if RAILS_END.is_match(line) {
            stack.pop();
            continue;
        }
        if let Some(caps) = RAILS_VERB.captures(line) {
            let verb = caps[1].to_string();
            let path = combine_with_stack(&stack, &caps[2]);
            let handler = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
            routes.push(RawRoute { verb, path, handler, line: line_no });
            continue;
        }
        if let Some(caps) = RAILS_RESOURCES.captures(line) {
            let resource = caps[1].to_string();
            let only: Option<Vec<String>> = caps.get(2).map(|m| {
                m.as_str()
                    .split(',')
                    .map(|s| s.trim().trim_start_matches(':').to_string())
                    .collect()
            });
            let prefix = stack_prefix(&stack);
            routes.extend(expand_resources(&prefix, &resource, only.as_deref(), line_no));
        }
    }

    routes
}

fn stack_prefix(stack: &[ScopeKind]) -> String {
    stack
        .iter()
        .map(|s| match s {
            ScopeKind::Namespace(name) => format!("/{name}"),
            ScopeKind::Scope(path) => format!("/{}", path.trim_matches('/')),
        })
        .collect()
}

fn combine_with_stack(stack: &[ScopeKind], path: &str) -> String {
    crate::path_utils::combine_path(&stack_prefix(stack), path)
}

/// Expand `resources :orders, only: [:index, :show]` into its member/
/// collection routes, handler named `<resource>#<action>` (spec.md §8 S3).
pub fn expand_resources(prefix: &str, resource: &str, only: Option<&[String]>, line: usize) -> Vec<RawRoute> {
    let allow = |action: &str| only.map(|list| list.iter().any(|a| a == action)).unwrap_or(true);
    let base = crate::path_utils::combine_path(prefix, &format!("/{resource}"));
    let handler_prefix = resource.to_string();
    let mut out = Vec::new();

    if allow("index") {
        out.push(RawRoute {
            verb: "get".to_string(),
            path: base.clone(),
            handler: format!("{handler_prefix}#index"),
            line,
        });
    }
    if allow("create") {
        out.push(RawRoute {
            verb: "post".to_string(),
            path: base.clone(),
            handler: format!("{handler_prefix}#create"),
            line,
        });
    }
    if allow("show") {
        out.push(RawRoute {
            verb: "get".to_string(),
            path: crate::path_utils::combine_path(&base, "/:id"),
            handler: format!("{handler_prefix}#show"),
            line,
        });
    }
    if allow("update") {
        out.push(RawRoute {
            verb: "put".to_string(),
            path: crate::path_utils::combine_path(&base, "/:id"),
            handler: format!("{handler_prefix}#update"),
            line,
        });
    }
    if allow("destroy") {
        out.push(RawRoute {
            verb: "delete".to_string(),
            path: crate::path_utils::combine_path(&base, "/:id"),
            handler: format!("{handler_prefix}#destroy"),
            line,
        });
    }
    out
}

// ============================================================================
// Tapir endpoint chains (Scala)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RawTapirEndpoint {
    pub name: String,
    pub verb: String,
    pub path_segments: Vec<PathSegment>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum PathSegment {
    Literal(String),
    Path { name: String, type_name: String },
    Query { name: String, type_name: String, optional: bool },
}

lazy_static! {
    static ref TAPIR_DECL: Regex =
        Regex::new(r#"val\s+(\w+)\s*=\s*endpoint\.(get|post|put|delete|patch)"#).unwrap();
    static ref TAPIR_LITERAL: Regex = Regex::new(r#"\.in\(\s*"([^"]+)"\s*\)"#).unwrap();
    static ref TAPIR_PATH_SEG: Regex = Regex::new(r#""([^"]+)"\s*/\s*path\[(\w+)\]\("([^"]+)"\)"#).unwrap();
    static ref TAPIR_QUERY: Regex =
        Regex::new(r#"query\[(?:Option\[(\w+)\]|(\w+))\]\("([^"]+)"\)"#).unwrap();
}

/// Parse `val name = endpoint.<verb>.in(...).in(query[...]("..."))` chains.
/// Each `val` declaration may span multiple source lines in real code;
/// callers are expected to pre-join logical statements (e.g. by
/// semicolon/line continuation) before calling this — spec.md §4.3 only
/// requires "just enough structure", not full expression parsing.
pub fn parse_tapir_endpoints(content: &str) -> Vec<RawTapirEndpoint> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let Some(decl) = TAPIR_DECL.captures(line) else { continue };
        let mut endpoint = RawTapirEndpoint {
            name: decl[1].to_string(),
            verb: decl[2].to_string(),
            path_segments: Vec::new(),
            line: idx + 1,
        };

        if let Some(caps) = TAPIR_PATH_SEG.captures(line) {
            endpoint.path_segments.push(PathSegment::Literal(caps[1].to_string()));
            endpoint.path_segments.push(PathSegment::Path {
                name: caps[3].to_string(),
                type_name: caps[2].to_string(),
            });
        } else {
            for caps in TAPIR_LITERAL.captures_iter(line) {
                endpoint.path_segments.push(PathSegment::Literal(caps[1].to_string()));
            }
        }

        for caps in TAPIR_QUERY.captures_iter(line) {
            let optional = caps.get(1).is_some();
            let type_name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "String".to_string());
            endpoint.path_segments.push(PathSegment::Query {
                name: caps[3].to_string(),
                type_name,
                optional,
            });
        }

        out.push(endpoint);
    }
    out
}

lazy_static! {
    static ref SCALA_CASE_CLASS: Regex = Regex::new(r#"case class\s+(\w+)\s*\(([^)]*)\)"#).unwrap();
}

/// Case-class field list: `name: Type` pairs, in declaration order.
pub fn parse_scala_case_class_fields(content: &str) -> Vec<(String, Vec<(String, String)>)> {
    let mut out = Vec::new();
    for caps in SCALA_CASE_CLASS.captures_iter(content) {
        let name = caps[1].to_string();
        let fields = caps[2]
            .split(',')
            .filter_map(|field| {
                let mut parts = field.splitn(2, ':');
                let field_name = parts.next()?.trim().to_string();
                let type_name = parts.next()?.trim().to_string();
                if field_name.is_empty() {
                    None
                } else {
                    Some((field_name, type_name))
                }
            })
            .collect();
        out.push((name, fields));
    }
    out
}

// ============================================================================
// Ktor routing DSL (Kotlin)
// ============================================================================

#[derive(Debug, Clone)]
pub struct RawKtorRoute {
    pub verb: String,
    pub path: String,
    pub line: usize,
}

lazy_static! {
    static ref KTOR_ROUTE_BLOCK: Regex = Regex::new(r#"route\("([^"]+)"\)\s*\{"#).unwrap();
    static ref KTOR_VERB: Regex = Regex::new(r#"\b(get|post|put|delete|patch)\s*(?:\("([^"]+)"\))?\s*\{"#).unwrap();
    static ref KTOR_CLOSE_BRACE: Regex = Regex::new(r"^\s*\}\s*$").unwrap();
}

/// Walk a Ktor `routing { route("/x") { get { ... } } }` body, maintaining a
/// `route(...)` prefix stack via naive brace counting (spec.md §9's
/// chain-walker discipline, applied line-by-line).
pub fn parse_ktor_routes(content: &str) -> Vec<RawKtorRoute> {
    let mut routes = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(caps) = KTOR_ROUTE_BLOCK.captures(line) {
            stack.push(caps[1].to_string());
            continue;
        }
        if let Some(caps) = KTOR_VERB.captures(line) {
            let verb = caps[1].to_string();
            let sub_path = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let prefix: String = stack.iter().map(|s| format!("/{}", s.trim_matches('/'))).collect();
            let path = crate::path_utils::combine_path(&prefix, sub_path);
            routes.push(RawKtorRoute { verb, path, line: line_no });
            continue;
        }
        if KTOR_CLOSE_BRACE.is_match(line) && !stack.is_empty() {
            stack.pop();
        }
    }

    routes
}

lazy_static! {
    static ref KOTLIN_DATA_CLASS: Regex = Regex::new(r#"data class\s+(\w+)\s*\(([^)]*)\)"#).unwrap();
}

/// Data-class field list: `name: Type` pairs, in declaration order.
pub fn parse_kotlin_data_class_fields(content: &str) -> Vec<(String, Vec<(String, String)>)> {
    let mut out = Vec::new();
    for caps in KOTLIN_DATA_CLASS.captures_iter(content) {
        let name = caps[1].to_string();
        let fields = caps[2]
            .split(',')
            .filter_map(|field| {
                let cleaned = field.trim().trim_start_matches("val ").trim_start_matches("var ");
                let mut parts = cleaned.splitn(2, ':');
                let field_name = parts.next()?.trim().to_string();
                let type_name = parts.next()?.trim().to_string();
                if field_name.is_empty() {
                    None
                } else {
                    Some((field_name, type_name))
                }
            })
            .collect();
        out.push((name, fields));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rails_namespace_and_resources_expand() {
        let content = r#"
Rails.application.routes.draw do
  namespace :api do
    namespace :v1 do
      get '/products', to: 'products#index'
      resources :orders, only: [:index, :show]
    end
  end
end
"#;
        let routes = parse_rails_routes(content);
        assert!(routes.iter().any(|r| r.path == "/api/v1/products" && r.handler == "products#index"));
        assert!(routes.iter().any(|r| r.path == "/api/v1/orders" && r.verb == "get" && r.handler == "orders#index"));
        assert!(routes.iter().any(|r| r.path == "/api/v1/orders/:id" && r.handler == "orders#show"));
        assert!(!routes.iter().any(|r| r.handler == "orders#destroy"));
    }

    #[test]
    fn tapir_path_param_and_query() {
        let content = r#"
val getUser = endpoint.get.in("users" / path[Long]("id")).out(jsonBody[User])
val search = endpoint.get.in("search").in(query[String]("q")).in(query[Option[Int]]("limit"))
"#;
        let endpoints = parse_tapir_endpoints(content);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].verb, "get");
        assert!(matches!(&endpoints[0].path_segments[1], PathSegment::Path { name, .. } if name == "id"));
        assert!(endpoints[1]
            .path_segments
            .iter()
            .any(|s| matches!(s, PathSegment::Query { name, optional, .. } if name == "limit" && *optional)));
    }

    #[test]
    fn ktor_nested_route_blocks() {
        let content = r#"
routing {
    route("/users") {
        get {
        }
        get("{id}") {
        }
    }
}
"#;
        let routes = parse_ktor_routes(content);
        assert!(routes.iter().any(|r| r.path == "/users" && r.verb == "get"));
        assert!(routes.iter().any(|r| r.path == "/users/{id}" && r.verb == "get"));
    }

    #[test]
    fn scala_case_class_fields_preserve_order() {
        let fields = parse_scala_case_class_fields("case class User(id: Long, name: String)");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "User");
        assert_eq!(fields[0].1, vec![("id".to_string(), "Long".to_string()), ("name".to_string(), "String".to_string())]);
    }

    #[test]
    fn kotlin_data_class_fields_strip_val_var() {
        let fields = parse_kotlin_data_class_fields("data class User(val id: Long, var name: String)");
        assert_eq!(fields[0].1, vec![("id".to_string(), "Long".to_string()), ("name".to_string(), "String".to_string())]);
    }
}
