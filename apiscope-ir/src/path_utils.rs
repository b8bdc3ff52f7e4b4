//! Shared utilities — path combination, path-parameter conversion,
//! operation-id generation, tag inference (spec.md §4.6, normative).
//!
//! Factored out of the plugin layer so every framework plugin composes the
//! same deterministic rules instead of re-deriving them (spec.md §9:
//! "Implementers should factor common helpers ... into shared modules to
//! avoid divergence"), mirroring how `pm_encoder`'s walker/search modules
//! share a single `FileWalker`/ignore-pattern implementation rather than
//! letting each caller reinvent one.

use crate::model::Method;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NAMED_PARAM: Regex = Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)(\([^)]*\))?").unwrap();
    static ref BRACE_PARAM: Regex = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\??\}").unwrap();
}

/// Trim/prefix/join/collapse per spec.md §4.6.
pub fn combine_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let mut path = path.to_string();
    if !path.starts_with('/') {
        path = format!("/{path}");
    }

    let combined = if prefix.is_empty() {
        path
    } else {
        format!("{prefix}{path}")
    };

    normalize_path(&combined)
}

/// Collapse doubled slashes, ensure a leading slash, strip any trailing
/// slash except for the bare root. Idempotent (spec.md §3 invariant, tested
/// below).
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        out.push('/');
    }
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Host syntax (`:name`, `*`, `{name?}`) → OpenAPI `{name}` syntax.
pub fn convert_path_params(path: &str) -> String {
    let converted = NAMED_PARAM.replace_all(path, "{$1}");
    let converted = converted.replace('*', "{path}");
    // Strip an optional-marker inside `{name?}`.
    converted.replace("?}", "}")
}

/// One path `Parameter` per `{name}` placeholder, in appearance order
/// (spec.md §4.6). Callers attach the concrete schema; this only recovers
/// the ordered name list.
pub fn extract_path_param_names(path: &str) -> Vec<String> {
    BRACE_PARAM
        .captures_iter(path)
        .map(|c| c[1].to_string())
        .collect()
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// spec.md §4.6: handler-derived when known, else path-derived.
pub fn operation_id(method: Method, path: &str, handler: &str) -> String {
    let verb = method.as_str().to_lowercase();

    if !handler.is_empty() {
        let last_segment = handler
            .rsplit(|c| c == '.' || c == '#')
            .next()
            .unwrap_or(handler);
        return format!("{verb}{last_segment}");
    }

    let normalized = normalize_path(path);
    let with_by = BRACE_PARAM.replace_all(&normalized, "By$1");

    let segments: Vec<String> = with_by
        .split('/')
        .filter(|s| !s.is_empty())
        .map(title_case)
        .collect();

    if segments.is_empty() {
        return verb;
    }

    format!("{verb}{}", segments.join(""))
}

const TAG_SKIP: &[&str] = &["api", "v1", "v2", "v3"];

/// spec.md §4.6: first non-empty, non-parameter, non-skip-set segment.
pub fn infer_tags(path: &str) -> Vec<String> {
    let normalized = normalize_path(path);
    for segment in normalized.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment.starts_with('{') && segment.ends_with('}') {
            continue;
        }
        let lower = segment.to_lowercase();
        if TAG_SKIP.contains(&lower.as_str()) {
            continue;
        }
        return vec![segment.to_string()];
    }
    Vec::new()
}

/// NestJS-style: prefer `lowercase(controller_name_without_"Controller")`
/// when non-empty, else fall back to path-derived tags.
pub fn infer_tags_for_controller(path: &str, controller_name: &str) -> Vec<String> {
    let trimmed = controller_name.strip_suffix("Controller").unwrap_or(controller_name);
    if !trimmed.is_empty() {
        return vec![trimmed.to_lowercase()];
    }
    infer_tags(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_path_trims_and_joins() {
        assert_eq!(combine_path("/api/", "/users"), "/api/users");
        assert_eq!(combine_path("", "users"), "/users");
        assert_eq!(combine_path("/api", ""), "/api");
        assert_eq!(combine_path("/api//v1/", "//users"), "/api/v1/users");
    }

    #[test]
    fn normalize_path_is_idempotent() {
        let once = normalize_path("//a//b/");
        let twice = normalize_path(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "/a/b");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn convert_path_params_handles_named_wildcard_and_optional() {
        assert_eq!(convert_path_params("/users/:id"), "/users/{id}");
        assert_eq!(convert_path_params("/files/*"), "/files/{path}");
        assert_eq!(convert_path_params("/users/:id(\\d+)"), "/users/{id}");
        assert_eq!(convert_path_params("/users/{id?}"), "/users/{id}");
    }

    #[test]
    fn convert_path_params_is_idempotent_once_converted() {
        let once = convert_path_params("/users/:id");
        let twice = convert_path_params(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn extract_path_param_names_preserves_order() {
        assert_eq!(
            extract_path_param_names("/a/{foo}/b/{bar}"),
            vec!["foo".to_string(), "bar".to_string()]
        );
    }

    #[test]
    fn operation_id_from_handler() {
        assert_eq!(
            operation_id(Method::Get, "/items", "ItemsController.findAll"),
            "getfindAll"
        );
        assert_eq!(operation_id(Method::Post, "/items", "Controller#create"), "postcreate");
    }

    #[test]
    fn operation_id_from_path() {
        assert_eq!(operation_id(Method::Get, "/users/{id}", ""), "getUsersByid");
        assert_eq!(operation_id(Method::Get, "/", ""), "get");
        assert_eq!(operation_id(Method::Get, "", ""), "get");
    }

    #[test]
    fn infer_tags_skips_version_segments() {
        assert_eq!(infer_tags("/api/v1/users/{id}"), vec!["users".to_string()]);
        assert_eq!(infer_tags("/v2/{id}"), Vec::<String>::new());
        assert_eq!(infer_tags("/"), Vec::<String>::new());
    }

    #[test]
    fn infer_tags_for_controller_prefers_controller_name() {
        assert_eq!(
            infer_tags_for_controller("/items", "ItemsController"),
            vec!["items".to_string()]
        );
        assert_eq!(
            infer_tags_for_controller("/api/orders", ""),
            vec!["orders".to_string()]
        );
    }
}
