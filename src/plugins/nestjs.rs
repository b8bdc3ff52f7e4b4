//! NestJS plugin (spec.md §4.4): `@Controller(...)` classes, `@Get`/`@Post`/
//! etc. method decorators, `@Param`/`@Query`/`@Body` parameter decorators.
//!
//! Decorator nesting inside a class body is recovered line-oriented rather
//! than through tree-sitter-typescript's decorator node shape, which the
//! pack's grammar crate models ambiguously across experimental-decorator
//! proposals; a small regex grammar is deterministic and easy to reason
//! about (spec.md §9: "prefer deterministic, syntactic heuristics").

use super::{FrameworkPlugin, PluginInfo};
use crate::error::Result;
use crate::plugins::manifest;
use apiscope_ir::{Language, Method, Parameter, RequestBody, Response, Route, Schema, SchemaRegistry, SourceFile};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

const VERBS: &[&str] = &["Get", "Post", "Put", "Delete", "Patch", "All"];

lazy_static! {
    static ref CONTROLLER: Regex = Regex::new(r"@Controller\(\s*([^)]*)\s*\)").unwrap();
    static ref CLASS: Regex = Regex::new(r"class\s+(\w+)").unwrap();
    static ref DECORATOR_CALL: Regex = Regex::new(r"@(\w+)\(([^()]*)\)").unwrap();
    static ref IDENT_OPEN_PAREN: Regex = Regex::new(r"(\w+)\(").unwrap();
    static ref OBJ_KEY: Regex = Regex::new(r"(\w+)\s*:\s*'([^']*)'").unwrap();
    static ref PARAM_DEC: Regex = Regex::new(r"@Param\(\s*'([^']+)'\s*\)").unwrap();
    static ref QUERY_DEC: Regex = Regex::new(r"@Query\(\s*'([^']+)'\s*\)\s*(\w+)(\?)?\s*:\s*(\w+)").unwrap();
    static ref BODY_DEC: Regex = Regex::new(r"@Body\(\)\s*\w+\s*:\s*(\w+)").unwrap();
}

pub struct NestJsPlugin;

impl FrameworkPlugin for NestJsPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "nestjs",
            version: "1.0.0",
            description: "NestJS controller/decorator route extractor",
            supported_frameworks: &["nestjs"],
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ts"]
    }

    fn detect(&self, project_root: &str) -> Result<bool> {
        Ok(manifest::package_json_has_dependency(project_root, "@nestjs/core")?
            || manifest::package_json_has_dependency(project_root, "@nestjs/common")?)
    }

    fn extract_routes(&self, files: &[SourceFile]) -> Vec<Route> {
        let mut routes = Vec::new();
        for file in files {
            if file.language != Language::TypeScript {
                continue;
            }
            if !file.text().contains("@Controller") {
                continue;
            }
            routes.extend(extract_file_routes(&file.text(), &file.path));
        }
        routes
    }

    fn extract_schemas(&self, _files: &[SourceFile], _registry: &SchemaRegistry) -> Vec<Schema> {
        Vec::new()
    }
}

fn parse_controller_arg(arg: &str) -> (Option<String>, Option<String>) {
    let trimmed = arg.trim();
    if trimmed.starts_with('{') {
        let path = OBJ_KEY
            .captures_iter(trimmed)
            .find(|c| &c[1] == "path")
            .map(|c| c[2].to_string());
        let version = OBJ_KEY
            .captures_iter(trimmed)
            .find(|c| &c[1] == "version")
            .map(|c| c[2].to_string());
        (path, version)
    } else {
        let bare = trimmed.trim_matches(|c| c == '\'' || c == '"');
        if bare.is_empty() {
            (None, None)
        } else {
            (Some(bare.to_string()), None)
        }
    }
}

/// The method's identifier + raw parameter text, skipping decorator
/// `ident(args)` shapes (those are always preceded by `@`) and
/// brace-balancing the argument span so a parameter-decorator call nested
/// inside it (`@Param('id')`, `@Body()`) doesn't truncate the match.
fn method_signature(line: &str) -> Option<(String, String)> {
    for caps in IDENT_OPEN_PAREN.captures_iter(line) {
        let name = caps.get(1).unwrap();
        let preceded_by_at = name.start() > 0 && line.as_bytes()[name.start() - 1] == b'@';
        if preceded_by_at {
            continue;
        }
        let open = caps.get(0).unwrap().end() - 1;
        let args_start = open + 1;
        let mut depth = 1i32;
        let mut close = None;
        for (offset, ch) in line[args_start..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(args_start + offset);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else { continue };
        return Some((name.as_str().to_string(), line[args_start..close].to_string()));
    }
    None
}

fn extract_file_routes(content: &str, path: &str) -> Vec<Route> {
    let lines: Vec<&str> = content.lines().collect();
    let mut routes = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(controller_caps) = CONTROLLER.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let controller_arg = controller_caps.get(1).map(|m| m.as_str()).unwrap_or("");

        let mut class_line = i;
        let mut class_name = None;
        while class_line < lines.len() && class_line < i + 5 {
            if let Some(c) = CLASS.captures(lines[class_line]) {
                class_name = Some(c[1].to_string());
                break;
            }
            class_line += 1;
        }
        let Some(class_name) = class_name else {
            i += 1;
            continue;
        };

        let (path_part, version_part) = parse_controller_arg(controller_arg);
        let mut prefix = String::new();
        if let Some(v) = &version_part {
            prefix = format!("/v{v}");
        }
        if let Some(p) = &path_part {
            prefix = apiscope_ir::path_utils::combine_path(&prefix, &format!("/{p}"));
        }
        if prefix.is_empty() {
            prefix = "/".to_string();
        }

        let mut depth = 0i32;
        let mut started = false;
        let mut end = class_line;
        for (k, line) in lines.iter().enumerate().skip(class_line) {
            for ch in line.chars() {
                if ch == '{' {
                    depth += 1;
                    started = true;
                } else if ch == '}' {
                    depth -= 1;
                }
            }
            if started && depth <= 0 {
                end = k;
                break;
            }
        }

        for (line_no, line) in lines.iter().enumerate().take(end + 1).skip(class_line) {
            let decorators: Vec<(String, String)> = DECORATOR_CALL
                .captures_iter(line)
                .map(|c| (c[1].to_string(), c[2].to_string()))
                .collect();
            let Some((verb_name, verb_arg)) = decorators.iter().find(|(n, _)| VERBS.contains(&n.as_str())) else {
                continue;
            };
            let Some((method_name, params_text)) = method_signature(line) else {
                continue;
            };
            let Some(http_method) = Method::from_str_loose(verb_name) else {
                continue;
            };

            let raw_path = verb_arg.trim_matches(|c| c == '\'' || c == '"');
            let joined = if raw_path.is_empty() {
                "/".to_string()
            } else {
                format!("/{raw_path}")
            };
            let full_path = apiscope_ir::path_utils::combine_path(&prefix, &joined);
            let converted = apiscope_ir::path_utils::convert_path_params(&full_path);

            let handler = format!("{class_name}.{method_name}");
            let mut route = Route::new(http_method, &converted, path, line_no + 1).with_handler(handler);
            route = route.with_tags(apiscope_ir::path_utils::infer_tags_for_controller(&route.path, &class_name));

            for name in route.path_param_names() {
                route = route.push_param(Parameter::path(name, Schema::string()));
            }

            for cap in PARAM_DEC.captures_iter(&params_text) {
                let name = &cap[1];
                if !route.parameters.iter().any(|p| p.name == name) {
                    route = route.push_param(Parameter::path(name.to_string(), Schema::string()));
                }
            }

            for cap in QUERY_DEC.captures_iter(&params_text) {
                let name = cap[1].to_string();
                let optional = cap.get(3).is_some();
                let schema = ts_type_to_schema(&cap[4]);
                route = route.push_param(Parameter::query(name, !optional, schema));
            }

            if let Some(cap) = BODY_DEC.captures(&params_text) {
                let dto_name = cap[1].to_string();
                route.request_body = Some(RequestBody::json(Schema::reference(&dto_name), true));
            }

            if let Some((_, code_arg)) = decorators.iter().find(|(n, _)| n == "HttpCode") {
                let mut responses = BTreeMap::new();
                responses.insert(code_arg.trim().to_string(), Response::described(format!("HTTP {}", code_arg.trim())));
                route.responses = Some(responses);
            }

            routes.push(route);
        }

        i = end + 1;
    }

    routes
}

fn ts_type_to_schema(type_name: &str) -> Schema {
    match type_name {
        "number" => Schema::number(),
        "boolean" => Schema::boolean(),
        _ => Schema::string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_nestjs_controller_with_decorators() {
        let source = "@Controller({ path: 'items', version: '1' })\n\
            export class ItemsController {\n\
            \u{20}@Get() findAll() {}\n\
            \u{20}@Get(':id') findOne(@Param('id') id: string) {}\n\
            \u{20}@Post() @HttpCode(201) create(@Body() dto: CreateItemDto) {}\n\
            }\n";
        let routes = extract_file_routes(source, "items.controller.ts");

        let find_all = routes.iter().find(|r| r.handler.ends_with("findAll")).unwrap();
        assert_eq!(find_all.path, "/v1/items");
        assert_eq!(find_all.tags, vec!["items".to_string()]);

        let find_one = routes.iter().find(|r| r.handler.ends_with("findOne")).unwrap();
        assert_eq!(find_one.path, "/v1/items/{id}");
        assert!(find_one.parameters.iter().any(|p| p.name == "id"));

        let create = routes.iter().find(|r| r.handler.ends_with("create")).unwrap();
        assert_eq!(create.path, "/v1/items");
        assert_eq!(create.method, Method::Post);
        let body = create.request_body.as_ref().unwrap();
        assert_eq!(
            body.content.get("application/json").unwrap().schema.r#ref.as_deref(),
            Some("#/components/schemas/CreateItemDto")
        );
        let responses = create.responses.as_ref().unwrap();
        assert!(responses.contains_key("201"));
    }
}
