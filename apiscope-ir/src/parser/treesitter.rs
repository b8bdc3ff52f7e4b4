//! Tree-sitter-backed parser (spec.md §4.3) for TypeScript, JavaScript and
//! Go. Structural helpers mirror the node-walking idiom
//! `core::syntax::adapter::TreeSitterAdapter` uses for its own
//! Rust/Python/JS symbol extraction (`child_by_field_name`, a reused
//! `node.walk()` cursor, `kind()` dispatch) — only the target shape
//! (routes/schemas instead of symbols) differs.

use crate::error::{AstError, Result};
use crate::model::Language;
use crate::validator_dsl::{ChainArg, ChainCall};
use tree_sitter::{Node, Parser, Tree};

/// A parsed file, scoped to one extraction call (spec.md §3, §5: release
/// before returning). `ParsedFile` owns the tree and the source bytes it
/// was built from; dropping it frees the native parse state.
pub struct ParsedFile {
    pub path: String,
    source: Vec<u8>,
    tree: Tree,
}

impl ParsedFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn node_text(&self, node: Node<'_>) -> String {
        node.utf8_text(&self.source).unwrap_or("").to_string()
    }

    /// 1-based source line a node starts on (spec.md §3 provenance).
    pub fn line_of(&self, node: Node<'_>) -> usize {
        node.start_position().row + 1
    }
}

fn tree_sitter_language(language: Language) -> Result<tree_sitter::Language> {
    match language {
        Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
        Language::Go => Ok(tree_sitter_go::LANGUAGE.into()),
        Language::Ruby => Ok(tree_sitter_ruby::LANGUAGE.into()),
        other => Err(AstError::UnsupportedLanguage(other.as_str().to_string())),
    }
}

/// `Parse(path, content)` (spec.md §4.3).
pub fn parse(path: &str, language: Language, content: &[u8]) -> Result<ParsedFile> {
    let ts_language = tree_sitter_language(language)?;
    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| AstError::TreeSitterError(e.to_string()))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| AstError::parse_error(path, "tree-sitter produced no tree"))?;
    Ok(ParsedFile {
        path: path.to_string(),
        source: content.to_vec(),
        tree,
    })
}

/// `FindCallExpressions(node, content)`: every `call_expression` descendant,
/// in traversal order (spec.md §5's ordering guarantee).
pub fn find_call_expressions<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "call_expression" {
            out.push(current);
        }
        let mut cursor = current.walk();
        let children: Vec<Node<'a>> = current.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    out.reverse();
    out
}

/// `GetCallArguments(node, content)`: the named children of the call's
/// `arguments` node.
pub fn get_call_arguments<'a>(call: Node<'a>) -> Vec<Node<'a>> {
    match call.child_by_field_name("arguments") {
        Some(args) => {
            let mut cursor = args.walk();
            args.named_children(&mut cursor).collect()
        }
        None => Vec::new(),
    }
}

/// `GetCalleeText(node, content)`: the raw source of the call's `function`
/// field, e.g. `app.get` in `app.get('/x', h)`.
pub fn get_callee_text(pf: &ParsedFile, call: Node<'_>) -> String {
    call.child_by_field_name("function")
        .map(|f| pf.node_text(f))
        .unwrap_or_default()
}

/// `GetMemberExpressionParts(node, content) -> (object, method)`.
pub fn get_member_expression_parts(pf: &ParsedFile, node: Node<'_>) -> Option<(String, String)> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    let property = node.child_by_field_name("property")?;
    Some((pf.node_text(object), pf.node_text(property)))
}

/// `ExtractStringLiteral(node, content) -> (value, ok)`. Template strings
/// with no interpolation behave as plain strings; an interpolated template
/// yields `None` (spec.md §4.3).
pub fn extract_string_literal(pf: &ParsedFile, node: Node<'_>) -> Option<String> {
    match node.kind() {
        "string" => {
            let raw = pf.node_text(node);
            Some(raw.trim_matches(|c| c == '\'' || c == '"').to_string())
        }
        "template_string" => {
            let mut cursor = node.walk();
            if node.children(&mut cursor).any(|c| c.kind() == "template_substitution") {
                return None;
            }
            let raw = pf.node_text(node);
            Some(raw.trim_matches('`').to_string())
        }
        _ => None,
    }
}

/// A pre-indexed `const X = <chain>` declaration whose initializer chain is
/// rooted at a known validator namespace (spec.md §4.3's pre-indexing rule).
pub struct ValidatorDeclaration<'a> {
    pub name: String,
    pub init: Node<'a>,
}

/// Scan top-level `variable_declarator` nodes for validator-schema
/// declarations, i.e. `const Name = z.foo()...` / `const Name = t.Foo(...)`.
pub fn find_validator_declarations<'a>(pf: &'a ParsedFile, roots: &[&str]) -> Vec<ValidatorDeclaration<'a>> {
    let mut out = Vec::new();
    let mut stack = vec![pf.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "variable_declarator" {
            if let (Some(name_node), Some(value_node)) =
                (node.child_by_field_name("name"), node.child_by_field_name("value"))
            {
                if chain_root_matches(pf, value_node, roots) {
                    out.push(ValidatorDeclaration {
                        name: pf.node_text(name_node),
                        init: value_node,
                    });
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

fn chain_root_matches(pf: &ParsedFile, node: Node<'_>, roots: &[&str]) -> bool {
    match chain_root_identifier(pf, node) {
        Some(name) => roots.contains(&name.as_str()),
        None => false,
    }
}

/// Walk down through `call_expression`/`member_expression` wrappers to the
/// identifier a chain ultimately originates at, e.g. `app` in
/// `app.get('/x').post('/y')`'s receiver chain — spec.md §4.4's "a call's
/// receiver may itself be a call expression that ultimately originates at
/// a known instance".
pub fn chain_root_identifier(pf: &ParsedFile, mut node: Node<'_>) -> Option<String> {
    loop {
        match node.kind() {
            "call_expression" => node = node.child_by_field_name("function")?,
            "member_expression" => node = node.child_by_field_name("object")?,
            "identifier" => return Some(pf.node_text(node)),
            _ => return None,
        }
    }
}

/// `interface_declaration` nodes anywhere in the file (spec.md §4.3).
pub fn find_interface_declarations<'a>(pf: &'a ParsedFile) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut stack = vec![pf.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "interface_declaration" {
            out.push(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

// ============================================================================
// Go host-AST-shaped helpers (spec.md §4.3: "Host-AST parser for the Go
// family"; realized via tree-sitter-go's concrete syntax tree, per
// SPEC_FULL.md's Parser Layer module note).
// ============================================================================

/// `HasImport(pf, path)`: is `path` present in any `import_spec`'s string
/// literal?
pub fn has_import(pf: &ParsedFile, path: &str) -> bool {
    let mut stack = vec![pf.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "import_spec" {
            if let Some(path_node) = node.child_by_field_name("path") {
                let text = pf.node_text(path_node);
                if text.trim_matches('"') == path {
                    return true;
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    false
}

pub struct GoStructField {
    pub name: String,
    pub type_text: String,
    pub tag_text: Option<String>,
}

pub struct GoStruct {
    pub name: String,
    pub fields: Vec<GoStructField>,
}

/// `ExtractStructs(pf)`: every top-level `type X struct { ... }` declaration.
pub fn extract_structs(pf: &ParsedFile) -> Vec<GoStruct> {
    let mut out = Vec::new();
    let mut stack = vec![pf.root()];
    while let Some(node) = stack.pop() {
        if node.kind() == "type_spec" {
            if let (Some(name_node), Some(type_node)) =
                (node.child_by_field_name("name"), node.child_by_field_name("type"))
            {
                if type_node.kind() == "struct_type" {
                    out.push(GoStruct {
                        name: pf.node_text(name_node),
                        fields: extract_struct_fields(pf, type_node),
                    });
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

fn extract_struct_fields(pf: &ParsedFile, struct_type: Node<'_>) -> Vec<GoStructField> {
    let mut fields = Vec::new();
    let mut cursor = struct_type.walk();
    for decl_list in struct_type.children(&mut cursor) {
        if decl_list.kind() != "field_declaration_list" {
            continue;
        }
        let mut inner = decl_list.walk();
        for field in decl_list.children(&mut inner) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let type_text = field
                .child_by_field_name("type")
                .map(|n| pf.node_text(n))
                .unwrap_or_default();
            let tag_text = field.child_by_field_name("tag").map(|n| pf.node_text(n));

            let mut name_cursor = field.walk();
            for name_node in field.children(&mut name_cursor) {
                if name_node.kind() == "field_identifier" {
                    fields.push(GoStructField {
                        name: pf.node_text(name_node),
                        type_text: type_text.clone(),
                        tag_text: tag_text.clone(),
                    });
                }
            }
        }
    }
    fields
}

// ============================================================================
// Chain bridge: call_expression node -> validator_dsl::ChainCall
// ============================================================================

/// Peel a method-chain `call_expression` (e.g. `z.string().min(1)`) into a
/// [`ChainCall`] the schema extractor layer can interpret, keeping
/// syntax-tree walking here and chain semantics in `validator_dsl`
/// (spec.md §4.3's pre-indexing feeds §4.5's interpretation).
pub fn build_chain_call(pf: &ParsedFile, node: Node<'_>) -> Option<ChainCall> {
    let mut segments: Vec<(String, Node<'_>)> = Vec::new();
    let mut current = node;

    loop {
        match current.kind() {
            "call_expression" => {
                let function = current.child_by_field_name("function")?;
                match function.kind() {
                    "member_expression" => {
                        let object = function.child_by_field_name("object")?;
                        let property = function.child_by_field_name("property")?;
                        segments.push((pf.node_text(property), current));
                        current = object;
                    }
                    "identifier" => {
                        let root = pf.node_text(function);
                        return Some(finish_chain(pf, root, segments));
                    }
                    _ => return None,
                }
            }
            "identifier" => {
                let root = pf.node_text(current);
                return Some(finish_chain(pf, root, segments));
            }
            _ => return None,
        }
    }
}

fn finish_chain(pf: &ParsedFile, root: String, mut segments: Vec<(String, Node<'_>)>) -> ChainCall {
    segments.reverse();
    let mut chain = ChainCall::new(root);
    for (name, call_node) in segments {
        let args = get_call_arguments(call_node)
            .into_iter()
            .map(|a| node_to_chain_arg(pf, a))
            .collect();
        chain = chain.call(name, args);
    }
    chain
}

fn node_to_chain_arg(pf: &ParsedFile, node: Node<'_>) -> ChainArg {
    match node.kind() {
        "string" | "template_string" => ChainArg::Str(extract_string_literal(pf, node).unwrap_or_default()),
        "number" => ChainArg::Num(pf.node_text(node).parse::<f64>().unwrap_or(0.0)),
        "true" => ChainArg::Bool(true),
        "false" => ChainArg::Bool(false),
        "regex" => ChainArg::Regex(pf.node_text(node)),
        "array" => {
            let mut cursor = node.walk();
            ChainArg::Array(node.named_children(&mut cursor).map(|c| node_to_chain_arg(pf, c)).collect())
        }
        "object" => {
            let mut cursor = node.walk();
            let mut props = Vec::new();
            for pair in node.named_children(&mut cursor) {
                if pair.kind() != "pair" {
                    continue;
                }
                if let (Some(key), Some(value)) = (pair.child_by_field_name("key"), pair.child_by_field_name("value")) {
                    let key_name = pf.node_text(key).trim_matches(|c| c == '\'' || c == '"').to_string();
                    if let Some(chain) = build_chain_call(pf, value) {
                        props.push((key_name, chain));
                    }
                }
            }
            ChainArg::Object(props)
        }
        "call_expression" => build_chain_call(pf, node)
            .map(|c| ChainArg::Chain(Box::new(c)))
            .unwrap_or_else(|| ChainArg::Ident(String::new())),
        "identifier" => ChainArg::Ident(pf.node_text(node)),
        _ => ChainArg::Ident(pf.node_text(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_language() {
        let result = parse("x.kt", Language::Kotlin, b"fun main() {}");
        assert!(result.is_err());
    }

    #[test]
    fn parses_simple_typescript_call() {
        let src = b"app.get('/users', handler);";
        let pf = parse("app.ts", Language::TypeScript, src).expect("parse");
        let calls = find_call_expressions(pf.root());
        assert_eq!(calls.len(), 1);
        assert_eq!(get_callee_text(&pf, calls[0]), "app.get");
        let parts = get_member_expression_parts(
            &pf,
            calls[0].child_by_field_name("function").unwrap(),
        );
        assert_eq!(parts, Some(("app".to_string(), "get".to_string())));
    }

    #[test]
    fn extracts_string_literal_path_argument() {
        let src = b"app.get('/users/:id', handler);";
        let pf = parse("app.ts", Language::TypeScript, src).expect("parse");
        let call = find_call_expressions(pf.root())[0];
        let args = get_call_arguments(call);
        let path = extract_string_literal(&pf, args[0]);
        assert_eq!(path.as_deref(), Some("/users/:id"));
    }

    #[test]
    fn build_chain_call_peels_method_chain() {
        let src = b"const x = z.string().min(1).max(100);";
        let pf = parse("s.ts", Language::TypeScript, src).expect("parse");
        let decls = find_validator_declarations(&pf, &["z"]);
        assert_eq!(decls.len(), 1);
        let chain = build_chain_call(&pf, decls[0].init).expect("chain");
        assert_eq!(chain.root, "z");
        assert_eq!(chain.segments.len(), 3);
        assert_eq!(chain.segments[0].name, "string");
        assert_eq!(chain.segments[1].name, "min");
    }
}
