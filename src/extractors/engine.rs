//! Grammar-driven declaration harvesting: parse, walk, and harvest
//! declaration nodes for any language described by a [`LanguageSpec`].
//!
//! One engine walks any grammar described by a [`LanguageSpec`] rather than
//! `julie`'s one-file-per-language extractors (`csharp.rs::extract_method`,
//! `rust.rs`, ...). The name-disambiguation, return-type, parameter, and
//! modifier rules below generalize the common shape `csharp.rs` and
//! `rust.rs` each hand-rolled independently into one reusable algorithm.

use tree_sitter::{Node, Parser, Tree};

use super::language_spec::{DeclKind, LanguageSpec, MethodDeclKind, NameStrategy, ReturnTypeStrategy};
use super::{ExtractedMethod, ExtractedType};

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "async",
    "abstract",
    "readonly",
    "const",
    "final",
];

pub fn parse(spec: &LanguageSpec, content: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&(spec.ts_language)()).ok()?;
    parser.parse(content, None)
}

/// Walks the whole tree and harvests every node whose kind names a
/// declaration in `spec`'s vocabulary.
pub fn harvest(spec: &LanguageSpec, tree: &Tree, content: &str) -> (Vec<ExtractedType>, Vec<ExtractedMethod>) {
    let mut types = Vec::new();
    let mut methods = Vec::new();
    let root = tree.root_node();
    let mut cursor = root.walk();
    walk(spec, root, content, &mut cursor, &mut types, &mut methods);
    (types, methods)
}

fn walk<'a>(
    spec: &LanguageSpec,
    node: Node<'a>,
    content: &str,
    cursor: &mut tree_sitter::TreeCursor<'a>,
    types: &mut Vec<ExtractedType>,
    methods: &mut Vec<ExtractedMethod>,
) {
    if let Some((_, kind)) = spec.type_nodes.iter().find(|(name, _)| *name == node.kind()) {
        if let Some(extracted) = extract_type(spec, node, content, *kind) {
            types.push(extracted);
        }
    }

    if let Some((_, kind)) = spec.method_nodes.iter().find(|(name, _)| *name == node.kind()) {
        if let Some(extracted) = extract_method(spec, node, content, *kind) {
            methods.push(extracted);
        }
    }

    for child in node.children(cursor) {
        let mut child_cursor = child.walk();
        walk(spec, child, content, &mut child_cursor, types, methods);
    }
}

fn extract_type(spec: &LanguageSpec, node: Node, content: &str, kind: DeclKind) -> Option<ExtractedType> {
    let name = declaration_name(spec, node, content)?;
    let (line, column) = start_position(node);
    Some(ExtractedType {
        name,
        kind: kind.as_str().to_string(),
        signature: first_line_signature(node, content),
        line,
        column,
        modifiers: extract_modifiers(node, content),
        base_type: None,
        interfaces: Vec::new(),
    })
}

fn extract_method(spec: &LanguageSpec, node: Node, content: &str, _kind: MethodDeclKind) -> Option<ExtractedMethod> {
    let name = method_name(spec, node, content)?;
    let (line, column) = start_position(node);
    let modifiers = extract_modifiers(node, content);
    let parameters = extract_parameters(spec, node, content);
    let return_type = extract_return_type(spec, node, content, &modifiers, &name);
    let containing_type = containing_type_name(spec, node, content);

    Some(ExtractedMethod {
        name,
        signature: first_line_signature(node, content),
        return_type,
        line,
        column,
        containing_type,
        parameters,
        modifiers,
    })
}

/// Name lookup per `NameStrategy`. For [`NameStrategy::Disambiguate`],
/// applies its "Method name disambiguation" rule verbatim - used for
/// both type and method declarations in grammars where it applies (C#,
/// Java, C, C++ all route constructors/methods through here).
fn declaration_name(spec: &LanguageSpec, node: Node, content: &str) -> Option<String> {
    match spec.name_strategy {
        NameStrategy::Field(field) => node
            .child_by_field_name(field)
            .map(|n| node_text(n, content)),
        NameStrategy::Disambiguate => disambiguate_name(spec, node, content),
    }
}

fn method_name(spec: &LanguageSpec, node: Node, content: &str) -> Option<String> {
    declaration_name(spec, node, content)
}

/// Method-name disambiguation: collect immediate `identifier`
/// children. With >=2, locate the parameter-list child and pick the
/// identifier whose start column is strictly less than the parameter list's
/// start column, choosing the latest such identifier. With no parameter
/// list, choose the last identifier. Otherwise fall back to the first
/// identifier or a `property_identifier` if present.
fn disambiguate_name(spec: &LanguageSpec, node: Node, content: &str) -> Option<String> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();

    let identifiers: Vec<Node> = children
        .iter()
        .copied()
        .filter(|c| c.kind() == "identifier")
        .collect();

    if identifiers.len() >= 2 {
        let param_list = children
            .iter()
            .find(|c| c.kind() == spec.parameter_list_kind);
        if let Some(param_list) = param_list {
            let param_col = param_list.start_position().column;
            let candidate = identifiers
                .iter()
                .filter(|id| id.start_position().column < param_col)
                .max_by_key(|id| id.start_position().column);
            if let Some(candidate) = candidate {
                return Some(node_text(*candidate, content));
            }
        }
        return identifiers.last().map(|n| node_text(*n, content));
    }

    if let Some(first) = identifiers.first() {
        return Some(node_text(*first, content));
    }
    children
        .iter()
        .find(|c| c.kind() == "property_identifier")
        .map(|n| node_text(*n, content))
}

/// Finds the return-type node for methods whose grammar places it
/// before the name, or via a dedicated annotation field.
fn extract_return_type(
    spec: &LanguageSpec,
    node: Node,
    content: &str,
    modifiers: &[String],
    name: &str,
) -> Option<String> {
    match spec.return_type_strategy {
        ReturnTypeStrategy::AnnotationField(field) => {
            if let Some(n) = node.child_by_field_name(field) {
                return Some(node_text(n, content));
            }
        }
        ReturnTypeStrategy::BeforeName(eligible_kinds) => {
            let mut cursor = node.walk();
            let name_node = children_before_name(node, &mut cursor, content, name);
            for child in name_node {
                if eligible_kinds.contains(&child.kind()) {
                    return Some(node_text(child, content));
                }
            }
        }
        ReturnTypeStrategy::None => {}
    }

    if modifiers.iter().any(|m| m == "async") {
        return Some(spec.async_return_placeholder.to_string());
    }
    Some("void".to_string())
}

/// Returns the children preceding the node whose text equals `name` (the
/// located name node), in source order, stopping there.
fn children_before_name<'a>(node: Node<'a>, cursor: &mut tree_sitter::TreeCursor<'a>, content: &str, name: &str) -> Vec<Node<'a>> {
    let mut before = Vec::new();
    for child in node.children(cursor) {
        if node_text(child, content) == name && (child.kind() == "identifier" || child.kind() == "property_identifier") {
            break;
        }
        before.push(child);
    }
    before
}

/// Immediate `parameter`/`formal_parameter`
/// children of the parameter-list node, trimmed subtree text each.
fn extract_parameters(spec: &LanguageSpec, node: Node, content: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(param_list) = node
        .children(&mut cursor)
        .find(|c| c.kind() == spec.parameter_list_kind)
    else {
        return Vec::new();
    };

    let mut inner_cursor = param_list.walk();
    param_list
        .children(&mut inner_cursor)
        .filter(|c| c.kind() == "parameter" || c.kind() == "formal_parameter")
        .map(|c| node_text(c, content).trim().to_string())
        .collect()
}

/// Modifier strings whose node types match the fixed keyword set, plus
/// generic `modifier`/`modifiers` container nodes.
fn extract_modifiers(node: Node, content: &str) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" || child.kind() == "modifier" {
            let mut inner_cursor = child.walk();
            for inner in child.children(&mut inner_cursor) {
                let text = node_text(inner, content);
                if MODIFIER_KEYWORDS.contains(&text.as_str()) {
                    modifiers.push(text);
                }
            }
            let own_text = node_text(child, content);
            if MODIFIER_KEYWORDS.contains(&own_text.as_str()) {
                modifiers.push(own_text);
            }
            continue;
        }
        let text = node_text(child, content);
        if MODIFIER_KEYWORDS.contains(&text.as_str()) {
            modifiers.push(text);
        }
    }
    modifiers
}

/// Walks parents until a class/interface/
/// struct/enum/namespace declaration node is found; take its name.
fn containing_type_name(spec: &LanguageSpec, node: Node, content: &str) -> Option<String> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if spec.containing_type_kinds.contains(&parent.kind()) {
            return declaration_name(spec, parent, content);
        }
        current = parent.parent();
    }
    None
}

fn first_line_signature(node: Node, content: &str) -> String {
    node_text(node, content)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

fn start_position(node: Node) -> (usize, usize) {
    let pos = node.start_position();
    (pos.row + 1, pos.column + 1)
}

fn node_text(node: Node, content: &str) -> String {
    node.utf8_text(content.as_bytes())
        .unwrap_or_default()
        .to_string()
}
