//! Per-language declaration vocabulary table for `TypeExtractor`.
//!
//! `julie::extractors` ships one hand-written extractor file per language
//! (`csharp.rs`, `rust.rs`, `typescript.rs`, ... 34 files). Here, a static
//! mapping from node-name to handler replaces that chained-per-language
//! approach. `LanguageSpec` is that mapping, reified as data so one
//! harvesting engine (`super::engine`) can walk any supported grammar.

use tree_sitter::Language;

/// How a declaration's name is located among its children.
#[derive(Debug, Clone, Copy)]
pub enum NameStrategy {
    /// Name lives in a single named field (`node.child_by_field_name(_)`).
    Field(&'static str),
    /// Method nodes with several `identifier` children - apply its
    /// disambiguation rule (used by C#-family grammars).
    Disambiguate,
}

/// Declaration kinds the engine recognizes (its "class/interface/
/// struct/enum/record/protocol/trait/impl" vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Interface,
    Struct,
    Enum,
    Record,
    Protocol,
    Trait,
    Impl,
    TypeAlias,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
            DeclKind::Struct => "struct",
            DeclKind::Enum => "enum",
            DeclKind::Record => "record",
            DeclKind::Protocol => "protocol",
            DeclKind::Trait => "trait",
            DeclKind::Impl => "impl",
            DeclKind::TypeAlias => "type_alias",
        }
    }
}

/// Method-like declaration kinds (its "function / method /
/// arrow-function / initializer" vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodDeclKind {
    Function,
    Method,
    Arrow,
    Initializer,
}

impl MethodDeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodDeclKind::Function => "function",
            MethodDeclKind::Method => "method",
            MethodDeclKind::Arrow => "arrow_function",
            MethodDeclKind::Initializer => "constructor",
        }
    }
}

/// Where a method's return type lives in its grammar.
#[derive(Debug, Clone, Copy)]
pub enum ReturnTypeStrategy {
    /// Return type is one of the children preceding the name node; the
    /// listed node kinds are the ones eligible to be picked up.
    BeforeName(&'static [&'static str]),
    /// Return type is an explicit named field on the method node.
    AnnotationField(&'static str),
    /// This language's methods carry no declared return type.
    None,
}

/// One language's grammar wiring for the extraction engine.
pub struct LanguageSpec {
    pub key: &'static str,
    pub extensions: &'static [&'static str],
    pub ts_language: fn() -> Language,
    pub type_nodes: &'static [(&'static str, DeclKind)],
    pub method_nodes: &'static [(&'static str, MethodDeclKind)],
    pub name_strategy: NameStrategy,
    pub parameter_list_kind: &'static str,
    pub return_type_strategy: ReturnTypeStrategy,
    pub containing_type_kinds: &'static [&'static str],
    /// Placeholder return type for an `async` method with no annotated
    /// return type, e.g. `"Task"` for C#.
    pub async_return_placeholder: &'static str,
}

macro_rules! lang_fn {
    ($crate_name:ident) => {
        || $crate_name::LANGUAGE.into()
    };
}

pub fn all_specs() -> &'static [LanguageSpec] {
    &LANGUAGE_SPECS
}

/// Looks up the spec whose `extensions` contains `ext` (without the leading dot).
pub fn spec_for_extension(ext: &str) -> Option<&'static LanguageSpec> {
    let lower = ext.to_lowercase();
    LANGUAGE_SPECS
        .iter()
        .find(|spec| spec.extensions.contains(&lower.as_str()))
}

pub fn spec_for_key(key: &str) -> Option<&'static LanguageSpec> {
    LANGUAGE_SPECS.iter().find(|spec| spec.key == key)
}

/// Every extension recognized by some `LanguageSpec`, plus the composite
/// extensions handled by `CompositeFileAnalyzer` (its "must include"
/// list: `.vue`, `.razor`, `.cshtml`).
pub fn all_recognized_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = LANGUAGE_SPECS
        .iter()
        .flat_map(|spec| spec.extensions.iter().copied())
        .collect();
    extensions.extend_from_slice(&["vue", "razor", "cshtml"]);
    extensions
}

static LANGUAGE_SPECS: std::sync::LazyLock<Vec<LanguageSpec>> = std::sync::LazyLock::new(|| {
    vec![
        LanguageSpec {
            key: "rust",
            extensions: &["rs"],
            ts_language: lang_fn!(tree_sitter_rust),
            type_nodes: &[
                ("struct_item", DeclKind::Struct),
                ("enum_item", DeclKind::Enum),
                ("trait_item", DeclKind::Trait),
                ("impl_item", DeclKind::Impl),
                ("type_item", DeclKind::TypeAlias),
                ("union_item", DeclKind::Struct),
            ],
            method_nodes: &[("function_item", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "parameters",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["struct_item", "enum_item", "trait_item", "impl_item"],
            async_return_placeholder: "impl Future",
        },
        LanguageSpec {
            key: "typescript",
            extensions: &["ts"],
            ts_language: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            type_nodes: &TS_TYPE_NODES,
            method_nodes: &TS_METHOD_NODES,
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "formal_parameters",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["class_declaration", "interface_declaration"],
            async_return_placeholder: "Promise",
        },
        LanguageSpec {
            key: "tsx",
            extensions: &["tsx"],
            ts_language: || tree_sitter_typescript::LANGUAGE_TSX.into(),
            type_nodes: &TS_TYPE_NODES,
            method_nodes: &TS_METHOD_NODES,
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "formal_parameters",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["class_declaration", "interface_declaration"],
            async_return_placeholder: "Promise",
        },
        LanguageSpec {
            key: "javascript",
            extensions: &["js", "mjs", "cjs"],
            ts_language: lang_fn!(tree_sitter_javascript),
            type_nodes: &[("class_declaration", DeclKind::Class)],
            method_nodes: &[
                ("function_declaration", MethodDeclKind::Function),
                ("method_definition", MethodDeclKind::Method),
                ("arrow_function", MethodDeclKind::Arrow),
            ],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "formal_parameters",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["class_declaration"],
            async_return_placeholder: "Promise",
        },
        LanguageSpec {
            key: "jsx",
            extensions: &["jsx"],
            ts_language: lang_fn!(tree_sitter_javascript),
            type_nodes: &[("class_declaration", DeclKind::Class)],
            method_nodes: &[
                ("function_declaration", MethodDeclKind::Function),
                ("method_definition", MethodDeclKind::Method),
                ("arrow_function", MethodDeclKind::Arrow),
            ],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "formal_parameters",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["class_declaration"],
            async_return_placeholder: "Promise",
        },
        LanguageSpec {
            key: "python",
            extensions: &["py"],
            ts_language: lang_fn!(tree_sitter_python),
            type_nodes: &[("class_definition", DeclKind::Class)],
            method_nodes: &[("function_definition", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "parameters",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["class_definition"],
            async_return_placeholder: "Coroutine",
        },
        LanguageSpec {
            key: "java",
            extensions: &["java"],
            ts_language: lang_fn!(tree_sitter_java),
            type_nodes: &[
                ("class_declaration", DeclKind::Class),
                ("interface_declaration", DeclKind::Interface),
                ("enum_declaration", DeclKind::Enum),
                ("record_declaration", DeclKind::Record),
            ],
            method_nodes: &[
                ("method_declaration", MethodDeclKind::Method),
                ("constructor_declaration", MethodDeclKind::Initializer),
            ],
            name_strategy: NameStrategy::Disambiguate,
            parameter_list_kind: "formal_parameters",
            return_type_strategy: ReturnTypeStrategy::BeforeName(&[
                "type_identifier",
                "generic_type",
                "integral_type",
                "floating_point_type",
                "boolean_type",
                "void_type",
                "array_type",
                "scoped_type_identifier",
            ]),
            containing_type_kinds: &[
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "record_declaration",
            ],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "go",
            extensions: &["go"],
            ts_language: lang_fn!(tree_sitter_go),
            type_nodes: &[("type_declaration", DeclKind::Struct)],
            method_nodes: &[
                ("function_declaration", MethodDeclKind::Function),
                ("method_declaration", MethodDeclKind::Method),
            ],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "parameter_list",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("result"),
            containing_type_kinds: &["type_declaration"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "c",
            extensions: &["c", "h"],
            ts_language: lang_fn!(tree_sitter_c),
            type_nodes: &[
                ("struct_specifier", DeclKind::Struct),
                ("enum_specifier", DeclKind::Enum),
                ("union_specifier", DeclKind::Struct),
            ],
            method_nodes: &[("function_definition", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Disambiguate,
            parameter_list_kind: "parameter_list",
            return_type_strategy: ReturnTypeStrategy::BeforeName(&[
                "primitive_type",
                "type_identifier",
                "sized_type_specifier",
                "struct_specifier",
            ]),
            containing_type_kinds: &["struct_specifier", "enum_specifier"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "cpp",
            extensions: &["cpp", "cc", "cxx", "hpp", "hh"],
            ts_language: lang_fn!(tree_sitter_cpp),
            type_nodes: &[
                ("class_specifier", DeclKind::Class),
                ("struct_specifier", DeclKind::Struct),
                ("enum_specifier", DeclKind::Enum),
            ],
            method_nodes: &[
                ("function_definition", MethodDeclKind::Function),
            ],
            name_strategy: NameStrategy::Disambiguate,
            parameter_list_kind: "parameter_list",
            return_type_strategy: ReturnTypeStrategy::BeforeName(&[
                "primitive_type",
                "type_identifier",
                "qualified_identifier",
                "sized_type_specifier",
                "template_type",
            ]),
            containing_type_kinds: &["class_specifier", "struct_specifier", "enum_specifier"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "csharp",
            extensions: &["cs"],
            ts_language: || tree_sitter_c_sharp::LANGUAGE.into(),
            type_nodes: &[
                ("class_declaration", DeclKind::Class),
                ("interface_declaration", DeclKind::Interface),
                ("struct_declaration", DeclKind::Struct),
                ("enum_declaration", DeclKind::Enum),
                ("record_declaration", DeclKind::Record),
            ],
            method_nodes: &[
                ("method_declaration", MethodDeclKind::Method),
                ("constructor_declaration", MethodDeclKind::Initializer),
                ("local_function_statement", MethodDeclKind::Function),
            ],
            name_strategy: NameStrategy::Disambiguate,
            parameter_list_kind: "parameter_list",
            return_type_strategy: ReturnTypeStrategy::BeforeName(&[
                "predefined_type",
                "generic_name",
                "nullable_type",
                "array_type",
                "qualified_name",
                "identifier",
            ]),
            containing_type_kinds: &[
                "class_declaration",
                "interface_declaration",
                "struct_declaration",
                "enum_declaration",
                "record_declaration",
            ],
            async_return_placeholder: "Task",
        },
        LanguageSpec {
            key: "ruby",
            extensions: &["rb"],
            ts_language: lang_fn!(tree_sitter_ruby),
            type_nodes: &[("class", DeclKind::Class), ("module", DeclKind::Trait)],
            method_nodes: &[("method", MethodDeclKind::Method), ("singleton_method", MethodDeclKind::Method)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "method_parameters",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["class", "module"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "php",
            extensions: &["php"],
            ts_language: lang_fn!(tree_sitter_php),
            type_nodes: &[
                ("class_declaration", DeclKind::Class),
                ("interface_declaration", DeclKind::Interface),
                ("trait_declaration", DeclKind::Trait),
                ("enum_declaration", DeclKind::Enum),
            ],
            method_nodes: &[
                ("function_definition", MethodDeclKind::Function),
                ("method_declaration", MethodDeclKind::Method),
            ],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "formal_parameters",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["class_declaration", "interface_declaration", "trait_declaration"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "swift",
            extensions: &["swift"],
            ts_language: lang_fn!(tree_sitter_swift),
            type_nodes: &[
                ("class_declaration", DeclKind::Class),
                ("protocol_declaration", DeclKind::Protocol),
            ],
            method_nodes: &[("function_declaration", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "parameter",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["class_declaration", "protocol_declaration"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "scala",
            extensions: &["scala"],
            ts_language: || tree_sitter_scala::LANGUAGE.into(),
            type_nodes: &[
                ("class_definition", DeclKind::Class),
                ("trait_definition", DeclKind::Trait),
                ("object_definition", DeclKind::Class),
            ],
            method_nodes: &[("function_definition", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "parameters",
            return_type_strategy: ReturnTypeStrategy::AnnotationField("return_type"),
            containing_type_kinds: &["class_definition", "trait_definition", "object_definition"],
            async_return_placeholder: "Future",
        },
        LanguageSpec {
            key: "html",
            extensions: &["html", "htm"],
            ts_language: lang_fn!(tree_sitter_html),
            type_nodes: &[],
            method_nodes: &[],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &[],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "css",
            extensions: &["css", "scss"],
            ts_language: lang_fn!(tree_sitter_css),
            type_nodes: &[],
            method_nodes: &[],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &[],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "json",
            extensions: &["json", "jsonc"],
            ts_language: lang_fn!(tree_sitter_json),
            type_nodes: &[],
            method_nodes: &[],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &[],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "toml",
            extensions: &["toml"],
            ts_language: || tree_sitter_toml_ng::LANGUAGE.into(),
            type_nodes: &[],
            method_nodes: &[],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &[],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "julia",
            extensions: &["jl"],
            ts_language: lang_fn!(tree_sitter_julia),
            type_nodes: &[("struct_definition", DeclKind::Struct)],
            method_nodes: &[("function_definition", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "signature",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["struct_definition"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "haskell",
            extensions: &["hs"],
            ts_language: lang_fn!(tree_sitter_haskell),
            type_nodes: &[("data_type", DeclKind::TypeAlias)],
            method_nodes: &[("function", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "patterns",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["data_type"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "ocaml",
            extensions: &["ml", "mli"],
            ts_language: lang_fn!(tree_sitter_ocaml),
            type_nodes: &[("type_definition", DeclKind::TypeAlias)],
            method_nodes: &[("let_binding", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "parameter",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["type_definition"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "verilog",
            extensions: &["v", "vh", "sv"],
            ts_language: lang_fn!(tree_sitter_verilog),
            type_nodes: &[("module_declaration", DeclKind::Struct)],
            method_nodes: &[("function_declaration", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "list_of_port_declarations",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &["module_declaration"],
            async_return_placeholder: "void",
        },
        LanguageSpec {
            key: "bash",
            extensions: &["sh", "bash"],
            ts_language: lang_fn!(tree_sitter_bash),
            type_nodes: &[],
            method_nodes: &[("function_definition", MethodDeclKind::Function)],
            name_strategy: NameStrategy::Field("name"),
            parameter_list_kind: "",
            return_type_strategy: ReturnTypeStrategy::None,
            containing_type_kinds: &[],
            async_return_placeholder: "void",
        },
    ]
});

static TS_TYPE_NODES: [(&str, DeclKind); 3] = [
    ("class_declaration", DeclKind::Class),
    ("interface_declaration", DeclKind::Interface),
    ("type_alias_declaration", DeclKind::TypeAlias),
];

static TS_METHOD_NODES: [(&str, MethodDeclKind); 3] = [
    ("function_declaration", MethodDeclKind::Function),
    ("method_definition", MethodDeclKind::Method),
    ("arrow_function", MethodDeclKind::Arrow),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spec_by_extension() {
        assert!(spec_for_extension("rs").is_some());
        assert!(spec_for_extension("cs").is_some());
        assert!(spec_for_extension("unknown-ext").is_none());
    }

    #[test]
    fn every_spec_has_a_unique_key() {
        let mut keys: Vec<&str> = all_specs().iter().map(|s| s.key).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn recognized_extensions_include_required_set() {
        let extensions = all_recognized_extensions();
        for required in ["cs", "ts", "tsx", "js", "jsx", "py", "java", "go", "rs",
            "cpp", "cc", "cxx", "hpp", "c", "h", "rb", "php", "swift", "scala",
            "html", "htm", "css", "scss", "json", "jsonc", "toml", "jl", "hs",
            "ml", "mli", "v", "vh", "sv", "bash", "sh", "vue", "razor"]
        {
            assert!(extensions.contains(&required), "missing extension {required}");
        }
    }
}
