//! Grammar-driven type/method extraction and composite-file
//! dispatch.
//!
//! Where `julie::extractors` hand-writes one file per language, this module
//! is one engine (`engine.rs`) parameterized by a per-language
//! `LanguageSpec` table (`language_spec.rs`) instead. `composite` holds the
//! two multi-language-file variants.

pub mod composite;
mod engine;
pub mod language_spec;

use std::path::Path;

use serde::{Deserialize, Serialize};

use language_spec::LanguageSpec;

/// One harvested class/interface/struct/enum/... declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedType {
    pub name: String,
    pub kind: String,
    pub signature: String,
    pub line: usize,
    pub column: usize,
    pub modifiers: Vec<String>,
    pub base_type: Option<String>,
    pub interfaces: Vec<String>,
}

/// One harvested function/method/arrow-function/initializer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedMethod {
    pub name: String,
    pub signature: String,
    pub return_type: Option<String>,
    pub line: usize,
    pub column: usize,
    pub containing_type: Option<String>,
    pub parameters: Vec<String>,
    pub modifiers: Vec<String>,
}

/// The outcome of one extraction call: `{success, language, types, methods}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub success: bool,
    pub language: String,
    pub types: Vec<ExtractedType>,
    pub methods: Vec<ExtractedMethod>,
}

impl ExtractionResult {
    fn empty(language: &str) -> Self {
        Self {
            success: true,
            language: language.to_string(),
            types: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn failed(language: &str) -> Self {
        Self {
            success: false,
            language: language.to_string(),
            types: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// Dispatches a file to its grammar or a composite analyzer.
pub struct TypeExtractor;

impl Default for TypeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract declarations from `content`, a file whose name is `file_path`
    /// (used only for extension dispatch - this may be a synthesized
    /// virtual filename from a composite analyzer, never touched on disk).
    pub fn extract(&self, file_path: &str, content: &str) -> ExtractionResult {
        // (a) empty/whitespace content -> success, empty lists.
        if content.trim().is_empty() {
            let language = extension_of(file_path).unwrap_or_default();
            return ExtractionResult::empty(&language);
        }

        let Some(extension) = extension_of(file_path) else {
            return ExtractionResult::failed("");
        };

        // (c) composite dispatch, guarded against recursing into the same
        // analyzer when the inner filename already carries the embedded
        // language's own extension.
        if let Some(result) = self.dispatch_composite(file_path, &extension, content) {
            return result;
        }

        // (d) grammar-driven harvest.
        let Some(spec) = language_spec::spec_for_extension(&extension) else {
            return ExtractionResult::failed(&extension);
        };
        self.extract_with_spec(spec, content)
    }

    fn dispatch_composite(&self, file_path: &str, extension: &str, content: &str) -> Option<ExtractionResult> {
        if composite::is_synthesized_extension(extension) {
            return None;
        }
        match extension {
            "vue" => Some(composite::script_embedded::analyze(self, file_path, content)),
            "razor" | "cshtml" => Some(composite::directive_embedded::analyze(self, file_path, content)),
            _ => None,
        }
    }

    /// Entry point composite analyzers use to re-enter extraction on their
    /// synthesized virtual source, bypassing extension-based dispatch
    /// (they already know the language).
    pub(crate) fn extract_with_spec(&self, spec: &LanguageSpec, content: &str) -> ExtractionResult {
        let Some(tree) = engine::parse(spec, content) else {
            return ExtractionResult::failed(spec.key);
        };
        let (types, methods) = engine::harvest(spec, &tree, content);
        ExtractionResult {
            success: true,
            language: spec.key.to_string(),
            types,
            methods,
        }
    }
}

fn extension_of(file_path: &str) -> Option<String> {
    Path::new(file_path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_succeeds_with_no_declarations() {
        let result = TypeExtractor::new().extract("foo.rs", "   \n\t");
        assert!(result.success);
        assert!(result.types.is_empty());
        assert!(result.methods.is_empty());
    }

    #[test]
    fn unknown_extension_fails() {
        let result = TypeExtractor::new().extract("foo.xyz123", "content");
        assert!(!result.success);
    }

    #[test]
    fn rust_struct_and_function_are_harvested() {
        let source = r#"
pub struct Widget {
    name: String,
}

pub async fn build_widget(name: String) -> Widget {
    Widget { name }
}
"#;
        let result = TypeExtractor::new().extract("widget.rs", source);
        assert!(result.success);
        assert_eq!(result.language, "rust");
        assert!(result.types.iter().any(|t| t.name == "Widget" && t.kind == "struct"));
        let method = result
            .methods
            .iter()
            .find(|m| m.name == "build_widget")
            .expect("build_widget harvested");
        assert_eq!(method.parameters, vec!["name: String".to_string()]);
    }

    #[test]
    fn csharp_method_disambiguation_picks_the_method_name_not_the_type() {
        let source = r#"
public class Worker
{
    public async Task<int> DoWork(int count)
    {
        return count;
    }
}
"#;
        let result = TypeExtractor::new().extract("worker.cs", source);
        assert!(result.success);
        let method = result
            .methods
            .iter()
            .find(|m| m.name == "DoWork")
            .expect("DoWork harvested");
        assert_eq!(method.containing_type.as_deref(), Some("Worker"));
        assert!(method.modifiers.contains(&"async".to_string()));
        assert_eq!(method.parameters, vec!["int count".to_string()]);
    }
}
