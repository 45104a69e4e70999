//! Directive-embedded composite documents (Razor/`.cshtml`-shaped).
//!
//! Grounded in `julie::extractors::razor`'s regex-driven directive scan
//! (`@code`, `@functions`, `@inherits` all located via `Regex::new` calls
//! scattered through `extract_symbols`), concatenated here into one
//! synthesized C# source instead of razor.rs's per-directive symbol
//! construction.

use std::sync::LazyLock;

use regex::Regex;

use crate::extractors::{language_spec, ExtractedType, ExtractionResult, TypeExtractor};

const INLINE_BLOCK_NOISE_THRESHOLD: usize = 20;

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)@code\s*\{(.*?)\n\}").unwrap());
static FUNCTIONS_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)@functions\s*\{(.*?)\n\}").unwrap());
static INLINE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)@\{(.*?)\n\}").unwrap());
static MODEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@model\s+(\S+)").unwrap());
static INHERITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@inherits\s+(\S+)").unwrap());

pub fn analyze(extractor: &TypeExtractor, file_path: &str, content: &str) -> ExtractionResult {
    let mut bodies = Vec::new();

    for captures in CODE_BLOCK_RE.captures_iter(content) {
        bodies.push(captures[1].to_string());
    }
    for captures in FUNCTIONS_BLOCK_RE.captures_iter(content) {
        bodies.push(captures[1].to_string());
    }
    for captures in INLINE_BLOCK_RE.captures_iter(content) {
        let body = &captures[1];
        if body.trim().len() >= INLINE_BLOCK_NOISE_THRESHOLD {
            bodies.push(body.to_string());
        }
    }

    let model = MODEL_RE.captures(content).map(|c| c[1].to_string());
    let inherits = INHERITS_RE.captures(content).map(|c| c[1].to_string());

    let wrapper_name = wrapper_class_name(file_path);
    let mut synthesized = String::from("using System;\nusing System.Collections.Generic;\nusing System.Linq;\nusing System.Threading.Tasks;\n\n");
    synthesized.push_str(&format!("public class {wrapper_name}"));
    if let Some(base) = &inherits {
        synthesized.push_str(&format!(" : {base}"));
    }
    synthesized.push_str("\n{\n");
    for body in &bodies {
        synthesized.push_str(body);
        synthesized.push('\n');
    }
    synthesized.push_str("}\n");

    let Some(spec) = language_spec::spec_for_key("csharp") else {
        return ExtractionResult {
            success: false,
            language: "razor".to_string(),
            types: Vec::new(),
            methods: Vec::new(),
        };
    };

    let mut result = extractor.extract_with_spec(spec, &synthesized);
    result.language = "razor".to_string();

    for t in &mut result.types {
        t.modifiers.push("razor".to_string());
    }
    for m in &mut result.methods {
        m.modifiers.push("razor".to_string());
    }

    let extension = std::path::Path::new(file_path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let page_kind = if extension == "razor" { "component" } else { "page" };

    let mut signature = format!("@page {wrapper_name}");
    if let Some(model) = &model {
        signature = format!("@model {model}");
    }

    result.types.insert(
        0,
        ExtractedType {
            name: wrapper_name,
            kind: page_kind.to_string(),
            signature,
            line: 1,
            column: 1,
            modifiers: Vec::new(),
            base_type: inherits,
            interfaces: Vec::new(),
        },
    );

    result
}

fn wrapper_class_name(file_path: &str) -> String {
    std::path::Path::new(file_path)
        .file_stem()
        .map(|s| s.to_string_lossy().replace('.', "_"))
        .unwrap_or_else(|| "RazorPage".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::TypeExtractor;

    #[test]
    fn code_block_is_harvested_into_wrapper_class() {
        let extractor = TypeExtractor::new();
        let source = r#"
@page "/counter"
@inherits LayoutComponentBase

<h1>@count</h1>

@code {
    private int count = 0;

    private void Increment()
    {
        count++;
    }
}
"#;
        let result = analyze(&extractor, "Counter.razor", source);
        assert!(result.success);
        assert_eq!(result.types[0].kind, "component");
        assert_eq!(result.types[0].base_type.as_deref(), Some("LayoutComponentBase"));
        let method = result
            .methods
            .iter()
            .find(|m| m.name == "Increment")
            .expect("Increment harvested");
        assert!(method.modifiers.contains(&"razor".to_string()));
    }

    #[test]
    fn short_inline_blocks_are_dropped_as_noise() {
        let extractor = TypeExtractor::new();
        let source = "@{ x }\n<p>hi</p>";
        let result = analyze(&extractor, "Short.cshtml", source);
        assert!(result.success);
        // Only the synthetic page type, no directive body was substantial enough to parse.
        assert_eq!(result.types.len(), 1);
    }

    #[test]
    fn cshtml_extension_synthesizes_a_page_not_a_component() {
        let extractor = TypeExtractor::new();
        let source = "@model MyApp.Models.HomeModel\n@{ var title = \"substantial enough content here\"; }";
        let result = analyze(&extractor, "Index.cshtml", source);
        assert_eq!(result.types[0].kind, "page");
    }
}
