//! Script-embedded composite documents (Vue SFC-shaped).
//!
//! Grounded in `julie::extractors::vue`'s regex section scan (its
//! `SCRIPT_START_RE`/`LANG_ATTR_RE` statics), but reduced to only what
//! `TypeExtractor` re-entry needs: locate the `<script>` block, its
//! language attribute, and its `setup` marker.

use std::sync::LazyLock;

use regex::Regex;

use crate::extractors::{language_spec, ExtractedType, ExtractionResult, TypeExtractor};

static SCRIPT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<script([^>]*)>(.*?)</script>"#).unwrap());
static LANG_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"lang\s*=\s*["']?([a-zA-Z]+)"#).unwrap());
static SETUP_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bsetup\b").unwrap());

pub fn analyze(extractor: &TypeExtractor, file_path: &str, content: &str) -> ExtractionResult {
    let Some(captures) = SCRIPT_OPEN_RE.captures(content) else {
        // On miss: success with empty results.
        return ExtractionResult {
            success: true,
            language: "vue".to_string(),
            types: Vec::new(),
            methods: Vec::new(),
        };
    };

    let attrs = &captures[1];
    let body = &captures[2];
    let is_composition_api = SETUP_ATTR_RE.is_match(attrs);

    let lang_key = LANG_ATTR_RE
        .captures(attrs)
        .map(|c| c[1].to_lowercase())
        .unwrap_or_default();
    let embedded_key = if lang_key == "ts" || lang_key == "typescript" {
        "typescript"
    } else {
        "javascript"
    };
    let Some(spec) = language_spec::spec_for_key(embedded_key) else {
        return ExtractionResult {
            success: false,
            language: "vue".to_string(),
            types: Vec::new(),
            methods: Vec::new(),
        };
    };

    let mut result = extractor.extract_with_spec(spec, body);
    result.language = "vue".to_string();

    let api_modifier = if is_composition_api { "composition-api" } else { "options-api" };
    for method in &mut result.methods {
        if !method.modifiers.iter().any(|m| m == api_modifier) {
            method.modifiers.push(api_modifier.to_string());
        }
    }

    // The primary exported type (first harvested, if any) is relabeled as
    // the component kind.
    if let Some(primary) = result.types.first_mut() {
        primary.kind = "component".to_string();
    }

    let component_name = component_name_from_path(file_path);
    result.types.insert(
        0,
        ExtractedType {
            name: component_name.clone(),
            kind: "vue-file".to_string(),
            signature: format!("<{component_name} />"),
            line: 1,
            column: 1,
            modifiers: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
        },
    );

    result
}

fn component_name_from_path(file_path: &str) -> String {
    std::path::Path::new(file_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Component".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::TypeExtractor;

    #[test]
    fn missing_script_block_succeeds_empty() {
        let extractor = TypeExtractor::new();
        let result = analyze(&extractor, "Empty.vue", "<template><div/></template>");
        assert!(result.success);
        assert!(result.types.is_empty());
    }

    #[test]
    fn composition_api_setup_script_is_tagged() {
        let extractor = TypeExtractor::new();
        let source = r#"
<template><div/></template>
<script setup lang="ts">
function greet(name: string): string {
    return name;
}
</script>
"#;
        let result = analyze(&extractor, "Greeter.vue", source);
        assert!(result.success);
        assert_eq!(result.types[0].name, "Greeter");
        assert_eq!(result.types[0].kind, "vue-file");
        let greet = result
            .methods
            .iter()
            .find(|m| m.name == "greet")
            .expect("greet harvested");
        assert!(greet.modifiers.contains(&"composition-api".to_string()));
    }

    #[test]
    fn options_api_script_without_setup_is_tagged() {
        let extractor = TypeExtractor::new();
        let source = r#"
<script>
export default {
    methods: {
        onClick() {}
    }
}
</script>
"#;
        let result = analyze(&extractor, "Button.vue", source);
        assert!(result.success);
        for method in &result.methods {
            assert!(method.modifiers.contains(&"options-api".to_string()));
        }
    }
}
