//! Composite (multi-language) file analyzers.
//!
//! Grounded in `julie::extractors::vue` (regex-located `<script>` sections,
//! no tree-sitter grammar of its own) and `julie::extractors::razor`
//! (regex-located `@code`/`@functions`/`@inherits` directives). Both variants
//! here synthesize a single-language virtual source and re-enter
//! [`super::TypeExtractor`] rather than parsing the host format themselves.

pub mod directive_embedded;
pub mod script_embedded;

/// Extensions a composite analyzer may synthesize for its inner re-entry.
/// The dispatch site in `TypeExtractor::dispatch_composite` consults this
/// before the composite map, so a file already carrying one of these
/// extensions never recurses back into a composite analyzer.
const SYNTHESIZED_EXTENSIONS: &[&str] = &["ts", "js", "cs"];

pub(crate) fn is_synthesized_extension(extension: &str) -> bool {
    SYNTHESIZED_EXTENSIONS.contains(&extension)
}
