//! Document schema for the per-workspace tantivy index.
//!
//! Grounded in `julie::search::schema::create_schema`'s field-building
//! style, reduced to the fields `Document` actually carries: this isn't
//! julie's combined symbol/file-content schema, just one record per file.

use tantivy::schema::{Field, Schema, SchemaBuilder, FAST, INDEXED, STORED, STRING};

use crate::analyzer::CodeAnalyzer;

pub const CODE_ANALYZER_NAME: &str = "code";

#[derive(Debug, Clone, Copy)]
pub struct SchemaFields {
    pub path: Field,
    pub relative_path: Field,
    pub filename: Field,
    pub extension: Field,
    pub size: Field,
    pub last_modified: Field,
    pub content: Field,
    pub path_component: Field,
}

pub fn build_schema() -> (Schema, SchemaFields) {
    let mut builder: SchemaBuilder = Schema::builder();

    let path = builder.add_text_field("path", STRING | STORED);
    let relative_path = builder.add_text_field("relative_path", STRING | STORED);
    let filename = builder.add_text_field("filename", STRING | STORED);
    let extension = builder.add_text_field("extension", STRING | STORED | FAST);
    let size = builder.add_u64_field("size", STORED | FAST);
    let last_modified = builder.add_u64_field("last_modified", STORED | FAST | INDEXED);

    let content_options = tantivy::schema::TextOptions::default()
        .set_stored()
        .set_indexing_options(
            tantivy::schema::TextFieldIndexing::default()
                .set_tokenizer(CODE_ANALYZER_NAME)
                .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
        );
    let content = builder.add_text_field("content", content_options.clone());
    let path_component = builder.add_text_field("path_component", content_options);

    let schema = builder.build();
    let fields = SchemaFields {
        path,
        relative_path,
        filename,
        extension,
        size,
        last_modified,
        content,
        path_component,
    };
    (schema, fields)
}

pub fn register_code_analyzer(index: &tantivy::Index) {
    index
        .tokenizers()
        .register(CODE_ANALYZER_NAME, CodeAnalyzer);
}
