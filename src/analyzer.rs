//! Language-aware tokenization for source code.
//!
//! The same analyzer indexes file content and parses text queries, so search
//! for "user" finds both `getUserData` and `get_user_data`. Grounded in
//! `julie::search::tokenizer::CodeTokenizer`'s camel/snake splitting, but
//! trimmed down: no preserved operator patterns, no affix stripping -
//! those are `julie`'s query-layer enrichments, not part of this core.

use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

/// Minimum and maximum token length retained after splitting.
const MIN_TOKEN_LEN: usize = 2;
const MAX_TOKEN_LEN: usize = 128;

/// Splits on non-identifier characters, then splits camelCase/PascalCase
/// runs, keeping the original-case whole identifier alongside the
/// lowercased parts. Digits are kept; case is otherwise dropped for the
/// split sub-tokens but preserved for the whole-identifier duplicate.
#[derive(Clone, Default)]
pub struct CodeAnalyzer;

impl Tokenizer for CodeAnalyzer {
    type TokenStream<'a> = CodeAnalyzerStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        CodeAnalyzerStream {
            tokens: tokenize(text),
            current: 0,
        }
    }
}

pub struct CodeAnalyzerStream {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenStream for CodeAnalyzerStream {
    fn advance(&mut self) -> bool {
        if self.current < self.tokens.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.current - 1]
    }
}

/// Tokenize `text` the same way the index does. Exposed standalone so
/// `Indexer` and the
/// (out-of-scope) query layer can both call it without going through
/// tantivy's `Tokenizer` trait machinery.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position = 0;

    for (word, offset) in identifier_runs(text) {
        let mut emit = |value: String, pos: &mut usize| {
            if value.len() >= MIN_TOKEN_LEN && value.len() <= MAX_TOKEN_LEN {
                tokens.push(Token {
                    offset_from: offset,
                    offset_to: offset + word.len(),
                    position: *pos,
                    text: value,
                    position_length: 1,
                });
                *pos += 1;
            }
        };

        // Whole-identifier duplicates: original case, then lowercase if different.
        emit(word.to_string(), &mut position);
        let lower = word.to_lowercase();
        if lower != word {
            emit(lower, &mut position);
        }

        for part in split_identifier_case(&word) {
            emit(part.to_lowercase(), &mut position);
        }
    }

    tokens
}

/// Splits `text` on any character that is not alphanumeric or `_`, returning
/// each run with its byte offset.
fn identifier_runs(text: &str) -> Vec<(String, usize)> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut current_start = 0;

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() || ch == '_' {
            if current.is_empty() {
                current_start = idx;
            }
            current.push(ch);
        } else if !current.is_empty() {
            runs.push((std::mem::take(&mut current), current_start));
        }
    }
    if !current.is_empty() {
        runs.push((current, current_start));
    }
    runs
}

/// Splits a run on `_` boundaries and camelCase/PascalCase boundaries,
/// returning only the sub-parts (the caller separately emits the whole run).
fn split_identifier_case(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for snake_part in word.split('_').filter(|p| !p.is_empty()) {
        parts.extend(split_camel_case(snake_part));
    }
    parts
}

fn split_camel_case(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        let is_boundary = i > 0
            && ((ch.is_uppercase() && chars[i - 1].is_lowercase())
                || (ch.is_uppercase()
                    && i + 1 < chars.len()
                    && chars[i - 1].is_uppercase()
                    && chars[i + 1].is_lowercase()));

        if is_boundary && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_texts(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_pascal_case_and_keeps_original() {
        let tokens = token_texts("FooBarBaz");
        assert!(tokens.contains(&"foo".to_string()));
        assert!(tokens.contains(&"bar".to_string()));
        assert!(tokens.contains(&"baz".to_string()));
        assert!(tokens.contains(&"FooBarBaz".to_string()));
    }

    #[test]
    fn splits_snake_case() {
        let tokens = token_texts("get_user_data");
        assert!(tokens.contains(&"get".to_string()));
        assert!(tokens.contains(&"user".to_string()));
        assert!(tokens.contains(&"data".to_string()));
    }

    #[test]
    fn drops_short_and_overlong_tokens() {
        let tokens = token_texts("a bb ccc");
        assert!(!tokens.iter().any(|t| t == "a"));
        assert!(tokens.iter().any(|t| t == "bb"));

        let long = "x".repeat(200);
        let tokens = token_texts(&long);
        assert!(tokens.is_empty());
    }

    #[test]
    fn keeps_digits_in_tokens() {
        let tokens = token_texts("utf8_decoder");
        assert!(tokens.iter().any(|t| t == "utf8"));
    }

    #[test]
    fn splits_on_non_identifier_characters() {
        let tokens = token_texts("foo.bar::baz");
        assert!(tokens.contains(&"foo".to_string()));
        assert!(tokens.contains(&"bar".to_string()));
        assert!(tokens.contains(&"baz".to_string()));
    }
}
