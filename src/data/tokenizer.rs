// ============================================================
// Layer 4 — Tokenizers
// ============================================================
// Two ways of turning a sentence into tokens:
//
//   WordTokenizer        "It's great!" → [It, ', s, great, !]
//   WhitespaceTokenizer  "It's great!" → [It's, great!]
//
// WordTokenizer delegates to the `tokenizers` crate's Whitespace
// pre-tokenizer (regex \w+|[^\w\s]+), so word characters and
// punctuation runs become separate tokens.
//
// Reference: tokenizers crate documentation (pre_tokenizers)

use tokenizers::{
    pre_tokenizers::whitespace::Whitespace, OffsetReferential, OffsetType,
    PreTokenizedString, PreTokenizer,
};

use crate::domain::instance::Token;
use crate::domain::traits::Tokenizer;

/// Splits on whitespace and separates punctuation from words.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer {
    pre_tokenizer: Whitespace,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut pretokenized = PreTokenizedString::from(text);
        if let Err(e) = self.pre_tokenizer.pre_tokenize(&mut pretokenized) {
            tracing::warn!("Pre-tokenizer failed ({e}); splitting on whitespace");
            return WhitespaceTokenizer.tokenize(text);
        }

        pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(piece, _, _)| Token::new(piece))
            .collect()
    }
}

/// Splits on whitespace only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.split_whitespace().map(Token::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: Vec<Token>) -> Vec<String> {
        tokens.into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_word_tokenizer_splits_punctuation() {
        let tokens = texts(WordTokenizer::new().tokenize("This movie was great!"));
        assert_eq!(tokens, vec!["This", "movie", "was", "great", "!"]);
    }

    #[test]
    fn test_word_tokenizer_keeps_punctuation_runs_together() {
        let tokens = texts(WordTokenizer::new().tokenize("wow... ok"));
        assert_eq!(tokens, vec!["wow", "...", "ok"]);
    }

    #[test]
    fn test_whitespace_tokenizer_keeps_punctuation_attached() {
        let tokens = texts(WhitespaceTokenizer.tokenize("  great!  fun "));
        assert_eq!(tokens, vec!["great!", "fun"]);
    }

    #[test]
    fn test_blank_text_has_no_tokens() {
        assert!(WordTokenizer::new().tokenize("   ").is_empty());
        assert!(WhitespaceTokenizer.tokenize("").is_empty());
    }
}
