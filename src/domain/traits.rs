// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The three seams of the text pipeline:
//
//   Tokenizer     — raw text        → Vec<Token>
//   TokenIndexer  — Vec<Token>      → Vec<u32> ids (via Vocabulary)
//   DatasetReader — file on disk    → Vec<Instance>
//
// The application layer only talks to these traits, so a new
// tokenizer or file format is one more impl, not a rewrite.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use anyhow::Result;

use crate::domain::instance::{Instance, Token};
use crate::domain::vocabulary::{VocabCounter, Vocabulary};

// ─── Tokenizer ────────────────────────────────────────────────────────────────
/// Splits raw text into tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

// ─── TokenIndexer ─────────────────────────────────────────────────────────────
/// Decides which vocabulary namespace a token lives in and
/// what string is stored there for it.
pub trait TokenIndexer: Send + Sync {
    /// Vocabulary namespace the ids come from, e.g. "tokens"
    fn namespace(&self) -> &str;

    /// The form of the token that is counted and looked up
    fn normalize(&self, token: &Token) -> String;

    /// Record one occurrence of `token` in the counter
    fn count_vocab_items(&self, token: &Token, counter: &mut VocabCounter) {
        counter.add(self.namespace(), self.normalize(token));
    }

    /// Map tokens to ids. Unknown tokens get the namespace's OOV id.
    fn tokens_to_indices(&self, tokens: &[Token], vocab: &Vocabulary) -> Vec<u32>;
}

// ─── DatasetReader ────────────────────────────────────────────────────────────
/// Any component that turns a data file into instances.
pub trait DatasetReader {
    /// Read every instance in the file.
    fn read(&self, path: &Path) -> Result<Vec<Instance>>;

    /// Build one instance from raw text (and a label when training).
    fn text_to_instance(&self, text: &str, label: Option<&str>) -> Instance;
}
