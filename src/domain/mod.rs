// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types for the classification problem:
//
//   Instance    — a tokenised sentence plus its label
//   Vocabulary  — token/label <-> id maps, one per namespace
//   traits      — Tokenizer, TokenIndexer, DatasetReader
//
// Nothing in here touches tensors; Burn lives in Layer 5.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Tokens, fields and instances
pub mod instance;

// Namespaced token <-> id mapping
pub mod vocabulary;

// Core abstractions (traits) that other layers implement
pub mod traits;
