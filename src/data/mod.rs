// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a raw TSV file to tensor batches.
//
//   <text>\t<label> lines
//       │
//       ▼
//   ClassificationTsvReader → Instance (tokens + label)
//       │   (Tokenizer splits text, TokenIndexer names the namespace)
//       ▼
//   Vocabulary              → built from the instances (domain)
//       │
//       ▼
//   ClassificationDataset   → IndexedInstance ids, Burn's Dataset trait
//       │
//       ▼
//   ClassificationBatcher   → padded token ids, mask, labels
//       │
//       ▼
//   BasicIterator           → DataLoader over one epoch
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Word and whitespace tokenizers
pub mod tokenizer;

/// Single-id token indexer
pub mod indexer;

/// Reads `<text>\t<label>` files into instances
pub mod reader;

/// Implements Burn's Dataset trait for indexed instances
pub mod dataset;

/// Implements Burn's Batcher trait with padding and mask
pub mod batcher;

/// Batch size, shuffle and seed for the DataLoader
pub mod iterator;

/// Seeded train/validation split
pub mod splitter;
