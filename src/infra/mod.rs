// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the use cases:
//
//   archive.rs — config.json, vocabulary/ and model weights
//                (Burn mpk.gz recorder) in one directory, so
//                `predict` can rebuild what `train` produced.
//
//   metrics.rs — per-epoch loss/accuracy rows in metrics.csv.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Serialization directory: config, vocabulary, weights
pub mod archive;

/// Training metrics CSV logger
pub mod metrics;
