// ============================================================
// Typed Errors
// ============================================================
// Failures the data and model layers can describe precisely.
// Use cases wrap these in anyhow::Error with file context.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the input records or their vocabulary lookups.
#[derive(Error, Debug)]
pub enum DataError {
    /// A non-blank line that is not exactly `<text>\t<label>`.
    #[error("{path}:{line_number}: expected `<text>\\t<label>`, found {fields} tab-separated field(s)")]
    MalformedLine {
        path:        PathBuf,
        line_number: usize,
        fields:      usize,
    },

    /// The labels namespace has no OOV entry, so every label must be known.
    #[error("label '{label}' is not in the vocabulary")]
    UnknownLabel { label: String },

    #[error("no instances were read from {path}")]
    EmptyDataset { path: PathBuf },
}

/// Problems with the component params.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("exactly one token indexer is supported, found {0}")]
    IndexerCount(usize),

    #[error("exactly one token embedder is supported, found {0}")]
    EmbedderCount(usize),

    #[error("token embedder '{embedder}' does not match token indexer '{indexer}'")]
    KeyMismatch { indexer: String, embedder: String },

    #[error("encoder expects embedding_dim={encoder} but the embedder produces {embedder}")]
    DimensionMismatch { encoder: usize, embedder: usize },

    #[error("the vocabulary has no labels; at least one labelled instance is required")]
    NoLabels,

    #[error("validation_split must be in [0, 1), found {0}")]
    ValidationSplit(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_line_mentions_location() {
        let e = DataError::MalformedLine {
            path:        PathBuf::from("train.tsv"),
            line_number: 3,
            fields:      1,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("train.tsv:3:"));
        assert!(msg.contains("1 tab-separated"));
    }
}
