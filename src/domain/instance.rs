// ============================================================
// Layer 3 — Instance Domain Types
// ============================================================
// One labelled example is an Instance made of two fields:
//
//   text  — TextField  (the tokenised sentence)
//   label — LabelField (the class name, absent at prediction time)
//
// Indexing an Instance against a Vocabulary produces an
// IndexedInstance: plain integer ids ready for batching.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::traits::TokenIndexer;
use crate::domain::vocabulary::{VocabCounter, Vocabulary, LABELS_NAMESPACE};
use crate::error::DataError;

/// A single token produced by a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextField {
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelField {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub text:  TextField,
    pub label: Option<LabelField>,
}

/// Token ids and label id for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedInstance {
    pub token_ids: Vec<u32>,
    pub label:     Option<u32>,
}

impl Instance {
    pub fn new(tokens: Vec<Token>, label: Option<String>) -> Self {
        Self {
            text:  TextField { tokens },
            label: label.map(|label| LabelField { label }),
        }
    }

    /// Count this instance's tokens (in the indexer's namespace)
    /// and its label (in the labels namespace).
    pub fn count_vocab_items(&self, indexer: &dyn TokenIndexer, counter: &mut VocabCounter) {
        for token in &self.text.tokens {
            indexer.count_vocab_items(token, counter);
        }
        if let Some(field) = &self.label {
            counter.add(LABELS_NAMESPACE, field.label.clone());
        }
    }

    /// Convert tokens and label to ids.
    pub fn index(
        &self,
        vocab:   &Vocabulary,
        indexer: &dyn TokenIndexer,
    ) -> Result<IndexedInstance, DataError> {
        let token_ids = indexer.tokens_to_indices(&self.text.tokens, vocab);
        let label = match &self.label {
            Some(field) => Some(
                vocab
                    .get_token_index(&field.label, LABELS_NAMESPACE)
                    .ok_or_else(|| DataError::UnknownLabel { label: field.label.clone() })?,
            ),
            None => None,
        };
        Ok(IndexedInstance { token_ids, label })
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.text.tokens.iter().map(|t| t.text.as_str()).collect();
        write!(
            f,
            "Instance(text: TextField of length {} with text: [{}]",
            tokens.len(),
            tokens.join(", ")
        )?;
        match &self.label {
            Some(field) => write!(f, ", label: LabelField with label: {})", field.label),
            None => write!(f, ")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::indexer::SingleIdTokenIndexer;
    use crate::domain::vocabulary::VocabularyParams;

    fn instance(text: &str, label: &str) -> Instance {
        Instance::new(
            text.split_whitespace().map(Token::new).collect(),
            Some(label.to_string()),
        )
    }

    #[test]
    fn test_counts_tokens_and_label() {
        let indexer = SingleIdTokenIndexer::default();
        let mut counter = VocabCounter::default();
        instance("good good movie", "pos").count_vocab_items(&indexer, &mut counter);

        assert_eq!(counter.count("tokens", "good"), 2);
        assert_eq!(counter.count("tokens", "movie"), 1);
        assert_eq!(counter.count("labels", "pos"), 1);
    }

    #[test]
    fn test_index_maps_unknown_tokens_to_oov() {
        let indexer = SingleIdTokenIndexer::default();
        let train = vec![instance("good movie", "pos")];
        let vocab = Vocabulary::from_instances(&train, &indexer, &VocabularyParams::default());

        let indexed = instance("good film", "pos").index(&vocab, &indexer).unwrap();
        assert_eq!(indexed.token_ids[0], vocab.get_token_index("good", "tokens").unwrap());
        assert_eq!(indexed.token_ids[1], 1);
        assert_eq!(indexed.label, Some(0));
    }

    #[test]
    fn test_index_rejects_unknown_label() {
        let indexer = SingleIdTokenIndexer::default();
        let vocab = Vocabulary::from_instances(
            &[instance("good", "pos")],
            &indexer,
            &VocabularyParams::default(),
        );
        let err = instance("bad", "neg").index(&vocab, &indexer).unwrap_err();
        assert!(matches!(err, DataError::UnknownLabel { .. }));
    }

    #[test]
    fn test_display_lists_tokens_and_label() {
        let shown = instance("a b", "pos").to_string();
        assert!(shown.contains("length 2"));
        assert!(shown.contains("[a, b]"));
        assert!(shown.contains("label: pos"));
    }
}
