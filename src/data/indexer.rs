use crate::domain::instance::Token;
use crate::domain::traits::TokenIndexer;
use crate::domain::vocabulary::{Vocabulary, OOV_INDEX, TOKENS_NAMESPACE};

/// Maps every token to a single id in one vocabulary namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleIdTokenIndexer {
    pub namespace:        String,
    pub lowercase_tokens: bool,
}

impl SingleIdTokenIndexer {
    pub fn new(namespace: impl Into<String>, lowercase_tokens: bool) -> Self {
        Self { namespace: namespace.into(), lowercase_tokens }
    }
}

impl Default for SingleIdTokenIndexer {
    fn default() -> Self {
        Self::new(TOKENS_NAMESPACE, false)
    }
}

impl TokenIndexer for SingleIdTokenIndexer {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn normalize(&self, token: &Token) -> String {
        if self.lowercase_tokens {
            token.text.to_lowercase()
        } else {
            token.text.clone()
        }
    }

    fn tokens_to_indices(&self, tokens: &[Token], vocab: &Vocabulary) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| {
                vocab
                    .get_token_index(&self.normalize(t), &self.namespace)
                    .unwrap_or(OOV_INDEX)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercasing_merges_case_variants() {
        let indexer = SingleIdTokenIndexer::new("tokens", true);
        let mut vocab = Vocabulary::default();
        let id = vocab.add_token_to_namespace("great", "tokens");

        let ids = indexer.tokens_to_indices(&[Token::new("Great"), Token::new("GREAT")], &vocab);
        assert_eq!(ids, vec![id, id]);
    }

    #[test]
    fn test_case_sensitive_by_default() {
        let indexer = SingleIdTokenIndexer::default();
        let mut vocab = Vocabulary::default();
        vocab.add_token_to_namespace("great", "tokens");

        let ids = indexer.tokens_to_indices(&[Token::new("Great")], &vocab);
        assert_eq!(ids, vec![OOV_INDEX]);
    }
}
