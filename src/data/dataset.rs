use burn::data::dataset::Dataset;

use crate::domain::instance::Instance;
use crate::domain::traits::TokenIndexer;
use crate::domain::vocabulary::Vocabulary;
use crate::error::DataError;

pub use crate::domain::instance::IndexedInstance;

/// Indexed instances behind Burn's Dataset trait so the
/// DataLoader can call .get(index) and .len() on them.
pub struct ClassificationDataset {
    items: Vec<IndexedInstance>,
}

impl ClassificationDataset {
    pub fn new(items: Vec<IndexedInstance>) -> Self { Self { items } }

    /// Index every instance against the vocabulary.
    pub fn from_instances(
        instances: &[Instance],
        vocab:     &Vocabulary,
        indexer:   &dyn TokenIndexer,
    ) -> Result<Self, DataError> {
        let items = instances
            .iter()
            .map(|instance| instance.index(vocab, indexer))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(items))
    }

    pub fn into_items(self) -> Vec<IndexedInstance> { self.items }
}

impl Dataset<IndexedInstance> for ClassificationDataset {
    fn get(&self, index: usize) -> Option<IndexedInstance> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::indexer::SingleIdTokenIndexer;
    use crate::domain::instance::Token;
    use crate::domain::vocabulary::VocabularyParams;

    #[test]
    fn test_dataset_indexes_every_instance() {
        let indexer = SingleIdTokenIndexer::default();
        let instances = vec![
            Instance::new(vec![Token::new("good")], Some("pos".into())),
            Instance::new(vec![Token::new("bad"), Token::new("bad")], Some("neg".into())),
        ];
        let vocab = Vocabulary::from_instances(&instances, &indexer, &VocabularyParams::default());
        let dataset = ClassificationDataset::from_instances(&instances, &vocab, &indexer).unwrap();

        assert_eq!(dataset.len(), 2);
        let second = dataset.get(1).unwrap();
        assert_eq!(second.token_ids.len(), 2);
        assert_eq!(second.label, vocab.get_token_index("neg", "labels"));
        assert!(dataset.get(2).is_none());
    }
}
