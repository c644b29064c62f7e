use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::batcher::{ClassificationBatch, ClassificationBatcher};
use crate::data::dataset::ClassificationDataset;

/// Fixed-size batches in dataset order, optionally shuffled
/// with a seed. Iterating the returned loader once is one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicIterator {
    pub batch_size: usize,
    pub shuffle:    bool,
    pub seed:       u64,
}

impl BasicIterator {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size, shuffle: true, seed: 42 }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of batches one epoch over `num_items` produces.
    pub fn num_batches(&self, num_items: usize) -> usize {
        num_items.div_ceil(self.batch_size.max(1))
    }

    pub fn loader<B: Backend>(
        &self,
        dataset: ClassificationDataset,
        device:  B::Device,
    ) -> Arc<dyn DataLoader<ClassificationBatch<B>>> {
        let builder = DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device))
            .batch_size(self.batch_size.max(1));
        let builder = if self.shuffle { builder.shuffle(self.seed) } else { builder };
        builder.build(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::IndexedInstance;

    type TestBackend = burn::backend::NdArray;

    fn dataset(n: usize) -> ClassificationDataset {
        ClassificationDataset::new(
            (0..n)
                .map(|i| IndexedInstance { token_ids: vec![i as u32 + 2], label: Some(0) })
                .collect(),
        )
    }

    #[test]
    fn test_batches_cover_dataset_once() {
        let iterator = BasicIterator::new(2).with_shuffle(false);
        let loader = iterator.loader::<TestBackend>(dataset(5), Default::default());

        let sizes: Vec<usize> = loader.iter().map(|b| b.batch_size()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(iterator.num_batches(5), 3);
    }

    #[test]
    fn test_shuffled_epoch_keeps_every_item() {
        let loader = BasicIterator::new(2).with_seed(7).loader::<TestBackend>(dataset(6), Default::default());

        let mut ids: Vec<i64> = loader
            .iter()
            .flat_map(|b| b.tokens.into_data().convert::<i64>().to_vec::<i64>().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![2, 3, 4, 5, 6, 7]);
    }
}
