// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<IndexedInstance>
// into tensors for one forward pass.
//
// Sentences have different lengths, so every row is padded
// with the padding id (0) up to the longest row in the batch:
//
//   [5, 9, 2]        tokens [[5, 9, 2],      mask [[1, 1, 1],
//   [7]          →           [7, 0, 0]]            [1, 0, 0]]
//
// The mask tells the encoder which positions are real tokens.
// Labels become a [batch_size] tensor when every item has one;
// prediction batches carry no labels.
//
// Reference: Burn Book §4 (Batcher)

use std::fmt;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::IndexedInstance;
use crate::domain::vocabulary::PADDING_INDEX;

// ─── ClassificationBatch ──────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Token ids, shape [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// true = real token, false = padding; shape [batch_size, seq_len]
    pub mask: Tensor<B, 2, Bool>,

    /// Label ids, shape [batch_size]
    pub labels: Option<Tensor<B, 1, Int>>,
}

impl<B: Backend> ClassificationBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.tokens.dims()[0]
    }
}

impl<B: Backend> fmt::Display for ClassificationBatch<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch(size={})", self.batch_size())?;
        writeln!(f, "  text.tokens: {}", self.tokens)?;
        writeln!(f, "  text.mask: {}", self.mask)?;
        match &self.labels {
            Some(labels) => write!(f, "  label: {}", labels),
            None => write!(f, "  label: <none>"),
        }
    }
}

// ─── ClassificationBatcher ────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<IndexedInstance, ClassificationBatch<B>> for ClassificationBatcher<B> {
    fn batch(&self, items: Vec<IndexedInstance>) -> ClassificationBatch<B> {
        let batch_size = items.len();
        // At least one column so an empty sentence still has a row
        let seq_len = items
            .iter()
            .map(|item| item.token_ids.len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut ids  = Vec::with_capacity(batch_size * seq_len);
        let mut mask = Vec::with_capacity(batch_size * seq_len);
        for item in &items {
            for pos in 0..seq_len {
                match item.token_ids.get(pos) {
                    Some(&id) => {
                        ids.push(id as i64);
                        mask.push(1i64);
                    }
                    None => {
                        ids.push(PADDING_INDEX as i64);
                        mask.push(0i64);
                    }
                }
            }
        }

        let tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(ids, [batch_size, seq_len]),
            &self.device,
        );
        let mask = Tensor::<B, 2, Int>::from_data(
            TensorData::new(mask, [batch_size, seq_len]),
            &self.device,
        )
        .equal_elem(1);

        // Only a fully labelled batch gets a label tensor
        let labels: Option<Vec<i64>> = items
            .iter()
            .map(|item| item.label.map(i64::from))
            .collect();
        let labels = labels.map(|labels| {
            Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [batch_size]), &self.device)
        });

        ClassificationBatch { tokens, mask, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn ints<const D: usize>(t: Tensor<TestBackend, D, Int>) -> Vec<i64> {
        t.into_data().convert::<i64>().to_vec::<i64>().unwrap()
    }

    fn item(ids: &[u32], label: Option<u32>) -> IndexedInstance {
        IndexedInstance { token_ids: ids.to_vec(), label }
    }

    #[test]
    fn test_pads_to_longest_and_builds_mask() {
        let batcher = ClassificationBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![item(&[5, 9, 2], Some(1)), item(&[7], Some(0))]);

        assert_eq!(batch.tokens.dims(), [2, 3]);
        assert_eq!(ints(batch.tokens.clone()), vec![5, 9, 2, 7, 0, 0]);
        assert_eq!(ints(batch.mask.clone().int()), vec![1, 1, 1, 1, 0, 0]);
        assert_eq!(ints(batch.labels.clone().unwrap()), vec![1, 0]);
    }

    #[test]
    fn test_unlabelled_items_give_no_label_tensor() {
        let batcher = ClassificationBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![item(&[3], None)]);
        assert!(batch.labels.is_none());
        assert!(batch.to_string().contains("label: <none>"));
    }

    #[test]
    fn test_empty_sentence_is_one_padding_column() {
        let batcher = ClassificationBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![item(&[], Some(0))]);
        assert_eq!(batch.tokens.dims(), [1, 1]);
        assert_eq!(ints(batch.mask.int()), vec![0]);
    }
}
