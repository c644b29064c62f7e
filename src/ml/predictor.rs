// ============================================================
// Layer 5 — Predictor
// ============================================================
// Rebuilds the reader, vocabulary and model from an archive and
// classifies raw text:
//
//   "what a great film" → Prediction { label: "pos",
//                                      probs: [("pos", 0.91), ("neg", 0.09)] }
//
// Probabilities are listed in label-id order. Text with no
// known tokens still gets a prediction: its tokens map to the
// OOV id, and an empty sentence is one padding column that the
// encoder reduces to zeros.

use anyhow::{Context, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::ClassificationBatcher, reader::ClassificationTsvReader};
use crate::domain::traits::DatasetReader;
use crate::domain::vocabulary::{Vocabulary, LABELS_NAMESPACE};
use crate::infra::archive::Archive;
use crate::ml::model::SimpleClassifier;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probs: Vec<(String, f32)>,
}

impl Prediction {
    pub fn confidence(&self) -> f32 {
        self.probs
            .iter()
            .find(|(label, _)| *label == self.label)
            .map_or(0.0, |(_, p)| *p)
    }
}

pub struct Predictor<B: Backend> {
    reader:  ClassificationTsvReader,
    vocab:   Vocabulary,
    model:   SimpleClassifier<B>,
    batcher: ClassificationBatcher<B>,
}

impl<B: Backend> Predictor<B> {
    pub fn new(
        reader: ClassificationTsvReader,
        vocab:  Vocabulary,
        model:  SimpleClassifier<B>,
        device: B::Device,
    ) -> Self {
        Self { reader, vocab, model, batcher: ClassificationBatcher::new(device) }
    }

    /// Load config, vocabulary and best weights from `archive`.
    pub fn from_archive(archive: &Archive, device: B::Device) -> Result<Self> {
        let cfg    = archive.load_config()?;
        let reader = cfg.dataset_reader.build()?;
        let vocab  = archive.load_vocabulary()?;

        let model_cfg = cfg.model.to_config(&reader, &vocab)?;
        let model = archive.load_best(model_cfg.init::<B>(&device), &device)?;
        tracing::info!("Predictor ready from '{}'", archive.dir().display());

        Ok(Self::new(reader, vocab, model, device))
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        self.predict_batch(&[text])?
            .pop()
            .context("empty prediction batch")
    }

    pub fn predict_batch(&self, texts: &[&str]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let items = texts
            .iter()
            .map(|text| {
                self.reader
                    .text_to_instance(text, None)
                    .index(&self.vocab, self.reader.token_indexer())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch  = self.batcher.batch(items);
        let output = self.model.forward(batch.tokens, batch.mask, None);

        let num_labels = output.probs.dims()[1];
        let probs = output
            .probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        probs
            .chunks(num_labels)
            .map(|row| self.decode_row(row))
            .collect()
    }

    fn decode_row(&self, row: &[f32]) -> Result<Prediction> {
        let probs = row
            .iter()
            .enumerate()
            .map(|(id, &p)| {
                let label = self
                    .vocab
                    .get_token_from_index(id as u32, LABELS_NAMESPACE)
                    .with_context(|| format!("label id {id} is not in the vocabulary"))?;
                Ok((label.to_string(), p))
            })
            .collect::<Result<Vec<_>>>()?;

        let label = probs
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, _)| label.clone())
            .context("model produced no label probabilities")?;

        Ok(Prediction { label, probs })
    }
}
