// ============================================================
// Layer 2 — RunUseCase
// ============================================================
// The walkthrough pipeline, one untrained pass over the data:
//
//   Step 1: Build the reader from its params   (Layer 2 - params)
//   Step 2: Read instances from the TSV file   (Layer 4 - data)
//   Step 3: Build the vocabulary               (Layer 3 - domain)
//   Step 4: Build the model from its params    (Layer 5 - ml)
//   Step 5: Index instances into a dataset     (Layer 4 - data)
//   Step 6: For each batch of one epoch, write the batch and
//           the model outputs (loss, probs) to `out`
//
// Output goes to any io::Write so the CLI can pass stdout and
// tests can pass a Vec<u8>.

use anyhow::Result;
use std::{io::Write, path::PathBuf};

use crate::application::params::{
    load_params, parse_params, DatasetReaderParams, ModelParams,
    DEFAULT_MODEL_PARAMS, DEFAULT_READER_PARAMS,
};
use crate::data::{dataset::ClassificationDataset, iterator::BasicIterator};
use crate::domain::traits::DatasetReader;
use crate::domain::vocabulary::{Vocabulary, VocabularyParams};
use crate::error::DataError;
use crate::ml::{backend::{default_device, InnerBackend}, model::SimpleClassifier};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path:     PathBuf,
    /// JSON file overriding the built-in reader params
    pub reader_params: Option<PathBuf>,
    /// JSON file overriding the built-in model params
    pub model_params:  Option<PathBuf>,
    pub batch_size:    usize,
    pub shuffle:       bool,
    pub seed:          u64,
}

impl RunConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path:     data_path.into(),
            reader_params: None,
            model_params:  None,
            batch_size:    2,
            shuffle:       true,
            seed:          42,
        }
    }
}

pub struct RunUseCase {
    config: RunConfig,
}

impl RunUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run one pass and return the number of batches written.
    pub fn execute(&self, out: &mut impl Write) -> Result<usize> {
        let cfg = &self.config;

        let reader_params: DatasetReaderParams = match &cfg.reader_params {
            Some(path) => load_params(path, "dataset reader")?,
            None => parse_params(DEFAULT_READER_PARAMS, "dataset reader")?,
        };
        let model_params: ModelParams = match &cfg.model_params {
            Some(path) => load_params(path, "model")?,
            None => parse_params(DEFAULT_MODEL_PARAMS, "model")?,
        };

        let reader = reader_params.build()?;
        let instances = reader.read(&cfg.data_path)?;
        if instances.is_empty() {
            return Err(DataError::EmptyDataset { path: cfg.data_path.clone() }.into());
        }
        tracing::debug!("First instance: {}", instances[0]);

        let vocab = Vocabulary::from_instances(
            &instances,
            reader.token_indexer(),
            &VocabularyParams::default(),
        );

        let device = default_device();
        let model_cfg = model_params.to_config(&reader, &vocab)?;
        let model: SimpleClassifier<InnerBackend> = model_cfg.init(&device);

        let dataset = ClassificationDataset::from_instances(&instances, &vocab, reader.token_indexer())?;
        let iterator = BasicIterator::new(cfg.batch_size)
            .with_shuffle(cfg.shuffle)
            .with_seed(cfg.seed);

        let mut batches = 0usize;
        for batch in iterator.loader::<InnerBackend>(dataset, device).iter() {
            writeln!(out, "{batch}")?;
            let outputs = model.forward_batch(&batch);
            writeln!(out, "Model outputs: {outputs}")?;
            batches += 1;
        }

        tracing::info!("Ran {} batches over {} instances", batches, instances.len());
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_file(contents: &str) -> tempfile::NamedTempFile {
        let f = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(f.path(), contents).unwrap();
        f
    }

    #[test]
    fn test_prints_every_batch_with_outputs() {
        let f = data_file("I like it\tpos\nI hate it\tneg\nGreat fun!\tpos\n");
        let mut out = Vec::new();
        let batches = RunUseCase::new(RunConfig::new(f.path())).execute(&mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(batches, 2);
        assert_eq!(printed.matches("Model outputs: {loss:").count(), 2);
        assert!(printed.contains("text.tokens"));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let f = data_file("\n\n");
        let err = RunUseCase::new(RunConfig::new(f.path())).execute(&mut Vec::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::EmptyDataset { .. })));
    }

    #[test]
    fn test_custom_model_params_are_used() {
        let f = data_file("a\tx\nb\ty\n");
        let params = data_file(
            r#"{"type": "simple_classifier",
                "embedder": {"token_embedders": {"tokens": {"type": "embedding", "embedding_dim": 3}}},
                "encoder": {"type": "bag_of_embeddings", "embedding_dim": 4}}"#,
        );
        let mut cfg = RunConfig::new(f.path());
        cfg.model_params = Some(params.path().to_path_buf());

        let err = RunUseCase::new(cfg).execute(&mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("embedding_dim=4"));
    }
}
