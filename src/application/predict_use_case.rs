// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a trained archive and classifies texts given on the
// command line and/or read from a file (one text per line; a
// trailing `\t<label>` column is ignored, so training files
// can be fed back in). Texts go through the model in chunks of
// the experiment's iterator batch size.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::infra::archive::Archive;
use crate::ml::{
    backend::{default_device, InnerBackend},
    predictor::{Prediction, Predictor},
};

pub struct PredictUseCase {
    predictor:  Predictor<InnerBackend>,
    batch_size: usize,
}

impl PredictUseCase {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Result<Self> {
        let archive = Archive::open(archive_dir)?;
        let batch_size = archive.load_config()?.iterator.batch_size.max(1);
        let predictor = Predictor::from_archive(&archive, default_device())?;
        Ok(Self { predictor, batch_size })
    }

    /// Classify `texts` followed by every non-blank line of `input`.
    pub fn execute(
        &self,
        texts: &[String],
        input: Option<&PathBuf>,
    ) -> Result<Vec<(String, Prediction)>> {
        let mut all: Vec<String> = texts.to_vec();
        if let Some(path) = input {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Cannot read input file '{}'", path.display()))?;
            all.extend(
                contents
                    .lines()
                    .map(|line| line.split('\t').next().unwrap_or("").trim().to_string())
                    .filter(|text| !text.is_empty()),
            );
        }
        if all.is_empty() {
            anyhow::bail!("Nothing to classify: pass --text or --input");
        }

        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let mut predictions = Vec::with_capacity(refs.len());
        for chunk in refs.chunks(self.batch_size) {
            predictions.extend(self.predictor.predict_batch(chunk)?);
        }
        tracing::debug!("Classified {} texts in batches of {}", refs.len(), self.batch_size);
        Ok(all.into_iter().zip(predictions).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{params::ExperimentConfig, train_use_case::TrainUseCase};

    fn trained_archive(dir: &std::path::Path, batch_size: usize) -> PathBuf {
        let train_path = dir.join("train.tsv");
        fs::write(&train_path, "good fun\tpos\nbad plot\tneg\ngreat film\tpos\n").unwrap();

        let mut cfg = ExperimentConfig::with_defaults(&train_path).unwrap();
        cfg.iterator.batch_size = batch_size;
        cfg.trainer.num_epochs = 1;

        let out = dir.join("model");
        TrainUseCase::new(cfg, &out).execute().unwrap();
        out
    }

    #[test]
    fn test_input_longer_than_one_batch_is_fully_classified() {
        let dir = tempfile::tempdir().unwrap();
        let archive = trained_archive(dir.path(), 2);
        let input = dir.path().join("input.tsv");
        fs::write(&input, "good\nbad\tneg\n\nfun plot\ngreat\n").unwrap();

        let use_case = PredictUseCase::new(&archive).unwrap();
        assert_eq!(use_case.batch_size, 2);

        let results = use_case.execute(&["film".to_string()], Some(&input)).unwrap();
        let texts: Vec<&str> = results.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["film", "good", "bad", "fun plot", "great"]);
        for (_, prediction) in &results {
            assert!(prediction.label == "pos" || prediction.label == "neg");
            assert_eq!(prediction.probs.len(), 2);
        }
    }

    #[test]
    fn test_nothing_to_classify_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = trained_archive(dir.path(), 4);
        let use_case = PredictUseCase::new(&archive).unwrap();
        assert!(use_case.execute(&[], None).is_err());
    }
}
