// ============================================================
// Layer 6 — Model Archive
// ============================================================
// Everything needed to rebuild a trained classifier lives in
// one serialization directory:
//
//   <serialization_dir>/
//     config.json              ← ExperimentConfig (reader + model params)
//     vocabulary/              ← Vocabulary::save_to_files
//     model_epoch_1.mpk.gz     ← weights after epoch 1
//     ...
//     best.mpk.gz              ← weights with the lowest loss so far
//     best_epoch.json          ← which epoch `best` came from
//     metrics.csv              ← written by MetricsLogger
//
// Weights go through Burn's NamedMpkGzFileRecorder (MessagePack
// + gzip, half precision). Loading needs a model of the same
// shape, which is why the config and vocabulary are saved too.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder},
};

use crate::application::params::ExperimentConfig;
use crate::domain::vocabulary::Vocabulary;
use crate::ml::model::SimpleClassifier;

/// Writes `<name>.mpk.gz`
type WeightsRecorder = NamedMpkGzFileRecorder<HalfPrecisionSettings>;

const CONFIG_FILE:     &str = "config.json";
const VOCABULARY_DIR:  &str = "vocabulary";
const BEST_WEIGHTS:    &str = "best";
const BEST_EPOCH_FILE: &str = "best_epoch.json";

pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    /// Open an archive directory, creating it when missing.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create serialization directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing archive for reading.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.join(CONFIG_FILE).exists() {
            anyhow::bail!(
                "'{}' is not a model archive (no {}). Have you run 'train' first?",
                dir.display(),
                CONFIG_FILE
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_config(&self, cfg: &ExperimentConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved experiment config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<ExperimentConfig> {
        ExperimentConfig::from_file(&self.dir.join(CONFIG_FILE))
    }

    pub fn save_vocabulary(&self, vocab: &Vocabulary) -> Result<()> {
        vocab.save_to_files(&self.dir.join(VOCABULARY_DIR))
    }

    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        Vocabulary::from_files(&self.dir.join(VOCABULARY_DIR))
    }

    /// Save the weights after `epoch`.
    pub fn save_epoch<B: Backend>(&self, model: &SimpleClassifier<B>, epoch: usize) -> Result<()> {
        self.record(model, &format!("model_epoch_{epoch}"))
    }

    /// Save the weights as the best so far.
    pub fn save_best<B: Backend>(&self, model: &SimpleClassifier<B>, epoch: usize) -> Result<()> {
        self.record(model, BEST_WEIGHTS)?;
        fs::write(self.dir.join(BEST_EPOCH_FILE), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {BEST_EPOCH_FILE}"))?;
        Ok(())
    }

    /// Load the best weights into a freshly initialised model.
    pub fn load_best<B: Backend>(
        &self,
        model:  SimpleClassifier<B>,
        device: &B::Device,
    ) -> Result<SimpleClassifier<B>> {
        let path = self.dir.join(BEST_WEIGHTS);
        let model = model
            .load_file(path.clone(), &WeightsRecorder::new(), device)
            .with_context(|| format!("Cannot load weights '{}'", path.display()))?;
        if let Ok(epoch) = self.best_epoch() {
            tracing::info!("Loaded weights from epoch {}", epoch);
        }
        Ok(model)
    }

    pub fn best_epoch(&self) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(BEST_EPOCH_FILE))
            .with_context(|| format!("Cannot read {BEST_EPOCH_FILE}"))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    fn record<B: Backend>(&self, model: &SimpleClassifier<B>, name: &str) -> Result<()> {
        // The recorder adds the .mpk.gz extension
        let path = self.dir.join(name);
        model
            .clone()
            .save_file(path.clone(), &WeightsRecorder::new())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        tracing::debug!("Saved weights '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::SimpleClassifierConfig;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_open_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Archive::open(dir.path()).is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path()).unwrap();
        let cfg = ExperimentConfig::with_defaults("train.tsv").unwrap();
        archive.save_config(&cfg).unwrap();

        let reopened = Archive::open(dir.path()).unwrap();
        assert_eq!(reopened.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_best_weights_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path()).unwrap();
        let device = Default::default();
        let cfg = SimpleClassifierConfig::new(6, 2, 3);

        let model: SimpleClassifier<TestBackend> = cfg.init(&device);
        archive.save_best(&model, 4).unwrap();
        assert_eq!(archive.best_epoch().unwrap(), 4);
        assert!(dir.path().join("best.mpk.gz").exists());

        let fresh: SimpleClassifier<TestBackend> = cfg.init(&device);
        let loaded = archive.load_best(fresh, &device).unwrap();

        let saved = model.classifier.weight.val().into_data().convert::<f32>().to_vec::<f32>().unwrap();
        let restored = loaded.classifier.weight.val().into_data().convert::<f32>().to_vec::<f32>().unwrap();
        for (a, b) in saved.iter().zip(&restored) {
            // half-precision storage
            assert!((a - b).abs() < 1e-2);
        }
    }
}
