// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over Burn DataLoaders:
//
//   train phase — forward with loss → backward → optimiser step
//   valid phase — model.valid() (no autodiff) → mean loss, accuracy
//
// After every epoch the metrics row is written and the weights
// are checkpointed; the epoch with the lowest validation loss
// (training loss when there is no validation data) is kept as
// `best`. With `patience` set, training stops once that many
// epochs pass without improvement.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{Context, Result};
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use std::sync::Arc;

use crate::application::params::{OptimizerParams, TrainerParams};
use crate::data::{batcher::ClassificationBatch, dataset::ClassificationDataset, iterator::BasicIterator};
use crate::infra::{archive::Archive, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::model::{SimpleClassifier, SimpleClassifierConfig};

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub best_epoch: usize,
    pub best_loss:  f64,
    pub metrics:    Vec<EpochMetrics>,
}

impl TrainOutcome {
    pub fn epochs_run(&self) -> usize {
        self.metrics.len()
    }
}

pub struct Trainer<'a, B: AutodiffBackend> {
    params:     &'a TrainerParams,
    iterator:   &'a BasicIterator,
    archive:    Option<&'a Archive>,
    device:     B::Device,
}

impl<'a, B: AutodiffBackend> Trainer<'a, B> {
    pub fn new(params: &'a TrainerParams, iterator: &'a BasicIterator, device: B::Device) -> Self {
        Self { params, iterator, archive: None, device }
    }

    /// Write metrics and checkpoints into this archive.
    pub fn with_archive(mut self, archive: &'a Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Build the model and optimiser and train.
    pub fn fit(
        &self,
        model_cfg:  &SimpleClassifierConfig,
        train:      ClassificationDataset,
        validation: Option<ClassificationDataset>,
    ) -> Result<(SimpleClassifier<B>, TrainOutcome)> {
        let model: SimpleClassifier<B> = model_cfg.init(&self.device);
        tracing::info!(
            "Model ready: vocab_size={}, embedding_dim={}, num_labels={}",
            model_cfg.vocab_size, model_cfg.embedding_dim, model_cfg.num_labels,
        );

        match self.params.optimizer {
            OptimizerParams::Adam { lr } => {
                let optim = AdamConfig::new().with_epsilon(1e-8).init::<B, SimpleClassifier<B>>();
                self.train_loop(model, optim, lr, train, validation)
            }
            OptimizerParams::Sgd { lr } => {
                let optim = SgdConfig::new().init::<B, SimpleClassifier<B>>();
                self.train_loop(model, optim, lr, train, validation)
            }
        }
    }

    fn train_loop<O: Optimizer<SimpleClassifier<B>, B>>(
        &self,
        mut model:  SimpleClassifier<B>,
        mut optim:  O,
        lr:         f64,
        train:      ClassificationDataset,
        validation: Option<ClassificationDataset>,
    ) -> Result<(SimpleClassifier<B>, TrainOutcome)> {
        let train_loader = self.iterator.loader::<B>(train, self.device.clone());
        // Validation runs on the inner backend, without an autodiff graph
        let val_loader = validation.map(|ds| {
            self.iterator
                .clone()
                .with_shuffle(false)
                .loader::<B::InnerBackend>(ds, self.device.clone())
        });
        let logger = self.archive.map(|a| MetricsLogger::create(a.dir())).transpose()?;

        let mut outcome = TrainOutcome { best_epoch: 0, best_loss: f64::INFINITY, metrics: Vec::new() };
        let mut epochs_without_improvement = 0usize;

        for epoch in 1..=self.params.num_epochs {
            // ── Training phase ────────────────────────────────────────────────
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;
            let mut correct  = 0usize;
            let mut seen     = 0usize;

            for batch in train_loader.iter() {
                let labels = batch.labels.clone().context("training batch has no labels")?;
                let output = model.forward_batch(&batch);
                let loss   = output.loss.context("training forward pass returned no loss")?;

                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches  += 1;
                correct  += count_correct(output.logits, labels);
                seen     += batch.batch_size();

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);
            }

            let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
            let train_acc  = if seen > 0 { correct as f64 / seen as f64 } else { 0.0 };

            // ── Validation phase ──────────────────────────────────────────────
            let (val_loss, val_acc) = match &val_loader {
                Some(loader) => {
                    let (loss, acc) = evaluate(&model.valid(), loader)?;
                    (Some(loss), Some(acc))
                }
                None => (None, None),
            };

            let metrics = EpochMetrics { epoch, train_loss, train_acc, val_loss, val_acc };
            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}%{}",
                epoch,
                self.params.num_epochs,
                train_loss,
                train_acc * 100.0,
                match (val_loss, val_acc) {
                    (Some(l), Some(a)) => format!(" | val_loss={:.4} | val_acc={:.1}%", l, a * 100.0),
                    _ => String::new(),
                },
            );

            if let Some(logger) = &logger {
                logger.log(&metrics)?;
            }
            if let Some(archive) = self.archive {
                archive.save_epoch(&model, epoch)?;
            }

            if metrics.is_improvement(outcome.best_loss) {
                outcome.best_loss  = metrics.selection_loss();
                outcome.best_epoch = epoch;
                epochs_without_improvement = 0;
                if let Some(archive) = self.archive {
                    archive.save_best(&model, epoch)?;
                    tracing::info!("New best model at epoch {}", epoch);
                }
            } else {
                epochs_without_improvement += 1;
            }
            outcome.metrics.push(metrics);

            if self.params.patience.is_some_and(|p| epochs_without_improvement >= p) {
                tracing::info!(
                    "No improvement for {} epochs, stopping early at epoch {}",
                    epochs_without_improvement, epoch,
                );
                break;
            }
        }

        tracing::info!("Training complete! Best epoch: {}", outcome.best_epoch);
        Ok((model, outcome))
    }
}

/// Mean loss and accuracy of `model` over one pass of `loader`.
pub fn evaluate<B: Backend>(
    model:  &SimpleClassifier<B>,
    loader: &Arc<dyn DataLoader<ClassificationBatch<B>>>,
) -> Result<(f64, f64)> {
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut correct  = 0usize;
    let mut seen     = 0usize;

    for batch in loader.iter() {
        let labels = batch.labels.clone().context("evaluation batch has no labels")?;
        let output = model.forward_batch(&batch);
        let loss   = output.loss.context("evaluation forward pass returned no loss")?;

        loss_sum += loss.into_scalar().elem::<f64>();
        batches  += 1;
        correct  += count_correct(output.logits, labels);
        seen     += batch.batch_size();
    }

    let loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
    let acc  = if seen > 0 { correct as f64 / seen as f64 } else { 0.0 };
    Ok((loss, acc))
}

/// Number of rows whose highest-scoring class is the label.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1]; flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted.equal(labels).int().sum().into_scalar().elem::<i64>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::IndexedInstance;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    // ids 2,3 → label 0; ids 4,5 → label 1
    fn separable() -> ClassificationDataset {
        ClassificationDataset::new(vec![
            IndexedInstance { token_ids: vec![2, 3], label: Some(0) },
            IndexedInstance { token_ids: vec![3, 2, 2], label: Some(0) },
            IndexedInstance { token_ids: vec![4, 5], label: Some(1) },
            IndexedInstance { token_ids: vec![5], label: Some(1) },
        ])
    }

    fn params(num_epochs: usize, patience: Option<usize>) -> TrainerParams {
        TrainerParams { num_epochs, optimizer: OptimizerParams::Adam { lr: 0.05 }, patience }
    }

    #[test]
    fn test_training_reduces_loss() {
        let params = params(30, None);
        let iterator = BasicIterator::new(2).with_seed(1);
        let trainer = Trainer::<TestBackend>::new(&params, &iterator, Default::default());

        let (_, outcome) = trainer
            .fit(&SimpleClassifierConfig::new(6, 2, 8), separable(), Some(separable()))
            .unwrap();

        assert_eq!(outcome.epochs_run(), 30);
        let first = outcome.metrics.first().unwrap();
        let last  = outcome.metrics.last().unwrap();
        assert!(last.train_loss < first.train_loss);
        assert!(last.val_loss.unwrap() < first.val_loss.unwrap());
        assert_eq!(last.val_acc, Some(1.0));
    }

    #[test]
    fn test_patience_stops_early() {
        // lr = 0 never improves after the first epoch
        let params = TrainerParams {
            num_epochs: 10,
            optimizer:  OptimizerParams::Sgd { lr: 0.0 },
            patience:   Some(2),
        };
        let iterator = BasicIterator::new(4).with_shuffle(false);
        let trainer = Trainer::<TestBackend>::new(&params, &iterator, Default::default());

        let (_, outcome) = trainer
            .fit(&SimpleClassifierConfig::new(6, 2, 4), separable(), Some(separable()))
            .unwrap();

        assert_eq!(outcome.best_epoch, 1);
        assert_eq!(outcome.epochs_run(), 3);
    }

    #[test]
    fn test_archive_gets_metrics_and_best_weights() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path()).unwrap();
        let params = params(2, None);
        let iterator = BasicIterator::new(2);
        let trainer = Trainer::<TestBackend>::new(&params, &iterator, Default::default())
            .with_archive(&archive);

        trainer.fit(&SimpleClassifierConfig::new(6, 2, 4), separable(), None).unwrap();

        assert!(dir.path().join("metrics.csv").exists());
        assert!(dir.path().join("model_epoch_2.mpk.gz").exists());
        assert!(dir.path().join("best.mpk.gz").exists());
        assert!(archive.best_epoch().is_ok());
    }
}
