// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run from an ExperimentConfig:
//
//   Step 1: Build the reader                    (Layer 2 - params)
//   Step 2: Read train (+ validation) data      (Layer 4 - data)
//   Step 3: Build vocabulary from both sets     (Layer 3 - domain)
//   Step 4: Index into datasets                 (Layer 4 - data)
//   Step 5: Save config and vocabulary          (Layer 6 - infra)
//   Step 6: Run the training loop               (Layer 5 - ml)
//
// With a lazy reader, steps 2–4 stream the files twice (once to
// count, once to index) so token strings are never all held in
// memory at the same time.
//
// Without a validation file, `validation_split` of the training
// instances is held out instead.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::application::params::ExperimentConfig;
use crate::data::{
    dataset::{ClassificationDataset, IndexedInstance},
    reader::ClassificationTsvReader,
    splitter::split_train_val,
};
use crate::domain::{
    instance::Instance,
    traits::DatasetReader,
    vocabulary::{VocabCounter, Vocabulary},
};
use crate::error::DataError;
use crate::infra::archive::Archive;
use crate::ml::{
    backend::{default_device, TrainBackend},
    trainer::{TrainOutcome, Trainer},
};

pub struct TrainUseCase {
    config:            ExperimentConfig,
    serialization_dir: PathBuf,
}

impl TrainUseCase {
    pub fn new(config: ExperimentConfig, serialization_dir: impl Into<PathBuf>) -> Self {
        Self { config, serialization_dir: serialization_dir.into() }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Reader ────────────────────────────────────────────────────
        let reader = cfg.dataset_reader.build()?;

        // ── Steps 2–4: Vocabulary and datasets ────────────────────────────────
        let (vocab, train, validation) = if reader.is_lazy() {
            self.load_streaming(&reader)?
        } else {
            self.load_in_memory(&reader)?
        };
        tracing::info!(
            "Datasets: {} train, {} validation",
            train.len(),
            validation.as_ref().map_or(0, Vec::len),
        );

        // ── Step 5: Archive ───────────────────────────────────────────────────
        let archive = Archive::create(&self.serialization_dir)?;
        archive.save_config(cfg)?;
        archive.save_vocabulary(&vocab)?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let model_cfg = cfg.model.to_config(&reader, &vocab)?;
        let iterator  = cfg.iterator.build();
        let trainer   = Trainer::<TrainBackend>::new(&cfg.trainer, &iterator, default_device())
            .with_archive(&archive);

        let (_, outcome) = trainer.fit(
            &model_cfg,
            ClassificationDataset::new(train),
            validation.map(ClassificationDataset::new),
        )?;
        Ok(outcome)
    }

    fn load_in_memory(
        &self,
        reader: &ClassificationTsvReader,
    ) -> Result<(Vocabulary, Vec<IndexedInstance>, Option<Vec<IndexedInstance>>)> {
        let cfg = &self.config;
        let train = read_non_empty(reader, &cfg.train_data_path)?;
        let validation = match &cfg.validation_data_path {
            Some(path) => Some(read_non_empty(reader, path)?),
            None => None,
        };

        // Vocabulary covers every split so validation labels are known
        let all: Vec<Instance> = train.iter().chain(validation.iter().flatten()).cloned().collect();
        let vocab = Vocabulary::from_instances(&all, reader.token_indexer(), &cfg.vocabulary);

        let index = |instances: &[Instance]| {
            ClassificationDataset::from_instances(instances, &vocab, reader.token_indexer())
                .map(ClassificationDataset::into_items)
        };
        let train = index(&train)?;
        let validation = validation.as_deref().map(index).transpose()?;

        let (train, validation) = self.hold_out(train, validation)?;
        Ok((vocab, train, validation))
    }

    fn load_streaming(
        &self,
        reader: &ClassificationTsvReader,
    ) -> Result<(Vocabulary, Vec<IndexedInstance>, Option<Vec<IndexedInstance>>)> {
        let cfg = &self.config;
        let paths: Vec<&Path> = std::iter::once(cfg.train_data_path.as_path())
            .chain(cfg.validation_data_path.as_deref())
            .collect();

        let mut counter = VocabCounter::default();
        for path in &paths {
            for instance in reader.read_lazy(path)? {
                instance?.count_vocab_items(reader.token_indexer(), &mut counter);
            }
        }
        let vocab = Vocabulary::from_counter(&counter, &cfg.vocabulary);

        let index_file = |path: &Path| -> Result<Vec<IndexedInstance>> {
            let mut items = Vec::new();
            for instance in reader.read_lazy(path)? {
                items.push(instance?.index(&vocab, reader.token_indexer())?);
            }
            if items.is_empty() {
                return Err(DataError::EmptyDataset { path: path.to_path_buf() }.into());
            }
            Ok(items)
        };
        let train = index_file(&cfg.train_data_path)?;
        let validation = cfg.validation_data_path.as_deref().map(index_file).transpose()?;

        let (train, validation) = self.hold_out(train, validation)?;
        Ok((vocab, train, validation))
    }

    /// Split off validation data when no validation file was given.
    /// The training share must keep at least one instance.
    fn hold_out(
        &self,
        train:      Vec<IndexedInstance>,
        validation: Option<Vec<IndexedInstance>>,
    ) -> Result<(Vec<IndexedInstance>, Option<Vec<IndexedInstance>>)> {
        let split = self.config.validation_split;
        let (train, validation) = match validation {
            Some(validation) => (train, Some(validation)),
            None if split > 0.0 => {
                let (train, held_out) = split_train_val(train, 1.0 - split, self.config.iterator.seed);
                (train, Some(held_out).filter(|v| !v.is_empty()))
            }
            None => (train, None),
        };
        if train.is_empty() {
            return Err(DataError::EmptyDataset { path: self.config.train_data_path.clone() }.into());
        }
        Ok((train, validation))
    }
}

fn read_non_empty(reader: &ClassificationTsvReader, path: &Path) -> Result<Vec<Instance>> {
    let instances = reader.read(path)?;
    if instances.is_empty() {
        return Err(DataError::EmptyDataset { path: path.to_path_buf() }.into());
    }
    Ok(instances)
}
