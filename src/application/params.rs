// ============================================================
// Layer 2 — Component Params
// ============================================================
// Every pipeline component is chosen by a JSON object with a
// "type" field, e.g.
//
//   {"type": "classification-tsv",
//    "token_indexers": {"tokens": {"type": "single_id"}}}
//
// Each "type" is a serde enum variant, so an unknown component
// name or a misspelt key fails at parse time with serde's
// message instead of being silently ignored.
//
// ExperimentConfig bundles every params block needed by the
// `train` command and is saved into the archive so `predict`
// can rebuild the exact same reader and model.
//
// Reference: serde documentation (enum representations)

use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::data::{
    indexer::SingleIdTokenIndexer,
    iterator::BasicIterator,
    reader::ClassificationTsvReader,
    tokenizer::{WhitespaceTokenizer, WordTokenizer},
};
use crate::domain::traits::{TokenIndexer, Tokenizer};
use crate::domain::vocabulary::{Vocabulary, VocabularyParams, LABELS_NAMESPACE, TOKENS_NAMESPACE};
use crate::error::ConfigError;
use crate::ml::model::SimpleClassifierConfig;

pub const DEFAULT_READER_PARAMS: &str = r#"
{
  "type": "classification-tsv",
  "token_indexers": {"tokens": {"type": "single_id"}}
}
"#;

pub const DEFAULT_MODEL_PARAMS: &str = r#"
{
  "type": "simple_classifier",
  "embedder": {"token_embedders": {
    "tokens": {"type": "embedding", "embedding_dim": 10}
  }},
  "encoder": {"type": "bag_of_embeddings", "embedding_dim": 10}
}
"#;

/// Parse a params JSON string, naming the block in the error.
pub fn parse_params<T: DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("Invalid {what} params"))
}

/// Read and parse a params JSON file.
pub fn load_params<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read {what} params from '{}'", path.display()))?;
    parse_params(&json, what)
}

// ─── Dataset reader ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderType {
    #[serde(rename = "classification-tsv")]
    ClassificationTsv,
}

// Empty struct variants: a unit variant of an internally tagged
// enum would skip extra keys instead of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum TokenizerParams {
    Word {},
    Whitespace {},
}

impl Default for TokenizerParams {
    fn default() -> Self {
        Self::Word {}
    }
}

impl TokenizerParams {
    pub fn build(&self) -> Box<dyn Tokenizer> {
        match self {
            Self::Word {} => Box::new(WordTokenizer::new()),
            Self::Whitespace {} => Box::new(WhitespaceTokenizer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexerType {
    #[serde(rename = "single_id")]
    SingleId,
}

fn default_namespace() -> String {
    TOKENS_NAMESPACE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenIndexerParams {
    #[serde(rename = "type")]
    pub kind: IndexerType,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub lowercase_tokens: bool,
}

impl Default for TokenIndexerParams {
    fn default() -> Self {
        Self { kind: IndexerType::SingleId, namespace: default_namespace(), lowercase_tokens: false }
    }
}

fn default_token_indexers() -> BTreeMap<String, TokenIndexerParams> {
    BTreeMap::from([(TOKENS_NAMESPACE.to_string(), TokenIndexerParams::default())])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetReaderParams {
    #[serde(rename = "type")]
    pub kind: ReaderType,
    #[serde(default)]
    pub lazy: bool,
    #[serde(default)]
    pub tokenizer: TokenizerParams,
    #[serde(default = "default_token_indexers")]
    pub token_indexers: BTreeMap<String, TokenIndexerParams>,
}

impl DatasetReaderParams {
    pub fn build(&self) -> Result<ClassificationTsvReader, ConfigError> {
        let mut indexers = self.token_indexers.iter();
        let (name, params) = match (indexers.next(), indexers.next()) {
            (Some(only), None) => only,
            _ => return Err(ConfigError::IndexerCount(self.token_indexers.len())),
        };
        let indexer = match params.kind {
            IndexerType::SingleId => {
                SingleIdTokenIndexer::new(params.namespace.clone(), params.lowercase_tokens)
            }
        };
        Ok(match self.kind {
            ReaderType::ClassificationTsv => {
                ClassificationTsvReader::new(self.tokenizer.build(), name.clone(), indexer, self.lazy)
            }
        })
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "simple_classifier")]
    SimpleClassifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEmbedderType {
    #[serde(rename = "embedding")]
    Embedding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenEmbedderParams {
    #[serde(rename = "type")]
    pub kind: TokenEmbedderType,
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextFieldEmbedderParams {
    pub token_embedders: BTreeMap<String, TokenEmbedderParams>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderType {
    #[serde(rename = "bag_of_embeddings")]
    BagOfEmbeddings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seq2VecEncoderParams {
    #[serde(rename = "type")]
    pub kind: EncoderType,
    pub embedding_dim: usize,
    #[serde(default)]
    pub averaged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelParams {
    #[serde(rename = "type")]
    pub kind: ModelType,
    pub embedder: TextFieldEmbedderParams,
    pub encoder: Seq2VecEncoderParams,
}

impl ModelParams {
    /// Check the params against the reader and size the model
    /// from the vocabulary.
    pub fn to_config(
        &self,
        reader: &ClassificationTsvReader,
        vocab:  &Vocabulary,
    ) -> Result<SimpleClassifierConfig, ConfigError> {
        let embedders = &self.embedder.token_embedders;
        let mut iter = embedders.iter();
        let (name, embedder) = match (iter.next(), iter.next()) {
            (Some(only), None) => only,
            _ => return Err(ConfigError::EmbedderCount(embedders.len())),
        };
        if name != reader.indexer_name() {
            return Err(ConfigError::KeyMismatch {
                indexer:  reader.indexer_name().to_string(),
                embedder: name.clone(),
            });
        }
        if self.encoder.embedding_dim != embedder.embedding_dim {
            return Err(ConfigError::DimensionMismatch {
                encoder:  self.encoder.embedding_dim,
                embedder: embedder.embedding_dim,
            });
        }

        let num_labels = vocab.get_vocab_size(LABELS_NAMESPACE);
        if num_labels == 0 {
            return Err(ConfigError::NoLabels);
        }
        // Padding and OOV rows exist even when no token was counted
        let vocab_size = vocab.get_vocab_size(reader.token_indexer().namespace()).max(2);

        Ok(match (self.kind, embedder.kind, self.encoder.kind) {
            (ModelType::SimpleClassifier, TokenEmbedderType::Embedding, EncoderType::BagOfEmbeddings) => {
                SimpleClassifierConfig::new(vocab_size, num_labels, embedder.embedding_dim)
                    .with_averaged(self.encoder.averaged)
            }
        })
    }
}

// ─── Iterator ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IteratorType {
    #[serde(rename = "basic")]
    Basic,
}

fn default_batch_size() -> usize { 32 }
fn default_true() -> bool { true }
fn default_seed() -> u64 { 42 }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IteratorParams {
    #[serde(rename = "type")]
    pub kind: IteratorType,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for IteratorParams {
    fn default() -> Self {
        Self {
            kind:       IteratorType::Basic,
            batch_size: default_batch_size(),
            shuffle:    true,
            seed:       default_seed(),
        }
    }
}

impl IteratorParams {
    pub fn build(&self) -> BasicIterator {
        match self.kind {
            IteratorType::Basic => BasicIterator::new(self.batch_size)
                .with_shuffle(self.shuffle)
                .with_seed(self.seed),
        }
    }
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
fn default_adam_lr() -> f64 { 1e-3 }
fn default_sgd_lr() -> f64 { 1e-2 }

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum OptimizerParams {
    Adam {
        #[serde(default = "default_adam_lr")]
        lr: f64,
    },
    Sgd {
        #[serde(default = "default_sgd_lr")]
        lr: f64,
    },
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self::Adam { lr: default_adam_lr() }
    }
}

fn default_num_epochs() -> usize { 10 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainerParams {
    #[serde(default = "default_num_epochs")]
    pub num_epochs: usize,
    #[serde(default)]
    pub optimizer: OptimizerParams,
    /// Stop after this many epochs without a better loss
    #[serde(default)]
    pub patience: Option<usize>,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self { num_epochs: default_num_epochs(), optimizer: OptimizerParams::default(), patience: None }
    }
}

// ─── Experiment ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    pub dataset_reader: DatasetReaderParams,
    pub train_data_path: PathBuf,
    #[serde(default)]
    pub validation_data_path: Option<PathBuf>,
    /// Fraction of training data held out when there is no validation file
    #[serde(default)]
    pub validation_split: f64,
    #[serde(default)]
    pub vocabulary: VocabularyParams,
    pub model: ModelParams,
    #[serde(default)]
    pub iterator: IteratorParams,
    #[serde(default)]
    pub trainer: TrainerParams,
}

impl ExperimentConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let cfg: Self = load_params(path, "experiment")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks serde cannot express on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ConfigError::ValidationSplit(self.validation_split));
        }
        Ok(())
    }

    /// Experiment with the built-in reader and model params.
    pub fn with_defaults(train_data_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dataset_reader:       parse_params(DEFAULT_READER_PARAMS, "dataset reader")?,
            train_data_path:      train_data_path.into(),
            validation_data_path: None,
            validation_split:     0.0,
            vocabulary:           VocabularyParams::default(),
            model:                parse_params(DEFAULT_MODEL_PARAMS, "model")?,
            iterator:             IteratorParams::default(),
            trainer:              TrainerParams::default(),
        })
    }
}
