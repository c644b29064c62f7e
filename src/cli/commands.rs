// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `run`, `train` and `predict`
// and all their configurable flags.
//
// Each Args struct converts into its use case's input type, so
// the application layer never sees clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::{params::ExperimentConfig, run_use_case::RunConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a TSV file and print every batch with untrained model outputs
    Run(RunArgs),

    /// Train a classifier and write an archive
    Train(TrainArgs),

    /// Classify text with a trained archive
    Predict(PredictArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// TSV file with one `<text>\t<label>` record per line
    pub data_path: PathBuf,

    /// Dataset reader params JSON (defaults to the built-in reader)
    #[arg(long)]
    pub reader_params: Option<PathBuf>,

    /// Model params JSON (defaults to the built-in model)
    #[arg(long)]
    pub model_params: Option<PathBuf>,

    #[arg(long, default_value_t = 2)]
    pub batch_size: usize,

    /// Seed for the batch shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Keep the file order instead of shuffling
    #[arg(long)]
    pub no_shuffle: bool,
}

impl From<RunArgs> for RunConfig {
    fn from(a: RunArgs) -> Self {
        RunConfig {
            data_path:     a.data_path,
            reader_params: a.reader_params,
            model_params:  a.model_params,
            batch_size:    a.batch_size,
            shuffle:       !a.no_shuffle,
            seed:          a.seed,
        }
    }
}

/// Arguments for the `train` command.
/// Either `--config` or `--train-data` must be given; the
/// remaining flags override the config.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Experiment config JSON
    #[arg(long, required_unless_present = "train_data")]
    pub config: Option<PathBuf>,

    /// Training TSV (with the built-in reader and model when no --config)
    #[arg(long)]
    pub train_data: Option<PathBuf>,

    /// Validation TSV
    #[arg(long)]
    pub validation_data: Option<PathBuf>,

    /// Directory for config, vocabulary, weights and metrics
    #[arg(short, long, default_value = "model")]
    pub serialization_dir: PathBuf,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Load or build the experiment config and apply the overrides.
    pub fn experiment(&self) -> Result<ExperimentConfig> {
        let mut cfg = match (&self.config, &self.train_data) {
            (Some(path), _) => ExperimentConfig::from_file(path)?,
            (None, Some(train)) => ExperimentConfig::with_defaults(train.clone())?,
            (None, None) => anyhow::bail!("pass --config or --train-data"),
        };

        if let Some(train) = &self.train_data {
            cfg.train_data_path = train.clone();
        }
        if let Some(val) = &self.validation_data {
            cfg.validation_data_path = Some(val.clone());
        }
        if let Some(epochs) = self.epochs {
            cfg.trainer.num_epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            cfg.iterator.batch_size = batch_size;
        }
        if let Some(seed) = self.seed {
            cfg.iterator.seed = seed;
        }
        Ok(cfg)
    }
}

/// Arguments for the `predict` command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Serialization directory written by `train`
    #[arg(short, long, default_value = "model")]
    pub archive: PathBuf,

    /// Text to classify (repeatable)
    #[arg(long, required_unless_present = "input")]
    pub text: Vec<String>,

    /// File with one text per line; a trailing tab-separated label is ignored
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["tsv-classifier", "run", "data.tsv"]).unwrap();
        let Commands::Run(args) = cli.command else { panic!("expected run") };
        let cfg: RunConfig = args.into();
        assert_eq!(cfg.batch_size, 2);
        assert!(cfg.shuffle);
        assert!(cfg.reader_params.is_none());
    }

    #[test]
    fn test_train_overrides_apply() {
        let cli = Cli::try_parse_from([
            "tsv-classifier", "train", "--train-data", "t.tsv", "--epochs", "3", "--seed", "7",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = args.experiment().unwrap();
        assert_eq!(cfg.trainer.num_epochs, 3);
        assert_eq!(cfg.iterator.seed, 7);
        assert_eq!(cfg.train_data_path, PathBuf::from("t.tsv"));
    }

    #[test]
    fn test_train_needs_data_or_config() {
        assert!(Cli::try_parse_from(["tsv-classifier", "train"]).is_err());
    }

    #[test]
    fn test_predict_needs_text_or_input() {
        assert!(Cli::try_parse_from(["tsv-classifier", "predict"]).is_err());
        assert!(Cli::try_parse_from(["tsv-classifier", "predict", "--text", "hi"]).is_ok());
    }
}
