// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap` and hands off to Layer 2 (application).
//
// Three commands are supported:
//   1. `run`     — one untrained pass printing batches and outputs
//   2. `train`   — trains a classifier into a serialization dir
//   3. `predict` — loads an archive and classifies text
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, RunArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "tsv-classifier",
    version = "0.1.0",
    about = "Read tab-separated text/label data, train a bag-of-embeddings classifier, predict labels."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args)     => run_walkthrough(args),
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_walkthrough(args: RunArgs) -> Result<()> {
    use crate::application::run_use_case::RunUseCase;

    tracing::info!("Reading {}", args.data_path.display());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    RunUseCase::new(args.into()).execute(&mut out)?;
    out.flush()?;
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let experiment = args.experiment()?;
    tracing::info!("Training on {}", experiment.train_data_path.display());

    let outcome = TrainUseCase::new(experiment, &args.serialization_dir).execute()?;
    println!(
        "Training complete: best epoch {} (loss {:.4}), archive in {}",
        outcome.best_epoch,
        outcome.best_loss,
        args.serialization_dir.display(),
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.archive)?;
    for (text, prediction) in use_case.execute(&args.text, args.input.as_ref())? {
        println!("{}\t{:.4}", prediction.label, prediction.confidence());
        tracing::debug!("Text: {text}");
        for (label, prob) in &prediction.probs {
            println!("  {label}: {prob:.4}");
        }
    }
    Ok(())
}
