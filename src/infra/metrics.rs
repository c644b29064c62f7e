// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// One CSV row per training epoch:
//
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,0.693100,0.500000,0.690200,0.500000
//   2,0.512300,0.750000,0.601000,0.750000
//
// Validation columns are left empty when the experiment has
// no validation data.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,train_loss,train_acc,val_loss,val_acc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Mean cross-entropy over training batches
    pub train_loss: f64,
    pub train_acc:  f64,
    pub val_loss:   Option<f64>,
    pub val_acc:    Option<f64>,
}

impl EpochMetrics {
    /// The loss that decides which epoch is best:
    /// validation loss when available, training loss otherwise.
    pub fn selection_loss(&self) -> f64 {
        self.val_loss.unwrap_or(self.train_loss)
    }

    pub fn is_improvement(&self, best_loss: f64) -> bool {
        self.selection_loss() < best_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a fresh metrics.csv in `dir` (an existing one is replaced).
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");
        fs::write(&csv_path, format!("{HEADER}\n"))
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let optional = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
        writeln!(
            f,
            "{},{:.6},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            optional(m.val_loss),
            optional(m.val_acc),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(epoch: usize, val_loss: Option<f64>) -> EpochMetrics {
        EpochMetrics { epoch, train_loss: 0.5, train_acc: 0.75, val_loss, val_acc: val_loss.map(|_| 0.5) }
    }

    #[test]
    fn test_is_improvement_prefers_validation_loss() {
        assert!(metrics(1, Some(0.3)).is_improvement(0.4));
        assert!(!metrics(1, Some(0.6)).is_improvement(0.55));
        // no validation: training loss 0.5 is compared
        assert!(metrics(1, None).is_improvement(0.55));
    }

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        logger.log(&metrics(1, Some(0.25))).unwrap();
        logger.log(&metrics(2, None)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,0.500000,0.750000,0.250000,0.500000");
        assert_eq!(lines[2], "2,0.500000,0.750000,,");
    }
}
