// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// ml and infra layers together for one CLI command.
//
//   run      — the untrained walkthrough pass (prints batches)
//   train    — full training run into a serialization dir
//   predict  — classify text with a trained archive
//
// params.rs holds the JSON component params every use case
// starts from.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// JSON params that select and configure components
pub mod params;

/// One pass printing batches and model outputs
pub mod run_use_case;

/// The training workflow
pub mod train_use_case;

/// The prediction workflow
pub mod predict_use_case;
