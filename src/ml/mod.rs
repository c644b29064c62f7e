// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model, training and inference code built on Burn:
//
//   backend.rs   — NdArray by default, Wgpu behind a feature;
//                  TrainBackend adds Autodiff on top
//
//   model.rs     — SimpleClassifier:
//                  • token embedding     [batch, seq, dim]
//                  • bag-of-embeddings   [batch, dim]  (masked sum/mean)
//                  • linear layer        [batch, num_labels]
//                  • softmax probs + cross-entropy loss
//
//   trainer.rs   — epoch loop: forward, backward, optimiser
//                  step, validation, metrics, checkpoints
//
//   predictor.rs — loads an archive and classifies raw text
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Backend type aliases and default device
pub mod backend;

/// Embedder, bag-of-embeddings encoder and classifier
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference from a trained archive
pub mod predictor;
