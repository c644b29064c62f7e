// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used by `train` when the experiment has no separate
// validation file: the training instances are shuffled with a
// seeded StdRng and the tail is held out for validation.
//
//   validation_split = 0.2 → 80% train, 20% validation
//
// The same seed always produces the same split, so two runs of
// one experiment config are evaluated on the same sentences.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `items` and split them into (train, validation).
/// `train_fraction` is clamped so the split index stays in range.
pub fn split_train_val<T>(mut items: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let total    = items.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let held_out = items.split_off(split_at.min(total));

    tracing::debug!(
        "Split {} instances: {} train, {} validation",
        total,
        items.len(),
        held_out.len(),
    );

    (items, held_out)
}
