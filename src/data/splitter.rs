// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to pick the best epoch and to report
//                     exact / coarse / fuzzy accuracy
//
// Why shuffle before splitting?
//   Level datasets are often sorted by level or by source text.
//   Without shuffling, the validation set could be all C2.
//
// Why a seed?
//   Re-running training with the same seed must produce the same
//   split, otherwise accuracies from two runs are not comparable.
//   StdRng::seed_from_u64 gives a reproducible Fisher-Yates shuffle.
//
// Reference: rand crate documentation (SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// `train_fraction` is clamped to [0, 1].
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_at = ((total as f64) * fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation (seed {})",
        samples.len(),
        val.len(),
        seed,
    );

    (samples, val)
}
