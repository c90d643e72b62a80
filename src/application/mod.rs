// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-facing goal per command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1); results are returned
//   - File formats are the data layer's business, except the
//     small output files a command itself produces
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Train a classifier on a labelled file
pub mod train_use_case;

/// Label an unlabelled file with a trained classifier
pub mod predict_use_case;

/// Score a trained classifier on a labelled file
pub mod evaluate_use_case;

/// Score a predictions file against a reference file
pub mod score_use_case;
