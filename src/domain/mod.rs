// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Pure Rust types that define what the system talks about:
// proficiency levels, labelled sentences, and the ordinal
// accuracy evaluator that scores predictions against truth.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, traits and pure functions
//
// Because everything here is pure, the evaluator can be called
// from any thread, any number of times, without coordination.
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// The six CEFR levels and their three coarse groups
pub mod level;

// A sentence, optionally labelled with its level
pub mod sentence;

// Exact / coarse / fuzzy accuracy over aligned label sequences
pub mod evaluation;

// Typed errors raised by the evaluator and label parsing
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
