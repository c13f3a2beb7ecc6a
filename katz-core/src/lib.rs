//! Katz back-off n-gram language modelling.
//!
//! This crate estimates the probability of word sequences from a training
//! corpus, including:
//! - N-gram counting of orders 1..N in a trie, sequentially or in parallel
//! - Simple Good-Turing discounting fitted per order
//! - Katz back-off probabilities and perplexity for arbitrary n-grams
//! - Sequence generation and bag-of-words ordering
//! - Compact binary persistence of trained models
//!
//! Tokenization is left to the caller: every entry point takes already
//! normalized tokens.

/// Counting, discounting, back-off and everything built on the model.
pub mod model;

/// Error type shared by the whole crate.
pub mod error;

/// Path helpers and binary encoding of models.
pub mod io;

pub use error::KatzError;
pub use model::{GenerationSettings, Generator, KatzModel, NGramCounts, StartSeed, TrainingSettings};
