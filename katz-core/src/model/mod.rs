//! Top-level module for the Katz back-off language model.
//!
//! This module provides, leaves first:
//! - A fixed-capacity token window (`TokenWindow`)
//! - Token interning (`Vocabulary`)
//! - The arena count trie (`NGramTrie`)
//! - Training-phase counts with merge and parallel build (`NGramCounts`)
//! - Simple Good-Turing discounting (`GoodTuringDiscount`)
//! - The finalized model and its queries (`KatzModel`)
//! - Sequence generation and bag ordering on top of a model

/// Fixed-capacity circular window yielding ordered n-grams.
pub mod window;

/// Token string ↔ `TokenId` interning, with the reserved start marker.
pub mod vocabulary;

/// Arena-backed n-gram count trie.
///
/// Populated with every suffix of each window so all orders carry
/// complete counts.
pub mod trie;

/// Mutable n-gram counts: document ingestion, merging and
/// multi-threaded construction.
pub mod ngram_counts;

/// Count-frequency tables and the Good-Turing discount fitted to them.
pub mod discount;

/// Finalized Katz back-off model.
///
/// Holds per-depth discounts and per-node back-off weights, answers
/// log-probability and perplexity queries, and persists itself.
pub mod katz_model;

/// Training and generation parameters.
pub mod settings;

/// Token sequence generation from a finalized model.
pub mod generator;

/// Most likely ordering of an unordered bag of words.
pub mod bag;

pub use discount::{CountFrequency, GoodTuringDiscount};
pub use generator::Generator;
pub use katz_model::KatzModel;
pub use ngram_counts::NGramCounts;
pub use settings::{GenerationSettings, MAX_ORDER, StartSeed, TrainingSettings};
pub use trie::{NGramTrie, NodeId};
pub use vocabulary::{START_MARKER, TokenId, Vocabulary};
pub use window::TokenWindow;
