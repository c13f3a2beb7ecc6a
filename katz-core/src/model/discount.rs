use super::trie::NGramTrie;
use crate::error::KatzError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `frequency` distinct n-grams occurred exactly `count` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountFrequency {
	pub count: u64,
	pub frequency: u64,
}

/// Builds the count-frequency table `(r, N_r)` of one trie depth, sorted by `r`.
///
/// Start-marker-only n-grams are bookkeeping, not language events, and are
/// left out. So are nodes that were created for traversal but never counted.
pub fn count_frequencies(trie: &NGramTrie, depth: usize) -> Vec<CountFrequency> {
	let mut table: BTreeMap<u64, u64> = BTreeMap::new();
	for node in trie.nodes_at_depth(depth) {
		let count = trie.count(node);
		if count == 0 || trie.is_start_only(node) {
			continue;
		}
		*table.entry(count).or_insert(0) += 1;
	}
	table
		.into_iter()
		.map(|(count, frequency)| CountFrequency { count, frequency })
		.collect()
}

/// Simple Good-Turing discount for one n-gram order.
///
/// The count-frequency table is smoothed by the line
/// `ln N_r = intercept + slope * ln r`, fitted by ordinary least squares.
/// Substituting the line into the Good-Turing estimate
/// `c*(r) = (r + 1) N_{r+1} / N_r` gives `c*(r) = r (1 + 1/r)^(slope + 1)`,
/// which stays well behaved where the raw `N_r` are sparse.
///
/// With the usual Zipfian slope (below -1) every count is discounted,
/// `c*(r) < r`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GoodTuringDiscount {
	slope: f64,
	intercept: f64,
}

impl GoodTuringDiscount {
	/// Fits the discount of `depth` from its count-frequency table.
	///
	/// # Errors
	/// `InsufficientData` when the table has fewer than two distinct counts,
	/// since the slope is then undefined.
	pub fn fit(depth: usize, table: &[CountFrequency]) -> Result<Self, KatzError> {
		let points: Vec<(f64, f64)> = table
			.iter()
			.filter(|entry| entry.count > 0 && entry.frequency > 0)
			.map(|entry| ((entry.count as f64).ln(), (entry.frequency as f64).ln()))
			.collect();
		let mut distinct: Vec<u64> = table
			.iter()
			.filter(|entry| entry.count > 0 && entry.frequency > 0)
			.map(|entry| entry.count)
			.collect();
		distinct.sort_unstable();
		distinct.dedup();
		if distinct.len() < 2 {
			return Err(KatzError::InsufficientData { depth, distinct: distinct.len() });
		}

		let n = points.len() as f64;
		let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
		let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
		let covariance: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
		let variance: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();

		let slope = covariance / variance;
		let intercept = mean_y - slope * mean_x;
		Ok(Self { slope, intercept })
	}

	/// Collects the count-frequency table of `depth` and fits it.
	pub fn estimate(trie: &NGramTrie, depth: usize) -> Result<Self, KatzError> {
		Self::fit(depth, &count_frequencies(trie, depth))
	}

	pub fn slope(&self) -> f64 {
		self.slope
	}

	pub fn intercept(&self) -> f64 {
		self.intercept
	}

	/// Discounted count `c*(r)`.
	pub fn discounted_count(&self, count: u64) -> f64 {
		let r = count as f64;
		r * (1.0 + 1.0 / r).powf(self.slope + 1.0)
	}

	/// Smoothed `N_r` read off the fitted line.
	pub fn smoothed_frequency(&self, count: u64) -> f64 {
		(self.intercept + self.slope * (count as f64).ln()).exp()
	}
}
