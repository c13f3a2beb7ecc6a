use crate::error::KatzError;
use serde::{Deserialize, Serialize};

/// Highest n-gram order a model may be trained with.
pub const MAX_ORDER: usize = 16;

/// Parameters of a training run.
///
/// # Invariants
/// - `1 <= order <= MAX_ORDER`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingSettings {
	/// Longest n-gram counted (N).
	order: usize,

	/// Number of chunks per CPU core when training in parallel.
	/// Values below 1 count as 1.
	pub chunk_factor: usize,
}

impl Default for TrainingSettings {
	fn default() -> Self {
		Self { order: 3, chunk_factor: 8 }
	}
}

impl TrainingSettings {
	/// Settings for a model of the given order with the default chunking.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `order` is 0 or above [`MAX_ORDER`].
	pub fn new(order: usize) -> Result<Self, KatzError> {
		let mut settings = Self::default();
		settings.set_order(order)?;
		Ok(settings)
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn set_order(&mut self, order: usize) -> Result<(), KatzError> {
		validate_order(order)?;
		self.order = order;
		Ok(())
	}
}

pub(crate) fn validate_order(order: usize) -> Result<(), KatzError> {
	if order == 0 || order > MAX_ORDER {
		return Err(KatzError::InvalidOrder { order, max: MAX_ORDER });
	}
	Ok(())
}

/// How a generated sequence begins.
///
/// # Variants
/// - `Random`: the first token is drawn from the unigram distribution.
/// - `Custom(tokens)`: the given prompt is the context and is kept in the output.
/// - `False`: generation starts right after the start markers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StartSeed {
	Random,
	Custom(Vec<String>),
	False,
}

/// Parameters of a generation run.
///
/// # Invariants
/// - `randomness` is within `[0.0, 1.0]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerationSettings {
	/// Number of tokens to generate after the seed.
	pub max_tokens: usize,

	/// Probability of sampling each step instead of taking the most likely
	/// token (0.0 = greedy, 1.0 = always sample).
	randomness: f32,

	pub start_seed: StartSeed,
}

impl Default for GenerationSettings {
	fn default() -> Self {
		Self { max_tokens: 20, randomness: 1.0, start_seed: StartSeed::False }
	}
}

impl GenerationSettings {
	pub fn randomness(&self) -> f32 {
		self.randomness
	}

	/// Sets the randomness factor.
	///
	/// # Errors
	/// Returns an error if the value is outside `[0.0, 1.0]`.
	pub fn set_randomness(&mut self, randomness: f32) -> Result<(), KatzError> {
		validate_randomness(randomness)?;
		self.randomness = randomness;
		Ok(())
	}
}

pub(crate) fn validate_randomness(randomness: f32) -> Result<(), KatzError> {
	if !(0.0..=1.0).contains(&randomness) {
		return Err(KatzError::InvalidSetting(format!(
			"randomness must be between 0.0 and 1.0, got {}",
			randomness
		)));
	}
	Ok(())
}
