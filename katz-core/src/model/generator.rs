use super::katz_model::KatzModel;
use super::settings::{GenerationSettings, StartSeed, validate_randomness};
use super::vocabulary::TokenId;
use crate::error::KatzError;
use rand::Rng;

/// Produces token sequences from a finalized model.
///
/// # Behavior
/// - Starts from the start markers, a custom prompt, or a random first token
///   according to `GenerationSettings::start_seed`.
/// - At each step scores every vocabulary token after the last `order - 1`
///   tokens, then either samples proportionally to the Katz probabilities
///   (with probability `randomness`) or takes the most likely token.
/// - Stops after `max_tokens` generated tokens.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
	model: &'a KatzModel,
}

impl<'a> Generator<'a> {
	pub fn new(model: &'a KatzModel) -> Self {
		Self { model }
	}

	/// Generates a sequence with the given random source.
	///
	/// A custom prompt is returned as the start of the sequence. Prompt
	/// tokens the model never saw are kept and simply back off to the
	/// unknown-token mass.
	///
	/// # Errors
	/// Returns an error if `settings.randomness()` is outside `[0.0, 1.0]`.
	pub fn generate<R: Rng>(&self, settings: &GenerationSettings, rng: &mut R) -> Result<Vec<String>, KatzError> {
		let randomness = settings.randomness();
		validate_randomness(randomness)?;
		let vocabulary = self.model.vocabulary();
		let context_len = self.model.order() - 1;

		let mut history: Vec<Option<TokenId>> = vec![Some(TokenId::START); context_len];
		let mut sequence: Vec<String> = Vec::new();
		match &settings.start_seed {
			StartSeed::False => (),
			StartSeed::Custom(prompt) => {
				for token in prompt {
					history.push(vocabulary.get(token));
					sequence.push(token.clone());
				}
			}
			StartSeed::Random => {
				let unigrams = self.model.next_token_log_probs(&[]);
				if let Some(first) = Self::sample(&unigrams, rng) {
					history.push(Some(first));
					sequence.push(vocabulary.token(first).to_owned());
				}
			}
		}

		for _ in 0..settings.max_tokens {
			let context = &history[history.len() - context_len..];
			let candidates = self.model.next_token_log_probs(context);
			let next = if rng.random_bool(f64::from(randomness)) {
				Self::sample(&candidates, rng)
			} else {
				Self::most_likely(&candidates)
			};
			match next {
				Some(token) => {
					history.push(Some(token));
					sequence.push(vocabulary.token(token).to_owned());
				}
				None => break,
			}
		}
		Ok(sequence)
	}

	/// Generates with the thread-local random source and joins the tokens
	/// with spaces.
	pub fn generate_text(&self, settings: &GenerationSettings) -> Result<String, KatzError> {
		Ok(self.generate(settings, &mut rand::rng())?.join(" "))
	}

	/// Weighted draw by cumulative subtraction over `exp(log_p)`.
	///
	/// Returns `None` if there is nothing to draw from.
	fn sample<R: Rng>(candidates: &[(TokenId, f64)], rng: &mut R) -> Option<TokenId> {
		let total: f64 = candidates.iter().map(|(_, log_p)| log_p.exp()).sum();
		if !(total > 0.0) {
			return None;
		}

		let mut r = rng.random_range(0.0..total);
		let mut fallback = None;
		for (token, log_p) in candidates {
			let weight = log_p.exp();
			if r < weight {
				return Some(*token);
			}
			r -= weight;
			fallback = Some(*token);
		}
		// rounding can leave a sliver past the last bucket
		fallback
	}

	/// Arg-max; the earliest candidate wins ties.
	fn most_likely(candidates: &[(TokenId, f64)]) -> Option<TokenId> {
		let mut best: Option<(TokenId, f64)> = None;
		for (token, log_p) in candidates {
			if best.is_none_or(|(_, best_log_p)| *log_p > best_log_p) {
				best = Some((*token, *log_p));
			}
		}
		best.map(|(token, _)| token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	const RHYME: &str = "humpty dumpty sat on a wall humpty dumpty had a great fall \
		all the king 's horses and all the king 's men could not put dumpty together again";

	fn model() -> KatzModel {
		KatzModel::train(3, RHYME.split_whitespace()).unwrap()
	}

	fn greedy(start_seed: StartSeed) -> GenerationSettings {
		let mut settings = GenerationSettings::default();
		settings.max_tokens = 6;
		settings.start_seed = start_seed;
		settings.set_randomness(0.0).unwrap();
		settings
	}

	#[test]
	fn greedy_generation_is_deterministic() {
		let model = model();
		let generator = Generator::new(&model);
		let settings = greedy(StartSeed::False);
		let first = generator.generate(&settings, &mut StdRng::seed_from_u64(1)).unwrap();
		let second = generator.generate(&settings, &mut StdRng::seed_from_u64(2)).unwrap();
		assert_eq!(first.len(), 6);
		assert_eq!(first, second);
		// "humpty" is the only word ever seen after two start markers
		assert_eq!(first[0], "humpty");
	}

	#[test]
	fn sampling_is_reproducible_with_a_seeded_rng() {
		let model = model();
		let generator = Generator::new(&model);
		let mut settings = GenerationSettings::default();
		settings.max_tokens = 10;
		let first = generator.generate(&settings, &mut StdRng::seed_from_u64(42)).unwrap();
		let second = generator.generate(&settings, &mut StdRng::seed_from_u64(42)).unwrap();
		assert_eq!(first, second);
		assert_eq!(first.len(), 10);
		for token in &first {
			assert!(model.vocabulary().get(token).is_some());
			assert_ne!(token, "<s>");
		}
	}

	#[test]
	fn custom_prompt_is_kept() {
		let model = model();
		let generator = Generator::new(&model);
		let prompt = vec!["all".to_owned(), "the".to_owned()];
		let settings = greedy(StartSeed::Custom(prompt));
		let sequence = generator.generate(&settings, &mut StdRng::seed_from_u64(3)).unwrap();
		assert_eq!(sequence.len(), 8);
		assert_eq!(&sequence[..3], &["all", "the", "king"]);
	}

	#[test]
	fn random_start_draws_a_known_token() {
		let model = model();
		let generator = Generator::new(&model);
		let mut settings = GenerationSettings::default();
		settings.max_tokens = 0;
		settings.start_seed = StartSeed::Random;
		let sequence = generator.generate(&settings, &mut StdRng::seed_from_u64(9)).unwrap();
		assert_eq!(sequence.len(), 1);
		assert!(model.vocabulary().get(&sequence[0]).is_some());
	}
}
