use super::settings::{TrainingSettings, validate_order};
use super::trie::NGramTrie;
use super::vocabulary::{TokenId, Vocabulary};
use super::window::TokenWindow;
use crate::error::KatzError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread;

/// Raw n-gram counts of orders `1..=N`, the mutable training-phase state.
///
/// # Responsibilities
/// - Turn token streams into sliding windows and count them in the trie
/// - Merge with counts built independently (e.g. on another thread)
///
/// # Invariants
/// - Every document is preceded by `order - 1` start markers, so the root
///   count is `Σ (tokens + order - 1)` over non-empty documents
/// - Every suffix of a counted n-gram is itself counted
///
/// The root therefore counts window positions, not tokens: the same 29-token
/// document gives a root count of 29 at order 1 and 31 at order 3, and the
/// unigram `p*` of a finalized model depends on the order accordingly.
///
/// Counts cannot be queried for probabilities; finalize them into a
/// [`KatzModel`](super::katz_model::KatzModel) first.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramCounts {
	order: usize,
	vocabulary: Vocabulary,
	trie: NGramTrie,
	/// Real tokens ingested, start markers excluded.
	tokens: u64,
	documents: u64,
}

impl NGramCounts {
	/// Creates empty counts for n-grams up to `order`.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `order` is 0 or above `MAX_ORDER`.
	pub fn new(order: usize) -> Result<Self, KatzError> {
		validate_order(order)?;
		Ok(Self {
			order,
			vocabulary: Vocabulary::new(),
			trie: NGramTrie::new(),
			tokens: 0,
			documents: 0,
		})
	}

	/// Counts one document.
	///
	/// The window is seeded by pushing `order - 1` start markers through it
	/// like ordinary tokens, so the marker-only prefixes `(<s>)`, `(<s>, <s>)`
	/// ... are counted too. Empty documents are ignored.
	pub fn add_document<I, S>(&mut self, tokens: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut tokens = tokens.into_iter().peekable();
		if tokens.peek().is_none() {
			return;
		}

		let mut window = TokenWindow::new(self.order);
		for _ in 1..self.order {
			window.add(TokenId::START);
			self.trie.populate(window.snapshot());
		}
		for token in tokens {
			window.add(self.vocabulary.intern(token.as_ref()));
			self.trie.populate(window.snapshot());
			self.tokens += 1;
		}
		self.documents += 1;
	}

	/// Builds counts from many documents on all CPU cores.
	///
	/// # Behavior
	/// - Splits documents into `num_cpus * chunk_factor` chunks.
	/// - Spawns one thread per chunk to build partial counts.
	/// - Merges the partial counts as they arrive.
	///
	/// The result holds the same counts as adding every document in turn;
	/// only the numbering of token ids may differ.
	pub fn from_documents_parallel<S>(settings: &TrainingSettings, documents: &[Vec<S>]) -> Result<Self, KatzError>
	where
		S: AsRef<str> + Sync,
	{
		let empty = Self::new(settings.order())?;
		if documents.is_empty() {
			return Ok(empty);
		}
		let chunks = num_cpus::get() * settings.chunk_factor.max(1);
		let chunk_size = documents.len().div_ceil(chunks);

		let mut counts = empty.clone();
		thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for chunk in documents.chunks(chunk_size) {
				let tx = tx.clone();
				let template = &empty;
				scope.spawn(move || {
					let mut partial = template.clone();
					for document in chunk {
						partial.add_document(document);
					}
					tx.send(partial).expect("Failed to send partial counts from thread");
				});
			}
			drop(tx);

			for partial in rx.iter() {
				debug!("merging partial counts of {} documents", partial.documents);
				counts.merge(&partial)?;
			}
			Ok::<(), KatzError>(())
		})?;

		info!(
			"counted {} documents ({} tokens) into {} trie nodes",
			counts.documents,
			counts.tokens,
			counts.trie.len()
		);
		Ok(counts)
	}

	/// Adds the counts of `other` into this one.
	///
	/// Merging is commutative and associative, so partial counts may be
	/// combined in any order before finalization.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the two orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), KatzError> {
		if self.order != other.order {
			return Err(KatzError::OrderMismatch { left: self.order, right: other.order });
		}
		let vocabulary = &mut self.vocabulary;
		self.trie
			.merge_from(&other.trie, |token| vocabulary.intern(other.vocabulary.token(token)));
		self.tokens += other.tokens;
		self.documents += other.documents;
		Ok(())
	}

	/// Raw count of an n-gram, 0 when it was never seen.
	pub fn count<S: AsRef<str>>(&self, ngram: &[S]) -> u64 {
		let ids: Option<Vec<TokenId>> = ngram.iter().map(|token| self.vocabulary.get(token.as_ref())).collect();
		ids.and_then(|ids| self.trie.find_node(&ids))
			.map_or(0, |node| self.trie.count(node))
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn trie(&self) -> &NGramTrie {
		&self.trie
	}

	/// Real tokens ingested, start markers excluded.
	pub fn token_count(&self) -> u64 {
		self.tokens
	}

	/// Non-empty documents ingested.
	pub fn document_count(&self) -> u64 {
		self.documents
	}

	pub(crate) fn into_parts(self) -> (usize, Vocabulary, NGramTrie) {
		(self.order, self.vocabulary, self.trie)
	}
}
