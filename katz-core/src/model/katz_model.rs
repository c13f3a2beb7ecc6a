use super::discount::GoodTuringDiscount;
use super::ngram_counts::NGramCounts;
use super::settings::TrainingSettings;
use super::trie::{NGramTrie, NodeId};
use super::vocabulary::{TokenId, Vocabulary};
use super::window::TokenWindow;
use crate::error::KatzError;
use crate::io::{read_encoded, write_encoded};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Katz back-off language model with Simple Good-Turing discounting.
///
/// A `KatzModel` is the frozen form of [`NGramCounts`]: finalization fits
/// one discount per depth, then computes a back-off weight for every node.
/// All queries take `&self`, so a model can be shared between threads.
///
/// # Probabilities
/// For a seen n-gram `g` the conditional probability is the discounted
/// count over the count of its prefix, `p*(g) = c*(g) / c(g[..n-1])`. The
/// mass a context leaves unallocated, `beta`, is handed to the shorter
/// context through `alpha`, scaled so the mass already given to the
/// continuations seen at the longer context is not reserved twice.
///
/// # Invariants
/// - `discounts[d - 1]` is the discount of every node at depth `d`
/// - `log_alphas` is indexed by `NodeId` and holds 0 for the root and for
///   nodes without children
/// - every non-root node has a positive count
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct KatzModel {
	order: usize,
	vocabulary: Vocabulary,
	trie: NGramTrie,
	discounts: Vec<GoodTuringDiscount>,
	log_alphas: Vec<f64>,
	/// `ln beta(root)`, the mass reserved for unknown tokens.
	log_beta_root: f64,
}

impl KatzModel {
	/// Freezes counts into a queryable model.
	///
	/// Runs the discount pass over every depth, then the alpha pass over
	/// every node. Counts cannot be added afterwards.
	///
	/// # Errors
	/// - `InsufficientData` if a depth has fewer than two distinct counts
	/// - `DegenerateCount` if a node was never counted
	/// - `NonPositiveMass` if a leftover mass is not positive
	/// - `MissingBackoff` if a back-off n-gram is absent
	pub fn finalize(counts: NGramCounts) -> Result<Self, KatzError> {
		let (order, vocabulary, trie) = counts.into_parts();

		let mut discounts = Vec::with_capacity(order);
		for depth in 1..=order {
			let discount = GoodTuringDiscount::estimate(&trie, depth)?;
			debug!(
				"depth {}: slope {:.4}, intercept {:.4}, smoothed N_1 {:.2}",
				depth,
				discount.slope(),
				discount.intercept(),
				discount.smoothed_frequency(1)
			);
			discounts.push(discount);
		}

		let mut model = Self {
			order,
			vocabulary,
			trie,
			discounts,
			log_alphas: Vec::new(),
			log_beta_root: 0.0,
		};
		model.check_counts()?;

		let root = model.trie.root();
		let beta_root = model.node_beta(root);
		if beta_root <= 0.0 {
			return Err(KatzError::NonPositiveMass { ngram: Vec::new(), mass: beta_root });
		}
		model.log_beta_root = beta_root.ln();
		model.log_alphas = model.compute_log_alphas()?;

		info!(
			"finalized order-{} model: {} vocabulary entries, {} trie nodes",
			model.order,
			model.vocabulary.len(),
			model.trie.len()
		);
		Ok(model)
	}

	/// Counts a single document and finalizes the result.
	pub fn train<I, S>(order: usize, tokens: I) -> Result<Self, KatzError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut counts = NGramCounts::new(order)?;
		counts.add_document(tokens);
		Self::finalize(counts)
	}

	/// Counts documents on all cores and finalizes the merged counts.
	pub fn train_parallel<S>(settings: &TrainingSettings, documents: &[Vec<S>]) -> Result<Self, KatzError>
	where
		S: AsRef<str> + Sync,
	{
		Self::finalize(NGramCounts::from_documents_parallel(settings, documents)?)
	}

	fn check_counts(&self) -> Result<(), KatzError> {
		match self.trie.node_ids().skip(1).find(|node| self.trie.count(*node) == 0) {
			Some(node) => Err(KatzError::DegenerateCount { ngram: self.strings(&self.trie.ngram(node)) }),
			None => Ok(()),
		}
	}

	/// Back-off weights of every node, walking the trie with an explicit stack.
	fn compute_log_alphas(&self) -> Result<Vec<f64>, KatzError> {
		let mut log_alphas = vec![0.0; self.trie.len()];
		let mut stack: Vec<NodeId> = self.trie.children(self.trie.root()).map(|(_, child)| child).collect();
		while let Some(node) = stack.pop() {
			log_alphas[node.index()] = self.log_alpha_for(node)?;
			stack.extend(self.trie.children(node).map(|(_, child)| child));
		}
		Ok(log_alphas)
	}

	/// `ln beta(v) - ln(1 - Σ p*(u + w))` over the continuations `w` of `v`,
	/// where `u` is `v`'s n-gram without its first token.
	fn log_alpha_for(&self, node: NodeId) -> Result<f64, KatzError> {
		if !self.trie.has_children(node) {
			return Ok(0.0);
		}
		let context = self.trie.ngram(node);
		let beta = self.node_beta(node);
		if beta <= 0.0 {
			return Err(KatzError::NonPositiveMass { ngram: self.strings(&context), mass: beta });
		}

		let shorter = &context[1..];
		let backoff = self
			.trie
			.find_node(shorter)
			.ok_or_else(|| KatzError::MissingBackoff { ngram: self.strings(shorter) })?;
		let mut reserved = 0.0;
		for (token, _) in self.trie.children(node) {
			let continuation = self.trie.child(backoff, token).ok_or_else(|| {
				let mut ngram = shorter.to_vec();
				ngram.push(token);
				KatzError::MissingBackoff { ngram: self.strings(&ngram) }
			})?;
			reserved += self.node_p_star(continuation);
		}
		let denominator = 1.0 - reserved;
		if denominator <= 0.0 {
			return Err(KatzError::NonPositiveMass { ngram: self.strings(shorter), mass: denominator });
		}
		Ok(beta.ln() - denominator.ln())
	}

	/// Natural-log Katz probability of the last token of `ngram` given the
	/// tokens before it.
	///
	/// # Errors
	/// `InvalidNGram` if `ngram` is empty or longer than the model order.
	pub fn log_p_katz<S: AsRef<str>>(&self, ngram: &[S]) -> Result<f64, KatzError> {
		self.check_len(ngram.len())?;
		Ok(self.log_p_ids(&self.lookup(ngram)))
	}

	/// Recursive back-off over interned tokens; `None` marks a token the
	/// model has never seen. `ngram` must be non-empty.
	pub(crate) fn log_p_ids(&self, ngram: &[Option<TokenId>]) -> f64 {
		let root = self.trie.root();
		let known = ngram
			.last()
			.copied()
			.flatten()
			.and_then(|token| self.trie.child(root, token))
			.is_some();
		if !known {
			return self.log_beta_root;
		}
		if let Some(node) = self.find(ngram) {
			return self.discounted(node).ln() - self.parent_count(node).ln();
		}
		let suffix = &ngram[1..];
		match self.find(&ngram[..ngram.len() - 1]) {
			Some(prefix) => self.log_alphas[prefix.index()] + self.log_p_ids(suffix),
			// nothing was reserved for an unseen context, so nothing is redistributed
			None => self.log_p_ids(suffix),
		}
	}

	/// Perplexity of a token stream, `exp(-Σ ln p / tokens)`.
	///
	/// The stream is scored as one document: it starts after `order - 1`
	/// start markers and every real token is predicted once.
	///
	/// # Errors
	/// `EmptyEvaluation` if the stream has no tokens.
	pub fn perplexity<I, S>(&self, tokens: I) -> Result<f64, KatzError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut window = TokenWindow::seeded(self.order, Some(TokenId::START));
		let mut log_sum = 0.0;
		let mut count = 0u64;
		for token in tokens {
			window.add(self.vocabulary.get(token.as_ref()));
			log_sum += self.log_p_ids(window.snapshot());
			count += 1;
		}
		if count == 0 {
			return Err(KatzError::EmptyEvaluation);
		}
		let perplexity = (-log_sum / count as f64).exp();
		debug!("perplexity {:.4} over {} tokens", perplexity, count);
		Ok(perplexity)
	}

	/// Log-probability of every possible next token after `context`, start
	/// marker excluded, in vocabulary order.
	///
	/// # Errors
	/// `InvalidNGram` if `context` has `order` tokens or more.
	pub fn next_token_distribution<S: AsRef<str>>(&self, context: &[S]) -> Result<Vec<(&str, f64)>, KatzError> {
		self.check_len(context.len() + 1)?;
		let context = self.lookup(context);
		Ok(self
			.next_token_log_probs(&context)
			.into_iter()
			.map(|(token, log_p)| (self.vocabulary.token(token), log_p))
			.collect())
	}

	pub(crate) fn next_token_log_probs(&self, context: &[Option<TokenId>]) -> Vec<(TokenId, f64)> {
		let mut ngram = context.to_vec();
		ngram.push(None);
		let last = ngram.len() - 1;
		self.vocabulary
			.ids()
			.filter(|token| *token != TokenId::START)
			.map(|token| {
				ngram[last] = Some(token);
				(token, self.log_p_ids(&ngram))
			})
			.collect()
	}

	/// Discounted conditional probability `p*` of a seen n-gram.
	pub fn p_star<S: AsRef<str>>(&self, ngram: &[S]) -> Option<f64> {
		self.find_seen(ngram).map(|node| self.node_p_star(node))
	}

	/// Leftover mass of a seen context; the empty context is the root.
	pub fn beta<S: AsRef<str>>(&self, context: &[S]) -> Option<f64> {
		self.find(&self.lookup(context)).map(|node| self.node_beta(node))
	}

	/// Back-off weight of a seen context.
	pub fn log_alpha<S: AsRef<str>>(&self, context: &[S]) -> Option<f64> {
		self.find_seen(context).map(|node| self.node_log_alpha(node))
	}

	/// Good-Turing discounted count `c*` of a seen n-gram.
	pub fn discounted_count<S: AsRef<str>>(&self, ngram: &[S]) -> Option<f64> {
		self.find_seen(ngram).map(|node| self.discounted(node))
	}

	pub fn node_p_star(&self, node: NodeId) -> f64 {
		self.discounted(node) / self.parent_count(node)
	}

	/// `1 - Σ p*` over the children of `node`.
	pub fn node_beta(&self, node: NodeId) -> f64 {
		1.0 - self
			.trie
			.children(node)
			.map(|(_, child)| self.node_p_star(child))
			.sum::<f64>()
	}

	pub fn node_log_alpha(&self, node: NodeId) -> f64 {
		self.log_alphas[node.index()]
	}

	/// Discount shared by every node of `depth` (1-based).
	pub fn discount(&self, depth: usize) -> Option<&GoodTuringDiscount> {
		depth.checked_sub(1).and_then(|index| self.discounts.get(index))
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

	/// Writes the model in its compact binary form.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), KatzError> {
		write_encoded(path, self)
	}

	/// Reads a model written by [`KatzModel::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KatzError> {
		read_encoded(path)
	}

	fn discounted(&self, node: NodeId) -> f64 {
		self.discounts[self.trie.depth(node) - 1].discounted_count(self.trie.count(node))
	}

	fn parent_count(&self, node: NodeId) -> f64 {
		self.trie.parent(node).map_or(0, |parent| self.trie.count(parent)) as f64
	}

	fn check_len(&self, len: usize) -> Result<(), KatzError> {
		if len == 0 || len > self.order {
			return Err(KatzError::InvalidNGram { len, order: self.order });
		}
		Ok(())
	}

	fn lookup<S: AsRef<str>>(&self, ngram: &[S]) -> Vec<Option<TokenId>> {
		ngram.iter().map(|token| self.vocabulary.get(token.as_ref())).collect()
	}

	fn find(&self, ngram: &[Option<TokenId>]) -> Option<NodeId> {
		ngram
			.iter()
			.try_fold(self.trie.root(), |node, token| self.trie.child(node, (*token)?))
	}

	/// Like `find`, but never returns the root.
	fn find_seen<S: AsRef<str>>(&self, ngram: &[S]) -> Option<NodeId> {
		if ngram.is_empty() {
			return None;
		}
		self.find(&self.lookup(ngram))
	}

	pub(crate) fn strings(&self, ngram: &[TokenId]) -> Vec<String> {
		ngram.iter().map(|token| self.vocabulary.token(*token).to_owned()).collect()
	}
}
