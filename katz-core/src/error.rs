/// Errors raised while building, finalizing, querying or persisting a model.
///
/// Trie lookups never fail: a missing n-gram is reported as `None` and
/// drives back-off. Everything here aborts the current operation; the
/// computations are deterministic, so none of them is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum KatzError {
	/// Fewer than two distinct `(r, N_r)` points at a depth, so the
	/// log-log regression slope is undefined.
	#[error("insufficient data to fit a discount at depth {depth}: {distinct} distinct count(s)")]
	InsufficientData { depth: usize, distinct: usize },

	/// A node with a zero count was reached where a probability is required.
	#[error("zero count for n-gram {ngram:?}")]
	DegenerateCount { ngram: Vec<String> },

	/// A leftover mass (beta or alpha denominator) that is not strictly
	/// positive, so its logarithm is undefined.
	#[error("non-positive leftover mass {mass} at context {ngram:?}")]
	NonPositiveMass { ngram: Vec<String>, mass: f64 },

	/// The back-off context of a node is absent from the trie.
	#[error("missing back-off n-gram {ngram:?}")]
	MissingBackoff { ngram: Vec<String> },

	#[error("order must be between 1 and {max}, got {order}")]
	InvalidOrder { order: usize, max: usize },

	#[error("cannot merge counts of order {left} with counts of order {right}")]
	OrderMismatch { left: usize, right: usize },

	/// Queries take between one and `order` tokens.
	#[error("n-gram of length {len} is not valid for a model of order {order}")]
	InvalidNGram { len: usize, order: usize },

	#[error("cannot compute perplexity over an empty token stream")]
	EmptyEvaluation,

	#[error("invalid setting: {0}")]
	InvalidSetting(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("model encoding failed: {0}")]
	Encoding(#[from] postcard::Error),
}
