use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token written before the first word of every document.
pub const START_MARKER: &str = "<s>";

/// Opaque identifier of an interned token.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub(crate) u32);

impl TokenId {
	/// Identifier of [`START_MARKER`], reserved in every vocabulary.
	pub const START: TokenId = TokenId(0);

	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// Bidirectional mapping between token strings and `TokenId`s.
///
/// # Invariants
/// - `TokenId::START` always maps to [`START_MARKER`]
/// - `ids[tokens[i]] == TokenId(i)` for every `i`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vocabulary {
	ids: HashMap<String, TokenId>,
	tokens: Vec<String>,
}

impl Default for Vocabulary {
	fn default() -> Self {
		Self::new()
	}
}

impl Vocabulary {
	pub fn new() -> Self {
		let mut vocabulary = Self { ids: HashMap::new(), tokens: Vec::new() };
		vocabulary.intern(START_MARKER);
		vocabulary
	}

	/// Returns the id of `token`, assigning the next free one if needed.
	pub fn intern(&mut self, token: &str) -> TokenId {
		if let Some(id) = self.ids.get(token) {
			return *id;
		}
		let id = TokenId(self.tokens.len() as u32);
		self.tokens.push(token.to_owned());
		self.ids.insert(token.to_owned(), id);
		id
	}

	/// Looks a token up without interning it.
	pub fn get(&self, token: &str) -> Option<TokenId> {
		self.ids.get(token).copied()
	}

	/// Returns the string of an id issued by this vocabulary.
	pub fn token(&self, id: TokenId) -> &str {
		&self.tokens[id.index()]
	}

	/// Number of distinct tokens, start marker included.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// A vocabulary always holds the start marker.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// All ids in issue order.
	pub fn ids(&self) -> impl Iterator<Item = TokenId> + '_ {
		(0..self.tokens.len()).map(|i| TokenId(i as u32))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn start_marker_is_reserved() {
		let vocabulary = Vocabulary::new();
		assert_eq!(vocabulary.get(START_MARKER), Some(TokenId::START));
		assert_eq!(vocabulary.token(TokenId::START), START_MARKER);
		assert_eq!(vocabulary.len(), 1);
	}

	#[test]
	fn interning_is_idempotent() {
		let mut vocabulary = Vocabulary::new();
		let humpty = vocabulary.intern("humpty");
		let dumpty = vocabulary.intern("dumpty");
		assert_ne!(humpty, dumpty);
		assert_eq!(vocabulary.intern("humpty"), humpty);
		assert_eq!(vocabulary.token(dumpty), "dumpty");
		assert_eq!(vocabulary.get("wall"), None);
		assert_eq!(vocabulary.ids().count(), 3);
	}
}
