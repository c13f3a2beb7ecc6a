use super::vocabulary::TokenId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Handle of a node inside an [`NGramTrie`] arena.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
	pub const ROOT: NodeId = NodeId(0);

	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// One n-gram: the path of tokens from the root down to this node.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct TrieNode {
	/// Last token of the n-gram (meaningless for the root).
	token: TokenId,
	/// Length of the n-gram.
	depth: usize,
	/// Occurrences of this exact n-gram.
	count: u64,
	/// Node of the n-gram one token shorter at the end. `None` only for the root.
	parent: Option<NodeId>,
	children: HashMap<TokenId, NodeId>,
}

/// Count trie over n-grams of orders `1..=N`, stored as an arena.
///
/// Nodes are never removed, so a `NodeId` stays valid for the lifetime of
/// the trie. Parents are plain handles, which keeps the structure free of
/// ownership cycles and cheap to serialize.
///
/// # Invariants
/// - `nodes[0]` is the root, with depth 0
/// - a child's depth is its parent's depth plus one
/// - the root's count is the number of `populate` calls (plus merged roots)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramTrie {
	nodes: Vec<TrieNode>,
}

impl Default for NGramTrie {
	fn default() -> Self {
		Self::new()
	}
}

impl NGramTrie {
	pub fn new() -> Self {
		let root = TrieNode {
			token: TokenId::START,
			depth: 0,
			count: 0,
			parent: None,
			children: HashMap::new(),
		};
		Self { nodes: vec![root] }
	}

	pub fn root(&self) -> NodeId {
		NodeId::ROOT
	}

	/// Records one occurrence of `ngram` and of each of its trailing suffixes.
	///
	/// For `(a, b, c)` the counts of `(c)`, `(b, c)` and `(a, b, c)` are each
	/// incremented once; intermediate nodes such as `(a)` or `(a, b)` are
	/// created when missing but not counted. The root is counted once.
	pub fn populate(&mut self, ngram: &[TokenId]) {
		if ngram.is_empty() {
			return;
		}
		self.nodes[NodeId::ROOT.index()].count += 1;
		for start in (0..ngram.len()).rev() {
			let node = self.insert_path(&ngram[start..]);
			self.nodes[node.index()].count += 1;
		}
	}

	/// Walks `ngram` from the root, creating missing nodes with a zero count.
	fn insert_path(&mut self, ngram: &[TokenId]) -> NodeId {
		ngram.iter().fold(NodeId::ROOT, |node, token| self.child_or_insert(node, *token))
	}

	fn child_or_insert(&mut self, node: NodeId, token: TokenId) -> NodeId {
		if let Some(child) = self.child(node, token) {
			return child;
		}
		let child = NodeId(self.nodes.len() as u32);
		let depth = self.nodes[node.index()].depth + 1;
		self.nodes.push(TrieNode {
			token,
			depth,
			count: 0,
			parent: Some(node),
			children: HashMap::new(),
		});
		self.nodes[node.index()].children.insert(token, child);
		child
	}

	/// Follows a single edge.
	pub fn child(&self, node: NodeId, token: TokenId) -> Option<NodeId> {
		self.nodes[node.index()].children.get(&token).copied()
	}

	/// Returns the node reached by `ngram` from the root, or `None` as soon
	/// as an edge is missing. The empty n-gram is the root.
	pub fn find_node(&self, ngram: &[TokenId]) -> Option<NodeId> {
		ngram.iter().try_fold(NodeId::ROOT, |node, token| self.child(node, *token))
	}

	pub fn count(&self, node: NodeId) -> u64 {
		self.nodes[node.index()].count
	}

	pub fn depth(&self, node: NodeId) -> usize {
		self.nodes[node.index()].depth
	}

	pub fn token(&self, node: NodeId) -> TokenId {
		self.nodes[node.index()].token
	}

	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes[node.index()].parent
	}

	/// Outgoing edges of `node`, in no particular order.
	pub fn children(&self, node: NodeId) -> impl Iterator<Item = (TokenId, NodeId)> + '_ {
		self.nodes[node.index()].children.iter().map(|(token, child)| (*token, *child))
	}

	pub fn has_children(&self, node: NodeId) -> bool {
		!self.nodes[node.index()].children.is_empty()
	}

	/// Number of nodes, root included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// A trie always holds its root.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// Every node handle, root first.
	pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
		(0..self.nodes.len() as u32).map(NodeId)
	}

	/// Handles of all nodes of the given depth.
	pub fn nodes_at_depth(&self, depth: usize) -> impl Iterator<Item = NodeId> + '_ {
		self.node_ids().filter(move |node| self.depth(*node) == depth)
	}

	/// Reconstructs the n-gram of `node` by walking up to the root.
	pub fn ngram(&self, node: NodeId) -> Vec<TokenId> {
		let mut tokens = Vec::with_capacity(self.depth(node));
		let mut current = node;
		while let Some(parent) = self.parent(current) {
			tokens.push(self.token(current));
			current = parent;
		}
		tokens.reverse();
		tokens
	}

	/// True for non-root nodes made only of start markers, such as `(<s>, <s>)`.
	pub fn is_start_only(&self, node: NodeId) -> bool {
		let mut current = node;
		while let Some(parent) = self.parent(current) {
			if self.token(current) != TokenId::START {
				return false;
			}
			current = parent;
		}
		node != NodeId::ROOT
	}

	/// Adds every count of `other` into `self`, node by node along matching
	/// paths. `remap` translates `other`'s token ids into this trie's ids.
	pub fn merge_from<F>(&mut self, other: &NGramTrie, mut remap: F)
	where
		F: FnMut(TokenId) -> TokenId,
	{
		let mut stack = vec![(NodeId::ROOT, NodeId::ROOT)];
		while let Some((theirs, ours)) = stack.pop() {
			self.nodes[ours.index()].count += other.count(theirs);
			for (token, their_child) in other.children(theirs) {
				let our_child = self.child_or_insert(ours, remap(token));
				stack.push((their_child, our_child));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(raw: &[u32]) -> Vec<TokenId> {
		raw.iter().map(|id| TokenId(*id)).collect()
	}

	#[test]
	fn populate_counts_every_suffix() {
		let mut trie = NGramTrie::new();
		trie.populate(&ids(&[1, 2, 3]));

		assert_eq!(trie.count(trie.root()), 1);
		let full = trie.find_node(&ids(&[1, 2, 3])).unwrap();
		assert_eq!(trie.count(full), 1);
		assert_eq!(trie.depth(full), 3);
		assert_eq!(trie.count(trie.find_node(&ids(&[2, 3])).unwrap()), 1);
		assert_eq!(trie.count(trie.find_node(&ids(&[3])).unwrap()), 1);

		// prefixes exist for traversal but were not observed on their own
		assert_eq!(trie.count(trie.find_node(&ids(&[1, 2])).unwrap()), 0);
		assert_eq!(trie.count(trie.find_node(&ids(&[1])).unwrap()), 0);
	}

	#[test]
	fn find_node_reports_missing_edges() {
		let mut trie = NGramTrie::new();
		trie.populate(&ids(&[1, 2]));
		assert!(trie.find_node(&ids(&[2, 1])).is_none());
		assert!(trie.find_node(&ids(&[1, 2, 3])).is_none());
		assert_eq!(trie.find_node(&[]), Some(trie.root()));
	}

	#[test]
	fn parent_is_the_prefix_node() {
		let mut trie = NGramTrie::new();
		trie.populate(&ids(&[4, 5, 6]));
		let node = trie.find_node(&ids(&[4, 5, 6])).unwrap();
		let parent = trie.parent(node).unwrap();
		assert_eq!(Some(parent), trie.find_node(&ids(&[4, 5])));
		assert_eq!(trie.ngram(node), ids(&[4, 5, 6]));
		assert_eq!(trie.parent(trie.root()), None);
	}

	#[test]
	fn start_only_nodes_are_flagged() {
		let mut trie = NGramTrie::new();
		trie.populate(&ids(&[0, 0, 1]));
		assert!(trie.is_start_only(trie.find_node(&ids(&[0])).unwrap()));
		assert!(trie.is_start_only(trie.find_node(&ids(&[0, 0])).unwrap()));
		assert!(!trie.is_start_only(trie.find_node(&ids(&[0, 1])).unwrap()));
		assert!(!trie.is_start_only(trie.root()));
	}

	#[test]
	fn nodes_at_depth_lists_one_level() {
		let mut trie = NGramTrie::new();
		trie.populate(&ids(&[1, 2]));
		trie.populate(&ids(&[2, 3]));
		let bigrams: Vec<_> = trie.nodes_at_depth(2).map(|node| trie.ngram(node)).collect();
		assert_eq!(bigrams.len(), 2);
		assert!(bigrams.contains(&ids(&[1, 2])));
		assert!(bigrams.contains(&ids(&[2, 3])));
	}

	#[test]
	fn merge_sums_matching_paths() {
		let mut left = NGramTrie::new();
		left.populate(&ids(&[1, 2]));
		let mut right = NGramTrie::new();
		right.populate(&ids(&[1, 2]));
		right.populate(&ids(&[2, 3]));

		left.merge_from(&right, |token| token);

		assert_eq!(left.count(left.root()), 3);
		assert_eq!(left.count(left.find_node(&ids(&[1, 2])).unwrap()), 2);
		assert_eq!(left.count(left.find_node(&ids(&[2])).unwrap()), 2);
		assert_eq!(left.count(left.find_node(&ids(&[3])).unwrap()), 1);
		assert_eq!(left.count(left.find_node(&ids(&[2, 3])).unwrap()), 1);
	}
}
