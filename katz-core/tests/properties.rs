use katz_core::model::{NGramTrie, NodeId, TokenWindow};
use katz_core::NGramCounts;
use proptest::prelude::*;

const WORDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

fn documents() -> impl Strategy<Value = Vec<Vec<&'static str>>> {
	prop::collection::vec(prop::collection::vec((0..WORDS.len()).prop_map(|i| WORDS[i]), 0..25), 1..5)
}

fn count_all(order: usize, documents: &[Vec<&str>]) -> NGramCounts {
	let mut counts = NGramCounts::new(order).unwrap();
	for document in documents {
		counts.add_document(document);
	}
	counts
}

fn tokens_of(counts: &NGramCounts, node: NodeId) -> Vec<String> {
	counts
		.trie()
		.ngram(node)
		.into_iter()
		.map(|id| counts.vocabulary().token(id).to_owned())
		.collect()
}

fn children_total(trie: &NGramTrie, node: NodeId) -> u64 {
	trie.children(node).map(|(_, child)| trie.count(child)).sum()
}

proptest! {
	#[test]
	fn snapshot_is_the_latest_tokens(capacity in 1usize..6, tokens in prop::collection::vec(0u32..100, 0..40)) {
		let mut window = TokenWindow::new(capacity);
		for (i, token) in tokens.iter().enumerate() {
			window.add(*token);
			let start = (i + 1).saturating_sub(capacity);
			prop_assert_eq!(window.snapshot(), &tokens[start..=i]);
		}
		prop_assert_eq!(window.len(), tokens.len().min(capacity));
	}

	#[test]
	fn trie_counts_are_consistent(order in 1usize..5, documents in documents()) {
		let counts = count_all(order, &documents);
		let trie = counts.trie();

		let expected_root: u64 = documents
			.iter()
			.filter(|document| !document.is_empty())
			.map(|document| (document.len() + order - 1) as u64)
			.sum();
		prop_assert_eq!(trie.count(trie.root()), expected_root);

		for node in trie.node_ids() {
			prop_assert!(trie.depth(node) <= order);
			prop_assert!(children_total(trie, node) <= trie.count(node));
			if node == trie.root() {
				continue;
			}
			prop_assert!(trie.count(node) > 0);
			// every suffix of a counted n-gram is counted at least as often
			let ngram = tokens_of(&counts, node);
			prop_assert!(counts.count(&ngram[1..]) >= trie.count(node));
		}
	}

	#[test]
	fn merge_order_does_not_matter(order in 1usize..4, left in documents(), right in documents()) {
		let mut left_first = count_all(order, &left);
		left_first.merge(&count_all(order, &right)).unwrap();
		let mut right_first = count_all(order, &right);
		right_first.merge(&count_all(order, &left)).unwrap();
		let all: Vec<Vec<&str>> = left.iter().chain(right.iter()).cloned().collect();
		let sequential = count_all(order, &all);

		prop_assert_eq!(left_first.trie().len(), sequential.trie().len());
		prop_assert_eq!(right_first.trie().len(), sequential.trie().len());
		for node in sequential.trie().node_ids() {
			let ngram = tokens_of(&sequential, node);
			let expected = sequential.trie().count(node);
			prop_assert_eq!(left_first.count(&ngram), expected);
			prop_assert_eq!(right_first.count(&ngram), expected);
		}
	}
}
