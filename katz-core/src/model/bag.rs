use super::katz_model::KatzModel;
use super::vocabulary::TokenId;
use std::collections::HashMap;

/// Partial ordering of a bag: one Viterbi cell.
#[derive(Clone, Debug)]
struct Cell {
	/// Bag positions of the last `order - 1` words; `None` is a start marker.
	context: Vec<Option<usize>>,
	log_p: f64,
	/// Index of the cell this one extends, in the previous layer.
	parent: Option<usize>,
	/// Bag position appended by this cell.
	position: Option<usize>,
	used: Vec<bool>,
}

/// Orders a bag of words into the sequence the model finds most likely.
///
/// Each layer extends every surviving partial ordering by one unused word
/// and keeps, per resulting context, only the best-scoring one. The search
/// is exact for the context it tracks but, like any Viterbi over bags, may
/// discard an ordering whose used-word set would have paid off later.
///
/// Repeated words are distinct bag entries. An empty bag gives an empty
/// sequence.
pub fn most_likely_sequence<S: AsRef<str>>(model: &KatzModel, bag: &[S]) -> Vec<String> {
	let ids: Vec<Option<TokenId>> = bag.iter().map(|word| model.vocabulary().get(word.as_ref())).collect();
	let context_len = model.order() - 1;

	let mut layers: Vec<Vec<Cell>> = vec![vec![Cell {
		context: vec![None; context_len],
		log_p: 0.0,
		parent: None,
		position: None,
		used: vec![false; bag.len()],
	}]];

	for _ in 0..bag.len() {
		let previous = &layers[layers.len() - 1];
		let mut next: Vec<Cell> = Vec::new();
		let mut by_context: HashMap<Vec<Option<usize>>, usize> = HashMap::new();

		for position in 0..bag.len() {
			for (index, cell) in previous.iter().enumerate() {
				if cell.used[position] {
					continue;
				}
				let mut window = cell.context.clone();
				window.push(Some(position));
				let ngram: Vec<Option<TokenId>> = window
					.iter()
					.map(|slot| match slot {
						Some(p) => ids[*p],
						None => Some(TokenId::START),
					})
					.collect();
				let log_p = cell.log_p + model.log_p_ids(&ngram);

				let context = window[1..].to_vec();
				let mut used = cell.used.clone();
				used[position] = true;
				let candidate = Cell {
					context: context.clone(),
					log_p,
					parent: Some(index),
					position: Some(position),
					used,
				};
				match by_context.get(&context) {
					Some(&slot) if next[slot].log_p >= log_p => (),
					Some(&slot) => next[slot] = candidate,
					None => {
						by_context.insert(context, next.len());
						next.push(candidate);
					}
				}
			}
		}
		layers.push(next);
	}

	let last = &layers[layers.len() - 1];
	let mut best = 0;
	for (index, cell) in last.iter().enumerate() {
		if cell.log_p > last[best].log_p {
			best = index;
		}
	}

	let mut positions = Vec::with_capacity(bag.len());
	let mut cursor = Some(best);
	for layer in layers.iter().rev() {
		let Some(index) = cursor else { break };
		let cell = &layer[index];
		if let Some(position) = cell.position {
			positions.push(position);
		}
		cursor = cell.parent;
	}
	positions.reverse();
	positions.into_iter().map(|p| bag[p].as_ref().to_owned()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const RHYME: &str = "humpty dumpty sat on a wall humpty dumpty had a great fall \
		all the king 's horses and all the king 's men could not put dumpty together again";

	fn model() -> KatzModel {
		KatzModel::train(3, RHYME.split_whitespace()).unwrap()
	}

	#[test]
	fn it_restores_a_training_sentence() {
		let model = model();
		let bag = ["wall", "sat", "dumpty", "a", "humpty", "on"];
		assert_eq!(
			most_likely_sequence(&model, &bag),
			vec!["humpty", "dumpty", "sat", "on", "a", "wall"]
		);
		let bag = ["the", "king", "all", "'s", "men"];
		assert_eq!(most_likely_sequence(&model, &bag), vec!["all", "the", "king", "'s", "men"]);
	}

	#[test]
	fn repeated_and_unknown_words_are_all_placed() {
		let model = model();
		let bag = ["a", "zebra", "a"];
		let mut sequence = most_likely_sequence(&model, &bag);
		assert_eq!(sequence.len(), 3);
		sequence.sort();
		assert_eq!(sequence, vec!["a", "a", "zebra"]);
	}

	#[test]
	fn empty_bag_gives_empty_sequence() {
		let model = model();
		assert!(most_likely_sequence::<&str>(&model, &[]).is_empty());
	}
}
