use serde::{Deserialize, Serialize};

/// Fixed-capacity window over the most recent tokens of a stream.
///
/// Every slot is stored twice, at `i` and `i + capacity`, so the live
/// contents are always one contiguous run of the backing buffer. This lets
/// `snapshot` hand out an ordered slice (oldest first) without copying,
/// whatever the current wrap position.
///
/// # Invariants
/// - `len <= capacity`
/// - `buffer.len() == 2 * capacity`
/// - `next < capacity`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TokenWindow<T> {
	capacity: usize,
	/// Number of live tokens.
	len: usize,
	/// Slot written by the next `add`.
	next: usize,
	buffer: Vec<T>,
}

impl<T: Copy + Default> TokenWindow<T> {
	/// Creates an empty window holding at most `capacity` tokens.
	///
	/// # Panics
	/// Panics if `capacity` is zero.
	pub fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "window capacity must be at least 1");
		Self { capacity, len: 0, next: 0, buffer: vec![T::default(); 2 * capacity] }
	}

	/// Creates a window of `capacity` tokens pre-filled with `capacity - 1`
	/// copies of `marker`, so the first `add` completes a full window.
	pub fn seeded(capacity: usize, marker: T) -> Self {
		let mut window = Self::new(capacity);
		for _ in 1..capacity {
			window.add(marker);
		}
		window
	}

	/// Pushes a token, evicting the oldest one once the window is full.
	pub fn add(&mut self, token: T) {
		self.buffer[self.next] = token;
		self.buffer[self.next + self.capacity] = token;
		self.next = (self.next + 1) % self.capacity;
		if self.len < self.capacity {
			self.len += 1;
		}
	}

	/// Current contents, oldest to newest.
	///
	/// Before the window is full this is everything added so far.
	pub fn snapshot(&self) -> &[T] {
		if self.len < self.capacity {
			&self.buffer[..self.len]
		} else {
			&self.buffer[self.next..self.next + self.capacity]
		}
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn is_full(&self) -> bool {
		self.len == self.capacity
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn snapshot_grows_until_full() {
		let mut window = TokenWindow::<u32>::new(4);
		assert!(window.is_empty());
		window.add(1);
		window.add(2);
		assert_eq!(window.snapshot(), &[1, 2]);
		assert!(!window.is_full());
	}

	#[test]
	fn snapshot_keeps_order_across_wrap() {
		let mut window = TokenWindow::<u32>::new(4);
		for token in 1..=5 {
			window.add(token);
		}
		assert_eq!(window.snapshot(), &[2, 3, 4, 5]);
		for token in 6..=11 {
			window.add(token);
		}
		assert_eq!(window.snapshot(), &[8, 9, 10, 11]);
		assert_eq!(window.len(), 4);
	}

	#[test]
	fn seeded_window_is_full_after_one_add() {
		let mut window = TokenWindow::seeded(3, 0u32);
		assert_eq!(window.snapshot(), &[0, 0]);
		window.add(7);
		assert!(window.is_full());
		assert_eq!(window.snapshot(), &[0, 0, 7]);
		window.add(8);
		assert_eq!(window.snapshot(), &[0, 7, 8]);
	}

	#[test]
	fn unit_window_holds_latest_token() {
		let mut window = TokenWindow::seeded(1, 0u32);
		assert!(window.is_empty());
		window.add(3);
		window.add(4);
		assert_eq!(window.snapshot(), &[4]);
	}
}
