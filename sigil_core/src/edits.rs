use serde::Deserialize;
use serde::Serialize;

/// A span of raw bytes in a source document, in the units reported by the
/// upstream structural parser. Never extends past the document it was
/// produced from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
	/// Starting byte offset of the span.
	pub offset: usize,
	/// Length of the span in bytes.
	pub length: usize,
}

impl ByteRange {
	pub const fn new(offset: usize, length: usize) -> Self {
		Self { offset, length }
	}

	/// The first offset past the end of the span.
	pub const fn upper_bound(&self) -> usize {
		self.offset + self.length
	}

	pub const fn is_empty(&self) -> bool {
		self.length == 0
	}

	pub const fn contains(&self, offset: usize) -> bool {
		self.offset <= offset && offset < self.upper_bound()
	}

	/// Whether two spans share at least one byte. Empty spans never
	/// intersect anything.
	pub const fn intersects(&self, other: &ByteRange) -> bool {
		!self.is_empty()
			&& !other.is_empty()
			&& self.offset < other.upper_bound()
			&& other.offset < self.upper_bound()
	}

	/// The smallest span covering both `self` and `other`.
	pub fn union(&self, other: &ByteRange) -> ByteRange {
		let offset = self.offset.min(other.offset);
		let upper = self.upper_bound().max(other.upper_bound());
		ByteRange::new(offset, upper - offset)
	}

	/// Returns this span's position after `edit` has been applied to the
	/// underlying text.
	///
	/// An edit that ends at or before the span shifts it by the edit's net
	/// length change; an edit that starts at or after the span's end leaves
	/// it untouched. An overlapping edit is treated as consuming the
	/// overlapped portion: the span's start clamps to the edit's start and
	/// the span still ends at its original end, moved by the net change.
	///
	/// Applying a sequence of non-overlapping edits in descending offset
	/// order produces the same result as applying the equivalent composite
	/// edit.
	pub fn adjusted(&self, edit: &Edit) -> ByteRange {
		if edit.at.upper_bound() <= self.offset {
			let offset = shift(self.offset, edit.delta());
			return ByteRange::new(offset, self.length);
		}

		if edit.at.offset >= self.upper_bound() {
			return *self;
		}

		let offset = self.offset.min(edit.at.offset);
		let upper = shift(self.upper_bound(), edit.delta());
		ByteRange::new(offset, upper.saturating_sub(offset))
	}
}

/// A single replacement applied to the text: the byte span that was
/// replaced, and the byte length of its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
	/// The span of the original text that the edit replaced.
	pub at: ByteRange,
	/// The byte length of the replacement content.
	pub new_length: usize,
}

impl Edit {
	pub const fn new(at: ByteRange, new_length: usize) -> Self {
		Self { at, new_length }
	}

	/// Net change in document length, in bytes.
	pub const fn delta(&self) -> isize {
		self.new_length as isize - self.at.length as isize
	}
}

/// Offset arithmetic with a signed delta, saturating at zero. A tracked
/// range can never move before the start of the document.
const fn shift(offset: usize, delta: isize) -> usize {
	if delta >= 0 {
		offset + delta as usize
	} else {
		offset.saturating_sub(delta.unsigned_abs())
	}
}
