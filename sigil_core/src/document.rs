use std::cell::OnceCell;

use serde::Serialize;

use crate::ByteRange;
use crate::SigilError;
use crate::SigilResult;

/// One break-normalized line of a [`SourceDocument`].
///
/// Lengths exclude the line break itself. Break bytes (CR, LF, or CRLF,
/// each counted as a single break) occupy the gap between one entry's end
/// and the next entry's start; they are plain ASCII, so within a break the
/// byte and character spaces advance in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineEntry {
	/// Byte offset of the first byte of the line.
	pub byte_offset: usize,
	/// Character offset of the first character of the line.
	pub char_offset: usize,
	/// Length of the line content in bytes.
	pub byte_len: usize,
	/// Length of the line content in characters.
	pub char_len: usize,
}

impl LineEntry {
	/// The first byte offset past the line content (the break, if any).
	pub const fn byte_end(&self) -> usize {
		self.byte_offset + self.byte_len
	}

	/// The first character offset past the line content.
	pub const fn char_end(&self) -> usize {
		self.char_offset + self.char_len
	}
}

/// An immutable snapshot of one file's text for a single parse pass.
///
/// The upstream structural parser reports locations in raw bytes, while
/// slicing and downstream tooling work in character units; multi-byte
/// characters make a single global conversion formula wrong, so the
/// document derives a per-line table and rescans within the located line.
/// The table is built lazily on first use and the document is never
/// mutated; edits produce a new document.
#[derive(Debug, Default)]
pub struct SourceDocument {
	text: String,
	lines: OnceCell<Vec<LineEntry>>,
}

impl SourceDocument {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			lines: OnceCell::new(),
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	/// Total length in bytes.
	pub fn len(&self) -> usize {
		self.text.len()
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	/// Total length in characters.
	pub fn char_len(&self) -> usize {
		// Anything after the last entry's content is line-break bytes,
		// which convert one-to-one.
		let last = self.last_entry();
		last.char_end() + (self.text.len() - last.byte_end())
	}

	/// The line table: one entry per CR/LF/CRLF-normalized line, in order.
	/// Never empty: an empty document has a single empty entry at offset
	/// 0, and a terminal line without a trailing break gets its own entry.
	/// A document ending in a break has no trailing empty entry.
	pub fn line_entries(&self) -> &[LineEntry] {
		self.lines.get_or_init(|| build_line_table(&self.text))
	}

	/// Content of line `index`, break excluded.
	pub fn line_text(&self, index: usize) -> Option<&str> {
		let entry = self.line_entries().get(index)?;
		self.text.get(entry.byte_offset..entry.byte_end())
	}

	/// Index of the line containing `byte_offset`. Break bytes belong to
	/// the line they terminate. An offset equal to the total length clamps
	/// to the last line, since parsers report end-of-file-adjacent offsets;
	/// anything past that is out of bounds.
	pub fn line_index_of_byte_offset(&self, byte_offset: usize) -> Option<usize> {
		if byte_offset > self.text.len() {
			return None;
		}
		let entries = self.line_entries();
		Some(entries.partition_point(|entry| entry.byte_offset <= byte_offset) - 1)
	}

	/// Translates a raw byte offset into a character offset. Offsets that
	/// fall inside a multi-byte character floor to the character's start.
	pub fn byte_offset_to_char_offset(&self, byte_offset: usize) -> Option<usize> {
		if byte_offset == self.text.len() {
			return Some(self.char_len());
		}
		let index = self.line_index_of_byte_offset(byte_offset)?;
		let entry = self.line_entries()[index];
		let diff = byte_offset - entry.byte_offset;
		if diff > entry.byte_len {
			// Inside the line break: ASCII, one byte per character.
			return Some(entry.char_end() + (diff - entry.byte_len));
		}
		let line = &self.text[entry.byte_offset..entry.byte_end()];
		Some(entry.char_offset + chars_within(line, diff))
	}

	/// Translates a character offset back into a raw byte offset. The
	/// inverse of [`byte_offset_to_char_offset`](Self::byte_offset_to_char_offset)
	/// for offsets on character boundaries.
	pub fn char_offset_to_byte_offset(&self, char_offset: usize) -> Option<usize> {
		if char_offset == self.char_len() {
			return Some(self.text.len());
		}
		if char_offset > self.char_len() {
			return None;
		}
		let entries = self.line_entries();
		let index = entries.partition_point(|entry| entry.char_offset <= char_offset) - 1;
		let entry = entries[index];
		let diff = char_offset - entry.char_offset;
		if diff > entry.char_len {
			return Some(entry.byte_end() + (diff - entry.char_len));
		}
		let line = &self.text[entry.byte_offset..entry.byte_end()];
		let bytes: usize = line.chars().take(diff).map(char::len_utf8).sum();
		Some(entry.byte_offset + bytes)
	}

	/// Slice of the text covered by a raw byte range. `None` when the range
	/// leaves the document or splits a multi-byte character.
	pub fn substring_with_byte_range(&self, range: ByteRange) -> Option<&str> {
		self.text.get(range.offset..range.upper_bound())
	}

	/// Like [`substring_with_byte_range`](Self::substring_with_byte_range),
	/// for callers where an invalid range is a hard error.
	pub fn substring(&self, range: ByteRange) -> SigilResult<&str> {
		self
			.substring_with_byte_range(range)
			.ok_or(SigilError::OffsetOutOfRange {
				offset: range.offset,
				requested: range.length,
				length: self.text.len(),
			})
	}

	fn last_entry(&self) -> LineEntry {
		let entries = self.line_entries();
		// The table is never empty.
		entries[entries.len() - 1]
	}
}

impl From<String> for SourceDocument {
	fn from(text: String) -> Self {
		Self::new(text)
	}
}

impl From<&str> for SourceDocument {
	fn from(text: &str) -> Self {
		Self::new(text)
	}
}

/// Number of complete characters within the first `byte_len` bytes of
/// `line`.
fn chars_within(line: &str, byte_len: usize) -> usize {
	let mut consumed = 0;
	let mut count = 0;
	for ch in line.chars() {
		if consumed + ch.len_utf8() > byte_len {
			break;
		}
		consumed += ch.len_utf8();
		count += 1;
	}
	count
}

fn build_line_table(text: &str) -> Vec<LineEntry> {
	let bytes = text.as_bytes();
	let mut entries = Vec::new();
	let mut line_start_byte = 0;
	let mut line_start_char = 0;
	let mut index = 0;

	while index < bytes.len() {
		let byte = bytes[index];
		if byte != b'\n' && byte != b'\r' {
			index += 1;
			continue;
		}

		let content = &text[line_start_byte..index];
		let char_len = content.chars().count();
		entries.push(LineEntry {
			byte_offset: line_start_byte,
			char_offset: line_start_char,
			byte_len: index - line_start_byte,
			char_len,
		});

		// CRLF counts as a single break.
		let break_len = if byte == b'\r' && bytes.get(index + 1) == Some(&b'\n') {
			2
		} else {
			1
		};
		index += break_len;
		line_start_byte = index;
		line_start_char += char_len + break_len;
	}

	// Terminal partial line, and the single empty entry of an empty
	// document. A document ending in a break produces nothing here.
	if line_start_byte < bytes.len() || entries.is_empty() {
		let content = &text[line_start_byte..];
		entries.push(LineEntry {
			byte_offset: line_start_byte,
			char_offset: line_start_char,
			byte_len: bytes.len() - line_start_byte,
			char_len: content.chars().count(),
		});
	}

	entries
}
