use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use tracing::trace;

use crate::Directive;
use crate::SourceDocument;
use crate::config::ParseOptions;
use crate::directive::parse_directive_line;

/// Directive marker recognized inside comment lines. Must match the wire
/// literal exactly; downstream files already carry it.
pub const DIRECTIVE_MARKER: &str = "sourcery:";
/// Opens a block scope applying to every following declaration.
pub const BLOCK_BEGIN_MARKER: &str = "sourcery:begin:";
/// Closes the open block scope, or an inline region.
pub const BLOCK_END_MARKER: &str = "sourcery:end";
/// Opens the file-wide directive set.
pub const FILE_MARKER: &str = "sourcery:file:";
/// Starts a named inline region; ignored by the directive collector.
pub const INLINE_MARKER: &str = "sourcery:inline:";
/// Single-line comment marker. Locale-independent ASCII.
pub const COMMENT_MARKER: &str = "//";

const DOC_COMMENT_MARKER: &str = "///";

/// Classification of one source line, decided purely by its trimmed prefix.
/// A directive occurring inside a string literal on a code line is never
/// recognized, because a code line does not start with the comment marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
	Comment,
	DocComment,
	BlockStart,
	BlockEnd,
	InlineStart,
	InlineEnd,
	FileDirective,
	Other,
}

#[derive(Debug)]
struct LineRecord {
	content: String,
	byte_offset: usize,
	kind: LineKind,
	/// Directives parsed from this line itself.
	directives: Directive,
	/// The scope (file layered under block) active at this line.
	scope: Directive,
}

/// Marker dispatch for one comment line.
enum CommentDirective<'a> {
	None,
	Line(&'a str),
	BlockBegin(&'a str),
	BlockEnd,
	File(&'a str),
	InlineStart,
}

/// Associates comment-run directives with the declarations that follow
/// them.
///
/// Construction classifies every line of the document in a single
/// top-to-bottom pass, threading the block and file scopes through as fold
/// accumulators; lookups afterwards are read-only, so one parser can serve
/// any number of declarations.
#[derive(Debug)]
pub struct AnnotationParser {
	lines: Vec<LineRecord>,
	text_len: usize,
	options: ParseOptions,
}

impl AnnotationParser {
	pub fn new(document: &SourceDocument) -> Self {
		Self::with_options(document, ParseOptions::default())
	}

	pub fn with_options(document: &SourceDocument, options: ParseOptions) -> Self {
		// The open block scope. Flat by design: a nested `begin` replaces
		// the open scope, and `end` empties it without discarding it, so a
		// later stray `end` still reads as a block end.
		let mut block_scope: Option<Directive> = None;
		let mut file_scope = Directive::default();
		let mut lines = Vec::with_capacity(document.line_entries().len());

		for (index, entry) in document.line_entries().iter().enumerate() {
			let content = document.line_text(index).unwrap_or_default().to_string();
			let trimmed = content.trim();
			let is_comment = trimmed.starts_with(COMMENT_MARKER);
			let mut kind = if trimmed.starts_with(DOC_COMMENT_MARKER) {
				LineKind::DocComment
			} else if is_comment {
				LineKind::Comment
			} else {
				LineKind::Other
			};
			let mut directives = Directive::default();

			if is_comment {
				match search_comment_markers(&content) {
					CommentDirective::Line(payload) => {
						directives = parse_directive_line(payload);
					}
					CommentDirective::BlockBegin(payload) => {
						kind = LineKind::BlockStart;
						let parsed = parse_directive_line(payload);
						directives = parsed.clone();
						block_scope = Some(parsed);
					}
					CommentDirective::BlockEnd => {
						match block_scope.as_mut() {
							Some(scope) => {
								kind = LineKind::BlockEnd;
								scope.clear();
							}
							None => {
								kind = LineKind::InlineEnd;
							}
						}
					}
					CommentDirective::File(payload) => {
						kind = LineKind::FileDirective;
						let parsed = parse_directive_line(payload);
						directives = parsed.clone();
						file_scope.extend(parsed);
					}
					CommentDirective::InlineStart => {
						kind = LineKind::InlineStart;
					}
					CommentDirective::None => {}
				}
			}

			let mut scope = file_scope.clone();
			if let Some(block) = &block_scope {
				scope.extend(block.iter().map(|(key, value)| (key.clone(), value.clone())));
			}

			lines.push(LineRecord {
				content,
				byte_offset: entry.byte_offset,
				kind,
				directives,
				scope,
			});
		}

		debug!(lines = lines.len(), "classified source lines");

		Self {
			lines,
			text_len: document.len(),
			options,
		}
	}

	/// Every directive in the document, merged in document order.
	pub fn all(&self) -> Directive {
		let mut all = Directive::default();
		for record in &self.lines {
			all.extend_from(&record.directives);
		}
		all
	}

	/// The directive set attached to a declaration whose first token starts
	/// at `byte_offset`.
	///
	/// The comment run is the contiguous block of comment lines directly
	/// above the declaration's line; any other line ends it. Runs merge
	/// farthest-to-nearest so that repeated keys collapse in document
	/// order, over a seed of the file and block scopes active at the
	/// declaration.
	pub fn annotations_at(&self, byte_offset: usize) -> Directive {
		let Some(index) = self.line_index_of_byte_offset(byte_offset) else {
			return Directive::default();
		};

		let mut result = self.lines[index].scope.clone();
		let run: Vec<&LineRecord> = self.lines[..index]
			.iter()
			.rev()
			.take_while(|record| {
				matches!(record.kind, LineKind::Comment | LineKind::DocComment)
			})
			.collect();
		for record in run.into_iter().rev() {
			result.extend_from(&record.directives);
		}

		trace!(byte_offset, keys = result.len(), "collected annotations");
		result
	}

	/// Doc-comment text (`///` lines) of the comment run above the
	/// declaration at `byte_offset`, top-down, markers stripped. Empty
	/// unless documentation parsing is enabled in [`ParseOptions`].
	pub fn documentation_at(&self, byte_offset: usize) -> Vec<String> {
		if !self.options.parse_documentation {
			return Vec::new();
		}
		let Some(index) = self.line_index_of_byte_offset(byte_offset) else {
			return Vec::new();
		};

		let mut documentation: Vec<String> = self.lines[..index]
			.iter()
			.rev()
			.take_while(|record| {
				matches!(record.kind, LineKind::Comment | LineKind::DocComment)
			})
			.filter(|record| record.kind == LineKind::DocComment)
			.map(|record| doc_text(&record.content))
			.collect();
		documentation.reverse();
		documentation
	}

	/// Resolve the directive set for every reported declaration.
	pub fn collect_directives(
		&self,
		declarations: &[DeclarationLocation],
	) -> HashMap<String, Directive> {
		declarations
			.iter()
			.map(|declaration| {
				(
					declaration.id.clone(),
					self.annotations_at(declaration.byte_offset),
				)
			})
			.collect()
	}

	fn line_index_of_byte_offset(&self, byte_offset: usize) -> Option<usize> {
		if byte_offset > self.text_len {
			return None;
		}
		Some(
			self
				.lines
				.partition_point(|record| record.byte_offset <= byte_offset)
				- 1,
		)
	}
}

/// A declaration reported by the upstream structural parser: a
/// caller-chosen identity (typically the qualified name) plus the byte
/// offset of the declaration's first token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationLocation {
	pub id: String,
	pub byte_offset: usize,
}

impl DeclarationLocation {
	pub fn new(id: impl Into<String>, byte_offset: usize) -> Self {
		Self {
			id: id.into(),
			byte_offset,
		}
	}
}

/// One-shot form of [`AnnotationParser::collect_directives`] for callers
/// that parse a document once.
pub fn collect_directives(
	document: &SourceDocument,
	declarations: &[DeclarationLocation],
) -> HashMap<String, Directive> {
	AnnotationParser::new(document).collect_directives(declarations)
}

fn search_comment_markers(line: &str) -> CommentDirective<'_> {
	let trimmed = line.trim();
	let Some(after_marker) = trimmed.strip_prefix(COMMENT_MARKER) else {
		return CommentDirective::None;
	};

	let comment = after_marker.trim_start_matches('/').trim();
	if !comment.starts_with(DIRECTIVE_MARKER) {
		return CommentDirective::None;
	}

	if comment.starts_with(INLINE_MARKER) {
		return CommentDirective::InlineStart;
	}

	if comment.starts_with(BLOCK_BEGIN_MARKER) {
		return match marker_payload(line, BLOCK_BEGIN_MARKER) {
			Some(payload) => CommentDirective::BlockBegin(payload),
			None => CommentDirective::None,
		};
	}

	if comment.starts_with(BLOCK_END_MARKER) {
		return CommentDirective::BlockEnd;
	}

	if comment.starts_with("sourcery:file") {
		return match marker_payload(line, FILE_MARKER) {
			Some(payload) => CommentDirective::File(payload),
			None => CommentDirective::None,
		};
	}

	match marker_payload(line, DIRECTIVE_MARKER) {
		Some(payload) => CommentDirective::Line(payload),
		None => CommentDirective::None,
	}
}

/// Everything after the first occurrence of `marker` on the line.
fn marker_payload<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
	let index = line.find(marker)?;
	Some(&line[index + marker.len()..])
}

fn doc_text(line: &str) -> String {
	let trimmed = line.trim();
	let rest = trimmed.strip_prefix(DOC_COMMENT_MARKER).unwrap_or(trimmed);
	rest.strip_prefix(' ').unwrap_or(rest).to_string()
}
