//! `sigil_core` is the annotation and managed-region engine for the
//! [sigil](https://github.com/sigil-rs/sigil) source regeneration tool. It
//! scans source text that mixes ordinary declarations with comment-embedded
//! directives, attaching typed metadata to the declaration that follows each
//! directive run and locating the byte-accurate marker-delimited regions
//! that generated content may overwrite in place.
//!
//! ## Processing pipeline
//!
//! ```text
//! Source file text
//!   → Guard (skip prior generated output and mid-merge-conflict files)
//!   → SourceDocument (line table, byte ↔ character offset reconciliation)
//!   → Region extractor (capture managed regions, blank bodies at fixed length)
//!   → AnnotationParser (classify lines, fold block/file scopes, attach
//!     directives to declarations reported by the structural parser)
//! ```
//!
//! ## Modules
//!
//! - [`annotations`] — Line classification and directive attachment,
//!   including block (`sourcery:begin:`/`sourcery:end`) and file
//!   (`sourcery:file:`) scopes.
//! - [`regions`] — Managed-region extraction and fixed-length blanking.
//! - [`config`] — Configuration loading from `sigil.toml`.
//!
//! ## Key types
//!
//! - [`Directive`] — A parsed metadata dictionary; values are
//!   [`DirectiveValue`]s (flag, number, string, ordered list, or nested
//!   map).
//! - [`SourceDocument`] — Immutable text snapshot with a lazily built line
//!   table translating structural-parser byte offsets to character offsets.
//! - [`ManagedRegion`] — A named region between begin/end markers, with its
//!   body byte range and begin-line indentation.
//! - [`ByteRange`] / [`Edit`] — The byte-unit interval algebra used to keep
//!   tracked ranges valid across in-place edits.
//! - [`ParseStatus`] — The pre-parse gate verdict.
//!
//! ## Quick start
//!
//! ```rust
//! use sigil_core::DeclarationLocation;
//! use sigil_core::GENERATION_MARKER;
//! use sigil_core::SourceDocument;
//! use sigil_core::annotations::AnnotationParser;
//! use sigil_core::can_parse;
//! use sigil_core::regions::extract_regions;
//!
//! let text = "// sourcery: skipEquality\nstruct Point {}\n";
//! assert!(can_parse(text, GENERATION_MARKER, false).is_parsable());
//!
//! let document = SourceDocument::new(text);
//! let parser = AnnotationParser::new(&document);
//! let directives = parser.annotations_at(26);
//! assert!(directives.contains_key("skipEquality"));
//!
//! let (rewritten, regions) = extract_regions(text, "inline").unwrap();
//! assert!(regions.is_empty());
//! assert_eq!(rewritten, text);
//! # let _ = DeclarationLocation::new("Point", 26);
//! ```

pub use annotations::*;
pub use config::*;
pub use directive::*;
pub use document::*;
pub use edits::*;
pub use error::*;
pub use regions::*;
pub use verifier::*;

pub mod annotations;
pub mod config;
mod directive;
mod document;
mod edits;
mod error;
pub mod regions;
mod verifier;

#[cfg(test)]
mod __fixtures;
