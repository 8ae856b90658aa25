use std::collections::HashMap;
use std::collections::hash_map::Entry;

use derive_more::Deref;
use derive_more::DerefMut;
use float_cmp::approx_eq;
use logos::Logos;
use serde::Serialize;

/// A single typed directive value.
///
/// Keeping this a closed sum type (rather than passing `serde_json::Value`
/// through) keeps downstream consumers exhaustive: a renderer matching on a
/// directive cannot silently miss a shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum DirectiveValue {
	/// A bare key with no value, e.g. `skipEquality`.
	Bool(bool),
	/// A numeric value, integer or floating point, e.g. `limit=3`.
	Number(f64),
	/// A string value, quoted or bare, e.g. `jsonKey="json_key"`.
	String(String),
	/// An ordered list: a repeated key collapsed in first-seen order, or a
	/// decoded JSON array.
	Items(Vec<DirectiveValue>),
	/// A nested mapping from a colon-qualified key or a decoded JSON
	/// object.
	Map(Directive),
}

impl Eq for DirectiveValue {}
impl PartialEq for DirectiveValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(DirectiveValue::Bool(value), DirectiveValue::Bool(other_value)) => value == other_value,
			(DirectiveValue::Number(value), DirectiveValue::Number(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(DirectiveValue::String(value), DirectiveValue::String(other_value)) => {
				value == other_value
			}
			(DirectiveValue::Items(value), DirectiveValue::Items(other_value)) => {
				value == other_value
			}
			(DirectiveValue::Map(value), DirectiveValue::Map(other_value)) => value == other_value,
			_ => false,
		}
	}
}

impl DirectiveValue {
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			DirectiveValue::Bool(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			DirectiveValue::Number(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			DirectiveValue::String(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_items(&self) -> Option<&[DirectiveValue]> {
		match self {
			DirectiveValue::Items(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&Directive> {
		match self {
			DirectiveValue::Map(map) => Some(map),
			_ => None,
		}
	}

	fn from_json(value: serde_json::Value) -> DirectiveValue {
		match value {
			serde_json::Value::Null => DirectiveValue::String(String::new()),
			serde_json::Value::Bool(value) => DirectiveValue::Bool(value),
			serde_json::Value::Number(value) => {
				DirectiveValue::Number(value.as_f64().unwrap_or_default())
			}
			serde_json::Value::String(value) => DirectiveValue::String(value),
			serde_json::Value::Array(items) => {
				DirectiveValue::Items(items.into_iter().map(Self::from_json).collect())
			}
			serde_json::Value::Object(entries) => {
				let mut map = Directive::default();
				for (key, value) in entries {
					map.append(key, Self::from_json(value));
				}
				DirectiveValue::Map(map)
			}
		}
	}
}

impl From<bool> for DirectiveValue {
	fn from(value: bool) -> Self {
		DirectiveValue::Bool(value)
	}
}

impl From<f64> for DirectiveValue {
	fn from(value: f64) -> Self {
		DirectiveValue::Number(value)
	}
}

impl From<&str> for DirectiveValue {
	fn from(value: &str) -> Self {
		DirectiveValue::String(value.to_string())
	}
}

impl From<String> for DirectiveValue {
	fn from(value: String) -> Self {
		DirectiveValue::String(value)
	}
}

/// A parsed metadata dictionary attached to one declaration (or one scope).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deref, DerefMut)]
pub struct Directive(
	#[deref]
	#[deref_mut]
	HashMap<String, DirectiveValue>,
);

impl Directive {
	pub fn new() -> Self {
		Self::default()
	}

	/// Merge `value` under `key`, collapsing repeats.
	///
	/// A fresh key stores the value directly. A repeated key collapses to an
	/// ordered list preserving first-seen order; a value equal to one
	/// already present is kept once. Nested maps merge recursively.
	pub fn append(&mut self, key: impl Into<String>, value: DirectiveValue) {
		match self.0.entry(key.into()) {
			Entry::Vacant(slot) => {
				slot.insert(value);
			}
			Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
				(DirectiveValue::Items(items), value) => {
					if !items.contains(&value) {
						items.push(value);
					}
				}
				(DirectiveValue::Map(existing), DirectiveValue::Map(incoming)) => {
					for (sub_key, sub_value) in incoming.0 {
						existing.append(sub_key, sub_value);
					}
				}
				(existing, value) => {
					if *existing != value {
						let previous = std::mem::replace(existing, DirectiveValue::Bool(false));
						*existing = DirectiveValue::Items(vec![previous, value]);
					}
				}
			},
		}
	}

	/// Append every entry of `other`, with the same collapse rules.
	pub fn extend_from(&mut self, other: &Directive) {
		for (key, value) in &other.0 {
			self.append(key.clone(), value.clone());
		}
	}
}

impl FromIterator<(String, DirectiveValue)> for Directive {
	fn from_iter<I: IntoIterator<Item = (String, DirectiveValue)>>(iter: I) -> Self {
		let mut directive = Directive::default();
		for (key, value) in iter {
			directive.append(key, value);
		}
		directive
	}
}

impl IntoIterator for Directive {
	type IntoIter = std::collections::hash_map::IntoIter<String, DirectiveValue>;
	type Item = (String, DirectiveValue);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Raw tokens for splitting a directive payload. Only the delimiters are
/// meaningful; everything else passes through as chunk text.
#[derive(Logos, Debug, PartialEq)]
enum PayloadToken {
	#[token(",")]
	Comma,
	#[token(":")]
	Colon,
	#[token("[")]
	OpenBracket,
	#[token("]")]
	CloseBracket,
	#[token("{")]
	OpenBrace,
	#[token("}")]
	CloseBrace,
	#[token("(")]
	OpenParen,
	#[token(")")]
	CloseParen,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r#"[^,:\[\]{}()"']+"#)]
	Chunk,
}

/// Split a payload on top-level commas. Commas inside quoted strings or
/// inside bracket nesting are not split points.
fn split_segments(payload: &str) -> Vec<&str> {
	let mut segments = Vec::new();
	let mut depth = 0usize;
	let mut start = 0;

	for (token, span) in PayloadToken::lexer(payload).spanned() {
		match token {
			Ok(
				PayloadToken::OpenBracket | PayloadToken::OpenBrace | PayloadToken::OpenParen,
			) => depth += 1,
			Ok(
				PayloadToken::CloseBracket | PayloadToken::CloseBrace | PayloadToken::CloseParen,
			) => depth = depth.saturating_sub(1),
			Ok(PayloadToken::Comma) if depth == 0 => {
				segments.push(&payload[start..span.start]);
				start = span.end;
			}
			// Quoted strings are single tokens, so their commas never
			// register; unlexable bytes stay part of the current segment.
			_ => {}
		}
	}

	segments.push(&payload[start..]);
	segments
}

/// Split the leading segment on colons to peel namespace qualifiers.
/// Qualifiers precede any value text, so splitting stops at the first
/// quote; brackets do not guard here.
fn split_namespaces(segment: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut start = 0;

	for (token, span) in PayloadToken::lexer(segment).spanned() {
		match token {
			Ok(PayloadToken::Colon) => {
				parts.push(&segment[start..span.start]);
				start = span.end;
			}
			Ok(PayloadToken::DoubleQuotedString | PayloadToken::SingleQuotedString) => break,
			Err(()) if segment[span.start..span.end].contains(['"', '\'']) => break,
			_ => {}
		}
	}

	parts.push(&segment[start..]);
	parts
}

/// Strip exactly one matching layer of single or double quotes, trimming
/// the whitespace just inside them. Anything else passes through.
fn strip_quotes(raw: &str) -> &str {
	let bytes = raw.as_bytes();
	if raw.len() >= 2 {
		let first = bytes[0];
		let last = bytes[raw.len() - 1];
		if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
			return raw[1..raw.len() - 1].trim();
		}
	}
	raw
}

/// Type a single directive value.
///
/// Unquoted numbers stay numeric; quoting forces string interpretation, so
/// `limit=42` is a number while `limit="42"` is the string `42`. After
/// quote-stripping, values that look like JSON containers are decoded, and
/// fall back to the raw string when the decode fails.
fn parse_value(raw: &str) -> DirectiveValue {
	if let Ok(number) = raw.parse::<f64>() {
		return DirectiveValue::Number(number);
	}

	let unquoted = strip_quotes(raw);
	if unquoted.starts_with('[') || unquoted.starts_with('{') {
		if let Ok(json) = serde_json::from_str::<serde_json::Value>(unquoted) {
			return DirectiveValue::from_json(json);
		}
	}

	DirectiveValue::String(unquoted.to_string())
}

/// Parse one directive payload (the text after a recognized marker) into a
/// [`Directive`].
///
/// The payload is a comma-separated list of `key[=value]` pairs. A key
/// without a value is a flag set to `true` (as is a key with an empty
/// value). The value is split off at the first `=`. Colon qualifiers on the
/// leading segment (`namespace:subkey: key=value`) nest the whole line's
/// directives under the qualifier chain. Malformed segments with an empty
/// key are skipped rather than failing the parse.
pub fn parse_directive_line(payload: &str) -> Directive {
	let mut segments: Vec<&str> = split_segments(payload.trim())
		.into_iter()
		.map(str::trim)
		.collect();

	let mut namespaces: Vec<String> = Vec::new();
	if !segments.is_empty() {
		let mut parts = split_namespaces(segments[0]);
		let remainder = parts.pop().unwrap_or_default();
		namespaces = parts.into_iter().map(|part| part.trim().to_string()).collect();
		segments[0] = remainder.trim();
	}

	let mut directive = Directive::default();
	for segment in segments {
		let (name, value) = match segment.split_once('=') {
			None => (segment, None),
			Some((name, value)) => (name.trim(), Some(value.trim())),
		};

		if name.is_empty() {
			continue;
		}

		match value {
			None | Some("") => directive.append(name.to_string(), DirectiveValue::Bool(true)),
			Some(value) => directive.append(name.to_string(), parse_value(value)),
		}
	}

	for namespace in namespaces.into_iter().rev() {
		let mut outer = Directive::default();
		outer.append(namespace, DirectiveValue::Map(directive));
		directive = outer;
	}

	directive
}
