use crate::Directive;
use crate::DirectiveValue;

pub fn truthy() -> DirectiveValue {
	DirectiveValue::Bool(true)
}

pub fn number(value: f64) -> DirectiveValue {
	DirectiveValue::Number(value)
}

pub fn string(value: &str) -> DirectiveValue {
	DirectiveValue::String(value.to_string())
}

pub fn items(values: Vec<DirectiveValue>) -> DirectiveValue {
	DirectiveValue::Items(values)
}

pub fn directive<const N: usize>(entries: [(&str, DirectiveValue); N]) -> Directive {
	entries
		.into_iter()
		.map(|(key, value)| (key.to_string(), value))
		.collect()
}

/// Byte offset of the first occurrence of `needle`, for addressing
/// declarations without hand-counted offsets.
pub fn offset_of(haystack: &str, needle: &str) -> usize {
	haystack
		.find(needle)
		.unwrap_or_else(|| panic!("fixture text does not contain `{needle}`"))
}

/// A source file exercising line directives, a block scope, a file scope,
/// and directive-free declarations.
pub const ANNOTATED_SOURCE: &str = "\
// sourcery:file: module=\"geometry\"

// sourcery: skipEquality
struct Point {
	let x = \"// sourcery: bogus = 1\"
}

// sourcery:begin: conforms=\"Codable\"
// sourcery: skipDescription
struct Size {}

struct Rect {}
// sourcery:end

struct Plain {}
";

/// The canonical inline-region sample.
pub const INLINE_REGION_SOURCE: &str = "// sourcery:inline:Type.X\nBODY\n// sourcery:end\n";
