use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SigilError {
	#[error(transparent)]
	#[diagnostic(code(sigil::io_error))]
	Io(#[from] std::io::Error),

	#[error("unterminated region: `{0}` has no closing marker")]
	#[diagnostic(
		code(sigil::unterminated_region),
		help("add a `// sourcery:end` line after the region body")
	)]
	UnterminatedRegion(String),

	#[error("byte range {offset}..{} is out of bounds for a document of {length} bytes", .offset + .requested)]
	#[diagnostic(code(sigil::offset_out_of_range))]
	OffsetOutOfRange {
		offset: usize,
		requested: usize,
		length: usize,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(sigil::config_parse),
		help("check that sigil.toml is valid TOML")
	)]
	ConfigParse(String),
}

pub type SigilResult<T> = Result<T, SigilError>;
