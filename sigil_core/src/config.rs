use std::path::Path;

use serde::Deserialize;

use crate::SigilError;
use crate::SigilResult;
use crate::verifier::GENERATION_MARKER;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["sigil.toml", ".sigil.toml", ".config/sigil.toml"];

/// Configuration loaded from a `sigil.toml` file.
///
/// ```toml
/// force_parse = ["generated", "toml"]
/// parse_documentation = true
/// generation_marker = "// Generated using sigil"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SigilConfig {
	/// File extensions (and region-name suffixes) exempt from the
	/// already-generated check and from region blanking. Lets callers
	/// re-parse their own output on purpose.
	#[serde(default)]
	pub force_parse: Vec<String>,
	/// Whether to collect doc-comment text alongside directives.
	#[serde(default)]
	pub parse_documentation: bool,
	/// First-line literal identifying previously generated output.
	#[serde(default = "default_generation_marker")]
	pub generation_marker: String,
}

impl Default for SigilConfig {
	fn default() -> Self {
		Self {
			force_parse: Vec::new(),
			parse_documentation: false,
			generation_marker: default_generation_marker(),
		}
	}
}

impl SigilConfig {
	pub fn from_toml_str(text: &str) -> SigilResult<Self> {
		toml::from_str(text).map_err(|error| SigilError::ConfigParse(error.to_string()))
	}

	pub fn load(path: &Path) -> SigilResult<Self> {
		Self::from_toml_str(&std::fs::read_to_string(path)?)
	}
}

fn default_generation_marker() -> String {
	GENERATION_MARKER.to_string()
}

/// Options for one parse pass, resolved from an optional [`SigilConfig`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
	/// Whether doc-comment runs are collected.
	pub parse_documentation: bool,
}

impl ParseOptions {
	pub fn from_config(config: Option<&SigilConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};
		Self {
			parse_documentation: config.parse_documentation,
		}
	}
}
