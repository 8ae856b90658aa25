use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::ByteRange;
use crate::SigilError;
use crate::SigilResult;
use crate::annotations::COMMENT_MARKER;
use crate::annotations::DIRECTIVE_MARKER;

/// A named, marker-delimited span that downstream tooling may regenerate
/// in place. The range covers exactly the content strictly between the end
/// of the begin-marker line and the start of the end-marker line; the
/// markers themselves stay in the file, which is what makes the region
/// findable again on the next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedRegion {
	pub name: String,
	/// Raw byte range of the region body in the original text.
	pub range: ByteRange,
	/// Leading whitespace of the begin-marker line, for re-indenting
	/// regenerated content.
	pub indentation: String,
}

pub type RegionMap = HashMap<String, ManagedRegion>;

/// The paired begin/end extraction is the one place a regex earns its keep:
/// "everything between two line-anchored markers" is the textual pattern,
/// and byte-exact match offsets fall out of it directly.
///
/// Groups: 1 = begin-line indentation, 2 = region name, 3 = body,
/// 4 = end-marker line (anchored at its line start).
fn region_regex(tag_pattern: &str) -> Regex {
	let comment = regex::escape(COMMENT_MARKER);
	let pattern = format!(
		r"(?ms)^(?:[ \t]*\r?\n)?([ \t]*){comment}[ \t]*{DIRECTIVE_MARKER}{tag_pattern}:(\S*)[ \t\r]*\n(.*?)(^[ \t]*{comment}[ \t]*{DIRECTIVE_MARKER}end)"
	);
	Regex::new(&pattern).unwrap()
}

/// Locate every `// sourcery:<tag>:<Name>` … `// sourcery:end` pair.
///
/// Returns the regions keyed by name (a name appearing more than once keeps
/// its last occurrence) together with the body ranges eligible for
/// blanking. Region names matching the `force_parse` allow-list (equal to
/// an entry, or ending in `.` + entry) are captured but never blanked.
///
/// A begin marker with no matching end marker before end of file is a hard
/// error: silently ignoring it would corrupt a later regeneration pass.
pub fn region_ranges(
	contents: &str,
	tag: &str,
	force_parse: &[String],
) -> SigilResult<(RegionMap, Vec<ByteRange>)> {
	let regex = region_regex(&regex::escape(tag));
	let mut regions = RegionMap::new();
	let mut ranges_to_replace = Vec::new();
	let mut matched_spans = Vec::new();

	for captures in regex.captures_iter(contents) {
		let (Some(whole), Some(indent), Some(name), Some(body), Some(end)) = (
			captures.get(0),
			captures.get(1),
			captures.get(2),
			captures.get(3),
			captures.get(4),
		) else {
			continue;
		};

		let name = name.as_str().to_string();
		let range = ByteRange::new(body.start(), end.start() - body.start());
		matched_spans.push(ByteRange::new(whole.start(), whole.end() - whole.start()));

		let force = force_parse
			.iter()
			.any(|entry| name == *entry || name.ends_with(&format!(".{entry}")));
		if !force {
			ranges_to_replace.push(range);
		}

		regions.insert(
			name.clone(),
			ManagedRegion {
				name,
				range,
				indentation: indent.as_str().to_string(),
			},
		);
	}

	ensure_terminated(contents, tag, &matched_spans)?;
	debug!(tag, regions = regions.len(), "extracted managed regions");

	Ok((regions, ranges_to_replace))
}

/// Like [`region_ranges`], additionally rewriting the text with every
/// non-allow-listed body blanked to an equal-length run of spaces.
///
/// Blanking at fixed length keeps every byte offset computed from the
/// original text numerically valid in the rewritten one. Edits are applied
/// from the highest offset toward the lowest, the governing rule for any
/// multi-edit pass, and the one that would keep offsets valid even under a
/// length-changing strategy.
pub fn extract_regions_with_force_parse(
	contents: &str,
	tag: &str,
	force_parse: &[String],
) -> SigilResult<(String, RegionMap)> {
	let (regions, mut ranges) = region_ranges(contents, tag, force_parse)?;

	ranges.sort_by(|a, b| b.offset.cmp(&a.offset));
	let mut rewritten = contents.to_string();
	for range in ranges {
		rewritten.replace_range(range.offset..range.upper_bound(), &" ".repeat(range.length));
	}

	Ok((rewritten, regions))
}

/// [`extract_regions_with_force_parse`] with an empty allow-list.
pub fn extract_regions(contents: &str, tag: &str) -> SigilResult<(String, RegionMap)> {
	extract_regions_with_force_parse(contents, tag, &[])
}

/// Delete marker pairs whose body is empty, whatever their tag. Used to
/// tidy generated output that no longer carries content for a region.
pub fn remove_empty_regions(contents: &str) -> String {
	let regex = region_regex(r"\S*");
	let mut spans = Vec::new();

	for captures in regex.captures_iter(contents) {
		let (Some(whole), Some(body), Some(end)) =
			(captures.get(0), captures.get(3), captures.get(4))
		else {
			continue;
		};
		if body.as_str().is_empty() {
			spans.push((whole.start(), end.end()));
		}
	}

	let mut result = contents.to_string();
	for (start, end) in spans.into_iter().rev() {
		result.replace_range(start..end, "");
	}
	result
}

/// Every begin marker must sit inside some matched span; one that does not
/// never found its `sourcery:end`.
fn ensure_terminated(contents: &str, tag: &str, matched: &[ByteRange]) -> SigilResult<()> {
	let begin_marker = format!("{DIRECTIVE_MARKER}{tag}:");
	let mut offset = 0;

	for line in contents.split('\n') {
		let line_start = offset;
		offset += line.len() + 1;

		let trimmed = line.trim();
		let Some(after_comment) = trimmed.strip_prefix(COMMENT_MARKER) else {
			continue;
		};
		let comment = after_comment.trim_start_matches('/').trim();
		let Some(rest) = comment.strip_prefix(begin_marker.as_str()) else {
			continue;
		};

		if !matched.iter().any(|span| span.contains(line_start)) {
			let name = rest.split_whitespace().next().unwrap_or_default();
			return Err(SigilError::UnterminatedRegion(name.to_string()));
		}
	}

	Ok(())
}
