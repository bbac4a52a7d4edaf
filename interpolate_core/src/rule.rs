use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use regex::Captures;
use regex::Regex;
use serde::Deserialize;

use crate::InterpolateError;
use crate::InterpolateResult;
use crate::matcher::MatcherSpec;
use crate::matcher::PathMatcher;
use crate::source::ReplaceSource;

/// Delimiter wrapped around builtin keys, e.g. `%GIT_REV%`.
pub const BUILTIN_DELIMITER: &str = "%";

/// How a replacement pattern was declared.
///
/// A literal string matches itself exactly (regex metacharacters are
/// escaped). A `{ regex = "..." }` table is compiled as written. A compiled
/// [`Regex`] is passed through unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum PatternOption {
	Literal(String),
	Regex { regex: String },
	#[serde(skip)]
	Compiled(Regex),
}

impl PatternOption {
	pub fn regex(source: impl Into<String>) -> Self {
		Self::Regex {
			regex: source.into(),
		}
	}

	/// Compile the declared pattern. Every match of the result is replaced,
	/// not only the first.
	pub fn compile(&self) -> InterpolateResult<Regex> {
		match self {
			Self::Literal(text) => literal_pattern(text),
			Self::Regex { regex } => compile_pattern(regex),
			Self::Compiled(regex) => Ok(regex.clone()),
		}
	}
}

impl From<&str> for PatternOption {
	fn from(value: &str) -> Self {
		Self::Literal(value.to_string())
	}
}

impl From<String> for PatternOption {
	fn from(value: String) -> Self {
		Self::Literal(value)
	}
}

impl From<Regex> for PatternOption {
	fn from(value: Regex) -> Self {
		Self::Compiled(value)
	}
}

fn compile_pattern(source: &str) -> InterpolateResult<Regex> {
	Regex::new(source).map_err(|e| {
		InterpolateError::InvalidPattern {
			pattern: source.to_string(),
			reason: e.to_string(),
		}
	})
}

/// A pattern matching `text` literally.
pub fn literal_pattern(text: &str) -> InterpolateResult<Regex> {
	compile_pattern(&regex::escape(text))
}

/// The pattern for a builtin key: the escaped key between `%` delimiters.
pub fn builtin_pattern(key: &str) -> InterpolateResult<Regex> {
	compile_pattern(&format!(
		"{BUILTIN_DELIMITER}{}{BUILTIN_DELIMITER}",
		regex::escape(key)
	))
}

/// One match handed to a replacer function: the whole match, its capture
/// groups, where it starts and the full text that was searched.
pub struct ReplacerMatch<'h> {
	captures: Captures<'h>,
	range: Range<usize>,
	input: &'h str,
}

impl<'h> ReplacerMatch<'h> {
	fn new(captures: Captures<'h>, input: &'h str) -> Option<Self> {
		let range = captures.get(0)?.range();
		Some(Self {
			captures,
			range,
			input,
		})
	}

	/// The full matched text.
	pub fn matched(&self) -> &'h str {
		&self.input[self.range.clone()]
	}

	/// Capture group `index` (1-based). `None` when the group did not
	/// participate in the match.
	pub fn group(&self, index: usize) -> Option<&'h str> {
		if index == 0 {
			return Some(self.matched());
		}

		self.captures.get(index).map(|group| group.as_str())
	}

	/// All capture groups in order, excluding the whole match.
	pub fn groups(&self) -> Vec<Option<&'h str>> {
		self.captures
			.iter()
			.skip(1)
			.map(|group| group.map(|m| m.as_str()))
			.collect()
	}

	/// Capture group by name.
	pub fn name(&self, name: &str) -> Option<&'h str> {
		self.captures.name(name).map(|group| group.as_str())
	}

	/// Byte offset of the match in [`Self::input`].
	pub fn offset(&self) -> usize {
		self.range.start
	}

	/// The whole text being searched.
	pub fn input(&self) -> &'h str {
		self.input
	}
}

/// A function computing the substitution for each match.
#[derive(Clone)]
pub struct ReplacerFn(Arc<dyn Fn(&ReplacerMatch<'_>) -> String + Send + Sync>);

impl ReplacerFn {
	pub fn new(replacer: impl Fn(&ReplacerMatch<'_>) -> String + Send + Sync + 'static) -> Self {
		Self(Arc::new(replacer))
	}

	pub fn call(&self, matched: &ReplacerMatch<'_>) -> String {
		(self.0)(matched)
	}
}

impl fmt::Debug for ReplacerFn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ReplacerFn(..)")
	}
}

/// The substitution for a rule: a literal string inserted verbatim, or a
/// function evaluated per match.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum ReplacementValue {
	Literal(String),
	#[serde(skip)]
	Replacer(ReplacerFn),
}

impl ReplacementValue {
	pub fn replacer(
		replacer: impl Fn(&ReplacerMatch<'_>) -> String + Send + Sync + 'static,
	) -> Self {
		Self::Replacer(ReplacerFn::new(replacer))
	}

	/// The literal text, if this is not a function.
	pub fn as_literal(&self) -> Option<&str> {
		match self {
			Self::Literal(value) => Some(value.as_str()),
			Self::Replacer(_) => None,
		}
	}
}

impl From<&str> for ReplacementValue {
	fn from(value: &str) -> Self {
		Self::Literal(value.to_string())
	}
}

impl From<String> for ReplacementValue {
	fn from(value: String) -> Self {
		Self::Literal(value)
	}
}

impl fmt::Display for ReplacementValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(value) => f.write_str(value),
			Self::Replacer(_) => f.write_str("<function>"),
		}
	}
}

/// A declared replacement.
///
/// ```toml
/// [[replacements]]
/// pattern = "%hello%"
/// value = "world"
/// exclude = ".map"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementSpec {
	pub pattern: PatternOption,
	pub value: ReplacementValue,
	/// Paths this replacement is limited to. Defaults to every path.
	#[serde(default)]
	pub include: Option<MatcherSpec>,
	/// Paths this replacement skips. Defaults to none.
	#[serde(default)]
	pub exclude: Option<MatcherSpec>,
}

impl ReplacementSpec {
	pub fn new(pattern: impl Into<PatternOption>, value: impl Into<ReplacementValue>) -> Self {
		Self {
			pattern: pattern.into(),
			value: value.into(),
			include: None,
			exclude: None,
		}
	}

	#[must_use]
	pub fn include(mut self, spec: impl Into<MatcherSpec>) -> Self {
		self.include = Some(spec.into());
		self
	}

	#[must_use]
	pub fn exclude(mut self, spec: impl Into<MatcherSpec>) -> Self {
		self.exclude = Some(spec.into());
		self
	}
}

/// Where a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleOrigin {
	User,
	Builtin,
}

impl fmt::Display for RuleOrigin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::User => f.write_str("user"),
			Self::Builtin => f.write_str("builtin"),
		}
	}
}

/// An active replacement rule, ready to be applied.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
	pub pattern: Regex,
	pub value: ReplacementValue,
	pub include: PathMatcher,
	pub exclude: PathMatcher,
	pub origin: RuleOrigin,
}

impl ReplacementRule {
	/// Build a user rule from its declaration.
	pub fn from_spec(spec: &ReplacementSpec) -> InterpolateResult<Self> {
		Ok(Self {
			pattern: spec.pattern.compile()?,
			value: spec.value.clone(),
			include: PathMatcher::from_optional_spec(spec.include.as_ref(), true)?,
			exclude: PathMatcher::from_optional_spec(spec.exclude.as_ref(), false)?,
			origin: RuleOrigin::User,
		})
	}

	/// Whether this rule should run for the asset at `path`.
	pub fn applies_to(&self, path: &str) -> bool {
		self.include.matches(path) && !self.exclude.matches(path)
	}

	/// Record an edit in `overlay` for every match in its original text.
	/// Returns the number of matches.
	pub fn apply(&self, overlay: &mut ReplaceSource) -> usize {
		let text = overlay.shared_original();
		let mut count = 0;

		match &self.value {
			ReplacementValue::Literal(value) => {
				for found in self.pattern.find_iter(&text) {
					overlay.replace(found.start(), found.end(), value.clone());
					count += 1;
				}
			}
			ReplacementValue::Replacer(replacer) => {
				for captures in self.pattern.captures_iter(&text) {
					let Some(matched) = ReplacerMatch::new(captures, &text) else {
						continue;
					};
					let value = replacer.call(&matched);
					overlay.replace(matched.range.start, matched.range.end, value);
					count += 1;
				}
			}
		}

		count
	}
}
