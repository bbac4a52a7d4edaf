use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::InterpolateError;
use crate::InterpolateResult;

/// Extension of source map assets. Builtin replacements skip these by default.
pub const SOURCE_MAP_EXTENSION: &str = ".map";

/// A user supplied predicate over an asset path.
#[derive(Clone)]
pub struct PathPredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl PathPredicate {
	pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
		Self(Arc::new(predicate))
	}

	pub fn call(&self, path: &str) -> bool {
		(self.0)(path)
	}
}

impl fmt::Debug for PathPredicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("PathPredicate(..)")
	}
}

/// One declared matcher, as written in `interpolate.toml` or built in code.
///
/// ```toml
/// exclude = true                    # constant
/// exclude = ".map"                  # substring containment
/// exclude = { regex = "\\.map$" }   # regular expression test
/// exclude = ["assets/", ".js"]      # every matcher must pass
/// ```
///
/// Predicates can only be constructed programmatically.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum MatcherOption {
	/// Matches every path (`true`) or none (`false`).
	Bool(bool),
	/// Matches paths containing this string.
	Substring(String),
	/// Matches paths the regular expression finds a match in.
	Regex { regex: String },
	/// Matches paths the function returns `true` for.
	#[serde(skip)]
	Predicate(PathPredicate),
}

impl MatcherOption {
	pub fn regex(source: impl Into<String>) -> Self {
		Self::Regex {
			regex: source.into(),
		}
	}

	pub fn predicate(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
		Self::Predicate(PathPredicate::new(predicate))
	}
}

impl From<bool> for MatcherOption {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<&str> for MatcherOption {
	fn from(value: &str) -> Self {
		Self::Substring(value.to_string())
	}
}

impl From<String> for MatcherOption {
	fn from(value: String) -> Self {
		Self::Substring(value)
	}
}

/// A single matcher option or a list of options that must all pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum MatcherSpec {
	All(Vec<MatcherOption>),
	One(MatcherOption),
}

impl From<MatcherOption> for MatcherSpec {
	fn from(value: MatcherOption) -> Self {
		Self::One(value)
	}
}

impl From<bool> for MatcherSpec {
	fn from(value: bool) -> Self {
		Self::One(value.into())
	}
}

impl From<&str> for MatcherSpec {
	fn from(value: &str) -> Self {
		Self::One(value.into())
	}
}

impl From<Vec<MatcherOption>> for MatcherSpec {
	fn from(value: Vec<MatcherOption>) -> Self {
		Self::All(value)
	}
}

/// A normalized matcher: every declared form reduced to something that can
/// answer `(path) -> bool`.
#[derive(Debug, Clone)]
pub enum Matcher {
	Always(bool),
	Substring(String),
	Pattern(Regex),
	Predicate(PathPredicate),
}

impl Matcher {
	/// Normalize a declared option. Regular expressions are compiled here, so
	/// an invalid one is reported as soon as the matcher is built.
	pub fn from_option(option: &MatcherOption) -> InterpolateResult<Self> {
		let matcher = match option {
			MatcherOption::Bool(value) => Self::Always(*value),
			MatcherOption::Substring(needle) => Self::Substring(needle.clone()),
			MatcherOption::Regex { regex } => {
				let compiled = Regex::new(regex).map_err(|e| {
					InterpolateError::InvalidMatcher {
						matcher: regex.clone(),
						reason: e.to_string(),
					}
				})?;
				Self::Pattern(compiled)
			}
			MatcherOption::Predicate(predicate) => Self::Predicate(predicate.clone()),
		};

		Ok(matcher)
	}

	pub fn matches(&self, path: &str) -> bool {
		match self {
			Self::Always(value) => *value,
			Self::Substring(needle) => path.contains(needle.as_str()),
			Self::Pattern(regex) => regex.is_match(path),
			Self::Predicate(predicate) => predicate.call(path),
		}
	}
}

/// A conjunction of matchers. An empty list matches every path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
	matchers: Vec<Matcher>,
}

impl PathMatcher {
	/// A matcher that answers `value` for every path.
	pub fn constant(value: bool) -> Self {
		Self {
			matchers: vec![Matcher::Always(value)],
		}
	}

	/// Normalize and combine a declared spec.
	pub fn from_spec(spec: &MatcherSpec) -> InterpolateResult<Self> {
		let matchers = match spec {
			MatcherSpec::One(option) => vec![Matcher::from_option(option)?],
			MatcherSpec::All(options) => {
				options
					.iter()
					.map(Matcher::from_option)
					.collect::<InterpolateResult<Vec<_>>>()?
			}
		};

		Ok(Self { matchers })
	}

	/// Normalize an optional spec, falling back to a constant when absent.
	pub fn from_optional_spec(spec: Option<&MatcherSpec>, default: bool) -> InterpolateResult<Self> {
		spec.map_or_else(|| Ok(Self::constant(default)), Self::from_spec)
	}

	/// The default exclusion for builtin replacements: source maps.
	pub fn source_maps() -> Self {
		Self {
			matchers: vec![Matcher::Predicate(PathPredicate::new(|path| {
				path.ends_with(SOURCE_MAP_EXTENSION)
			}))],
		}
	}

	pub fn matches(&self, path: &str) -> bool {
		self.matchers.iter().all(|matcher| matcher.matches(path))
	}
}

impl From<Matcher> for PathMatcher {
	fn from(matcher: Matcher) -> Self {
		Self {
			matchers: vec![matcher],
		}
	}
}
