use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum InterpolateError {
	#[error(transparent)]
	#[diagnostic(code(interpolate::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(interpolate::config_parse),
		help("check that interpolate.toml is valid TOML with [builtin] and/or [[replacements]] sections")
	)]
	ConfigParse(String),

	#[error("invalid replacement pattern `{pattern}`: {reason}")]
	#[diagnostic(
		code(interpolate::invalid_pattern),
		help("use a plain string to match literal text, or fix the `regex` value")
	)]
	InvalidPattern { pattern: String, reason: String },

	#[error("invalid path matcher `{matcher}`: {reason}")]
	#[diagnostic(
		code(interpolate::invalid_matcher),
		help("matchers accept `true`/`false`, a substring, or `{{ regex = \"...\" }}`")
	)]
	InvalidMatcher { matcher: String, reason: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(interpolate::symlink_cycle),
		help("remove the circular symlink from the output directory")
	)]
	SymlinkCycle { path: String },

	#[error("failed to interpolate `{filename}`: {reason}")]
	#[diagnostic(code(interpolate::replacer))]
	Replacer { filename: String, reason: String },
}

pub type InterpolateResult<T> = Result<T, InterpolateError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
