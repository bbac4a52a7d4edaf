use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::InterpolateError;
use crate::InterpolateResult;
use crate::matcher::MatcherSpec;
use crate::rule::ReplacementSpec;

/// Default maximum asset size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default build output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"interpolate.toml",
	".interpolate.toml",
	".config/interpolate.toml",
];

/// Which assets the builtin replacements run on.
///
/// ```toml
/// [builtin]
/// include = "assets/"
/// exclude = [{ regex = "\\.map$" }]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuiltinOptions {
	/// Defaults to every path.
	#[serde(default)]
	pub include: Option<MatcherSpec>,
	/// Defaults to paths ending in `.map`.
	#[serde(default)]
	pub exclude: Option<MatcherSpec>,
}

/// Options for [`DefaultReplacer`](crate::DefaultReplacer).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplacerOptions {
	/// Working directory for builtin lookups. Relative paths are resolved
	/// against the host's context directory.
	#[serde(default)]
	pub context: Option<PathBuf>,
	/// User replacements, applied before the builtin ones.
	#[serde(default)]
	pub replacements: Vec<ReplacementSpec>,
	#[serde(default)]
	pub builtin: BuiltinOptions,
}

impl ReplacerOptions {
	#[must_use]
	pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
		self.context = Some(context.into());
		self
	}

	#[must_use]
	pub fn with_replacement(mut self, replacement: ReplacementSpec) -> Self {
		self.replacements.push(replacement);
		self
	}

	#[must_use]
	pub fn with_builtin_include(mut self, spec: impl Into<MatcherSpec>) -> Self {
		self.builtin.include = Some(spec.into());
		self
	}

	#[must_use]
	pub fn with_builtin_exclude(mut self, spec: impl Into<MatcherSpec>) -> Self {
		self.builtin.exclude = Some(spec.into());
		self
	}

	/// The directory builtin lookups run in: the configured context when
	/// set, otherwise the host's context directory. An empty host context
	/// means the host has none, and the process's current directory is used.
	pub fn working_dir(&self, host_context: &Path) -> PathBuf {
		let host_context = if host_context.as_os_str().is_empty() {
			std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
		} else {
			host_context.to_path_buf()
		};

		match &self.context {
			Some(context) if context.is_absolute() => context.clone(),
			Some(context) => host_context.join(context),
			None => host_context,
		}
	}
}

/// Configuration loaded from an `interpolate.toml` file.
///
/// ```toml
/// context = "."
/// output = "dist"
///
/// [builtin]
/// exclude = ".map"
///
/// [[replacements]]
/// pattern = "%hello%"
/// value = "world"
///
/// [[replacements]]
/// pattern = { regex = "__BUILD_(\\w+)__" }
/// value = "stamped"
/// exclude = [{ regex = "\\.map$" }]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct InterpolateConfig {
	#[serde(flatten)]
	pub replacer: ReplacerOptions,
	/// Directory holding the build output, relative to the project root.
	#[serde(default = "default_output_dir")]
	pub output: PathBuf,
	/// Maximum asset size in bytes. Larger assets are left alone.
	/// Defaults to 10 MB.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
}

impl Default for InterpolateConfig {
	fn default() -> Self {
		Self {
			replacer: ReplacerOptions::default(),
			output: default_output_dir(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

fn default_output_dir() -> PathBuf {
	PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl InterpolateConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> InterpolateResult<Option<InterpolateConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::parse(&content).map(Some)
	}

	pub fn parse(content: &str) -> InterpolateResult<InterpolateConfig> {
		toml::from_str(content).map_err(|e| InterpolateError::ConfigParse(e.to_string()))
	}

	/// The output directory as an absolute path under `root`.
	pub fn output_dir(&self, root: &Path) -> PathBuf {
		root.join(&self.output)
	}
}
