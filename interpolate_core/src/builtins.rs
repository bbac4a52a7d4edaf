use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;

/// File searched for, upwards from the working directory.
pub const MANIFEST_FILE_NAME: &str = "package.json";
/// Prefix of every key flattened out of the manifest.
pub const MANIFEST_ROOT_KEY: &str = "packageJson";
pub const GIT_DESCRIBE_KEY: &str = "GIT_DESCRIBE";
pub const GIT_REV_KEY: &str = "GIT_REV";
pub const GIT_VERSION_KEY: &str = "GIT_VERSION";

/// A builtin key and its value, before the key is wrapped into a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltinReplacement {
	pub key: String,
	pub value: String,
}

impl BuiltinReplacement {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

/// Where builtin values come from.
///
/// Lookups never fail: anything that goes wrong contributes no entries.
#[async_trait]
pub trait BuiltinSource: Send + Sync {
	/// Flattened `package.json` entries reachable from `cwd`.
	async fn package_info(&self, cwd: &Path) -> Vec<BuiltinReplacement>;
	/// `GIT_DESCRIBE`, `GIT_REV` and `GIT_VERSION` for the repository at `cwd`.
	async fn git_info(&self, cwd: &Path) -> Vec<BuiltinReplacement>;
}

/// Run both lookups concurrently. Manifest entries come first, and only the
/// first entry for each key is kept.
pub async fn fetch_builtins(source: &dyn BuiltinSource, cwd: &Path) -> Vec<BuiltinReplacement> {
	let (package, git) = tokio::join!(source.package_info(cwd), source.git_info(cwd));
	let mut seen = HashSet::new();

	package
		.into_iter()
		.chain(git)
		.filter(|replacement| seen.insert(replacement.key.clone()))
		.collect()
}

/// Reads the real file system and runs the `git` client.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBuiltins;

#[async_trait]
impl BuiltinSource for SystemBuiltins {
	async fn package_info(&self, cwd: &Path) -> Vec<BuiltinReplacement> {
		let Some(manifest_path) = find_up(MANIFEST_FILE_NAME, cwd).await else {
			tracing::debug!(cwd = %cwd.display(), "no {MANIFEST_FILE_NAME} found");
			return Vec::new();
		};

		let bytes = match tokio::fs::read(&manifest_path).await {
			Ok(bytes) => bytes,
			Err(error) => {
				tracing::debug!(path = %manifest_path.display(), %error, "failed to read manifest");
				return Vec::new();
			}
		};

		match serde_json::from_slice::<Value>(&bytes) {
			Ok(manifest) => flatten_manifest(&manifest),
			Err(error) => {
				tracing::debug!(path = %manifest_path.display(), %error, "failed to parse manifest");
				Vec::new()
			}
		}
	}

	async fn git_info(&self, cwd: &Path) -> Vec<BuiltinReplacement> {
		let (describe, rev) = tokio::join!(
			run_git(cwd, &["describe", "--tags"]),
			run_git(cwd, &["rev-parse", "--short", "HEAD"]),
		);

		git_replacements(describe.as_deref(), rev.as_deref())
	}
}

/// Search `start` and each of its ancestors for a file called `name`. A
/// relative `start` is resolved against the current directory first.
pub async fn find_up(name: &str, start: &Path) -> Option<PathBuf> {
	let start: PathBuf = std::path::absolute(start)
		.unwrap_or_else(|_| start.to_path_buf())
		.components()
		.collect();
	let mut dir = Some(start.as_path());

	while let Some(current) = dir {
		let candidate = current.join(name);
		if tokio::fs::metadata(&candidate)
			.await
			.is_ok_and(|metadata| metadata.is_file())
		{
			return Some(candidate);
		}
		dir = current.parent();
	}

	None
}

/// Run `git` with `args` in `cwd`, returning trimmed stdout on success.
async fn run_git(cwd: &Path, args: &[&str]) -> Option<String> {
	let output = Command::new("git")
		.args(args)
		.current_dir(cwd)
		.kill_on_drop(true)
		.output()
		.await;

	let output = match output {
		Ok(output) => output,
		Err(error) => {
			tracing::debug!(?args, %error, "failed to run git");
			return None;
		}
	};

	if !output.status.success() {
		tracing::debug!(
			?args,
			status = ?output.status.code(),
			stderr = %String::from_utf8_lossy(&output.stderr).trim(),
			"git exited unsuccessfully"
		);
		return None;
	}

	Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Derive the git keys from the two query results. `GIT_VERSION` is the tag
/// description when there is one, otherwise the revision.
pub fn git_replacements(describe: Option<&str>, rev: Option<&str>) -> Vec<BuiltinReplacement> {
	let describe = describe.map(str::trim).unwrap_or_default();
	let rev = rev.map(str::trim).unwrap_or_default();
	let version = if describe.is_empty() { rev } else { describe };

	vec![
		BuiltinReplacement::new(GIT_DESCRIBE_KEY, describe),
		BuiltinReplacement::new(GIT_REV_KEY, rev),
		BuiltinReplacement::new(GIT_VERSION_KEY, version),
	]
}

/// Flatten a parsed manifest into dotted keys under [`MANIFEST_ROOT_KEY`].
///
/// Objects and arrays recurse (array items keyed by index) and contribute
/// nothing when empty. Scalars are stringified; `null` becomes `"null"`.
pub fn flatten_manifest(manifest: &Value) -> Vec<BuiltinReplacement> {
	let mut replacements = Vec::new();
	flatten_into(MANIFEST_ROOT_KEY.to_string(), manifest, &mut replacements);
	replacements
}

fn flatten_into(key: String, value: &Value, out: &mut Vec<BuiltinReplacement>) {
	match value {
		Value::Object(map) => {
			for (child, value) in map {
				flatten_into(format!("{key}.{child}"), value, out);
			}
		}
		Value::Array(items) => {
			for (index, value) in items.iter().enumerate() {
				flatten_into(format!("{key}.{index}"), value, out);
			}
		}
		Value::String(text) => out.push(BuiltinReplacement::new(key, text.as_str())),
		Value::Null => out.push(BuiltinReplacement::new(key, "null")),
		Value::Bool(flag) => out.push(BuiltinReplacement::new(key, flag.to_string())),
		Value::Number(number) => out.push(BuiltinReplacement::new(key, number.to_string())),
	}
}
