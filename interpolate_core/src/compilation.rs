use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::InterpolateError;
use crate::InterpolateResult;
use crate::source::AssetSource;

static NEXT_COMPILATION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one compilation. Every [`Compilation`] gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompilationId(u64);

impl CompilationId {
	fn next() -> Self {
		Self(NEXT_COMPILATION_ID.fetch_add(1, Ordering::Relaxed))
	}
}

/// The parts of a compilation a replacer may look at.
#[derive(Debug, Clone)]
pub struct CompilationInfo {
	id: CompilationId,
	context: PathBuf,
}

impl CompilationInfo {
	pub fn id(&self) -> CompilationId {
		self.id
	}

	/// The host's context directory.
	pub fn context(&self) -> &Path {
		&self.context
	}
}

/// One build: a context directory and its finalized output assets, keyed by
/// logical name (`/`-separated, relative to the output directory).
#[derive(Debug)]
pub struct Compilation {
	pub(crate) info: CompilationInfo,
	pub assets: BTreeMap<String, AssetSource>,
	/// Files found by [`Compilation::from_dir`] but not loaded because they
	/// exceed the size limit.
	pub skipped: Vec<String>,
}

impl Compilation {
	pub fn new(context: impl Into<PathBuf>) -> Self {
		Self {
			info: CompilationInfo {
				id: CompilationId::next(),
				context: context.into(),
			},
			assets: BTreeMap::new(),
			skipped: Vec::new(),
		}
	}

	/// Load every file under `dir` as an asset. Files larger than
	/// `max_file_size` are not loaded; their names are kept in
	/// [`Compilation::skipped`].
	pub fn from_dir(context: impl Into<PathBuf>, dir: &Path, max_file_size: u64) -> InterpolateResult<Self> {
		let mut compilation = Self::new(context);
		let mut files = Vec::new();
		let mut visited_dirs = HashSet::new();
		walk_dir(dir, &mut files, &mut visited_dirs)?;
		files.sort();

		for path in files {
			let size = std::fs::metadata(&path)?.len();
			let name = asset_name(dir, &path);
			if size > max_file_size {
				tracing::debug!(asset = %name, size, limit = max_file_size, "skipping large asset");
				compilation.skipped.push(name);
				continue;
			}

			let bytes = std::fs::read(&path)?;
			compilation.insert_asset(name, AssetSource::from_bytes(bytes));
		}

		Ok(compilation)
	}

	pub fn info(&self) -> &CompilationInfo {
		&self.info
	}

	pub fn id(&self) -> CompilationId {
		self.info.id
	}

	pub fn context(&self) -> &Path {
		&self.info.context
	}

	pub fn insert_asset(&mut self, name: impl Into<String>, source: impl Into<AssetSource>) {
		self.assets.insert(name.into(), source.into());
	}

	pub fn asset(&self, name: &str) -> Option<&AssetSource> {
		self.assets.get(name)
	}

	/// Write the named assets into `dir`.
	pub fn write_assets<'a>(
		&self,
		dir: &Path,
		names: impl IntoIterator<Item = &'a String>,
	) -> InterpolateResult<()> {
		for name in names {
			let Some(source) = self.assets.get(name) else {
				continue;
			};
			let path = dir.join(name);
			if let Some(parent) = path.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::write(path, source.to_bytes())?;
		}

		Ok(())
	}

	/// Copy the skipped files unchanged from `source_dir` into `dir`.
	pub fn copy_skipped(&self, source_dir: &Path, dir: &Path) -> InterpolateResult<()> {
		for name in &self.skipped {
			let target = dir.join(name);
			if let Some(parent) = target.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::copy(source_dir.join(name), target)?;
		}

		Ok(())
	}
}

fn asset_name(root: &Path, path: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.to_string_lossy()
		.replace('\\', "/")
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> InterpolateResult<()> {
	if !dir.is_dir() {
		return Ok(());
	}

	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(InterpolateError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_dir() {
			walk_dir(&path, files, visited_dirs)?;
		} else if path.is_file() {
			files.push(path);
		}
	}

	Ok(())
}
