use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use crate::AssetSource;
use crate::BuiltinReplacement;
use crate::BuiltinSource;
use crate::Compilation;
use crate::DefaultReplacer;
use crate::Interpolator;
use crate::ReplacerOptions;

/// A builtin source with fixed answers that counts how often it is asked.
#[derive(Debug, Default)]
pub struct StaticBuiltins {
	pub package: Vec<BuiltinReplacement>,
	pub git: Vec<BuiltinReplacement>,
	pub delay: Option<Duration>,
	pub package_calls: AtomicUsize,
	pub git_calls: AtomicUsize,
}

impl StaticBuiltins {
	pub fn empty() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn new(package: Vec<BuiltinReplacement>, git: Vec<BuiltinReplacement>) -> Arc<Self> {
		Arc::new(Self {
			package,
			git,
			..Self::default()
		})
	}

	pub fn slow(package: Vec<BuiltinReplacement>, git: Vec<BuiltinReplacement>) -> Arc<Self> {
		Arc::new(Self {
			package,
			git,
			delay: Some(Duration::from_millis(20)),
			..Self::default()
		})
	}

	pub fn package_calls(&self) -> usize {
		self.package_calls.load(Ordering::SeqCst)
	}

	pub fn git_calls(&self) -> usize {
		self.git_calls.load(Ordering::SeqCst)
	}

	async fn wait(&self) {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
	}
}

#[async_trait]
impl BuiltinSource for StaticBuiltins {
	async fn package_info(&self, _cwd: &Path) -> Vec<BuiltinReplacement> {
		self.package_calls.fetch_add(1, Ordering::SeqCst);
		self.wait().await;
		self.package.clone()
	}

	async fn git_info(&self, _cwd: &Path) -> Vec<BuiltinReplacement> {
		self.git_calls.fetch_add(1, Ordering::SeqCst);
		self.wait().await;
		self.git.clone()
	}
}

pub fn git_builtins() -> Vec<BuiltinReplacement> {
	vec![
		BuiltinReplacement::new("GIT_DESCRIBE", "v1.2.3-4-gabc1234"),
		BuiltinReplacement::new("GIT_REV", "abc1234"),
		BuiltinReplacement::new("GIT_VERSION", "v1.2.3-4-gabc1234"),
	]
}

pub fn package_builtins() -> Vec<BuiltinReplacement> {
	vec![
		BuiltinReplacement::new("packageJson.name", "demo"),
		BuiltinReplacement::new("packageJson.version", "1.2.3"),
	]
}

pub fn interpolator_with(
	options: ReplacerOptions,
	builtins: Arc<StaticBuiltins>,
) -> Interpolator<DefaultReplacer> {
	Interpolator::new(DefaultReplacer::with_builtins(options, builtins))
}

pub fn compilation_with(assets: &[(&str, &str)]) -> Compilation {
	let mut compilation = Compilation::new("/project");
	for (name, content) in assets {
		compilation.insert_asset(*name, *content);
	}
	compilation
}

/// The asset's content as text, panicking if missing or binary.
pub fn asset_text(compilation: &Compilation, name: &str) -> String {
	let source: &AssetSource = compilation
		.asset(name)
		.unwrap_or_else(|| panic!("missing asset `{name}`"));
	source
		.text()
		.unwrap_or_else(|| panic!("asset `{name}` is not text"))
		.into_owned()
}
