use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use async_trait::async_trait;
use futures::future::join_all;

use crate::InterpolateError;
use crate::InterpolateResult;
use crate::builtins::BuiltinReplacement;
use crate::builtins::BuiltinSource;
use crate::builtins::SystemBuiltins;
use crate::builtins::fetch_builtins;
use crate::compilation::Compilation;
use crate::compilation::CompilationId;
use crate::compilation::CompilationInfo;
use crate::config::ReplacerOptions;
use crate::resolver::ReplacementResolver;
use crate::rule::ReplacementRule;
use crate::source::AssetSource;
use crate::source::ReplaceSource;

/// What a replacer knows about the asset it is rewriting.
#[derive(Debug, Clone, Copy)]
pub struct ReplacerContext<'a> {
	pub filename: &'a str,
	pub compilation: &'a CompilationInfo,
}

/// Rewrites assets for the [`Interpolator`].
#[async_trait]
pub trait Replacer: Send + Sync {
	/// Called once per compilation before any asset is rewritten. An error
	/// here aborts the whole pass.
	async fn prepare(&self, _compilation: &CompilationInfo) -> InterpolateResult<()> {
		Ok(())
	}

	/// Rewrite one asset. `Ok(None)` leaves it untouched.
	async fn replace(
		&self,
		source: &AssetSource,
		ctx: &ReplacerContext<'_>,
	) -> InterpolateResult<Option<AssetSource>>;
}

/// The standard replacer: user replacements followed by builtin
/// `%packageJson.*%` and `%GIT_*%` replacements.
pub struct DefaultReplacer {
	options: Arc<ReplacerOptions>,
	builtins: Arc<dyn BuiltinSource>,
	current: Mutex<Option<(CompilationId, Arc<ReplacementResolver>)>>,
}

impl DefaultReplacer {
	pub fn new(options: ReplacerOptions) -> Self {
		Self::with_builtins(options, Arc::new(SystemBuiltins))
	}

	pub fn with_builtins(options: ReplacerOptions, builtins: Arc<dyn BuiltinSource>) -> Self {
		Self {
			options: Arc::new(options),
			builtins,
			current: Mutex::new(None),
		}
	}

	pub fn options(&self) -> &ReplacerOptions {
		&self.options
	}

	/// The resolver for compilation `id`. A new compilation gets a new
	/// resolver, so builtins are fetched again.
	pub fn resolver_for(&self, id: CompilationId) -> Arc<ReplacementResolver> {
		let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

		if let Some((current_id, resolver)) = current.as_ref() {
			if *current_id == id {
				return Arc::clone(resolver);
			}
		}

		let resolver = Arc::new(ReplacementResolver::new(
			Arc::clone(&self.options),
			Arc::clone(&self.builtins),
		));
		*current = Some((id, Arc::clone(&resolver)));
		resolver
	}

	/// The resolved rules for `compilation`.
	pub async fn rules(
		&self,
		compilation: &CompilationInfo,
	) -> InterpolateResult<Arc<[ReplacementRule]>> {
		self.resolver_for(compilation.id())
			.resolve(compilation.context())
			.await
	}

	/// Fetch the builtin key/value pairs, including empty ones.
	pub async fn builtin_replacements(&self, host_context: &Path) -> Vec<BuiltinReplacement> {
		let cwd = self.options.working_dir(host_context);
		fetch_builtins(self.builtins.as_ref(), &cwd).await
	}

	/// The builtin pairs as a flat map, for compile-time constant injection.
	pub async fn define_options(&self, host_context: &Path) -> BTreeMap<String, String> {
		self.builtin_replacements(host_context)
			.await
			.into_iter()
			.map(|replacement| (replacement.key, replacement.value))
			.collect()
	}
}

impl std::fmt::Debug for DefaultReplacer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DefaultReplacer")
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl Replacer for DefaultReplacer {
	async fn prepare(&self, compilation: &CompilationInfo) -> InterpolateResult<()> {
		self.rules(compilation).await.map(|_| ())
	}

	async fn replace(
		&self,
		source: &AssetSource,
		ctx: &ReplacerContext<'_>,
	) -> InterpolateResult<Option<AssetSource>> {
		let rules = self.rules(ctx.compilation).await?;
		let related: Vec<&ReplacementRule> = rules
			.iter()
			.filter(|rule| rule.applies_to(ctx.filename))
			.collect();

		if related.is_empty() {
			return Ok(None);
		}

		let Some(text) = source.text() else {
			tracing::debug!(asset = ctx.filename, "skipping binary asset");
			return Ok(None);
		};

		let mut overlay = ReplaceSource::new(text.into_owned());
		for rule in related {
			let count = rule.apply(&mut overlay);
			tracing::trace!(
				asset = ctx.filename,
				pattern = rule.pattern.as_str(),
				count,
				"applied rule"
			);
		}

		if !overlay.has_edits() {
			return Ok(None);
		}

		Ok(Some(AssetSource::Replaced(overlay)))
	}
}

/// An asset whose rewrite failed. Its content was left unchanged.
#[derive(Debug)]
pub struct AssetError {
	pub filename: String,
	pub error: InterpolateError,
}

/// The outcome of one interpolation pass.
#[derive(Debug, Default)]
pub struct ApplyReport {
	/// Assets whose content changed.
	pub replaced: Vec<String>,
	/// Assets left as they were.
	pub untouched: Vec<String>,
	/// Assets that failed. Other assets were still processed.
	pub errors: Vec<AssetError>,
}

impl ApplyReport {
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}
}

/// Applies a [`Replacer`] to every asset of a compilation.
#[derive(Debug)]
pub struct Interpolator<R = DefaultReplacer> {
	replacer: R,
}

impl<R: Replacer> Interpolator<R> {
	pub fn new(replacer: R) -> Self {
		Self { replacer }
	}

	pub fn replacer(&self) -> &R {
		&self.replacer
	}

	/// Rewrite every asset in `compilation`.
	///
	/// Assets are processed concurrently. A failing asset is recorded in the
	/// report and keeps its content; a failing [`Replacer::prepare`] aborts
	/// the pass with no asset modified.
	pub async fn apply(&self, compilation: &mut Compilation) -> InterpolateResult<ApplyReport> {
		self.replacer.prepare(&compilation.info).await?;

		let info = &compilation.info;
		let outcomes = join_all(compilation.assets.iter().map(|(filename, source)| {
			async move {
				let ctx = ReplacerContext {
					filename: filename.as_str(),
					compilation: info,
				};
				(filename.clone(), self.replacer.replace(source, &ctx).await)
			}
		}))
		.await;

		let mut report = ApplyReport::default();
		for (filename, outcome) in outcomes {
			match outcome {
				Ok(Some(updated)) => {
					compilation.assets.insert(filename.clone(), updated);
					report.replaced.push(filename);
				}
				Ok(None) => report.untouched.push(filename),
				Err(error) => {
					tracing::warn!(asset = %filename, %error, "failed to interpolate asset");
					report.errors.push(AssetError { filename, error });
				}
			}
		}

		Ok(report)
	}
}
