use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::InterpolateResult;
use crate::builtins::BuiltinSource;
use crate::builtins::fetch_builtins;
use crate::config::ReplacerOptions;
use crate::matcher::PathMatcher;
use crate::rule::ReplacementRule;
use crate::rule::ReplacementValue;
use crate::rule::RuleOrigin;
use crate::rule::builtin_pattern;

/// Produces the ordered rule list for one compilation: user rules first, then
/// builtin rules.
///
/// Resolution runs at most once per resolver. Callers arriving while the
/// first resolution is still in flight wait for that same computation instead
/// of starting another. A failed resolution is not cached.
pub struct ReplacementResolver {
	options: Arc<ReplacerOptions>,
	builtins: Arc<dyn BuiltinSource>,
	rules: OnceCell<Arc<[ReplacementRule]>>,
}

impl ReplacementResolver {
	pub fn new(options: Arc<ReplacerOptions>, builtins: Arc<dyn BuiltinSource>) -> Self {
		Self {
			options,
			builtins,
			rules: OnceCell::new(),
		}
	}

	/// Whether a resolution has completed.
	pub fn is_resolved(&self) -> bool {
		self.rules.initialized()
	}

	/// Resolve the rule list. `host_context` is the host's context directory,
	/// used unless the options carry their own.
	pub async fn resolve(&self, host_context: &Path) -> InterpolateResult<Arc<[ReplacementRule]>> {
		let rules = self
			.rules
			.get_or_try_init(|| self.build_rules(host_context))
			.await?;

		Ok(Arc::clone(rules))
	}

	async fn build_rules(&self, host_context: &Path) -> InterpolateResult<Arc<[ReplacementRule]>> {
		// User rules compile before any external lookup.
		let mut rules = self
			.options
			.replacements
			.iter()
			.map(ReplacementRule::from_spec)
			.collect::<InterpolateResult<Vec<_>>>()?;
		let user_count = rules.len();

		let include = PathMatcher::from_optional_spec(self.options.builtin.include.as_ref(), true)?;
		let exclude = match &self.options.builtin.exclude {
			Some(spec) => PathMatcher::from_spec(spec)?,
			None => PathMatcher::source_maps(),
		};

		let cwd = self.options.working_dir(host_context);
		let builtins = fetch_builtins(self.builtins.as_ref(), &cwd).await;
		for builtin in builtins {
			if builtin.value.is_empty() {
				continue;
			}

			rules.push(ReplacementRule {
				pattern: builtin_pattern(&builtin.key)?,
				value: ReplacementValue::Literal(builtin.value),
				include: include.clone(),
				exclude: exclude.clone(),
				origin: RuleOrigin::Builtin,
			});
		}

		tracing::debug!(
			cwd = %cwd.display(),
			user = user_count,
			builtin = rules.len() - user_count,
			"resolved replacement rules"
		);

		Ok(rules.into())
	}
}

impl std::fmt::Debug for ReplacementResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReplacementResolver")
			.field("options", &self.options)
			.field("rules", &self.rules.get())
			.finish_non_exhaustive()
	}
}
