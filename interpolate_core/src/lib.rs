//! `interpolate_core` stamps values into build output. After a build has
//! produced its assets, every placeholder in every text asset is replaced in
//! one pass, using rules declared by the user plus a builtin set derived from
//! the project's `package.json` and its git state.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Compilation (context directory + finalized assets)
//!   → Interpolator (fans out over assets)
//!   → DefaultReplacer (one ReplacementResolver per compilation)
//!   → ReplacementResolver (user rules, then builtin rules; resolved once)
//!   → ReplaceSource (range edits over the original text, materialized once)
//! ```
//!
//! ## Builtin Replacements
//!
//! | Placeholder             | Value                                          |
//! | ----------------------- | ---------------------------------------------- |
//! | `%packageJson.<path>%`  | Any field of the nearest `package.json`        |
//! | `%GIT_DESCRIBE%`        | `git describe --tags`                          |
//! | `%GIT_REV%`             | `git rev-parse --short HEAD`                   |
//! | `%GIT_VERSION%`         | The tag description, else the revision         |
//!
//! Builtin replacements skip `.map` assets unless `[builtin] exclude` says
//! otherwise. Missing manifests and failing git commands contribute nothing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use interpolate_core::Compilation;
//! use interpolate_core::DefaultReplacer;
//! use interpolate_core::Interpolator;
//! use interpolate_core::ReplacementSpec;
//! use interpolate_core::ReplacerOptions;
//!
//! # async fn run() -> interpolate_core::InterpolateResult<()> {
//! let options = ReplacerOptions::default()
//! 	.with_replacement(ReplacementSpec::new("%hello%", "world").exclude(".map"));
//! let interpolator = Interpolator::new(DefaultReplacer::new(options));
//!
//! let mut compilation = Compilation::new(".");
//! compilation.insert_asset("main.js", "console.log('%hello%', '%GIT_VERSION%')");
//!
//! let report = interpolator.apply(&mut compilation).await?;
//! assert!(report.is_ok());
//! # Ok(())
//! # }
//! ```

pub use builtins::*;
pub use compilation::*;
pub use config::*;
pub use error::*;
pub use interpolator::*;
pub use matcher::*;
pub use resolver::*;
pub use rule::*;
pub use source::*;

mod builtins;
mod compilation;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod interpolator;
mod matcher;
mod resolver;
mod rule;
mod source;

#[cfg(test)]
mod __fixtures;
