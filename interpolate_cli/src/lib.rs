use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Stamp package and git metadata into build output.",
	long_about = "interpolate replaces placeholders in finished build assets.\n\nUser rules come \
	              from `interpolate.toml`. Builtin rules replace `%packageJson.<field>%` with \
	              values from the nearest package.json and `%GIT_DESCRIBE%`, `%GIT_REV%` and \
	              `%GIT_VERSION%` with the repository state. Source maps are skipped by the \
	              builtin rules unless configured otherwise.\n\nQuick start:\n  interpolate init   \
	              Create a sample interpolate.toml\n  interpolate apply  Rewrite the output \
	              directory\n  interpolate define Show the builtin values"
)]
pub struct InterpolateCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize interpolate in a project by creating a sample config file.
	///
	/// Creates an `interpolate.toml` file in the project root. If a config
	/// file already exists, this command is a no-op and exits successfully.
	Init,
	/// Replace placeholders in every asset of the output directory.
	///
	/// Loads every file under the configured `output` directory as one
	/// compilation, applies user replacements followed by the builtin ones
	/// and writes the changed files back. Exits with status 1 when any asset
	/// could not be processed.
	Apply {
		/// Write the processed assets to this directory instead of
		/// rewriting the output directory in place.
		#[arg(long)]
		out: Option<PathBuf>,

		/// Preview changes without writing files. Prints which assets would
		/// be modified.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Show a unified diff for each modified asset.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Print the builtin replacement values for this project.
	///
	/// Includes keys whose value is empty, such as `GIT_DESCRIBE` in a
	/// repository without tags.
	Define {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print the resolved replacement rules in the order they apply.
	Rules {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
