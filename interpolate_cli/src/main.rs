use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use interpolate_cli::Commands;
use interpolate_cli::InterpolateCli;
use interpolate_cli::OutputFormat;
use interpolate_core::ApplyReport;
use interpolate_core::Compilation;
use interpolate_core::DefaultReplacer;
use interpolate_core::InterpolateConfig;
use interpolate_core::InterpolateError;
use interpolate_core::Interpolator;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

const SAMPLE_CONFIG: &str = r#"# interpolate configuration

# Directory holding the build output, relative to the project root.
output = "dist"

# Working directory for the builtin package.json and git lookups.
# context = "."

# Assets larger than this many bytes are left alone.
# max_file_size = 10485760

# Builtin %packageJson.*% and %GIT_*% replacements skip source maps unless
# `exclude` is set here.
# [builtin]
# include = "assets/"
# exclude = { regex = "\\.map$" }

# User replacements run before the builtin ones.
# [[replacements]]
# pattern = "%APP_NAME%"
# value = "my-app"
# exclude = ".map"
#
# [[replacements]]
# pattern = { regex = "__BUILD_(\\w+)__" }
# value = "stamped"
"#;

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = InterpolateCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Apply { out, dry_run, diff }) => {
			run_apply(&args, out.as_deref(), *dry_run, *diff)
		}
		Some(Commands::Define { format }) => run_define(&args, *format),
		Some(Commands::Rules { format }) => run_rules(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `interpolate --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<InterpolateError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `--verbose` shows debug events, otherwise `RUST_LOG`
/// decides and warnings are the default.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.try_init()
		.ok();
}

fn resolve_root(args: &InterpolateCli) -> PathBuf {
	match &args.path {
		Some(path) => std::path::absolute(path).unwrap_or_else(|_| path.clone()),
		None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
	}
}

fn load_config(root: &Path) -> Result<InterpolateConfig, InterpolateError> {
	let config = InterpolateConfig::load(root)?;
	if config.is_none() {
		tracing::debug!(root = %root.display(), "no config file found, using defaults");
	}

	Ok(config.unwrap_or_default())
}

fn run_init(args: &InterpolateCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = InterpolateConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join("interpolate.toml");
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created config file: {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Add placeholders such as %packageJson.version% or %GIT_REV% to your sources");
	println!("  2. Build your project into the `output` directory");
	println!("  3. Run `interpolate apply` to stamp the build output");

	Ok(())
}

fn run_apply(
	args: &InterpolateCli,
	out: Option<&Path>,
	dry_run: bool,
	show_diff: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let has_failures = run_apply_once(args, out, dry_run, show_diff)?;

	if has_failures {
		process::exit(1);
	}

	Ok(())
}

fn run_apply_once(
	args: &InterpolateCli,
	out: Option<&Path>,
	dry_run: bool,
	show_diff: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let output_dir = config.output_dir(&root);

	if !output_dir.is_dir() {
		return Err(format!("output directory not found: {}", output_dir.display()).into());
	}

	let mut compilation = Compilation::from_dir(&root, &output_dir, config.max_file_size)?;
	let originals: BTreeMap<String, String> = if show_diff {
		compilation
			.assets
			.iter()
			.filter_map(|(name, source)| Some((name.clone(), source.text()?.into_owned())))
			.collect()
	} else {
		BTreeMap::new()
	};

	let interpolator = Interpolator::new(DefaultReplacer::new(config.replacer));
	let rt = tokio::runtime::Runtime::new()?;
	let report = rt.block_on(interpolator.apply(&mut compilation))?;

	print_asset_errors(&report, &output_dir, &root);
	print_skipped(&compilation, config.max_file_size);

	if !dry_run {
		let target = out.map_or_else(|| output_dir.clone(), |out| root.join(out));
		if target == output_dir {
			compilation.write_assets(&target, &report.replaced)?;
		} else {
			compilation.write_assets(&target, compilation.assets.keys())?;
			compilation.copy_skipped(&output_dir, &target)?;
		}
	}

	if report.replaced.is_empty() {
		println!("No placeholders found in {} asset(s).", report.untouched.len());
		return Ok(!report.is_ok());
	}

	if dry_run {
		println!("Dry run: would update {} asset(s):", report.replaced.len());
	} else {
		println!(
			"Updated {} of {} asset(s).",
			report.replaced.len(),
			report.replaced.len() + report.untouched.len()
		);
	}

	if dry_run || args.verbose || show_diff {
		for name in &report.replaced {
			let rel = make_relative(&output_dir.join(name), &root);
			println!("  {rel}");

			if show_diff {
				let current = originals.get(name).map_or("", String::as_str);
				let expected = compilation
					.asset(name)
					.and_then(|source| source.text())
					.unwrap_or_default();
				print_diff(current, &expected);
			}
		}
	}

	Ok(!report.is_ok())
}

fn print_asset_errors(report: &ApplyReport, output_dir: &Path, root: &Path) {
	if report.is_ok() {
		return;
	}

	eprintln!(
		"{} {} asset(s) could not be processed:",
		colored!("error:", red),
		report.errors.len()
	);
	for failure in &report.errors {
		let rel = make_relative(&output_dir.join(&failure.filename), root);
		eprintln!("  {rel}: {}", failure.error);
	}
}

fn print_skipped(compilation: &Compilation, max_file_size: u64) {
	if compilation.skipped.is_empty() {
		return;
	}

	eprintln!(
		"{} {} asset(s) larger than {max_file_size} bytes were left unchanged:",
		colored!("warning:", yellow),
		compilation.skipped.len()
	);
	for name in &compilation.skipped {
		eprintln!("  {name}");
	}
}

fn run_define(args: &InterpolateCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let replacer = DefaultReplacer::new(config.replacer);

	let rt = tokio::runtime::Runtime::new()?;
	let define = rt.block_on(replacer.define_options(&root));

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::json!(define));
		}
		OutputFormat::Text => {
			println!("{}", colored!("Builtin replacements:", bold));
			for (key, value) in &define {
				let placeholder = format!("%{key}%");
				if value.is_empty() {
					println!("  {placeholder:<32} {}", colored!("(empty, not replaced)", dimmed));
				} else {
					println!("  {placeholder:<32} {value}");
				}
			}
		}
	}

	Ok(())
}

fn run_rules(args: &InterpolateCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let replacer = DefaultReplacer::new(config.replacer);
	let compilation = Compilation::new(&root);

	let rt = tokio::runtime::Runtime::new()?;
	let rules = rt.block_on(replacer.rules(compilation.info()))?;

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = rules
				.iter()
				.map(|rule| {
					serde_json::json!({
						"origin": rule.origin.to_string(),
						"pattern": rule.pattern.as_str(),
						"value": rule.value.as_literal(),
					})
				})
				.collect();
			println!("{}", serde_json::json!(entries));
		}
		OutputFormat::Text => {
			if rules.is_empty() {
				println!("No replacement rules.");
				return Ok(());
			}

			println!("{}", colored!("Replacement rules:", bold));
			for (index, rule) in rules.iter().enumerate() {
				println!(
					"  {:>3}. {:<8} {} {} {}",
					index + 1,
					colored!(format!("[{}]", rule.origin), dimmed),
					rule.pattern.as_str(),
					colored!("->", dimmed),
					rule.value
				);
			}
		}
	}

	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("    {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("    {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!("     {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
