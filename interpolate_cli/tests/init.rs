use interpolate_core::AnyEmptyResult;
use interpolate_core::InterpolateConfig;

mod common;

use common::interpolate_cmd;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	interpolate_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created config file"));

	let config_path = tmp.path().join("interpolate.toml");
	let content = std::fs::read_to_string(&config_path)?;
	assert!(content.contains("[[replacements]]"));
	assert!(content.contains("[builtin]"));

	let config = InterpolateConfig::parse(&content)?;
	assert_eq!(config.output, std::path::PathBuf::from("dist"));
	assert!(config.replacer.replacements.is_empty());

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let existing = tmp.path().join(".interpolate.toml");
	std::fs::write(&existing, "output = \"public\"\n")?;

	interpolate_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	assert_eq!(std::fs::read_to_string(&existing)?, "output = \"public\"\n");
	assert!(!tmp.path().join("interpolate.toml").exists());

	Ok(())
}

#[test]
fn missing_subcommand_fails() {
	interpolate_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));
}
