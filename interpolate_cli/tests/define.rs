use interpolate_core::AnyEmptyResult;

mod common;

use common::interpolate_cmd;
use common::write_manifest;

#[test]
fn define_json_lists_builtin_values() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_manifest(tmp.path())?;

	let output = interpolate_cmd()
		.arg("define")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let values: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(values["packageJson.name"], "demo");
	assert_eq!(values["packageJson.version"], "1.2.3");
	// Empty values are listed even though no rule is built for them.
	assert_eq!(values["packageJson.description"], "");
	assert!(values.get("GIT_REV").is_some());
	assert!(values.get("GIT_DESCRIBE").is_some());
	assert!(values.get("GIT_VERSION").is_some());

	Ok(())
}

#[test]
fn define_text_shows_placeholders() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_manifest(tmp.path())?;

	interpolate_cmd()
		.arg("define")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Builtin replacements:"))
		.stdout(predicates::str::contains("%packageJson.version%"))
		.stdout(predicates::str::contains("1.2.3"))
		.stdout(predicates::str::contains("(empty, not replaced)"));

	Ok(())
}

#[test]
fn define_respects_configured_context() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_manifest(&tmp.path().join("app"))?;
	std::fs::write(tmp.path().join("interpolate.toml"), "context = \"app\"\n")?;

	let output = interpolate_cmd()
		.arg("define")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let values: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(values["packageJson.name"], "demo");

	Ok(())
}
