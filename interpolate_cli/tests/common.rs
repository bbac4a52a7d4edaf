#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn interpolate_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("interpolate"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

pub fn write_manifest(root: &Path) -> std::io::Result<()> {
	write_file(
		root,
		"package.json",
		r#"{ "name": "demo", "version": "1.2.3", "description": "" }"#,
	)
}
