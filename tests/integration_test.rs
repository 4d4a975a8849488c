#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn watchrc_cmd() -> assert_cmd::Command {
	assert_cmd::Command::cargo_bin("watchrc").unwrap()
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
	let path = dir.join("watchrc.conf");
	fs::write(&path, content).unwrap();
	path
}

const EXAMPLE: &str = "\
config:
    foreground true
    stdout daemon.log
env:
    LANG C
watch:
    /srv/incoming
default:
    add /bin/echo added
/\\.txt$/f:
    delete /bin/echo deleted
";

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_help_flag() {
	watchrc_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("filesystem notification daemon"));
}

#[test]
fn test_version_flag() {
	watchrc_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("watchrc"));
}

#[test]
fn test_no_args_shows_help() {
	watchrc_cmd()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// check tests
// ============================================================================

#[test]
fn test_check_valid_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config = write_config(temp_dir.path(), EXAMPLE);

	watchrc_cmd()
		.arg("check")
		.arg("--config")
		.arg(&config)
		.assert()
		.success()
		.stdout(predicate::str::contains("ok (5 sections, 1 rules)"));

	assert!(temp_dir.path().join("daemon.log").exists());
}

#[test]
fn test_check_reports_located_error() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config = write_config(temp_dir.path(), "config:\n    subprocess_limit abc\n");

	watchrc_cmd()
		.arg("check")
		.arg("--config")
		.arg(&config)
		.assert()
		.failure()
		.stderr(predicate::str::contains(
			"watchrc.conf:2: invalid value 'abc' for subprocess_limit should be an integer",
		));
}

#[test]
fn test_check_invalid_section_name() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config = write_config(temp_dir.path(), "watch:\n    /tmp\nbadname:\n    add x\n");

	watchrc_cmd()
		.args(["check", "--config"])
		.arg(&config)
		.assert()
		.failure()
		.stderr(predicate::str::contains("watchrc.conf:3: invalid regexp section 'badname'"));
}

#[test]
fn test_check_missing_file() {
	let temp_dir = tempfile::tempdir().unwrap();

	watchrc_cmd()
		.args(["check", "--config"])
		.arg(temp_dir.path().join("nope.conf"))
		.assert()
		.failure()
		.stderr(predicate::str::contains("nope.conf:0: failed to read"));
}

#[test]
fn test_override_is_validated() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config = write_config(temp_dir.path(), EXAMPLE);

	watchrc_cmd()
		.args(["check", "--set", "debug=many", "--config"])
		.arg(&config)
		.assert()
		.failure()
		.stderr(predicate::str::contains("invalid value 'many' for debug"));
}

#[test]
fn test_override_syntax_is_checked() {
	watchrc_cmd()
		.args(["check", "--set", "debug"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("expected KEY=VALUE"));
}

// ============================================================================
// dump / show tests
// ============================================================================

#[test]
fn test_dump_output() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config = write_config(temp_dir.path(), EXAMPLE);

	watchrc_cmd()
		.args(["dump", "--config"])
		.arg(&config)
		.assert()
		.success()
		.stdout(predicate::str::contains("# from line 10\n/\\.txt$/f:"))
		.stdout(predicate::str::contains("  add \"/bin/echo\" \"added\""))
		.stdout(predicate::str::contains("  foreground True"));
}

#[test]
fn test_show_output() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config = write_config(temp_dir.path(), EXAMPLE);

	watchrc_cmd()
		.args(["show", "--set", "subprocess_limit=3", "--config"])
		.arg(&config)
		.assert()
		.success()
		.stdout(predicate::str::contains("foreground: true"))
		.stdout(predicate::str::contains("subprocess_limit: 3"))
		.stdout(predicate::str::contains("LANG=C"))
		.stdout(predicate::str::contains("/srv/incoming"))
		.stdout(predicate::str::contains("(dir: false, file: true): delete, add"));
}

#[test]
fn test_base_dir_flag() {
	let temp_dir = tempfile::tempdir().unwrap();
	let logs = temp_dir.path().join("logs");
	fs::create_dir(&logs).unwrap();
	let config = write_config(temp_dir.path(), EXAMPLE);

	watchrc_cmd()
		.args(["check", "--config"])
		.arg(&config)
		.arg("--base-dir")
		.arg(&logs)
		.assert()
		.success();

	assert!(logs.join("daemon.log").exists());
}
