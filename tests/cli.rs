//! Binary-level checks through assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("hostaudit")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("security posture"));
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("hostaudit")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hostaudit"));
}

// The platform gate refuses to run anywhere the management interfaces do
// not exist.
#[cfg(not(windows))]
#[test]
fn non_windows_platform_exits_fatally() {
    Command::cargo_bin("hostaudit")
        .unwrap()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported platform"));
}
