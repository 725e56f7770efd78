//! Drives the compiled `microc` binary end-to-end against fixture scripts.

use assert_cmd::Command;
use predicates::prelude::*;

fn microc() -> Command {
    Command::cargo_bin("microc").unwrap()
}

#[test]
fn runs_a_script_file_and_prints_framed_output() {
    microc()
        .arg("tests/fixtures/collatz.mc")
        .assert()
        .success()
        .stdout(predicate::str::contains("__P__125\n__P__"));
}

#[test]
fn reads_a_script_from_stdin() {
    let src = std::fs::read_to_string("tests/fixtures/collatz.mc").unwrap();
    microc()
        .arg("-")
        .write_stdin(src)
        .assert()
        .success()
        .stdout(predicate::str::contains("__P__125\n__P__"));
}

#[test]
fn scope_violation_halts_with_nonzero_exit_and_framed_error() {
    microc()
        .arg("tests/fixtures/scope_violation.mc")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("__ER__"));
}

#[test]
fn syntax_error_reports_to_stderr_and_exits_nonzero() {
    microc()
        .arg("tests/fixtures/bad_syntax.mc")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn send_bool_errors_without_embedded_flag() {
    microc()
        .arg("tests/fixtures/send_bool.mc")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("embedded"));
}

#[test]
fn send_bool_succeeds_with_embedded_flag() {
    microc()
        .arg("--embedded")
        .arg("tests/fixtures/send_bool.mc")
        .assert()
        .success();
}

#[test]
fn missing_file_reports_io_error() {
    microc()
        .arg("tests/fixtures/does_not_exist.mc")
        .assert()
        .failure()
        .code(2);
}
