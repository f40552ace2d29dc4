//! CLI interface tests for the `p4c` driver binary.
//!
//! Exercises the process-level contract from spec.md §6: one positional
//! source path, leading `--name[=value]` tokens ignored, exit 0 on a clean
//! compile and exit 1 with a `file:line:col: error: ...` diagnostic on any
//! fatal stage.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn p4c_bin() -> Command {
    Command::cargo_bin("p4c").expect("p4c binary built")
}

fn write_source(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn compiles_well_typed_program_successfully() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ok.p4", "header H { bit<8> f; bit<16> g; }");

    p4c_bin().arg(&path).assert().success();
}

#[test]
fn missing_argument_is_a_usage_error() {
    p4c_bin()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no input file"));
}

#[test]
fn unreadable_file_is_an_io_error() {
    p4c_bin()
        .arg("/no/such/directory/missing.p4")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn unresolved_type_reference_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "bad.p4", "struct S { NoSuchType f; }");

    p4c_bin()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unresolved"));
}

#[test]
fn diagnostic_carries_file_line_and_column() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "loc.p4", "struct S {\n    NoSuchType f;\n}\n");

    p4c_bin()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("{}:2:", path.display())));
}

#[test]
fn leading_unknown_flags_are_ignored_not_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ok.p4", "header H { bit<8> f; }");

    p4c_bin().arg("--emit=none").arg(&path).assert().success();
}

#[test]
fn ambiguous_type_reference_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_source(
        &dir,
        "ambiguous.p4",
        "struct S { bit<8> a; }\nstruct S { bit<8> b; }\nheader H { S s; }\n",
    );

    p4c_bin()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ambiguous"));
}
