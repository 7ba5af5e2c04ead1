//! End-to-end CLI tests: invoke the `tacc` binary against temp source
//! files and assert on stdout/stderr and the written token listing.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn tacc() -> Command {
    Command::cargo_bin("tacc").unwrap()
}

#[test]
fn help_lists_the_binary_name() {
    tacc().arg("--help").assert().success().stdout(predicate::str::contains("tacc"));
}

#[test]
fn compiling_a_well_formed_program_exits_zero_and_writes_the_token_listing() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { int x = 1; return x; }");
    let out = dir.path().join("tokens.txt");

    tacc().arg(&input).arg("-w").arg(&out).assert().success();

    assert!(out.exists(), "token listing should be written to the -w path");
    let listing = std::fs::read_to_string(&out).unwrap();
    assert!(listing.contains("Identifier"));
}

#[test]
fn o0_prints_tac_before_optimization() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { int x = 2 + 3 * 4; int y = 10; return x; }");

    tacc()
        .arg(&input)
        .arg("-o0")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 + 3").or(predicate::str::contains("3 * 4")));
}

#[test]
fn o2_folds_and_eliminates_the_unused_declaration() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { int x = 2 + 3 * 4; int y = 10; return x; }");

    tacc()
        .arg(&input)
        .arg("-o2")
        .assert()
        .success()
        .stdout(predicate::str::contains("14"))
        .stdout(predicate::str::contains("y").not());
}

#[test]
fn s_prints_an_assembly_listing_with_a_return() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { return 42; }");

    tacc().arg(&input).arg("-s").assert().success().stdout(predicate::str::contains("ret"));
}

#[test]
fn uninitialized_use_is_a_semantic_error_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { int x; return x; }");

    tacc()
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("SemanticError"))
        .stderr(predicate::str::contains("initialized"));
}

#[test]
fn division_by_zero_is_a_tac_error() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { return 10 / 0; }");

    tacc().arg(&input).arg("-o1").assert().failure().code(1).stderr(predicate::str::contains("TACError"));
}

#[test]
fn verbose_mode_echoes_phases_to_stderr() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog.c", "int main() { return 0; }");

    tacc().arg(&input).arg("-v").assert().success().stderr(predicate::str::contains("lexing").or(predicate::str::contains("phase")));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does_not_exist.c");

    tacc().arg(&missing).assert().failure().code(1);
}
