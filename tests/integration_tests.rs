use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn stackasm() -> Command {
    let mut cmd = Command::cargo_bin("stackasm").unwrap();
    // Status lines are coloured otherwise
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("STACKASM_STACK_SIZE");
    cmd
}

#[test]
fn runs_without_arguments() {
    stackasm().assert().success();
}

#[test]
fn runs_lowercase_source() {
    stackasm()
        .arg("run")
        .arg("tests/files/add.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("STACK 8\n"))
        .stdout(contains("FLAGS Z=0 S=0 P=1 C=0 O=0\n"))
        .stdout(contains("Completed"));
}

#[test]
fn bare_path_runs() {
    stackasm()
        .arg("tests/files/add.asm")
        .assert()
        .success()
        .stdout(contains("Running"));
}

#[test]
fn runs_counting_loop() {
    stackasm()
        .args(["run", "tests/files/sum.asm", "--minimal"])
        .assert()
        .success()
        .stdout(contains("PC 16\n"))
        .stdout(contains("R1 0\n"))
        .stdout(contains("STACK 15\n"))
        .stdout(contains("MEM 40=15\n"))
        .stdout(contains("FLAGS Z=1 S=0 P=1 C=0 O=0\n"));
}

#[test]
fn splits_wide_product() {
    stackasm()
        .args(["run", "tests/files/mul.asm", "--minimal"])
        .assert()
        .success()
        .stdout(contains("R1 3\nR2 0\n"))
        .stdout(contains("SP 0\n"));
}

#[test]
fn limit_stops_endless_loop() {
    stackasm()
        .args(["run", "tests/files/loop.asm", "--minimal", "--limit", "10"])
        .assert()
        .success()
        .stdout(contains("Stopped"))
        .stdout(contains("after 10 steps"))
        .stdout(contains("PC 2\n"));
}

#[test]
fn steps_without_terminal() {
    stackasm()
        .args(["step", "tests/files/add.asm", "--minimal"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(contains("  0 PUSH #5\n"))
        .stdout(contains("  2 ADD\nPC 3\n"))
        .stdout(contains("STACK 5 3\n"));
}

#[test]
fn reports_fault() {
    stackasm()
        .args(["run", "tests/files/underflow.asm", "--minimal"])
        .assert()
        .success()
        .stdout(contains("FAULT pop from empty stack at PC 1"))
        .stdout(contains("Halted"));
}

#[test]
fn stack_size_flag_and_variable() {
    stackasm()
        .args(["run", "tests/files/add.asm", "--minimal", "--stack-size", "1"])
        .assert()
        .success()
        .stdout(contains("FAULT stack overflow at PC 1"));

    stackasm()
        .args(["run", "tests/files/add.asm", "--minimal"])
        .env("STACKASM_STACK_SIZE", "1")
        .assert()
        .success()
        .stdout(contains("FAULT stack overflow at PC 1"));
}

#[test]
fn lex_error_names_line() {
    stackasm()
        .args(["check", "tests/files/bad_char.asm"])
        .assert()
        .failure()
        .stderr(contains("Wrong character '$' at line 2"));
}

#[test]
fn undefined_label_is_reported() {
    stackasm()
        .args(["check", "tests/files/undefined.asm"])
        .assert()
        .failure()
        .stderr(contains("Undefined label 'NOWHERE'"));
}

#[test]
fn check_passes_valid_source() {
    stackasm()
        .args(["check", "tests/files/sum.asm"])
        .assert()
        .success()
        .stdout(contains("no errors found!"));
}

#[test]
fn compiles_then_runs_listing() {
    let dest = std::env::temp_dir().join(format!("stackasm-sum-{}.bin", std::process::id()));

    stackasm()
        .arg("compile")
        .arg("tests/files/sum.asm")
        .arg(&dest)
        .assert()
        .success()
        .stdout(contains("Saved"));

    let listing = std::fs::read_to_string(&dest).unwrap();
    assert_eq!(listing.lines().count(), 17);
    assert!(listing
        .lines()
        .all(|line| line.len() == 35 && line.chars().all(|c| c == '0' || c == '1')));

    stackasm()
        .arg("run")
        .arg(&dest)
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("MEM 40=15\n"));

    std::fs::remove_file(&dest).unwrap();
}

#[test]
fn rejects_unknown_extension() {
    stackasm()
        .args(["run", "Cargo.toml"])
        .assert()
        .failure()
        .stderr(contains("unknown extension").or(contains("Exiting")));
}
