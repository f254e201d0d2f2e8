use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn tally_help_works() {
    Command::cargo_bin("tally")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("personal task tracking"));
}

#[test]
fn tally_version_works() {
    Command::cargo_bin("tally")
        .expect("binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("tally"));
}
