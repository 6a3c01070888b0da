//! Integration tests for `cardmatch normalize` and `cardmatch diff`.
#![allow(clippy::expect_used)]

use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;

/// Path to the compiled `cardmatch` binary.
fn cardmatch_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("cardmatch");
    path
}

/// A command for the binary with configuration env vars cleared.
fn cardmatch() -> Command {
    let mut cmd = Command::new(cardmatch_bin());
    cmd.env_remove("CARDMATCH_FORMAT").env_remove("CARDMATCH_LOG");
    cmd
}

/// Path to a shared fixture file.
fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures");
    path.push(name);
    path.to_str().expect("path").to_owned()
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

#[test]
fn normalize_elides_defaults_and_passthrough() {
    let out = cardmatch()
        .args(["normalize", "--compact", &fixture("card-equivalent.json")])
        .output()
        .expect("run cardmatch normalize");
    assert_eq!(out.status.code(), Some(0));
    let card: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert!(card.get("vCardProps").is_none());
    assert!(card["name"].get("@type").is_none());
    let components = card["name"]["components"].as_array().expect("components");
    assert_eq!(components[0]["kind"], "given");
    assert_eq!(components[1], serde_json::json!({"kind": "surname", "value": "Doe"}));
    // Converter fields are only stripped by `diff`.
    assert_eq!(card["prodId"], "Converter 1.0");
}

#[test]
fn normalize_pretty_by_default() {
    let out = cardmatch()
        .args(["normalize", &fixture("card-expected.json")])
        .output()
        .expect("run cardmatch normalize");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("\n  \""), "stdout: {stdout}");
    assert!(!stdout.contains("individual"), "stdout: {stdout}");
}

#[test]
fn normalize_invalid_json_exits_2() {
    let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
    tmp.write_all(b"{not json").expect("write");
    let out = cardmatch()
        .args(["normalize", tmp.path().to_str().expect("path")])
        .output()
        .expect("run cardmatch normalize");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid card"));
}

// ---------------------------------------------------------------------------
// diff
// ---------------------------------------------------------------------------

#[test]
fn diff_equivalent_cards_exits_0() {
    let out = cardmatch()
        .args([
            "diff",
            &fixture("card-expected.json"),
            &fixture("card-equivalent.json"),
        ])
        .output()
        .expect("run cardmatch diff");
    assert_eq!(
        out.status.code(),
        Some(0),
        "stdout: {}",
        String::from_utf8_lossy(&out.stdout)
    );
    assert_eq!(String::from_utf8_lossy(&out.stdout), "cards are equivalent\n");
}

#[test]
fn diff_different_cards_exits_1() {
    let out = cardmatch()
        .args([
            "diff",
            &fixture("card-expected.json"),
            &fixture("card-different.json"),
        ])
        .output()
        .expect("run cardmatch diff");
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains(r#"name/components/1/value: expected "Doe", got "Roe""#),
        "stdout: {stdout}"
    );
    assert!(stdout.ends_with("1 difference\n"), "stdout: {stdout}");
}

#[test]
fn diff_json_reports_paths() {
    let out = cardmatch()
        .args([
            "--format",
            "json",
            "diff",
            &fixture("card-different.json"),
            &fixture("card-expected.json"),
        ])
        .output()
        .expect("run cardmatch diff");
    assert_eq!(out.status.code(), Some(1));
    let first: serde_json::Value = serde_json::from_str(
        String::from_utf8_lossy(&out.stdout)
            .lines()
            .next()
            .expect("one line"),
    )
    .expect("NDJSON line");
    assert_eq!(first["path"], "name/components/1/value");
    assert_eq!(first["expected"], "Roe");
    assert_eq!(first["actual"], "Doe");
}

#[test]
fn diff_rejects_two_stdin_arguments() {
    let out = cardmatch()
        .args(["diff", "-", "-"])
        .output()
        .expect("run cardmatch diff");
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn diff_invalid_observed_exits_2() {
    let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
    tmp.write_all(b"not-valid-json").expect("write");
    let out = cardmatch()
        .args([
            "diff",
            &fixture("card-expected.json"),
            tmp.path().to_str().expect("path"),
        ])
        .output()
        .expect("run cardmatch diff");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid observed card"));
}
