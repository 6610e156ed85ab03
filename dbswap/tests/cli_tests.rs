//! End-to-end tests running the compiled `dbswap` binary.
//!
//! These verify exit statuses, the files left behind, and the messages
//! written to the log stream.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TEMPLATE: &str = r#"{"dashboards":[{"__Dashboard__":{"slices":[{"__Slice__":{"params":"{\"database_name\":\"old\"}"}}]}}],"datasources":[{"__SqlaTable__":{"params":"{\"database_name\":\"old\"}"}}]}"#;

fn dbswap(dir: &Path, args: &[&str]) -> Output {
    dbswap_with_env(dir, args, &[])
}

fn dbswap_with_env(dir: &Path, args: &[&str], vars: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbswap"))
        .current_dir(dir)
        .args(args)
        .env_remove("DBSWAP_DATABASE_NAME")
        .env_remove("DBSWAP_INPUT_FILE")
        .env_remove("DBSWAP_OUTPUT_FILE")
        .env_remove("RUST_LOG")
        .envs(vars.iter().copied())
        .output()
        .expect("Failed to run dbswap binary")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_structured_file_rewrite_with_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pgd_monitoring_template.json"), TEMPLATE).unwrap();

    let output = dbswap(dir.path(), &["new"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let log = stderr(&output);
    assert!(log.contains("Database name entered: new"));
    assert!(log.contains("Upload file generated"));
    assert!(log.contains("'upload.json'"));

    let written = std::fs::read_to_string(dir.path().join("upload.json")).unwrap();
    assert_eq!(written.matches(r#"{\"database_name\":\"new\"}"#).count(), 2);
}

#[test]
fn test_structured_file_rewrite_with_flags() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("import_template.json"), TEMPLATE).unwrap();

    let output = dbswap(
        dir.path(),
        &["-d", "prod", "-i", "import_template.json", "-o", "prod.json"],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("prod.json")).unwrap())
            .unwrap();
    assert_eq!(
        document["datasources"][0]["__SqlaTable__"]["params"],
        "{\"database_name\":\"prod\"}"
    );
}

#[test]
fn test_positional_name_overrides_environment() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pgd_monitoring_template.json"), TEMPLATE).unwrap();

    let output = dbswap_with_env(dir.path(), &["bdrdb"], &[("DBSWAP_DATABASE_NAME", "envdb")]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Database name entered: bdrdb"));
    let written = std::fs::read_to_string(dir.path().join("upload.json")).unwrap();
    assert_eq!(written.matches(r#"{\"database_name\":\"bdrdb\"}"#).count(), 2);
}

#[test]
fn test_database_name_from_environment() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pgd_monitoring_template.json"), TEMPLATE).unwrap();

    let output = dbswap_with_env(dir.path(), &[], &[("DBSWAP_DATABASE_NAME", "envdb")]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Database name entered: envdb"));
}

#[test]
fn test_plain_text_file_rewrite() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("import.txt"), "db=template_database_name;x=1").unwrap();

    let output = dbswap(
        dir.path(),
        &["prod", "--mode", "plain-text", "-i", "import.txt", "-o", "upload.txt"],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("upload.txt")).unwrap(),
        "db=prod;x=1"
    );
}

#[test]
fn test_exit_code_on_wrong_extension() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("template.txt"), TEMPLATE).unwrap();

    let output = dbswap(dir.path(), &["new", "-i", "template.txt"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("must have JSON extension"));
    assert!(!dir.path().join("upload.json").exists());
}

#[test]
fn test_exit_code_on_missing_input() {
    let dir = TempDir::new().unwrap();

    let output = dbswap(dir.path(), &["new", "-i", "absent.json"]);

    assert_eq!(output.status.code(), Some(1));
    let log = stderr(&output);
    assert!(log.contains("ERROR"));
    assert!(log.contains("not found"));
    assert!(!dir.path().join("upload.json").exists());
}

#[test]
fn test_exit_code_on_malformed_template() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pgd_monitoring_template.json"), "{\"dashboards\": [").unwrap();

    let output = dbswap(dir.path(), &["new"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Malformed input"));
    assert!(!dir.path().join("upload.json").exists());
}

#[test]
fn test_exit_code_on_missing_database_name() {
    let dir = TempDir::new().unwrap();

    let output = dbswap(dir.path(), &[]);

    // Usage errors are reported by clap with its own status
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_verbose_reports_counts() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pgd_monitoring_template.json"), TEMPLATE).unwrap();

    let output = dbswap(dir.path(), &["new", "-v"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let log = stderr(&output);
    assert!(log.contains("params_rewritten=2"), "{log}");
    assert!(log.contains("bytes_written="), "{log}");
}

#[test]
fn test_quiet_suppresses_info() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pgd_monitoring_template.json"), TEMPLATE).unwrap();

    let output = dbswap(dir.path(), &["new", "-q"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(!stderr(&output).contains("Database name entered"));
    assert!(dir.path().join("upload.json").exists());
}
