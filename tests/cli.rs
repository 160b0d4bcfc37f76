use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

mod util;
use util::{fixture, raw_tables};

/// Binary with config and credentials isolated from the host.
fn base_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("propsearch"));
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("PROPSEARCH_DATASET")
        .env_remove("PROPSEARCH_MODEL")
        .env_remove("PROPSEARCH_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn extract_offline_prints_filter_json() {
    let home = TempDir::new().unwrap();
    let output = base_cmd(&home)
        .args(["extract", "--offline", "Show me 3BHK flats in Pune under 1.2 Cr"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["type"], "3BHK");
    assert_eq!(json["fullAddress"], "Pune");
    assert_eq!(json["price"]["min"], 0.0);
    assert_eq!(json["price"]["max"], 12_000_000.0);
}

#[test]
fn search_offline_json_reports_matches() {
    let home = TempDir::new().unwrap();
    let data = fixture("listings.csv");
    let output = base_cmd(&home)
        .arg("--data")
        .arg(&data)
        .args([
            "search",
            "--offline",
            "--format",
            "json",
            "3BHK ready to move apartments in Pune",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["count"], 2);
    assert_eq!(json["constrained"], true);
    assert_eq!(json["filters"]["status"], "READY_TO_MOVE");
    assert_eq!(json["results"][0]["projectName"], "Skyline Heights");
}

#[test]
fn search_offline_markdown_limits_rows() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .arg("--data")
        .arg(fixture("listings.csv"))
        .args(["search", "--offline", "--limit", "2", "hello"])
        .assert()
        .success()
        .stdout(contains("# Property Search Results"))
        .stdout(contains("**Results:** 7"))
        .stdout(contains("5 more not shown"));
}

#[test]
fn ask_offline_prints_plain_text() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .arg("--data")
        .arg(fixture("listings.csv"))
        .args(["ask", "--offline", "2 bhk semi-furnished for rent in Wakad, Pune above 800 sqft"])
        .assert()
        .success()
        .stdout(contains("PROPERTY SEARCH RESULTS"))
        .stdout(contains("[1] Palm Residency (2BHK)"));
}

#[test]
fn ask_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .arg("--data")
        .arg(fixture("listings.csv"))
        .args(["ask", "3 bhk in Pune"])
        .assert()
        .code(1)
        .stderr(contains("OPENAI_API_KEY"));
}

#[test]
fn missing_dataset_fails_with_path() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["--data", "/nonexistent/listings.csv", "search", "--offline", "3 bhk"])
        .assert()
        .code(1)
        .stderr(contains("/nonexistent/listings.csv"));
}

#[test]
fn dataset_missing_column_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "projectName,status\nA,READY_TO_MOVE\n").unwrap();

    base_cmd(&home)
        .arg("--data")
        .arg(&bad)
        .args(["search", "--offline", "anything"])
        .assert()
        .code(1)
        .stderr(contains("possessionDate"));
}

#[test]
fn config_file_sets_dataset_path() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("propsearch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "[dataset]\npath = {:?}\n",
            fixture("listings.csv").display().to_string()
        ),
    )
    .unwrap();

    base_cmd(&home)
        .args(["search", "--offline", "--format", "text", "7 bathrooms"])
        .assert()
        .success()
        .stdout(contains("Results: 0 | Filters: bathrooms"));
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.toml");
    std::fs::write(&path, "[synthesis]\nmax_records = 0\n").unwrap();

    base_cmd(&home)
        .arg("--config")
        .arg(&path)
        .args(["extract", "--offline", "3 bhk"])
        .assert()
        .code(1)
        .stderr(contains("max_records"));
}

#[test]
fn prepare_then_search_round_trip() {
    let home = TempDir::new().unwrap();
    let raw = raw_tables();
    let out_dir = TempDir::new().unwrap();
    let cleaned = out_dir.path().join("cleaned.csv");

    base_cmd(&home)
        .arg("prepare")
        .arg("--input-dir")
        .arg(raw.path())
        .arg("--output")
        .arg(&cleaned)
        .assert()
        .success()
        .stdout(contains("wrote 2 rows"));

    let output = base_cmd(&home)
        .arg("--data")
        .arg(&cleaned)
        .args(["search", "--offline", "--format", "json", "2 bhk under 90 lakh"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["projectName"], "Green Meadows");
    assert_eq!(json["results"][0]["price"], 8_500_000.0);
    assert_eq!(json["results"][0]["status"], "UNKNOWN");
    assert_eq!(json["results"][0]["listingType"], "Sell");
}

#[test]
fn prepare_missing_table_fails() {
    let home = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["prepare", "--output"])
        .arg(empty.path().join("out.csv"))
        .arg("--input-dir")
        .arg(empty.path())
        .assert()
        .code(1)
        .stderr(contains("project.csv"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .arg("frobnicate")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}
