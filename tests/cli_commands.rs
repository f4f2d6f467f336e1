#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
    db: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let db = dir.path().join("store").join("data.dat");
        Self { dir, db }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("cli.toml")
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("rbstore");
        cmd.env_remove("RBSTORE_DB")
            .env_remove("RUST_LOG")
            .env("RBSTORE_CONFIG", self.config_path())
            .arg("--db")
            .arg(&self.db);
        cmd
    }

    fn run_ok(&self, args: &[&str]) -> Vec<u8> {
        self.cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--format", "json"];
        full.extend_from_slice(args);
        let out = self.run_ok(&full);
        serde_json::from_slice(&out).expect("valid json")
    }

    fn seed(&self) {
        self.run_ok(&["flight", "add", "BA7", "250"]);
        self.run_ok(&["flight", "add", "AC101", "120"]);
        self.run_ok(&[
            "customer", "add", "Ada", "555-0101", "--address", "2 Short St", "--flight", "BA7",
            "--seat", "3",
        ]);
        self.run_ok(&["customer", "add", "Bob", "555-0102", "--flight", "AC101"]);
        self.run_ok(&["customer", "add", "Cy", "555-0103"]);
    }
}

fn stdout_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).expect("utf8 stdout")
}

#[test]
fn flight_commands_persist_to_the_file() {
    let sb = Sandbox::new();
    sb.seed();
    assert!(sb.db.exists());

    let list = sb.json(&["flight", "list"]);
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["AC101", "BA7"]);

    let shown = sb.json(&["flight", "show", "BA7"]);
    assert_eq!(shown["seats"], 250);

    sb.run_ok(&["flight", "remove", "AC101"]);
    let text = stdout_text(&sb.run_ok(&["flight", "list"]));
    assert!(text.contains("BA7"));
    assert!(!text.contains("AC101"));
}

#[test]
fn duplicate_flight_fails_without_changing_the_file() {
    let sb = Sandbox::new();
    sb.run_ok(&["flight", "add", "BA7", "250"]);
    let before = fs::read(&sb.db).unwrap();

    sb.cmd()
        .args(["flight", "add", "BA7", "99"])
        .assert()
        .failure()
        .code(1);
    assert_eq!(fs::read(&sb.db).unwrap(), before);
    assert_eq!(sb.json(&["flight", "show", "BA7"])["seats"], 250);
}

#[test]
fn negative_seat_count_is_rejected() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["flight", "add", "BA7", "--", "-4"])
        .assert()
        .failure();
    assert!(!sb.db.exists());
}

#[test]
fn customer_listing_filters_by_flight() {
    let sb = Sandbox::new();
    sb.seed();

    let all = sb.json(&["customer", "list"]);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let on_ba7 = sb.json(&["customer", "list", "--flight", "BA7"]);
    let names: Vec<&str> = on_ba7
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada"]);

    let cy = sb.json(&["customer", "show", "Cy", "555-0103"]);
    assert_eq!(cy["seat"], -1);
    assert_eq!(cy["flight_id"], "");

    let ada = stdout_text(&sb.run_ok(&["customer", "show", "Ada", "555-0101"]));
    assert!(ada.contains("Ada, 2 Short St, 555-0101"));
    assert!(ada.contains("seat=3"));
}

#[test]
fn removing_an_unknown_customer_fails() {
    let sb = Sandbox::new();
    sb.seed();
    sb.cmd()
        .args(["customer", "remove", "Nobody", "000"])
        .assert()
        .failure()
        .code(1);
    sb.run_ok(&["customer", "remove", "Bob", "555-0102"]);
    assert_eq!(sb.json(&["customer", "list"]).as_array().unwrap().len(), 2);
}

#[test]
fn stats_reports_both_stores() {
    let sb = Sandbox::new();
    sb.seed();
    let stats = sb.json(&["stats"]);
    assert_eq!(stats["flights"]["records"], 2);
    assert_eq!(stats["customers"]["records"], 3);
    assert!(stats["customers"]["black_height"].is_number());
    assert!(stats["filesystem"]["db_size_bytes"].as_u64().unwrap() > 2);
}

#[test]
fn stats_on_missing_file_fails() {
    let sb = Sandbox::new();
    sb.cmd().arg("stats").assert().failure().code(1);
}

#[test]
fn verify_succeeds_on_healthy_file() {
    let sb = Sandbox::new();
    sb.seed();
    let report = sb.json(&["verify"]);
    assert_eq!(report["success"], true);
    assert_eq!(report["counts"]["customers"], 3);
}

#[test]
fn verify_flags_a_corrupted_file() {
    let sb = Sandbox::new();
    sb.run_ok(&["flight", "add", "BA7", "250"]);
    let mut bytes = fs::read(&sb.db).unwrap();
    bytes[1] = 1;
    fs::write(&sb.db, bytes).unwrap();

    let output = sb
        .cmd()
        .args(["--format", "json", "verify"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["success"], false);
    assert!(report["findings"][0]["message"]
        .as_str()
        .unwrap()
        .contains("root is red"));

    // normal commands refuse the file
    sb.cmd().args(["flight", "list"]).assert().failure().code(1);
}

#[test]
fn config_file_supplies_the_default_database() {
    let sb = Sandbox::new();
    let configured = sb.dir.path().join("configured.dat");
    write_config(&sb.config_path(), &configured);

    let mut cmd = cargo_bin_cmd!("rbstore");
    cmd.env_remove("RBSTORE_DB")
        .env("RBSTORE_CONFIG", sb.config_path())
        .args(["flight", "add", "QF1", "300"])
        .assert()
        .success();
    assert!(configured.exists());
    assert!(!sb.db.exists());

    let out = sb.run_ok(&["config"]);
    let text = stdout_text(&out);
    assert!(text.contains("max_depth = 64"));
}

fn write_config(path: &Path, db: &Path) {
    let body = format!(
        "[database]\ndefault = {:?}\n\n[limits]\nmax_depth = 64\n",
        db.display().to_string()
    );
    fs::write(path, body).unwrap();
}
