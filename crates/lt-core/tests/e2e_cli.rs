//! CLI E2E tests for log conversion.
//!
//! Validates:
//! - Default run writes `<stem>.json` and `<stem>_parsed.json`
//! - Print mode writes one separator-joined row per message
//! - `--format` lists each channel's layout on stderr
//! - Channel include/ignore patterns
//! - Parquet flat output
//! - Exit codes for missing catalogs and unreadable logs

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use lt_common::{Message, Value};
use lt_core::lcm::{EventLogWriter, TypeCatalog, TypeRegistry};
use predicates::prelude::*;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

const CATALOG: &str = r#"{
  "package": "demo",
  "types": [
    {"name": "pose_t", "members": [
      {"name": "utime", "type": "int64_t"},
      {"name": "pos", "type": "double", "dims": [3]},
      {"name": "frame", "type": "string"}
    ]},
    {"name": "pt_t", "members": [
      {"name": "x", "type": "float"},
      {"name": "y", "type": "float"}
    ]},
    {"name": "path_t", "members": [
      {"name": "utime", "type": "int64_t"},
      {"name": "n", "type": "int32_t"},
      {"name": "pts", "type": "pt_t", "dims": ["n"]}
    ]}
  ]
}"#;

/// Get a Command for the lt-core binary, isolated from the user's config.
fn lt_core(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("lt-core");
    cmd.timeout(Duration::from_secs(60))
        .env_remove("LT_CONFIG")
        .env_remove("LT_TYPE_CATALOGS")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", home)
        .env("HOME", home);
    cmd
}

struct Fixture {
    dir: TempDir,
    catalog: PathBuf,
    log: PathBuf,
}

impl Fixture {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = lt_core(self.dir.path());
        cmd.arg("-t").arg(&self.catalog);
        cmd
    }
}

fn pose(utime: i64, offset: f64, frame: &str) -> Message {
    Message::new("pose_t")
        .with("utime", Value::Int(utime))
        .with(
            "pos",
            Value::Array(vec![
                Value::Float(1.0 + offset),
                Value::Float(2.0 + offset),
                Value::Float(3.0 + offset),
            ]),
        )
        .with("frame", Value::Text(frame.to_string()))
}

fn path(utime: i64, points: &[(f64, f64)]) -> Message {
    let pts = points
        .iter()
        .map(|(x, y)| {
            Value::Record(
                Message::new("pt_t")
                    .with("x", Value::Float(*x))
                    .with("y", Value::Float(*y)),
            )
        })
        .collect();
    Message::new("path_t")
        .with("utime", Value::Int(utime))
        .with("n", Value::Int(points.len() as i64))
        .with("pts", Value::Array(pts))
}

/// Catalog plus a log with three POSE, two PATH and one undecodable ODD event.
fn fixture() -> Fixture {
    let dir = tempdir().expect("tempdir");
    let catalog = dir.path().join("demo.json");
    fs::write(&catalog, CATALOG).expect("write catalog");

    let registry = TypeRegistry::from_catalogs(vec![TypeCatalog::parse_json(CATALOG).expect("catalog")])
        .expect("registry");
    let encode = |name: &str, msg: &Message| registry.encode(name, msg).expect("encode");

    let log = dir.path().join("run.log");
    let mut writer = EventLogWriter::create(&log).expect("create log");
    let events: Vec<(i64, &str, Vec<u8>)> = vec![
        (1_000_000, "POSE", encode("demo.pose_t", &pose(1_000_000, 0.0, "map"))),
        (1_100_000, "ODD", vec![0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 1, 7]),
        (1_200_000, "PATH", encode("demo.path_t", &path(1_200_000, &[(0.5, 0.25)]))),
        (1_500_000, "POSE", encode("demo.pose_t", &pose(1_500_000, 1.0, "map"))),
        (
            1_700_000,
            "PATH",
            encode("demo.path_t", &path(1_700_000, &[(1.0, 2.0), (3.0, 4.0)])),
        ),
        (2_000_000, "POSE", encode("demo.pose_t", &pose(2_000_000, 2.0, "odom"))),
    ];
    for (ts, channel, data) in &events {
        writer.write_event(*ts, channel, data).expect("write event");
    }
    writer.finish().expect("flush log");

    Fixture { dir, catalog, log }
}

fn read_json(path: &Path) -> Json {
    let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e));
    serde_json::from_str(&content).expect("parse JSON")
}

// ============================================================================
// Store mode
// ============================================================================

#[test]
fn test_default_run_writes_flat_and_structured_json() {
    let fx = fixture();
    fx.cmd().arg(&fx.log).assert().success().code(0);

    let flat = read_json(&fx.path("run_log.json"));
    assert_eq!(flat["metadata"]["log_time_column"], true);
    assert_eq!(flat["metadata"]["stats"]["unknown_types"], 1);

    let pose = flat["channels"]["POSE"].as_array().expect("POSE rows");
    assert_eq!(pose.len(), 3);
    assert_eq!(pose[0], serde_json::json!([1_000_000.0, 1.0, 2.0, 3.0, 0.0]));
    assert_eq!(pose[2][4], 1.0);

    let path = flat["channels"]["PATH"].as_array().expect("PATH rows");
    assert_eq!(path.len(), 2);
    // shorter row is zero padded before the log time
    assert_eq!(path[0], serde_json::json!([1_200_000.0, 1.0, 0.5, 0.25, 0.0, 0.0, 0.2]));
    assert_eq!(path[1].as_array().map(Vec::len), Some(7));
    assert!(flat["channels"].get("ODD").is_none());

    let parsed = read_json(&fx.path("run_log_parsed.json"));
    let pose = &parsed["channels"]["POSEParsed"];
    assert_eq!(pose["numMsg"], 3);
    assert_eq!(pose["channel"], "POSE");
    assert_eq!(pose["typename"], "pose_t");
    assert_eq!(pose["frame"], serde_json::json!(["map", "map", "odom"]));
    assert_eq!(pose["pos"][1], serde_json::json!([2.0, 3.0, 4.0]));
    assert_eq!(pose["logTime"], serde_json::json!([[0.0], [0.5], [1.0]]));

    let path = &parsed["channels"]["PATHParsed"];
    assert_eq!(path["numMsg"], 2);
    assert_eq!(path["pts"][1]["numMsg"], 2);
    assert_eq!(path["pts"][1]["x"], serde_json::json!([[1.0], [3.0]]));
}

#[test]
fn test_no_log_time_drops_trailing_column() {
    let fx = fixture();
    fx.cmd()
        .args(["--no-log-time", "-o"])
        .arg(fx.path("out/result"))
        .arg(&fx.log)
        .assert()
        .success();

    let flat = read_json(&fx.path("out/result.json"));
    assert_eq!(flat["metadata"]["log_time_column"], false);
    assert_eq!(flat["channels"]["POSE"][0], serde_json::json!([1_000_000.0, 1.0, 2.0, 3.0]));
    assert!(fx.path("out/result_parsed.json").exists());
}

#[test]
fn test_parquet_writes_one_file_per_channel() {
    let fx = fixture();
    fx.cmd()
        .args(["--flat-format", "parquet"])
        .arg(&fx.log)
        .assert()
        .success();

    let flat_dir = fx.path("run_log_flat");
    assert!(flat_dir.join("POSE.parquet").exists());
    assert!(flat_dir.join("PATH.parquet").exists());
    assert!(!fx.path("run_log.json").exists());
    assert!(fx.path("run_log_parsed.json").exists());
}

// ============================================================================
// Print mode
// ============================================================================

#[test]
fn test_print_mode_rows() {
    let fx = fixture();
    fx.cmd()
        .args(["-p", "-s", ",", "-c", "POSE"])
        .arg(&fx.log)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("POSE,1000000,1,2,3,0\n"))
        .stdout(predicate::str::contains("POSE,2000000,3,4,5,1\n"))
        .stdout(predicate::str::contains("PATH").not());

    assert!(!fx.path("run_log.json").exists());
}

#[test]
fn test_print_mode_to_file() {
    let fx = fixture();
    let out = fx.path("rows.txt");
    fx.cmd()
        .args(["-p", "--no-log-time", "-o"])
        .arg(&out)
        .arg(&fx.log)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let rows = fs::read_to_string(&out).expect("read rows");
    assert_eq!(rows.lines().count(), 5);
    assert!(rows.lines().any(|l| l == "PATH 1700000 2 1 2 3 4"));
}

#[test]
fn test_format_listing_on_stderr() {
    let fx = fixture();
    fx.cmd()
        .args(["-p", "-f", "-c", "POSE"])
        .arg(&fx.log)
        .assert()
        .success()
        .stderr(predicate::str::contains("#POSE  pose_t :"))
        .stderr(predicate::str::contains("#2- pos(3)"))
        .stderr(predicate::str::contains("#5- log_timestamp"));
}

#[test]
fn test_ignore_pattern_skips_channel() {
    let fx = fixture();
    fx.cmd().args(["-i", "PATH"]).arg(&fx.log).assert().success();

    let flat = read_json(&fx.path("run_log.json"));
    assert!(flat["channels"].get("POSE").is_some());
    assert!(flat["channels"].get("PATH").is_none());
}

// ============================================================================
// Error paths
// ============================================================================

#[test]
fn test_missing_catalog_exits_config_error() {
    let fx = fixture();
    lt_core(fx.dir.path())
        .arg(&fx.log)
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("type catalogs"));
}

#[test]
fn test_unreadable_catalog_exits_config_error() {
    let fx = fixture();
    lt_core(fx.dir.path())
        .arg("-t")
        .arg(fx.path("nope.json"))
        .arg(&fx.log)
        .assert()
        .failure()
        .code(10);
}

#[test]
fn test_missing_log_exits_log_error() {
    let fx = fixture();
    fx.cmd()
        .arg(fx.path("missing.log"))
        .assert()
        .failure()
        .code(11);
}

#[test]
fn test_non_lcm_input_exits_log_error() {
    let fx = fixture();
    let bogus = fx.path("bogus.log");
    fs::write(&bogus, b"definitely not an event log").expect("write");
    fx.cmd().arg(&bogus).assert().failure().code(11);
}
