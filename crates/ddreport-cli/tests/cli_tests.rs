use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Fixture helpers ────────────────────────────────────────────────────────

/// Player document spanning 2021-02-27 .. 2021-03-03 (UTC).
///
///   Novice/Kobra    5 points, finished 2021-02-28
///   Moderate/Ravine 10 points, finished 2021-03-03
///   Novice/Tutorial 2 points, unfinished
const DOCUMENT: &str = r#"{
    "player": "nameless tee",
    "points": { "points": 17 },
    "first_finish": { "timestamp": 1614384000.25 },
    "last_finishes": [ { "timestamp": 1614729600.5 }, { "timestamp": 1614470400 } ],
    "types": {
        "Novice": {
            "maps": {
                "Kobra": { "points": 5, "first_finish": 1614470400 },
                "Tutorial": { "points": 2 }
            }
        },
        "Moderate": {
            "maps": {
                "Ravine": { "points": 10, "first_finish": 1614729600 }
            }
        }
    }
}"#;

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// `ddreport` with an empty config and no color, so user settings never leak in.
fn ddreport(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ddreport").unwrap();
    cmd.env("DDREPORT_CONFIG", dir.path().join("missing-config"))
        .env_remove("DDREPORT_API_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

// ── Basic commands ─────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let tmp = TempDir::new().unwrap();
    ddreport(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DDNet player finish analytics"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_version() {
    let tmp = TempDir::new().unwrap();
    ddreport(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_report_help_shows_options() {
    let tmp = TempDir::new().unwrap();
    ddreport(&tmp)
        .args(["report", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--utc-offset"))
        .stdout(predicate::str::contains("--input"));
}

#[test]
fn test_missing_player_is_usage_error() {
    let tmp = TempDir::new().unwrap();
    ddreport(&tmp).arg("summary").assert().failure();
}

// ── summary ────────────────────────────────────────────────────────────────

#[test]
fn test_summary_json_from_input() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);

    let output = ddreport(&tmp)
        .args(["summary", "ignored", "--json", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["player"], "nameless tee");
    assert_eq!(json["totalFinished"], 2);
    assert_eq!(json["totalPoints"], 15);
    assert_eq!(json["unfinishedMaps"], 1);
    assert_eq!(json["reportedPoints"], 17);
    assert_eq!(json["firstDay"], "2021-02-27");
    assert_eq!(json["lastDay"], "2021-03-03");
    assert_eq!(json["daily"].as_object().unwrap().len(), 5);
    assert_eq!(json["monthly"].as_object().unwrap().len(), 2);
    assert_eq!(json["monthly"]["2021-02"]["Novice"]["maps"][0], "Kobra");
    assert_eq!(json["monthly"]["2021-03"]["Novice"]["count"], 0);
}

#[test]
fn test_summary_table_from_input() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);

    ddreport(&tmp)
        .args(["summary", "ignored", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Month"))
        .stdout(predicate::str::contains("2021-02"))
        .stdout(predicate::str::contains("2021-03"))
        .stdout(predicate::str::contains("Moderate"))
        .stdout(predicate::str::contains("nameless tee"));
}

#[test]
fn test_summary_daily_skips_quiet_days() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);

    ddreport(&tmp)
        .args(["summary", "ignored", "--daily", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2021-02-28"))
        .stdout(predicate::str::contains("2021-03-03"))
        .stdout(predicate::str::contains("2021-03-01").not());
}

#[test]
fn test_summary_uses_requested_name_when_player_missing() {
    let tmp = TempDir::new().unwrap();
    let without_player = DOCUMENT.replace(r#""player": "nameless tee","#, "");
    let input = write_fixture(tmp.path(), "player.json", &without_player);

    ddreport(&tmp)
        .args(["summary", "brainless tee", "--json", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""player": "brainless tee""#));
}

#[test]
fn test_utc_offset_moves_day_boundaries() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);

    let output = ddreport(&tmp)
        .args(["summary", "ignored", "--json", "--utc-offset", "-1", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["firstDay"], "2021-02-26");
    assert_eq!(json["lastDay"], "2021-03-02");
    assert_eq!(json["daily"]["2021-02-27"]["Novice"]["count"], 1);
    assert_eq!(json["monthly"]["2021-02"]["Novice"]["count"], 1);
    assert_eq!(json["monthly"]["2021-03"]["Moderate"]["count"], 1);
}

#[test]
fn test_utc_offset_out_of_range_fails() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);

    ddreport(&tmp)
        .args(["summary", "ignored", "--utc-offset", "40", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("UTC offset out of range"));
}

// ── export ─────────────────────────────────────────────────────────────────

#[test]
fn test_export_daily_csv_to_file() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);
    let csv_path = tmp.path().join("out.csv");

    ddreport(&tmp)
        .args(["export", "ignored", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&csv_path)
        .assert()
        .success();

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "bucket,category,count,points,cumulative_count,cumulative_points"
    );
    // 5 days x 2 categories
    assert_eq!(lines.len(), 11);
    assert!(lines.contains(&"2021-02-27,Novice,0,0,0,0"));
    assert!(lines.contains(&"2021-02-28,Novice,1,5,1,5"));
    assert!(lines.contains(&"2021-03-02,Moderate,0,0,1,5"));
    assert!(lines.contains(&"2021-03-03,Moderate,1,10,2,15"));
}

#[test]
fn test_export_monthly_csv_to_stdout() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(tmp.path(), "player.json", DOCUMENT);

    ddreport(&tmp)
        .args(["export", "ignored", "--monthly", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2021-02,Novice,1,5,1,5"))
        .stdout(predicate::str::contains("2021-03,Moderate,1,10,2,15"));
}

// ── failures ───────────────────────────────────────────────────────────────

#[test]
fn test_malformed_document_fails() {
    let tmp = TempDir::new().unwrap();
    let input = write_fixture(
        tmp.path(),
        "player.json",
        r#"{ "player": "x", "first_finish": { "timestamp": 1 }, "last_finishes": [] }"#,
    );

    ddreport(&tmp)
        .args(["summary", "x", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid player document"));
}

#[test]
fn test_map_without_points_fails() {
    let tmp = TempDir::new().unwrap();
    let broken = DOCUMENT.replace(r#""Tutorial": { "points": 2 }"#, r#""Tutorial": {}"#);
    let input = write_fixture(tmp.path(), "player.json", &broken);

    ddreport(&tmp)
        .args(["export", "x", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_input_file_fails() {
    let tmp = TempDir::new().unwrap();

    ddreport(&tmp)
        .args(["summary", "x", "--input"])
        .arg(tmp.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_unreachable_api_fails() {
    let tmp = TempDir::new().unwrap();

    ddreport(&tmp)
        .args([
            "summary",
            "x",
            "--no-spinner",
            "--api-url",
            "http://127.0.0.1:1/players/",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load report for x"));
}
