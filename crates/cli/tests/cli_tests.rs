// ABOUTME: End-to-end tests for the rewise-cli binary.
// ABOUTME: Runs the offline parse subcommand against temporary feed files and stdin.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn rewise_cmd() -> Command {
    Command::cargo_bin("rewise-cli").unwrap()
}

const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
<channel>
  <title>CLI Show</title>
  <item>
    <title>Pilot</title>
    <enclosure url="https://cdn.example.com/pilot.mp3" type="audio/mpeg" length="100"/>
    <itunes:duration>10:00</itunes:duration>
  </item>
</channel>
</rss>"#;

fn feed_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_parse_file_prints_normalized_json() {
    let file = feed_file(RSS);
    let output = rewise_cmd()
        .args(["parse", "--compact", "--feed-url", "https://feeds.example.com/cli.xml"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["podcast"]["title"], "CLI Show");
    assert_eq!(json["count"], 1);
    assert_eq!(json["episodes"][0]["audioUrl"], "https://cdn.example.com/pilot.mp3");
    assert_eq!(json["episodes"][0]["durationSeconds"], 600);
    assert_eq!(json["feedUrl"], "https://feeds.example.com/cli.xml");
    assert!(json["parsingIssues"].is_null());
}

#[test]
fn test_parse_stdin() {
    rewise_cmd()
        .args(["parse", "-"])
        .write_stdin(RSS)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Pilot\""));
}

#[test]
fn test_parse_empty_feed_fails() {
    let file = feed_file(r#"<rss version="2.0"><channel><title>Nothing</title></channel></rss>"#);
    rewise_cmd()
        .arg("parse")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no episodes found in RSS feed"));
}

#[test]
fn test_parse_missing_file() {
    rewise_cmd()
        .args(["parse", "/definitely/not/here.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}
