mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

use common::{card_node, fake_graphql_server, page};

#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("pipeboard").unwrap();
    cmd.env_remove("PIPEFY_TOKEN").env_remove("RUST_LOG");
    cmd
}

// --- Help & version ---

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipefy"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pipeboard"));
}

// --- Configuration errors ---

#[test]
fn missing_pipe_id_fails() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(&tmp)
        .arg("summary")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("pipe_id is required"));
}

#[test]
fn missing_explicit_config_fails() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(&tmp)
        .args(["--config", "absent.toml", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn missing_token_fails_with_authentication_error() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(&tmp)
        .args(["--pipe-id", "305708346", "summary"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("authentication error"));
}

#[test]
fn progress_without_completed_phases_fails() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(&tmp)
        .env("PIPEFY_TOKEN", "tok")
        .args(["--pipe-id", "305708346", "progress", "Financeiro"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("completed_phases"));
}

// --- End to end against a fake endpoint ---

fn write_config(dir: &std::path::Path, url: &str) {
    fs::write(
        dir.join("pipeboard.toml"),
        format!(
            "pipe_id = \"305708346\"\napi_url = \"{url}\"\ntoken_env = \"BOARD_TOKEN\"\n\
             completed_phases = [\"Concluído\"]\nexcluded_labels = [\"alta\"]\n"
        ),
    )
    .unwrap();
}

fn two_page_server() -> String {
    let (url, _) = fake_graphql_server(vec![
        (
            200,
            page(
                vec![card_node(
                    "1",
                    "Backlog",
                    "2024-05-01T09:00:00-03:00",
                    &["Financeiro", "alta"],
                )],
                Some("c1"),
                true,
            ),
        ),
        (
            200,
            page(
                vec![card_node("2", "Concluído", "2024-05-03T09:00:00-03:00", &["Financeiro"])],
                None,
                false,
            ),
        ),
    ]);
    url
}

#[test]
fn summary_json_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path(), &two_page_server());

    let output = cmd()
        .current_dir(&tmp)
        .env("BOARD_TOKEN", "tok")
        .args(["summary", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_cards"], 2);
    assert_eq!(json["unique_phases"], 2);
}

#[test]
fn progress_text_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path(), &two_page_server());

    cmd()
        .current_dir(&tmp)
        .env("BOARD_TOKEN", "tok")
        .args(["progress", "Financeiro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50.0%"))
        .stdout(predicate::str::contains("concluído"));
}

#[test]
fn modules_text_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path(), &two_page_server());

    cmd()
        .current_dir(&tmp)
        .env("BOARD_TOKEN", "tok")
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("Financeiro"))
        .stdout(predicate::str::contains("alta").not());
}
