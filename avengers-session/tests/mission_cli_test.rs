mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use common::avengers;

const SUBTASKS: &str = r#"{
    "task": "Evaluate three vendors",
    "subtasks": [
        {"id": "t0", "description": "Research vendor pricing"},
        {"id": "t1", "description": "Survey internal users", "mode": "existing", "existing_agent_id": "survey-bot"},
        {"id": "t2", "description": "Write the recommendation report", "dependencies": ["t0", "t1"]}
    ]
}"#;

fn mission_dir(workspace: &Path, id: &str) -> PathBuf {
    workspace.join("avengers-missions").join(id)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Assemble the three-agent mission and return its id.
fn assemble(workspace: &Path) -> String {
    let subtasks = workspace.join("subtasks.json");
    fs::write(&subtasks, SUBTASKS).unwrap();

    let output = avengers(workspace)
        .args(["assemble", "--subtasks"])
        .arg(&subtasks)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    value["mission"]["id"].as_str().unwrap().to_string()
}

fn write_artifact(workspace: &Path, id: &str, index: usize, content: &str) {
    let path = mission_dir(workspace, id)
        .join("outputs")
        .join(format!("{}_agent_{:02}.md", id, index));
    fs::write(path, content).unwrap();
}

#[test]
fn assemble_writes_mission_plan_and_agents() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    let dir = mission_dir(temp.path(), &id);

    let mission = read_json(&dir.join("mission.json"));
    assert_eq!(mission["status"], "initializing");
    assert_eq!(mission["task"], "Evaluate three vendors");

    let plan = read_json(&dir.join("execution_plan.json"));
    assert_eq!(plan["total_agents"], 3);
    assert_eq!(plan["phases"][0]["parallel"], true);
    assert_eq!(plan["phases"][0]["agents"].as_array().unwrap().len(), 2);
    assert_eq!(plan["phases"][1]["parallel"], false);
    assert_eq!(plan["phases"][1]["agents"][0]["id"], format!("{}_agent_02", id));
    assert_eq!(plan["commands"][1]["type"], "send");
    assert_eq!(plan["commands"][1]["params"]["label"], "survey-bot");

    assert!(dir.join("agents").join(format!("{}_agent_00.json", id)).exists());
    assert!(dir.join("outputs").is_dir());
}

#[test]
fn assemble_task_only_creates_mission_without_plan() {
    let temp = TempDir::new().unwrap();

    avengers(temp.path())
        .args(["assemble", "--task", "Plan the offsite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No subtasks given"));

    let missions: Vec<_> = fs::read_dir(temp.path().join("avengers-missions"))
        .unwrap()
        .collect();
    assert_eq!(missions.len(), 1);
    let dir = missions[0].as_ref().unwrap().path();
    assert!(dir.join("mission.json").exists());
    assert!(!dir.join("execution_plan.json").exists());
}

#[test]
fn assemble_rejects_malformed_subtasks() {
    let temp = TempDir::new().unwrap();
    let subtasks = temp.path().join("bad.json");
    fs::write(&subtasks, r#"{"subtasks": [{"type": "coder"}]}"#).unwrap();

    avengers(temp.path())
        .args(["assemble", "--subtasks"])
        .arg(&subtasks)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid subtask list"));
}

#[test]
fn assemble_requires_task_or_subtasks() {
    let temp = TempDir::new().unwrap();
    avengers(temp.path()).arg("assemble").assert().failure();
}

#[test]
fn execute_renders_commands_and_marks_executing() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    let dir = mission_dir(temp.path(), &id);

    avengers(temp.path())
        .args(["execute", "--mission", &id, "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions_spawn({"))
        .stdout(predicate::str::contains("sessions_send({"))
        .stdout(predicate::str::contains("dispatch these 2 together"));

    assert_eq!(read_json(&dir.join("mission.json"))["status"], "executing");
    let script = fs::read_to_string(dir.join("execute_commands.md")).unwrap();
    assert!(script.contains("## Phase 2 (sequential)"));

    let log = fs::read_to_string(dir.join("logs").join("execution.jsonl")).unwrap();
    assert!(log.contains("execution_started"));
}

#[test]
fn execute_dry_run_leaves_status_alone() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());

    avengers(temp.path())
        .args(["execute", "--mission", &id, "--dry-run"])
        .assert()
        .success();

    let mission = read_json(&mission_dir(temp.path(), &id).join("mission.json"));
    assert_eq!(mission["status"], "initializing");
}

#[test]
fn execute_without_plan_fails() {
    let temp = TempDir::new().unwrap();
    avengers(temp.path())
        .args(["assemble", "--task", "No plan here", "--format", "json"])
        .assert()
        .success();
    let entry = fs::read_dir(temp.path().join("avengers-missions"))
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    let id = entry.file_name().to_string_lossy().to_string();

    avengers(temp.path())
        .args(["execute", "--mission", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Execution plan for mission"));
}

#[test]
fn status_json_reports_rounded_progress() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    write_artifact(temp.path(), &id, 0, "pricing table");
    write_artifact(temp.path(), &id, 2, "");

    let output = avengers(temp.path())
        .args(["status", "--mission", &id, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["mission"]["id"], id.as_str());
    assert_eq!(value["progress"]["completed"], 2);
    assert_eq!(value["progress"]["total"], 3);
    assert_eq!(value["progress"]["percent"], 67);
    assert_eq!(value["agents"][1]["status"], "missing");
    assert_eq!(value["agents"][0]["output_size"], 13);
    assert!(!value["logs"].as_array().unwrap().is_empty());
}

#[test]
fn status_text_shows_bar_and_phases() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    write_artifact(temp.path(), &id, 0, "done");

    avengers(temp.path())
        .args(["status", "--mission", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress: 1/3 (33%)"))
        .stdout(predicate::str::contains("Phase 2:"))
        .stdout(predicate::str::contains("(4 bytes)"));
}

#[test]
fn status_missing_mission_fails() {
    let temp = TempDir::new().unwrap();
    avengers(temp.path())
        .args(["status", "--mission", "19990101_000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn status_watch_exits_once_complete() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    for index in 0..3 {
        write_artifact(temp.path(), &id, index, "result");
    }

    let mut cmd = avengers(temp.path());
    cmd.args(["status", "--mission", &id, "--watch", "--interval", "1"]);
    assert_cmd::Command::from_std(cmd)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("All agents finished"));
}

#[test]
fn consolidate_incomplete_exits_one_then_force_completes() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    let dir = mission_dir(temp.path(), &id);
    write_artifact(temp.path(), &id, 0, "Vendor A is cheapest.");
    write_artifact(temp.path(), &id, 1, "");

    avengers(temp.path())
        .args(["consolidate", "--mission", &id])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("empty: "))
        .stderr(predicate::str::contains("missing: "));
    assert!(!dir.join("FINAL_REPORT.md").exists());

    avengers(temp.path())
        .args(["consolidate", "--mission", &id, "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("partial"));

    let report = fs::read_to_string(dir.join("FINAL_REPORT.md")).unwrap();
    assert!(report.contains("Vendor A is cheapest."));
    assert!(report.contains("## Metadata"));

    let mission = read_json(&dir.join("mission.json"));
    assert_eq!(mission["status"], "completed");
    assert!(mission["completed_at"].is_string());
    assert_eq!(mission["validation"]["success"], false);
    assert_eq!(mission["validation"]["completed"], 1);
}

#[test]
fn consolidate_json_with_custom_output() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    for index in 0..3 {
        write_artifact(temp.path(), &id, index, "section");
    }
    let report_path = temp.path().join("out").join("report.md");

    let output = avengers(temp.path())
        .args(["consolidate", "--mission", &id, "--format", "json", "--output"])
        .arg(&report_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["mission_id"], id.as_str());
    assert_eq!(value["validation"]["success"], true);
    assert_eq!(
        value["report_path"].as_str().map(PathBuf::from),
        Some(report_path.clone())
    );
    assert!(report_path.exists());
}

#[test]
fn list_shows_missions() {
    let temp = TempDir::new().unwrap();
    avengers(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No missions"));

    let id = assemble(temp.path());
    avengers(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("initializing"));
}

#[test]
fn execute_after_consolidate_keeps_completed_status() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    let dir = mission_dir(temp.path(), &id);
    for index in 0..3 {
        write_artifact(temp.path(), &id, index, "finished");
    }

    avengers(temp.path())
        .args(["consolidate", "--mission", &id])
        .assert()
        .success();
    let consolidated = read_json(&dir.join("mission.json"));

    avengers(temp.path())
        .args(["execute", "--mission", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("already completed"));

    let mission = read_json(&dir.join("mission.json"));
    assert_eq!(mission["status"], "completed");
    assert_eq!(mission["completed_at"], consolidated["completed_at"]);
    assert_eq!(mission["validation"]["success"], true);
}

#[test]
fn execute_twice_keeps_executing() {
    let temp = TempDir::new().unwrap();
    let id = assemble(temp.path());
    let dir = mission_dir(temp.path(), &id);

    for _ in 0..2 {
        avengers(temp.path())
            .args(["execute", "--mission", &id])
            .assert()
            .success();
    }

    assert_eq!(read_json(&dir.join("mission.json"))["status"], "executing");
    let log = fs::read_to_string(dir.join("logs").join("execution.jsonl")).unwrap();
    assert_eq!(log.matches("execution_started").count(), 1);
}
