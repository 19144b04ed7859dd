//! Integration tests for the `plm` command line.
//!
//! Every run starts from the built-in seed unless a seed file is given, and
//! nothing carries over between runs.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `plm` command isolated from any seed set in the caller's environment.
fn plm() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_plm"));
    cmd.env_remove("PLM_SEED").env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

const FULL_DRAFT: &str = r#"{
  "phase": {"phaseName": "North Estate", "phaseNumber": "2"},
  "block": {
    "blockName": "Block C", "blockNumber": "12", "areaHectare": "40.5", "areaAcre": "100",
    "status": "Active", "soilType": "Loamy", "drainage": "Good", "accessibility": "Easy",
    "treesPerHectare": "136", "totalTrees": "5500", "palmVariety": "Tenera",
    "plantingDate": "2015-03-01", "palmAge": "2015", "slope": "5%", "estimatedYield": "22"
  },
  "trees": [{
    "treeNumber": "7", "tagType": "Oil Palm Tree", "tagID": "T-0007", "age": "2015",
    "status": "Healthy", "plantingDate": "2015-03-02", "height": "8.5",
    "trunkCircumference": "210", "healthScore": "90", "estimatedYield": "0.2"
  }]
}"#;

// === Task board ===

#[test]
fn test_list_shows_seed_tasks() {
    plm()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tree Pruning - Block A"))
        .stdout(predicate::str::contains("Fertilizer Application - Block D"));
}

#[test]
fn test_list_pending_json_keeps_order() {
    let output = plm()
        .args(["list", "--status", "pending", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "3"]);
    assert_eq!(json[0]["status"], "Pending");
}

#[test]
fn test_list_query_matches_assignee() {
    plm()
        .args(["list", "--query", "SITI"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fertilizer Application"))
        .stdout(predicate::str::contains("Irrigation").not());
}

#[test]
fn test_list_no_match() {
    plm()
        .args(["list", "--query", "Block C", "--status", "in-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found"));
}

#[test]
fn test_view_task() {
    plm()
        .args(["view", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pest Control - Block C"))
        .stdout(predicate::str::contains("Ahmad"));
}

#[test]
fn test_view_unknown_task_fails() {
    plm()
        .args(["view", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

// === Workers ===

#[test]
fn test_recommend_harvesting() {
    plm()
        .args(["recommend", "Harvesting"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ahmad"))
        .stdout(predicate::str::contains("Faiz"))
        .stdout(predicate::str::contains("Siti").not());
}

#[test]
fn test_recommend_unknown_category_is_empty() {
    plm()
        .args(["recommend", "Irrigation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workers with expertise in Irrigation"));
}

#[test]
fn test_workers_and_catalog() {
    plm()
        .arg("workers")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hana"))
        .stdout(predicate::str::contains("Busy"));
    plm()
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mechanisation Fleet"))
        .stdout(predicate::str::contains("Block D"));
}

// === Assignment ===

#[test]
fn test_assign_creates_pending_task_on_top() {
    plm()
        .args([
            "assign", "--category", "Spraying", "--priority", "high",
            "--start", "2024-12-01", "--end", "2024-12-02",
            "--area", "Block C", "--worker", "siti",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task 5-w3: Spraying - Block C -> Siti"))
        .stdout(predicate::str::contains("Workers assigned successfully!"));
}

#[test]
fn test_assign_missing_area_fails() {
    plm()
        .args([
            "assign", "--category", "Spraying", "--priority", "high",
            "--start", "2024-12-01", "--end", "2024-12-02", "--worker", "w3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Please complete all task details and select at least one worker.",
        ))
        .stdout(predicate::str::contains("Workers assigned").not());
}

#[test]
fn test_assign_unknown_worker_fails() {
    plm()
        .args([
            "assign", "--category", "Spraying", "--priority", "low",
            "--start", "today", "--end", "tomorrow", "--area", "Block A", "--worker", "w9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("worker 'w9'"));
}

#[test]
fn test_assign_bad_date_fails() {
    plm()
        .args(["assign", "--start", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse date 'someday'"));
}

#[test]
fn test_assign_out_of_range_date_fails_cleanly() {
    plm()
        .args(["assign", "--start", "in 99999999d"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not parse date 'in 99999999d'"))
        .stderr(predicate::str::contains("panicked").not());
}

// === Seeds and export ===

#[test]
fn test_seed_file_replaces_sections() {
    let temp = TempDir::new().unwrap();
    let seed = temp.path().join("seed.json");
    fs::write(&seed, r#"{"tasks": [], "areas": ["North 1"]}"#).unwrap();

    plm()
        .args(["list", "--json", "--seed"])
        .arg(&seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
    plm()
        .arg("catalog")
        .env("PLM_SEED", &seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("North 1"))
        .stdout(predicate::str::contains("Harvesting"));
}

#[test]
fn test_seed_with_duplicate_ids_is_rejected() {
    let temp = TempDir::new().unwrap();
    let seed = temp.path().join("seed.json");
    let task = r#"{"id": "1", "title": "T", "status": "Pending", "priority": "Low",
                   "assignedTo": "A", "assignedToId": "w1",
                   "startDate": "2024-01-01", "endDate": "2024-01-02"}"#;
    fs::write(&seed, format!(r#"{{"tasks": [{task}, {task}]}}"#)).unwrap();

    plm()
        .arg("list")
        .arg("--seed")
        .arg(&seed)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate task id '1'"));
}

#[test]
fn test_export_round_trips_as_seed() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("snapshot.json");

    plm()
        .args(["export", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 task(s)"));
    assert!(out.exists());

    plm()
        .args(["view", "4", "--seed"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fertilizer Application - Block D"));
}

// === Planting ===

#[test]
fn test_plant_full_draft() {
    let temp = TempDir::new().unwrap();
    let draft = temp.path().join("draft.json");
    fs::write(&draft, FULL_DRAFT).unwrap();

    let output = plm().arg("plant").arg(&draft).output().unwrap();
    assert!(output.status.success());
    let area = stdout_json(&output);
    assert_eq!(area["block"]["phaseName"], "North Estate");
    assert_eq!(area["trees"][0]["block"], "Block C");
    assert_eq!(area["trees"][0]["variety"], "Tenera");
    assert_eq!(area["trees"][0]["tagID"], "T-0007");
}

#[test]
fn test_plant_incomplete_block_names_fields() {
    let temp = TempDir::new().unwrap();
    let draft = temp.path().join("draft.json");
    fs::write(
        &draft,
        r#"{"phase": {"phaseName": "P", "phaseNumber": "1"}, "block": {"blockName": "Block A"}}"#,
    )
    .unwrap();

    plm()
        .arg("plant")
        .arg(&draft)
        .assert()
        .failure()
        .stderr(predicate::str::contains("block form incomplete"))
        .stderr(predicate::str::contains("Soil Type"));
}

#[test]
fn test_completions() {
    plm()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plm"));
}
