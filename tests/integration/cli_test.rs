use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn survey() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("survey").unwrap();
    for key in [
        "SURVEY_SMTP_HOST",
        "SURVEY_SMTP_USERNAME",
        "SURVEY_SMTP_PASSWORD",
        "SURVEY_FROM_ADDRESS",
        "SURVEY_ADMIN_NAME",
        "SURVEY_ADMIN_EMAIL",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    survey().arg("init").current_dir(dir.path()).assert().success();
    dir
}

fn json_output(dir: &Path, args: &[&str]) -> Value {
    let output = survey()
        .args(args)
        .arg("--json")
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

const FEEDBACK_DRAFT: &str = r#"{
    "title": "Product feedback",
    "description": "Tell us how we did",
    "questions": [
        {"id": "q1", "title": "Your thoughts", "type": "text", "required": true},
        {"id": "q2", "title": "Pick some", "type": "multiple-choice", "options": ["A", "B", "C"]},
        {"id": "q3", "title": "Recommend us?", "type": "nps", "category": "loyalty"}
    ],
    "delivery": {"distribution": "manual", "recipients": ["pat@example.com"]}
}"#;

/// Create the feedback survey and return its full id.
fn create_feedback_survey(dir: &Path) -> String {
    let draft = dir.join("draft.json");
    fs::write(&draft, FEEDBACK_DRAFT).unwrap();
    let created = json_output(dir, &["survey", "create", "--file", draft.to_str().unwrap()]);
    created["id"].as_str().unwrap().to_string()
}

#[test]
fn init_creates_survey_dir() {
    let dir = TempDir::new().unwrap();
    survey()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains(".survey"));

    assert!(dir.path().join(".survey/config.json").exists());
    assert!(dir.path().join(".survey/records/survey").is_dir());
    assert!(dir.path().join(".survey/indexes").is_dir());
}

#[test]
fn init_twice_fails() {
    let dir = init_repo();
    survey()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .failure();
}

#[test]
fn commands_outside_repo_fail() {
    let dir = TempDir::new().unwrap();
    survey()
        .args(["survey", "list"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("not a survey repository"));
}

#[test]
fn list_empty_repo() {
    let dir = init_repo();
    survey()
        .args(["survey", "list"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("No surveys."));
}

#[test]
fn create_and_show_survey() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());

    survey()
        .args(["survey", "show", &id[..8]])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("Product feedback"))
        .stdout(predicates::str::contains("*q1 [text] Your thoughts"))
        .stdout(predicates::str::contains("range: 0-10"));

    let shown = json_output(dir.path(), &["survey", "show", &id]);
    assert_eq!(shown["status"], "active");
    assert_eq!(shown["questions"].as_array().unwrap().len(), 3);
}

#[test]
fn create_rejects_invalid_draft() {
    let dir = init_repo();
    let draft = dir.path().join("bad.json");
    fs::write(
        &draft,
        r#"{"title": "Bad", "questions": [{"title": "Pick", "type": "dropdown", "options": ["only"]}]}"#,
    )
    .unwrap();
    survey()
        .args(["survey", "create", "--file", draft.to_str().unwrap()])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("at least 2 options"));
}

#[test]
fn respond_with_multiple_values() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());

    let response = json_output(
        dir.path(),
        &[
            "respond", &id, "-a", "q1=hello", "-a", "Answers[q2]=A", "-a", "q2=C", "-a", "q3=9",
            "--name", "Robin", "--device", "mobile", "--time", "125",
        ],
    );
    let answers = response["answers"].as_array().unwrap();
    assert_eq!(answers[0]["answer"], "hello");
    assert_eq!(answers[1]["multiple_answers"], serde_json::json!(["A", "C"]));
    assert!(answers[1].get("answer").is_none());
    assert_eq!(answers[2]["score_value"], 9.0);

    let shown = json_output(dir.path(), &["survey", "show", &id]);
    assert_eq!(shown["response_count"], 1);
    assert_eq!(shown["completion_rate"], 100.0);
}

#[test]
fn respond_missing_required_answer_fails() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());

    survey()
        .args(["respond", &id, "-a", "q1=", "-a", "q2=A"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("Your thoughts"));

    let shown = json_output(dir.path(), &["survey", "show", &id]);
    assert_eq!(shown["response_count"], 0);
}

#[test]
fn respond_rejects_malformed_answer() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    survey()
        .args(["respond", &id, "-a", "hello"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("question_id=value"));
}

#[test]
fn inactive_survey_refuses_responses() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    survey()
        .args(["survey", "status", &id, "inactive"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("now inactive"));

    survey()
        .args(["respond", &id, "-a", "q1=hi"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("not accepting responses"));
}

#[test]
fn unknown_survey_status_is_rejected() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    survey()
        .args(["survey", "status", &id, "paused"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("paused"));
}

#[test]
fn response_metrics_and_dashboard() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    let response = json_output(
        dir.path(),
        &["respond", &id, "-a", "q1=great", "-a", "q3=10", "--time", "125"],
    );
    let response_id = response["id"].as_str().unwrap().to_string();
    json_output(dir.path(), &["respond", &id, "-a", "q1=meh", "-a", "q2=B", "-a", "q3=4"]);

    survey()
        .args(["analytics", "response", &response_id[..10]])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("Completion time: 2m 5s"));

    let metrics = json_output(dir.path(), &["analytics", "response", &response_id]);
    assert_eq!(metrics["question_count"], 2);
    assert_eq!(metrics["validation_rate"], 100.0);

    let dashboard = json_output(dir.path(), &["analytics", "dashboard", &id]);
    assert_eq!(dashboard["total_responses"], 2);
    assert_eq!(dashboard["completion_rate"], 50.0);
    assert_eq!(dashboard["questions"][2]["net_promoter_score"], 0.0);
    assert_eq!(dashboard["category_scores"]["loyalty"], 7.0);
}

#[test]
fn recent_responses_newest_first() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    json_output(dir.path(), &["respond", &id, "-a", "q1=first"]);
    let second = json_output(dir.path(), &["respond", &id, "-a", "q1=second"]);

    let recent = json_output(dir.path(), &["analytics", "recent", "-n", "1"]);
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["id"], second["id"]);
}

#[test]
fn send_queues_invitations_in_outbox() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    survey()
        .args(["survey", "send", &id])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("1 recipients"));

    let outbox = fs::read_to_string(dir.path().join(".survey/outbox.jsonl")).unwrap();
    assert!(outbox.contains("pat@example.com"));
    assert!(outbox.contains("Product feedback"));
}

#[test]
fn send_without_recipients_fails() {
    let dir = init_repo();
    let draft = dir.path().join("draft.json");
    fs::write(&draft, r#"{"title": "Quiet", "questions": []}"#).unwrap();
    let created = json_output(dir.path(), &["survey", "create", "--file", draft.to_str().unwrap()]);
    let id = created["id"].as_str().unwrap();

    survey()
        .args(["survey", "send", id])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("no recipients"));
}

#[test]
fn delete_survey_removes_responses() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    json_output(dir.path(), &["respond", &id, "-a", "q1=hi"]);

    survey()
        .args(["survey", "delete", &id])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("1 responses"));

    let recent = json_output(dir.path(), &["analytics", "recent"]);
    assert!(recent.as_array().unwrap().is_empty());
    survey()
        .args(["survey", "show", &id])
        .current_dir(dir.path())
        .assert()
        .failure();
}

#[test]
fn suggestion_lifecycle_notifies_submitter() {
    let dir = init_repo();
    let created = json_output(
        dir.path(),
        &["suggestion", "submit", "Dark mode", "--name", "Sam", "--email", "sam@example.com"],
    );
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "new");

    let updated = json_output(
        dir.path(),
        &["suggestion", "respond", &id, "reviewed", "-m", "Planned for next release"],
    );
    assert_eq!(updated["status"], "reviewed");
    assert_eq!(updated["response"], "Planned for next release");

    let outbox = fs::read_to_string(dir.path().join(".survey/outbox.jsonl")).unwrap();
    assert!(outbox.contains("sam@example.com"));

    survey()
        .args(["suggestion", "list", "--status", "reviewed"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("Dark mode"))
        .stdout(predicates::str::contains("50%"));
}

#[test]
fn anonymous_suggestion_is_not_mailed() {
    let dir = init_repo();
    let created = json_output(dir.path(), &["suggestion", "submit", "Faster exports", "--anonymous"]);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created.get("customer").is_none());

    json_output(dir.path(), &["suggestion", "respond", &id, "implemented", "-m", "Done"]);
    assert!(!dir.path().join(".survey/outbox.jsonl").exists());
}

#[test]
fn suggestion_unknown_status_fails() {
    let dir = init_repo();
    let created = json_output(dir.path(), &["suggestion", "submit", "Idea", "--anonymous"]);
    let id = created["id"].as_str().unwrap().to_string();
    survey()
        .args(["suggestion", "respond", &id, "shipped"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("shipped"));
}

#[test]
fn requirement_update_tracks_completion() {
    let dir = init_repo();
    let created = json_output(
        dir.path(),
        &["requirement", "propose", "CSV export", "-d", "Export responses", "--category", "reporting"],
    );
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "proposed");

    let updated = json_output(
        dir.path(),
        &["requirement", "update", &id, "--status", "in-progress", "--completion", "40"],
    );
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["completion"], 40);

    survey()
        .args(["requirement", "update", &id, "--completion", "140"])
        .current_dir(dir.path())
        .assert()
        .failure();

    let listed = json_output(dir.path(), &["requirement", "list", "--category", "reporting"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn submitter_identity_never_comes_from_admin_env() {
    let dir = init_repo();
    let created = survey()
        .args(["suggestion", "submit", "From env", "--json"])
        .env("SURVEY_ADMIN_NAME", "Avery")
        .env("SURVEY_ADMIN_EMAIL", "avery@example.com")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(created.status.success());
    let created: Value = serde_json::from_slice(&created.stdout).unwrap();
    assert!(created.get("customer").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    survey()
        .args(["suggestion", "respond", &id, "reviewed", "-m", "Thanks"])
        .env("SURVEY_ADMIN_EMAIL", "avery@example.com")
        .current_dir(dir.path())
        .assert()
        .success();
    assert!(!dir.path().join(".survey/outbox.jsonl").exists());

    let named = json_output(
        dir.path(),
        &["suggestion", "submit", "Named", "--email", "kim@example.com"],
    );
    assert_eq!(named["customer"]["name"], "Unknown");
    assert_eq!(named["customer"]["email"], "kim@example.com");
}

#[test]
fn reindex_rebuilds_response_index() {
    let dir = init_repo();
    let id = create_feedback_survey(dir.path());
    json_output(dir.path(), &["respond", &id, "-a", "q1=hi"]);
    fs::remove_file(dir.path().join(".survey/indexes/responses.json")).unwrap();

    survey()
        .arg("reindex")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("responses: 1 entries"));

    let responses = json_output(dir.path(), &["response", "list", &id]);
    assert_eq!(responses.as_array().unwrap().len(), 1);
}

#[test]
fn show_with_short_prefix_fails() {
    let dir = init_repo();
    create_feedback_survey(dir.path());
    survey()
        .args(["survey", "show", "ab"])
        .current_dir(dir.path())
        .assert()
        .failure();
}
