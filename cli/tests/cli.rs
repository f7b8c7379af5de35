//! End-to-end checks of the `nudge` binary.
//!
//! Every command runs with a cleared environment inside a temp directory so
//! neither a stray `nudge.toml` nor the caller's `NUDGE_*` variables leak in.

use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn nudge_command(storage: &Path, cwd: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("nudge")?;
    cmd.env_clear();
    cmd.env("NUDGE_STORAGE__DIR", storage);
    cmd.env("RUST_LOG", "warn");
    cmd.current_dir(cwd);
    Ok(cmd)
}

#[test]
fn help_lists_commands() -> Result<()> {
    let dir = TempDir::new()?;
    nudge_command(dir.path(), dir.path())?
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("watch"))
        .stdout(contains("shown"));
    Ok(())
}

#[test]
fn shown_list_prints_persisted_entries() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("rnr_shown_reminders.json"),
        r#"[{"id":"r1","count":2}]"#,
    )?;

    nudge_command(dir.path(), dir.path())?
        .args(["shown", "list", "rnr"])
        .assert()
        .success()
        .stdout("rnr\tr1\t2\n");
    Ok(())
}

#[test]
fn shown_clear_deletes_the_domain_file() -> Result<()> {
    let dir = TempDir::new()?;
    let file = dir.path().join("hrd_shown_reminders.json");
    fs::write(&file, r#"[{"id":"h1","count":1},{"id":"h2","count":4}]"#)?;

    nudge_command(dir.path(), dir.path())?
        .args(["shown", "clear", "hrd"])
        .assert()
        .success()
        .stdout("cleared 2 entries for hrd\n");

    assert!(!file.exists());
    Ok(())
}

#[test]
fn fetch_without_session_fails() -> Result<()> {
    let dir = TempDir::new()?;
    nudge_command(dir.path(), dir.path())?
        .args(["fetch", "rnr"])
        .assert()
        .failure()
        .stderr(contains("no session configured"));
    Ok(())
}

#[test]
fn fetch_rejects_session_without_domain_role() -> Result<()> {
    let dir = TempDir::new()?;
    nudge_command(dir.path(), dir.path())?
        .env("NUDGE_SESSION__TOKEN", "tok")
        .env("NUDGE_SESSION__ROLES", "Recruiter")
        .args(["fetch", "dataflow"])
        .assert()
        .failure()
        .stderr(contains("do not grant access"));
    Ok(())
}

#[test]
fn explicit_config_file_is_applied() -> Result<()> {
    let dir = TempDir::new()?;
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[engine]\npoll_interval_secs = 0\n")?;

    nudge_command(dir.path(), dir.path())?
        .args(["--config"])
        .arg(&config)
        .args(["shown", "list"])
        .assert()
        .failure()
        .stderr(contains("poll_interval_secs"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_json_renders_badge_items() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reminders/hrd"))
        .and(query_param("dueOnly", "true"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "h1",
                    "processingStepId": "step-9",
                    "dailyCount": 1,
                    "reminderCount": 2,
                    "sentAt": "2024-06-01T08:30:00Z",
                    "processing": { "step": "HRD pickup" }
                },
                { "id": "h2", "processingStepId": "step-4", "dailyCount": 0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let output = nudge_command(dir.path(), dir.path())?
        .env("NUDGE_SERVER__BASE_URL", server.uri())
        .env("NUDGE_SESSION__TOKEN", "tok-1")
        .env("NUDGE_SESSION__ROLES", "Processing Executive")
        .args(["fetch", "hrd", "--json"])
        .output()?;
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let view: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(view["total"], json!(1));
    let items = view["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!("h1"));
    assert_eq!(items[0]["domain"], json!("HRD"));
    assert_eq!(items[0]["reminderCount"], json!(2));
    assert_eq!(items[0]["path"], json!("/processing/step-9?tab=hrd"));
    Ok(())
}
