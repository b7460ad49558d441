//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn pipewise() -> Command {
    let mut cmd = Command::cargo_bin("pipewise").unwrap();
    // Keep a developer's .env or pipewise.toml out of the way
    cmd.current_dir(std::env::temp_dir())
        .env_remove("DATABASE_URL")
        .env_remove("OPENAI_API_KEY")
        .env_remove("PIPEWISE_CONFIG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    pipewise()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("manage"))
        .stdout(predicate::str::contains("completions"));
}

// === Serve ===

#[test]
fn test_serve_help() {
    pipewise()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"));
}

#[test]
fn test_serve_without_database_url_fails() {
    pipewise()
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}

// === Manage ===

#[test]
fn test_manage_help_lists_database_commands() {
    pipewise()
        .args(["manage", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("upgrade-database"))
        .stdout(predicate::str::contains("show-current-database-revision"))
        .stdout(predicate::str::contains("purge-database"));
}

#[test]
fn test_generate_random_key_is_hex() {
    pipewise()
        .args(["manage", "generate-random-key", "--length", "16"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9a-f]{32}\n$").unwrap());
}

#[test]
fn test_create_user_help() {
    pipewise()
        .args(["manage", "create-user", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slug of the tenant"));
}

// === Jobs ===

#[test]
fn test_jobs_extract_help() {
    pipewise()
        .args(["jobs", "extract", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HTML file of the job post page"));
}

#[test]
fn test_jobs_extract_without_api_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("job.html");
    std::fs::write(&page, "<h1>Rust Engineer</h1>").unwrap();

    pipewise()
        .args(["jobs", "extract", "--in"])
        .arg(&page)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_jobs_extract_missing_file_fails() {
    pipewise()
        .args(["jobs", "extract", "--in", "/nonexistent/job.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

// === Completions ===

#[test]
fn test_completions_bash() {
    pipewise()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pipewise"));
}
