//! End-to-end runs of the `stockflow` binary against a mock server.

use anyhow::Result;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value as JsonValue;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

const MOVEMENT_PATH: &str = "/openboxes/api/stockMovements/sm-1";

/// `stockflow` with an isolated config home pointed at `server`.
fn stockflow(home: &Path, server: &MockServer) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("stockflow")?;
    cmd.env("STOCKFLOW_HOME", home);
    cmd.env("STOCKFLOW_BASE_URL", format!("{}/openboxes/api", server.uri()));
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}

fn pack_page(items: JsonValue) -> JsonValue {
    json!({ "data": { "packPage": { "packPageItems": items } } })
}

async fn mount_fetch(server: &MockServer, items: JsonValue, times: u64) {
    Mock::given(method("GET"))
        .and(path(MOVEMENT_PATH))
        .and(query_param("stepNumber", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pack_page(items)))
        .expect(times)
        .mount(server)
        .await;
}

#[test]
fn help_lists_commands() -> Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("stockflow")?;
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("show"))
        .stdout(contains("advance"))
        .stdout(contains("recipients"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn show_prints_table_and_flags_missing_recipient() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(
        &server,
        json!([{ "id": 1, "productCode": "P-1", "productName": "Gauze", "recipient": null }]),
        1,
    )
    .await;
    let home = TempDir::new()?;

    stockflow(home.path(), &server)?
        .args(["show", "--movement", "sm-1"])
        .assert()
        .success()
        .stdout(contains("Product Name"))
        .stdout(contains("Gauze"))
        .stdout(contains("(required)"))
        .stderr(contains("Recipient on row 1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn show_json_prints_values() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{ "id": "1", "palletName": "PAL-1" }]), 1).await;
    let home = TempDir::new()?;

    let output = stockflow(home.path(), &server)?
        .args(["show", "--movement", "sm-1", "--json"])
        .output()?;

    assert!(output.status.success());
    let values: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(values["stockMovementId"], json!("sm-1"));
    assert_eq!(values["items"][0]["palletName"], json!("PAL-1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn save_without_recipient_fails_before_posting() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{ "id": "1" }]), 1).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new()?;

    stockflow(home.path(), &server)?
        .args(["save", "--movement", "sm-1", "--pallet", "1=PAL-1"])
        .assert()
        .failure()
        .stderr(contains("Please fix the form"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn advance_sets_recipient_saves_and_transitions() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{ "id": "1" }]), 1).await;
    Mock::given(method("POST"))
        .and(path(MOVEMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pack_page(json!([
            { "id": "1", "recipient": { "id": "u1", "name": "Ann Lee" } }
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{MOVEMENT_PATH}/status")))
        .and(body_json(json!({ "status": "CHECKING" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new()?;

    stockflow(home.path(), &server)?
        .args(["advance", "--movement", "sm-1", "--recipient", "1=u1"])
        .assert()
        .success()
        .stdout(contains("Packing complete: 1 line item(s)"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn split_prints_its_own_confirmation() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{ "id": "1" }]), 1).await;
    Mock::given(method("POST"))
        .and(path(MOVEMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pack_page(json!([
            { "id": "1", "splitLineItems": [{ "id": "1a" }, { "id": "1b" }] }
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new()?;
    let split_file = home.path().join("split.json");
    std::fs::write(&split_file, r#"[{ "id": "1a" }, { "id": "1b" }]"#)?;

    stockflow(home.path(), &server)?
        .args(["split", "--movement", "sm-1", "--row", "1", "--file"])
        .arg(&split_file)
        .assert()
        .success()
        .stdout(contains("Split saved for row 1."))
        .stdout(contains("Changes saved").not());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn declined_refresh_does_not_refetch() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{ "id": "1" }]), 1).await;
    let home = TempDir::new()?;

    stockflow(home.path(), &server)?
        .args(["refresh", "--movement", "sm-1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Refresh cancelled."))
        .stderr(contains("Confirm refresh"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recipients_lists_matches() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openboxes/api/persons"))
        .and(query_param("name", "ann"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "u1", "name": "Ann Lee" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new()?;

    stockflow(home.path(), &server)?
        .args(["recipients", "ann"])
        .assert()
        .success()
        .stdout(contains("u1\tAnn Lee"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn config_file_sets_next_status() -> Result<()> {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{ "id": "1", "recipient": { "id": "u1" } }]), 1).await;
    Mock::given(method("POST"))
        .and(path(MOVEMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pack_page(json!([
            { "id": "1", "recipient": { "id": "u1" } }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{MOVEMENT_PATH}/status")))
        .and(body_json(json!({ "status": "PACKED" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new()?;
    std::fs::write(home.path().join("config.toml"), "next_status = \"PACKED\"\n")?;

    stockflow(home.path(), &server)?
        .args(["advance", "--movement", "sm-1"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn invalid_env_value_names_the_variable() -> Result<()> {
    let home = TempDir::new()?;
    let mut cmd = assert_cmd::Command::cargo_bin("stockflow")?;
    cmd.env("STOCKFLOW_HOME", home.path())
        .env("STOCKFLOW_STEP_NUMBER", "five")
        .args(["show", "--movement", "sm-1"])
        .assert()
        .failure()
        .stderr(contains("STOCKFLOW_STEP_NUMBER"));
    Ok(())
}
