mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn root_reports_environment() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["env"], "development");
    Ok(())
}

#[tokio::test]
async fn health_reports_ready_store() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["bootstrap"], "ready");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_json_404() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/nothing-here")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn routes_are_served_under_base_path() -> Result<()> {
    let server = TestServer::spawn_with(|c| {
        c.server.base_path = Some("/.netlify/functions/server".to_string());
    })
    .await?;

    let res = server
        .client
        .get(server.url("/.netlify/functions/server/api/fund"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["fund"]["id"].as_i64(), Some(1));
    Ok(())
}

#[tokio::test]
async fn failed_bootstrap_stops_the_server() -> Result<()> {
    let server = TestServer::start(|c| {
        c.database.url = "sqlite:///nonexistent-dir/for/fund-tracker.sqlite?mode=ro".to_string();
        c.database.connection_timeout = 2;
    })
    .await?;

    let outcome = server.finish(std::time::Duration::from_secs(15)).await?;
    let err = outcome.expect_err("server should exit with an error");
    assert!(err.to_string().contains("bootstrap failed"), "{}", err);
    Ok(())
}
