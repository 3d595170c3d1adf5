use anyhow::Result;
use httpmock::prelude::*;
use reddit_gateway::{
    Exporter, Gateway, GatewayConfig, GatewayEngine, HttpTransport, LocalStorage, WorkItem,
};
use serde_json::{json, Value};
use std::io::Read;
use tempfile::TempDir;

fn config_for(server: &MockServer, output_path: &str, extra_output: &str) -> Result<GatewayConfig> {
    let content = format!(
        r#"
[api]
public_base_url = "{}"
oauth_base_url = "{}"
user_agent = "engine-test/1.0"

[listing]
page_size = 100

[output]
output_path = "{}"
filename_pattern = "run"
{}
"#,
        server.base_url(),
        server.url("/oauth"),
        output_path,
        extra_output
    );
    Ok(GatewayConfig::from_toml_str(&content)?)
}

fn engine(config: &GatewayConfig) -> Result<GatewayEngine<HttpTransport, LocalStorage>> {
    let gateway = Gateway::new(HttpTransport::from_config(&config.api)?)
        .with_page_size(config.listing.page_size)
        .with_concurrency(config.gateway.concurrent_requests);
    let exporter = Exporter::new(
        LocalStorage::new(config.output.output_path.clone()),
        config.output.clone(),
    );
    Ok(GatewayEngine::new(gateway, exporter))
}

fn mock_hot_listing(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/r/rust/hot.json");
        then.status(200).json_body(json!({
            "kind": "Listing",
            "data": {
                "after": null,
                "children": [
                    {"kind": "t3", "data": {"id": "p1", "title": "First", "score": 10}},
                    {"kind": "t3", "data": {"id": "p2", "title": "Second, with comma", "score": 5}}
                ]
            }
        }));
    })
}

fn work_items() -> Result<Vec<WorkItem>> {
    let raw = json!([
        {"resource": "post", "operation": "getAll", "subreddit": "rust", "content": "hot", "returnAll": true},
        {"resource": "subreddit", "operation": "getAll", "trending": true}
    ]);
    Ok(WorkItem::from_json_array(&raw.to_string())?)
}

#[tokio::test]
async fn test_engine_writes_json_and_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    let listing_mock = mock_hot_listing(&server);
    let trending_mock = server.mock(|when, then| {
        when.method(GET).path("/api/trending_subreddits.json");
        then.status(200)
            .json_body(json!({"subreddit_names": ["rust", "programming"], "comment_count": 3}));
    });

    let config = config_for(&server, &output_path, r#"output_formats = ["json", "csv"]"#)?;
    let summary = engine(&config)?.run(&work_items()?).await?;

    listing_mock.assert();
    trending_mock.assert();
    assert_eq!(summary.items_processed, 2);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.files, vec!["run.json", "run.csv"]);

    let json_output = std::fs::read_to_string(temp_dir.path().join("run.json"))?;
    let parsed: Vec<Value> = serde_json::from_str(&json_output)?;
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0]["id"], "p1");
    assert_eq!(parsed[1]["id"], "p2");
    assert_eq!(parsed[2]["comment_count"], 3);

    let csv_output = std::fs::read_to_string(temp_dir.path().join("run.csv"))?;
    assert!(csv_output.lines().next().unwrap().contains("title"));
    assert!(csv_output.contains("\"Second, with comma\""));
    assert_eq!(csv_output.lines().count(), 4);

    Ok(())
}

#[tokio::test]
async fn test_engine_zip_bundle() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    let listing_mock = mock_hot_listing(&server);

    let config = config_for(
        &server,
        &output_path,
        r#"output_formats = ["jsonl", "csv"]

[output.compression]
enabled = true
filename = "bundle.zip"
"#,
    )?;

    let raw = json!([
        {"resource": "post", "operation": "getAll", "subreddit": "rust", "content": "hot", "limit": 1}
    ]);
    let items = WorkItem::from_json_array(&raw.to_string())?;
    let summary = engine(&config)?.run(&items).await?;

    listing_mock.assert();
    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.files, vec!["bundle.zip"]);

    let zip_data = std::fs::read(temp_dir.path().join("bundle.zip"))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    assert_eq!(archive.len(), 2);

    let mut jsonl = String::new();
    archive.by_name("run.jsonl")?.read_to_string(&mut jsonl)?;
    assert_eq!(jsonl.lines().count(), 1);
    assert!(jsonl.contains("\"p1\""));

    Ok(())
}

#[tokio::test]
async fn test_engine_failure_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    let listing_mock = server.mock(|when, then| {
        when.method(GET).path("/r/rust/hot.json");
        then.status(500);
    });

    let config = config_for(&server, &output_path, "")?;
    let result = engine(&config)?.run(&work_items()?).await;

    listing_mock.assert();
    let err = result.unwrap_err();
    assert!(matches!(
        err.root_cause(),
        reddit_gateway::GatewayError::TransportFailure { status: Some(500), .. }
    ));
    assert!(!temp_dir.path().join("run.json").exists());

    Ok(())
}
