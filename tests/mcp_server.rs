use anyhow::Result;
use async_trait::async_trait;
use research_assistant::server;
use research_assistant::state::MemoryStore;
use research_assistant::tools::{register_builtins, BuiltinDeps, ToolRegistry};
use research_assistant::web::{PageFetcher, SearchHit, SearchProvider};
use serde_json::{json, Value};
use std::sync::Arc;

struct Offline;

#[async_trait]
impl SearchProvider for Offline {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl PageFetcher for Offline {
    async fn fetch_text(&self, _url: &str) -> Result<String> {
        anyhow::bail!("offline")
    }
}

fn registry(reports: &std::path::Path) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    register_builtins(
        &mut registry,
        BuiltinDeps {
            search: Arc::new(Offline),
            fetcher: Arc::new(Offline),
            store: Arc::new(MemoryStore::new()),
            reports_dir: reports.to_path_buf(),
            agent_name: "Research Assistant".into(),
        },
    )
    .unwrap();
    registry
}

fn request(id: u64, method: &str, params: Value) -> String {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
}

#[tokio::test]
async fn session_over_stdio_framing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let lines = [
        request(1, "initialize", json!({"protocolVersion": "2025-03-26", "capabilities": {}})),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        request(2, "tools/list", json!({})),
        request(
            3,
            "tools/call",
            json!({"name": "log_activity", "arguments": {"subject": "Acme", "activity": "Opened office"}}),
        ),
        request(4, "tools/call", json!({"name": "query_logs", "arguments": {"filter": "acme"}})),
        request(5, "tools/call", json!({"name": "fetch_url", "arguments": {"url": "https://example.com"}})),
        "this is not json".to_string(),
    ];
    let input = lines.join("\n") + "\n";

    let mut output = Vec::new();
    server::serve(&registry, input.as_bytes(), &mut output).await.unwrap();

    let replies: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 6);

    assert_eq!(replies[0]["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(replies[1]["result"]["tools"].as_array().unwrap().len(), 6);

    assert_eq!(replies[2]["result"]["isError"], false);
    let logs = replies[3]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(logs.contains("Acme: Opened office"));

    assert_eq!(replies[4]["id"], 5);
    assert_eq!(replies[4]["result"]["isError"], true);

    assert_eq!(replies[5]["error"]["code"], -32700);
}
