//! Shared protocol-test fixtures: an in-memory provider, a test context,
//! and a line-framed client over a duplex transport.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf, duplex,
    split,
};

use fred_ingestor::dataset::builder::DatasetBuilder;
use fred_ingestor::dataset::catalog::DatasetCatalog;
use fred_ingestor::models::directory::{CategoryInfo, ReleaseInfo, SourceInfo};
use fred_ingestor::models::observation::Observation;
use fred_ingestor::models::request_params::ObservationRequest;
use fred_ingestor::models::series::{Frequency, Series, SeriesMeta};
use fred_ingestor::plot::PlotService;
use fred_ingestor::providers::{GatewayError, SeriesProvider};
use fred_ingestor::store::SeriesStore;
use fred_mcp_server::server::McpServer;
use fred_mcp_server::tools::{ToolContext, ToolRegistry};
use shared_utils::config::AppConfig;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn meta(id: &str) -> SeriesMeta {
    SeriesMeta {
        id: id.to_string(),
        title: format!("{id} test series"),
        units: "Percent".to_string(),
        frequency: Frequency::Monthly,
        seasonal_adjustment: "Not Seasonally Adjusted".to_string(),
        observation_start: None,
        observation_end: None,
        popularity: None,
        notes: None,
    }
}

pub fn monthly_series(id: &str, values: &[f64]) -> Series {
    let observations = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let year = 2020 + (i / 12) as i32;
            let month = (i % 12) as u32 + 1;
            Observation::new(NaiveDate::from_ymd_opt(year, month, 1).unwrap(), Some(*v))
        })
        .collect();
    Series {
        meta: meta(id),
        observations,
    }
}

/// In-memory provider with an optional artificial latency, used to keep
/// protocol tests off the network and to exercise cancellation.
pub struct FixtureProvider {
    pub series: Vec<Series>,
    pub delay: Duration,
}

impl FixtureProvider {
    pub fn new(series: Vec<Series>) -> Self {
        Self {
            series,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(series: Vec<Series>, delay: Duration) -> Self {
        Self { series, delay }
    }

    fn find(&self, id: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.meta.id == id)
    }
}

#[async_trait]
impl SeriesProvider for FixtureProvider {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SeriesMeta>, GatewayError> {
        Ok(self
            .series
            .iter()
            .filter(|s| s.meta.id.contains(text) || s.meta.title.contains(text))
            .take(limit)
            .map(|s| s.meta.clone())
            .collect())
    }

    async fn series_meta(&self, series_id: &str) -> Result<SeriesMeta, GatewayError> {
        self.find(series_id)
            .map(|s| s.meta.clone())
            .ok_or_else(|| GatewayError::NotFound {
                series_id: series_id.to_string(),
            })
    }

    async fn observations(&self, req: &ObservationRequest) -> Result<Series, GatewayError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let series = self
            .find(&req.series_id)
            .ok_or_else(|| GatewayError::NotFound {
                series_id: req.series_id.clone(),
            })?;
        let observations = series
            .observations
            .iter()
            .filter(|o| req.start.is_none_or(|s| o.date >= s))
            .filter(|o| req.end.is_none_or(|e| o.date <= e))
            .copied()
            .collect();
        Ok(Series {
            meta: series.meta.clone(),
            observations,
        })
    }

    async fn releases(&self) -> Result<Vec<ReleaseInfo>, GatewayError> {
        Ok(vec![ReleaseInfo {
            id: 53,
            name: "Gross Domestic Product".to_string(),
            press_release: Some(true),
            link: None,
        }])
    }

    async fn release_details(&self, release_id: i64) -> Result<ReleaseInfo, GatewayError> {
        if release_id == 53 {
            Ok(ReleaseInfo {
                id: 53,
                name: "Gross Domestic Product".to_string(),
                press_release: Some(true),
                link: None,
            })
        } else {
            Err(GatewayError::NotFound {
                series_id: release_id.to_string(),
            })
        }
    }

    async fn category_details(&self, category_id: i64) -> Result<CategoryInfo, GatewayError> {
        Err(GatewayError::NotFound {
            series_id: category_id.to_string(),
        })
    }

    async fn sources(&self) -> Result<Vec<SourceInfo>, GatewayError> {
        Ok(Vec::new())
    }
}

pub fn test_context(root: &Path, provider: Arc<dyn SeriesProvider>) -> Arc<ToolContext> {
    let config = Arc::new(AppConfig {
        api_key: SecretString::new("test-key".into()),
        data_root: root.to_path_buf(),
        worker_limit: 4,
        fetch_concurrency: 4,
        retry_budget: 1,
    });
    let store = SeriesStore::new(root);
    let builder = Arc::new(DatasetBuilder::new(Arc::clone(&provider), root, 4));
    let plots = Arc::new(PlotService::new(Arc::clone(&provider), store.clone()));
    let catalog = DatasetCatalog::new(root);
    Arc::new(ToolContext {
        config,
        provider,
        store,
        builder,
        plots,
        catalog,
    })
}

/// A line-framed JSON-RPC client talking to an in-process server.
pub struct Client {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    next_id: i64,
}

impl Client {
    pub async fn send_raw(&mut self, raw: &str) {
        self.writer.write_all(raw.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    pub async fn send(&mut self, message: Value) {
        self.send_raw(&message.to_string()).await;
    }

    /// Reads responses until the one with `id` arrives; other responses
    /// (out-of-order completions) are skipped.
    pub async fn recv_for(&mut self, id: i64) -> Value {
        loop {
            let line = tokio::time::timeout(Duration::from_secs(30), self.lines.next_line())
                .await
                .expect("timed out waiting for response")
                .unwrap()
                .expect("transport closed while waiting for response");
            let value: Value = serde_json::from_str(&line).unwrap();
            if value["id"] == json!(id) {
                return value;
            }
        }
    }

    /// Reads the next response line, whatever its id.
    pub async fn recv_any(&mut self) -> Option<Value> {
        let line = tokio::time::timeout(Duration::from_secs(30), self.lines.next_line())
            .await
            .expect("timed out waiting for response")
            .unwrap()?;
        Some(serde_json::from_str(&line).unwrap())
    }

    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await;
        self.recv_for(id).await
    }

    /// Sends a request without waiting; returns the id used.
    pub async fn request_no_wait(&mut self, method: &str, params: Value) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await;
        id
    }

    pub async fn initialize(&mut self) {
        let response = self
            .request(
                "initialize",
                json!({ "protocolVersion": "2024-11-05", "capabilities": {} }),
            )
            .await;
        assert!(response["error"].is_null(), "initialize failed: {response}");
        self.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        self.request(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )
        .await
    }
}

/// Extracts the single text content body of a tool result as JSON.
pub fn tool_payload(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("no text content in {response}"));
    serde_json::from_str(text).unwrap()
}

pub fn spawn_server(ctx: Arc<ToolContext>) -> Client {
    let (client_side, server_side) = duplex(1 << 20);
    let (server_reader, server_writer) = split(server_side);
    tokio::spawn(async move {
        let server = McpServer::new(ctx, ToolRegistry::new());
        let _ = server.run(server_reader, server_writer).await;
    });
    let (client_reader, client_writer) = split(client_side);
    Client {
        writer: client_writer,
        lines: BufReader::new(client_reader).lines(),
        next_id: 1,
    }
}
