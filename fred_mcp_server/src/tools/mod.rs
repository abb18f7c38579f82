//! The tool registry: a static table of typed tool definitions built at
//! startup and dispatched by name.
//!
//! Each entry carries a human description, a JSON-schema input
//! descriptor, and a handler. Handlers receive decoded inputs, return a
//! single string payload (JSON), and keep no cross-request state in
//! memory; everything durable lives on disk.

mod build;
mod directory;
mod fetch;
mod plot;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use fred_ingestor::dataset::builder::{BuildError, DatasetBuilder};
use fred_ingestor::dataset::catalog::DatasetCatalog;
use fred_ingestor::plot::{PlotError, PlotService};
use fred_ingestor::providers::{GatewayError, SeriesProvider};
use fred_ingestor::store::SeriesStore;
use shared_utils::config::AppConfig;

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, JsonRpcError, ToolDescriptor,
};

/// Shared, immutable dependencies handed to every handler invocation.
pub struct ToolContext {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn SeriesProvider>,
    pub store: SeriesStore,
    pub builder: Arc<DatasetBuilder>,
    pub plots: Arc<PlotService>,
    pub catalog: DatasetCatalog,
}

/// Handler-declared failures, mapped onto protocol error envelopes.
#[derive(Debug)]
pub enum ToolError {
    /// The arguments did not match the tool's input schema.
    InvalidParams(String),
    /// The operation ran and failed; `kind` is a stable taxonomy string.
    Failed { kind: String, message: String },
}

impl ToolError {
    pub fn failed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Failed {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn into_rpc_error(self) -> JsonRpcError {
        match self {
            ToolError::InvalidParams(message) => JsonRpcError::new(INVALID_PARAMS, message),
            ToolError::Failed { kind, message } => JsonRpcError::with_data(
                INTERNAL_ERROR,
                message,
                serde_json::json!({ "kind": kind }),
            ),
        }
    }
}

impl From<GatewayError> for ToolError {
    fn from(err: GatewayError) -> Self {
        ToolError::failed(err.kind(), err.to_string())
    }
}

impl From<BuildError> for ToolError {
    fn from(err: BuildError) -> Self {
        ToolError::failed(err.kind(), err.to_string())
    }
}

impl From<PlotError> for ToolError {
    fn from(err: PlotError) -> Self {
        ToolError::failed(err.kind(), err.to_string())
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send>>;
pub type ToolHandler = Arc<dyn Fn(Arc<ToolContext>, Value) -> HandlerFuture + Send + Sync>;

pub struct ToolEntry {
    pub descriptor: ToolDescriptor,
    pub handler: ToolHandler,
}

/// The static registry. Populated once at startup; read-only afterwards.
pub struct ToolRegistry {
    entries: IndexMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            entries: IndexMap::new(),
        };
        fetch::register(&mut registry);
        build::register(&mut registry);
        plot::register(&mut registry);
        directory::register(&mut registry);
        registry
    }

    pub(crate) fn register<F>(
        &mut self,
        name: &str,
        description: &str,
        input_schema: Value,
        handler: F,
    ) where
        F: Fn(Arc<ToolContext>, Value) -> HandlerFuture + Send + Sync + 'static,
    {
        let entry = ToolEntry {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            },
            handler: Arc::new(handler),
        };
        debug_assert!(
            !self.entries.contains_key(name),
            "duplicate tool name {name}"
        );
        self.entries.insert(name.to_string(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.get(name)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entries.values().map(|e| e.descriptor.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes handler arguments against the param struct; a mismatch is an
/// `invalid_params` error carrying serde's description of the violation.
/// Absent arguments decode like an empty object.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    let params = if params.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// Serializes a handler payload to the single text body of the result.
pub(crate) fn to_payload<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::failed("internal", format!("payload serialization: {e}")))
}
