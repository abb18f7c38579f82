use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fred_ingestor::dataset::builder::DatasetBuilder;
use fred_ingestor::dataset::catalog::DatasetCatalog;
use fred_ingestor::plot::PlotService;
use fred_ingestor::providers::SeriesProvider;
use fred_ingestor::providers::fred::FredProvider;
use fred_ingestor::store::SeriesStore;
use fred_mcp_server::server::McpServer;
use fred_mcp_server::tools::{ToolContext, ToolRegistry};
use shared_utils::config::AppConfig;

#[derive(Parser)]
#[command(author, version, about = "MCP server exposing FRED time-series tools over stdio")]
struct Cli {
    /// Override the data root directory (also FRED_DATA_ROOT)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Override the tool worker pool size (also FRED_WORKER_LIMIT)
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout is the protocol channel; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()
        .context("configuration error: FRED_API_KEY must be set in the environment")?;
    if let Some(data_root) = cli.data_root {
        config.data_root = data_root;
    }
    if let Some(workers) = cli.workers {
        config.worker_limit = workers.max(1);
    }
    let config = Arc::new(config);

    let provider: Arc<dyn SeriesProvider> =
        Arc::new(FredProvider::new(&config).context("failed to construct the FRED gateway")?);
    let store = SeriesStore::new(&config.data_root);
    let builder = Arc::new(DatasetBuilder::new(
        Arc::clone(&provider),
        &config.data_root,
        config.fetch_concurrency,
    ));
    let plots = Arc::new(PlotService::new(Arc::clone(&provider), store.clone()));
    let catalog = DatasetCatalog::new(&config.data_root);

    tracing::info!(
        data_root = %config.data_root.display(),
        workers = config.worker_limit,
        "starting MCP server on stdio"
    );

    let ctx = Arc::new(ToolContext {
        config,
        provider,
        store,
        builder,
        plots,
        catalog,
    });
    let server = McpServer::new(ctx, ToolRegistry::new());
    server.run(tokio::io::stdin(), tokio::io::stdout()).await
}
