//! Dataset tools: the builder and the recent-datasets listing.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;

use fred_ingestor::dataset::builder::BuildRequest;
use fred_ingestor::dataset::catalog;
use fred_ingestor::models::table::MergeStrategy;
use fred_ingestor::models::transformation::Transformation;

use crate::tools::{ToolRegistry, parse_params, to_payload};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildDatasetParams {
    series_list: Vec<String>,
    #[serde(default)]
    transformations: Option<IndexMap<String, Transformation>>,
    observation_start: Option<NaiveDate>,
    observation_end: Option<NaiveDate>,
    #[serde(default)]
    merge_strategy: Option<MergeStrategy>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListRecentParams {
    limit: Option<usize>,
}

pub(crate) fn register(registry: &mut ToolRegistry) {
    registry.register(
        "build_fred_dataset_tool",
        "Fetch several series, align them on the Date index with the chosen merge strategy, apply per-series transformations, and persist CSV + XLSX + metadata under the data root. Per-series fetch failures are reported in the payload; the build fails only if every series fails.",
        json!({
            "type": "object",
            "properties": {
                "series_list": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1,
                    "description": "FRED series ids, e.g. [\"UNRATE\", \"CPIAUCSL\"]"
                },
                "transformations": {
                    "type": ["object", "null"],
                    "additionalProperties": {
                        "type": "string",
                        "enum": ["none", "YoY", "QoQ", "MoM", "diff", "pct_change", "log", "log_diff"]
                    },
                    "description": "Optional map of series id to transformation; omitted ids stay untransformed"
                },
                "observation_start": { "type": ["string", "null"], "description": "ISO-8601 day" },
                "observation_end": { "type": ["string", "null"], "description": "ISO-8601 day" },
                "merge_strategy": {
                    "type": ["string", "null"],
                    "enum": ["inner", "outer", "left", "right", null],
                    "description": "Row-matching policy (default inner)"
                }
            },
            "required": ["series_list"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: BuildDatasetParams = parse_params(params)?;
                let summary = ctx
                    .builder
                    .build(BuildRequest {
                        series_list: p.series_list,
                        transformations: p.transformations.unwrap_or_default(),
                        observation_start: p.observation_start,
                        observation_end: p.observation_end,
                        merge_strategy: p.merge_strategy.unwrap_or_default(),
                    })
                    .await?;
                to_payload(&summary)
            })
        },
    );

    registry.register(
        "list_recent_datasets_tool",
        "List the most recently built datasets with their columns, transformations, observation window, and CSV path. Use it to rebind column references from earlier sessions.",
        json!({
            "type": "object",
            "properties": {
                "limit": { "type": ["integer", "null"], "minimum": 1, "description": "Maximum entries (default 10)" }
            },
            "required": []
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: ListRecentParams = parse_params(params)?;
                let entries = ctx
                    .catalog
                    .entries(p.limit.unwrap_or(catalog::DEFAULT_LIMIT));
                let datasets: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|e| {
                        json!({
                            "name": e.metadata.name,
                            "created_at": e.metadata.created_at,
                            "observation_start": e.metadata.observation_start,
                            "observation_end": e.metadata.observation_end,
                            "columns": e.metadata.columns,
                            "transformations": e.metadata.transformations,
                            "merge_strategy": e.metadata.merge_strategy,
                            "row_count": e.metadata.row_count,
                            "csv_path": e.metadata.csv_path,
                        })
                    })
                    .collect();
                to_payload(&json!({ "count": datasets.len(), "datasets": datasets }))
            })
        },
    );
}
