//! Plot tools: single-series, dual-axis, differencing analysis, and
//! dataset-column plots.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::tools::{ToolRegistry, parse_params, to_payload};

const DATE_SCHEMA: &str = "ISO-8601 day, e.g. 2000-01-01";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlotSeriesParams {
    series_id: String,
    observation_start: Option<NaiveDate>,
    observation_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlotDualAxisParams {
    series_id_left: String,
    series_id_right: String,
    observation_start: Option<NaiveDate>,
    observation_end: Option<NaiveDate>,
    color_left: Option<String>,
    color_right: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlotFromDatasetParams {
    column_left: String,
    column_right: String,
    dataset_path: Option<PathBuf>,
}

fn windowed_series_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "series_id": { "type": "string", "description": "FRED series id" },
            "observation_start": { "type": ["string", "null"], "description": DATE_SCHEMA },
            "observation_end": { "type": ["string", "null"], "description": DATE_SCHEMA }
        },
        "required": ["series_id"]
    })
}

pub(crate) fn register(registry: &mut ToolRegistry) {
    registry.register(
        "plot_series_tool",
        "Fetch a series, persist its window to the store, and render a line chart PNG next to the CSV/XLSX export. Returns the three paths.",
        windowed_series_schema(),
        |ctx, params| {
            Box::pin(async move {
                let p: PlotSeriesParams = parse_params(params)?;
                let artifacts = ctx
                    .plots
                    .plot_series(&p.series_id, p.observation_start, p.observation_end)
                    .await?;
                to_payload(&artifacts)
            })
        },
    );

    registry.register(
        "plot_dual_axis_tool",
        "Fetch two series, align them on the intersection of their dates, and render them on independent left/right axes. Returns the image and data export paths.",
        json!({
            "type": "object",
            "properties": {
                "series_id_left": { "type": "string", "description": "Series drawn on the left axis" },
                "series_id_right": { "type": "string", "description": "Series drawn on the right axis" },
                "observation_start": { "type": ["string", "null"], "description": DATE_SCHEMA },
                "observation_end": { "type": ["string", "null"], "description": DATE_SCHEMA },
                "color_left": { "type": ["string", "null"], "description": "Named color for the left series (default blue)" },
                "color_right": { "type": ["string", "null"], "description": "Named color for the right series (default red)" }
            },
            "required": ["series_id_left", "series_id_right"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: PlotDualAxisParams = parse_params(params)?;
                let artifacts = ctx
                    .plots
                    .plot_dual_axis(
                        &p.series_id_left,
                        &p.series_id_right,
                        p.observation_start,
                        p.observation_end,
                        p.color_left.as_deref(),
                        p.color_right.as_deref(),
                    )
                    .await?;
                to_payload(&artifacts)
            })
        },
    );

    registry.register(
        "analyze_differencing_tool",
        "Plot a series at level, first difference, and second difference, and run an augmented Dickey-Fuller test on each. Returns test statistics, p-values, critical values, and the three image paths.",
        windowed_series_schema(),
        |ctx, params| {
            Box::pin(async move {
                let p: PlotSeriesParams = parse_params(params)?;
                let report = ctx
                    .plots
                    .analyze_differencing(&p.series_id, p.observation_start, p.observation_end)
                    .await?;
                to_payload(&report)
            })
        },
    );

    registry.register(
        "plot_from_dataset_tool",
        "Render two columns of a built dataset on a dual axis without any network calls. When dataset_path is omitted the most recent dataset containing both columns is resolved through the catalog.",
        json!({
            "type": "object",
            "properties": {
                "column_left": { "type": "string", "description": "Column name, e.g. UNRATE" },
                "column_right": { "type": "string", "description": "Column name, possibly transformed, e.g. CPIAUCSL_YoY" },
                "dataset_path": { "type": ["string", "null"], "description": "Dataset CSV path or folder; omit to resolve via the recent-datasets catalog" }
            },
            "required": ["column_left", "column_right"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: PlotFromDatasetParams = parse_params(params)?;
                let artifacts = ctx
                    .plots
                    .plot_from_dataset(
                        &ctx.catalog,
                        &p.column_left,
                        &p.column_right,
                        p.dataset_path.as_deref(),
                    )
                    .await?;
                to_payload(&artifacts)
            })
        },
    );
}
