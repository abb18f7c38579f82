//! Fetch-side tools: search, series metadata, observations, store
//! downloads, and single-series transformation.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use fred_ingestor::models::request_params::ObservationRequest;
use fred_ingestor::models::transformation::Transformation;
use fred_ingestor::store::StoreError;
use fred_ingestor::transform;

use crate::tools::{ToolError, ToolRegistry, parse_params, to_payload};

const DATE_SCHEMA: &str = "ISO-8601 day, e.g. 2000-01-01";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchParams {
    search_text: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeriesIdParams {
    series_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WindowedSeriesParams {
    series_id: String,
    observation_start: Option<NaiveDate>,
    observation_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransformSeriesParams {
    series_id: String,
    transformation: Transformation,
    observation_start: Option<NaiveDate>,
    observation_end: Option<NaiveDate>,
}

fn windowed_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "series_id": { "type": "string", "description": "FRED series id, e.g. UNRATE" },
            "observation_start": { "type": ["string", "null"], "description": DATE_SCHEMA },
            "observation_end": { "type": ["string", "null"], "description": DATE_SCHEMA }
        },
        "required": ["series_id"]
    })
}

pub(crate) fn register(registry: &mut ToolRegistry) {
    registry.register(
        "search_fred_series_tool",
        "Search FRED for series matching free text; returns id, title, units, and frequency for each hit.",
        json!({
            "type": "object",
            "properties": {
                "search_text": { "type": "string", "description": "Free-text query, e.g. 'unemployment rate'" },
                "limit": { "type": ["integer", "null"], "minimum": 1, "description": "Maximum results (default 10)" }
            },
            "required": ["search_text"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: SearchParams = parse_params(params)?;
                let results = ctx
                    .provider
                    .search(&p.search_text, p.limit.unwrap_or(10))
                    .await?;
                to_payload(&json!({ "count": results.len(), "results": results }))
            })
        },
    );

    registry.register(
        "get_series_info_tool",
        "Full metadata for one series: title, units, frequency, seasonal adjustment, observation window, popularity, notes.",
        json!({
            "type": "object",
            "properties": {
                "series_id": { "type": "string", "description": "FRED series id, e.g. GDP" }
            },
            "required": ["series_id"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: SeriesIdParams = parse_params(params)?;
                let meta = ctx.provider.series_meta(&p.series_id).await?;
                to_payload(&meta)
            })
        },
    );

    registry.register(
        "get_series_observations_tool",
        "Observations for a series within an optional window, returned inline as JSON. Missing values are null.",
        windowed_schema(),
        |ctx, params| {
            Box::pin(async move {
                let p: WindowedSeriesParams = parse_params(params)?;
                let series = ctx
                    .provider
                    .observations(&ObservationRequest::windowed(
                        p.series_id,
                        p.observation_start,
                        p.observation_end,
                    ))
                    .await?;
                to_payload(&json!({
                    "series_id": series.meta.id,
                    "title": series.meta.title,
                    "units": series.meta.units,
                    "frequency": series.meta.frequency,
                    "count": series.observations.len(),
                    "observations": series.observations,
                }))
            })
        },
    );

    registry.register(
        "download_series_tool",
        "Download a series window and persist it under the data root as CSV and XLSX; returns the paths written.",
        windowed_schema(),
        |ctx, params| {
            Box::pin(async move {
                let p: WindowedSeriesParams = parse_params(params)?;
                let series = ctx
                    .provider
                    .observations(&ObservationRequest::windowed(
                        p.series_id,
                        p.observation_start,
                        p.observation_end,
                    ))
                    .await?;
                let stored = ctx.store.write_series(&series).map_err(store_error)?;
                to_payload(&json!({
                    "series_id": series.meta.id,
                    "csv_path": stored.csv_path,
                    "xlsx_path": stored.xlsx_path,
                    "observation_start": stored.start,
                    "observation_end": stored.end,
                    "rows": stored.rows,
                }))
            })
        },
    );

    registry.register(
        "transform_series_tool",
        "Fetch a series and apply one named transformation (YoY, QoQ, MoM, diff, pct_change, log, log_diff); returns the transformed observations inline.",
        json!({
            "type": "object",
            "properties": {
                "series_id": { "type": "string", "description": "FRED series id" },
                "transformation": {
                    "type": "string",
                    "enum": ["none", "YoY", "QoQ", "MoM", "diff", "pct_change", "log", "log_diff"]
                },
                "observation_start": { "type": ["string", "null"], "description": DATE_SCHEMA },
                "observation_end": { "type": ["string", "null"], "description": DATE_SCHEMA }
            },
            "required": ["series_id", "transformation"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: TransformSeriesParams = parse_params(params)?;
                let series = ctx
                    .provider
                    .observations(&ObservationRequest::windowed(
                        p.series_id.clone(),
                        p.observation_start,
                        p.observation_end,
                    ))
                    .await?;
                let values: Vec<Option<f64>> =
                    series.observations.iter().map(|o| o.value).collect();
                let transformed = transform::apply(p.transformation, &values);
                let observations: Vec<serde_json::Value> = series
                    .observations
                    .iter()
                    .zip(transformed)
                    .map(|(o, v)| json!({ "date": o.date, "value": v }))
                    .collect();
                to_payload(&json!({
                    "series_id": p.series_id,
                    "transformation": p.transformation,
                    "column": p.transformation.column_name(&p.series_id),
                    "count": observations.len(),
                    "observations": observations,
                }))
            })
        },
    );
}

fn store_error(err: StoreError) -> ToolError {
    match &err {
        StoreError::EmptySeries { .. } => ToolError::failed("empty_window", err.to_string()),
        StoreError::Sink(_) => ToolError::failed("internal", err.to_string()),
    }
}
