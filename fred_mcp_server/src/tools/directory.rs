//! Directory tools: releases, release details, category details, sources.

use serde::Deserialize;
use serde_json::json;

use crate::tools::{ToolRegistry, parse_params, to_payload};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReleaseDetailsParams {
    release_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryDetailsParams {
    category_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

fn empty_schema() -> serde_json::Value {
    json!({ "type": "object", "properties": {}, "required": [] })
}

pub(crate) fn register(registry: &mut ToolRegistry) {
    registry.register(
        "get_releases_tool",
        "List all data releases known to the provider.",
        empty_schema(),
        |ctx, params| {
            Box::pin(async move {
                let _: NoParams = parse_params(params)?;
                let releases = ctx.provider.releases().await?;
                to_payload(&json!({ "count": releases.len(), "releases": releases }))
            })
        },
    );

    registry.register(
        "get_release_details_tool",
        "Details for one release by numeric id.",
        json!({
            "type": "object",
            "properties": {
                "release_id": { "type": "integer", "description": "Release id, e.g. 53" }
            },
            "required": ["release_id"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: ReleaseDetailsParams = parse_params(params)?;
                let release = ctx.provider.release_details(p.release_id).await?;
                to_payload(&release)
            })
        },
    );

    registry.register(
        "get_category_details_tool",
        "Details for one category node by numeric id.",
        json!({
            "type": "object",
            "properties": {
                "category_id": { "type": "integer", "description": "Category id, e.g. 125" }
            },
            "required": ["category_id"]
        }),
        |ctx, params| {
            Box::pin(async move {
                let p: CategoryDetailsParams = parse_params(params)?;
                let category = ctx.provider.category_details(p.category_id).await?;
                to_payload(&category)
            })
        },
    );

    registry.register(
        "get_sources_tool",
        "List all originating data sources.",
        empty_schema(),
        |ctx, params| {
            Box::pin(async move {
                let _: NoParams = parse_params(params)?;
                let sources = ctx.provider.sources().await?;
                to_payload(&json!({ "count": sources.len(), "sources": sources }))
            })
        },
    );
}
