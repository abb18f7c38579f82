//! Directory records: releases, categories, and sources.
//!
//! These mirror the provider's catalog endpoints and are returned verbatim
//! to tool callers; nothing downstream persists them.

use serde::{Deserialize, Serialize};

/// A data release (e.g. "Gross Domestic Product").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub press_release: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A category node in the provider's category tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// An originating data source (e.g. "Board of Governors").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}
