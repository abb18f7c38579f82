//! The recent-datasets resource.
//!
//! Served under `fred://datasets/recent` as a human-readable text listing
//! suitable for direct LLM consumption. The resource is a pure
//! re-projection of the on-disk catalog; it never mutates state.

use serde_json::{Value, json};

use fred_ingestor::dataset::catalog::{self, DatasetCatalog};

use crate::protocol::ResourceDescriptor;

pub const RECENT_DATASETS_URI: &str = "fred://datasets/recent";

pub fn descriptors() -> Vec<ResourceDescriptor> {
    vec![ResourceDescriptor {
        uri: RECENT_DATASETS_URI.to_string(),
        name: "Recently built FRED datasets".to_string(),
        mime_type: "text/plain".to_string(),
    }]
}

/// Contents of a `resources/read` for a known URI, or `None` when the URI
/// is not served here.
pub fn read(catalog: &DatasetCatalog, uri: &str) -> Option<Value> {
    if uri != RECENT_DATASETS_URI {
        return None;
    }
    let text = catalog.render_text(catalog::DEFAULT_LIMIT);
    Some(json!({
        "contents": [{
            "uri": RECENT_DATASETS_URI,
            "mimeType": "text/plain",
            "text": text,
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_uris_are_not_served() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DatasetCatalog::new(dir.path());
        assert!(read(&catalog, "fred://datasets/everything").is_none());
    }

    #[test]
    fn read_returns_a_single_text_content() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DatasetCatalog::new(dir.path());
        let value = read(&catalog, RECENT_DATASETS_URI).unwrap();
        assert_eq!(value["contents"][0]["mimeType"], "text/plain");
        assert!(
            value["contents"][0]["text"]
                .as_str()
                .unwrap()
                .contains("No datasets")
        );
    }
}
