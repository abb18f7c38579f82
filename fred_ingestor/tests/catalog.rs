mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;

use common::{StaticProvider, day, monthly_series};
use fred_ingestor::dataset::builder::{BuildRequest, DatasetBuilder};
use fred_ingestor::dataset::catalog::DatasetCatalog;
use fred_ingestor::models::table::MergeStrategy;
use fred_ingestor::models::transformation::Transformation;

fn provider() -> StaticProvider {
    let cpi: Vec<f64> = (0..15).map(|i| 250.0 + i as f64).collect();
    StaticProvider::new(vec![
        monthly_series("UNRATE", day(2020, 1, 1), &[3.5; 15]),
        monthly_series("CPIAUCSL", day(2020, 1, 1), &cpi),
        monthly_series("GDP", day(2020, 1, 1), &[1.0, 2.0, 3.0]),
    ])
}

fn request(series_list: &[&str]) -> BuildRequest {
    BuildRequest {
        series_list: series_list.iter().map(|s| s.to_string()).collect(),
        transformations: IndexMap::new(),
        observation_start: None,
        observation_end: None,
        merge_strategy: MergeStrategy::Inner,
    }
}

#[tokio::test]
async fn catalog_lists_newest_first_and_skips_incomplete_folders() {
    let dir = tempfile::tempdir().unwrap();
    let builder = DatasetBuilder::new(Arc::new(provider()), dir.path(), 4);

    builder
        .build_at(
            request(&["GDP"]),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    builder
        .build_at(
            request(&["UNRATE", "CPIAUCSL"]),
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    // A folder matching the naming convention but lacking a sidecar must
    // never be listed.
    std::fs::create_dir_all(dir.path().join("FRED_dataset_BROKEN")).unwrap();
    std::fs::write(
        dir.path().join("FRED_dataset_BROKEN").join("data.csv"),
        "date,BROKEN\n",
    )
    .unwrap();

    let catalog = DatasetCatalog::new(dir.path());
    let entries = catalog.entries(10);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].metadata.name, "FRED_dataset_UNRATE_CPIAUCSL");
    assert_eq!(entries[1].metadata.name, "FRED_dataset_GDP");
}

#[tokio::test]
async fn catalog_respects_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let builder = DatasetBuilder::new(Arc::new(provider()), dir.path(), 4);
    builder
        .build_at(
            request(&["GDP"]),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    builder
        .build_at(
            request(&["UNRATE"]),
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    let catalog = DatasetCatalog::new(dir.path());
    let entries = catalog.entries(1);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].metadata.name, "FRED_dataset_UNRATE");
}

#[tokio::test]
async fn rebinding_finds_the_most_recent_dataset_with_both_columns() {
    let dir = tempfile::tempdir().unwrap();
    let builder = DatasetBuilder::new(Arc::new(provider()), dir.path(), 4);

    let mut req = request(&["UNRATE", "CPIAUCSL"]);
    req.transformations
        .insert("CPIAUCSL".to_string(), Transformation::YoY);
    builder
        .build_at(req, Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap())
        .await
        .unwrap();
    builder
        .build_at(
            request(&["GDP"]),
            Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    let catalog = DatasetCatalog::new(dir.path());
    let entry = catalog
        .most_recent_with_columns(&["UNRATE", "CPIAUCSL_YoY"])
        .unwrap();
    assert_eq!(entry.metadata.name, "FRED_dataset_UNRATE_CPIAUCSL");
    assert!(
        catalog
            .most_recent_with_columns(&["UNRATE", "CPIAUCSL_XYZ"])
            .is_none()
    );
}

#[tokio::test]
async fn render_text_emits_one_block_per_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let builder = DatasetBuilder::new(Arc::new(provider()), dir.path(), 4);
    let mut req = request(&["UNRATE", "CPIAUCSL"]);
    req.transformations
        .insert("CPIAUCSL".to_string(), Transformation::YoY);
    builder
        .build_at(req, Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap())
        .await
        .unwrap();

    let catalog = DatasetCatalog::new(dir.path());
    let text = catalog.render_text(10);
    assert!(text.contains("Dataset: FRED_dataset_UNRATE_CPIAUCSL"));
    assert!(text.contains("Columns: UNRATE, CPIAUCSL_YoY"));
    assert!(text.contains("Transformations: CPIAUCSL=YoY"));
    assert!(text.contains(".csv"));
}

#[test]
fn empty_root_renders_a_friendly_message() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = DatasetCatalog::new(dir.path());
    assert!(catalog.entries(10).is_empty());
    assert!(catalog.render_text(10).contains("No datasets"));
}
