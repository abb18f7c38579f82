mod common;

use std::sync::Arc;

use indexmap::IndexMap;

use common::{StaticProvider, day, monthly_series};
use fred_ingestor::dataset::builder::{BuildRequest, DatasetBuilder};
use fred_ingestor::dataset::catalog::DatasetCatalog;
use fred_ingestor::models::table::MergeStrategy;
use fred_ingestor::models::transformation::Transformation;
use fred_ingestor::plot::{PlotError, PlotService};
use fred_ingestor::store::SeriesStore;

/// Trend plus deterministic noise, so differencing never collapses to a
/// constant sequence.
fn trended(seed: u64, len: usize, base: f64, drift: f64, wobble: f64) -> Vec<f64> {
    let mut state = seed;
    (0..len)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let noise = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            base + drift * i as f64 + noise * wobble
        })
        .collect()
}

fn provider() -> Arc<StaticProvider> {
    let cpi = trended(11, 30, 250.0, 0.8, 1.5);
    let unrate = trended(23, 30, 4.0, 0.02, 0.6);
    Arc::new(StaticProvider::new(vec![
        monthly_series("UNRATE", day(2020, 1, 1), &unrate),
        monthly_series("CPIAUCSL", day(2020, 1, 1), &cpi),
    ]))
}

async fn build_dataset(provider: Arc<StaticProvider>, root: &std::path::Path) {
    let builder = DatasetBuilder::new(provider, root, 4);
    let mut transformations = IndexMap::new();
    transformations.insert("CPIAUCSL".to_string(), Transformation::YoY);
    builder
        .build(BuildRequest {
            series_list: vec!["UNRATE".to_string(), "CPIAUCSL".to_string()],
            transformations,
            observation_start: None,
            observation_end: None,
            merge_strategy: MergeStrategy::Inner,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn plot_series_writes_png_next_to_the_store_export() {
    let dir = tempfile::tempdir().unwrap();
    let provider = provider();
    let service = PlotService::new(provider, SeriesStore::new(dir.path()));

    let artifacts = service.plot_series("UNRATE", None, None).await.unwrap();
    assert!(artifacts.png_path.exists());
    assert!(artifacts.csv_path.exists());
    assert!(artifacts.xlsx_path.exists());
    assert!(artifacts.png_path.starts_with(dir.path().join("UNRATE").join("grafico")));
    assert!(artifacts.csv_path.starts_with(dir.path().join("UNRATE").join("series")));
}

#[tokio::test]
async fn dual_axis_plot_exports_the_aligned_window() {
    let dir = tempfile::tempdir().unwrap();
    let service = PlotService::new(provider(), SeriesStore::new(dir.path()));

    let artifacts = service
        .plot_dual_axis("UNRATE", "CPIAUCSL", None, None, Some("blue"), Some("red"))
        .await
        .unwrap();
    assert!(artifacts.png_path.exists());
    assert!(artifacts.csv_path.exists());
    assert!(artifacts.xlsx_path.exists());
}

#[tokio::test]
async fn differencing_analysis_produces_three_charts_with_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let service = PlotService::new(provider(), SeriesStore::new(dir.path()));

    let report = service
        .analyze_differencing("CPIAUCSL", None, None)
        .await
        .unwrap();
    assert_eq!(report.outcomes.len(), 3);
    let orders: Vec<&str> = report.outcomes.iter().map(|o| o.order.as_str()).collect();
    assert_eq!(orders, vec!["level", "diff1", "diff2"]);
    for outcome in &report.outcomes {
        assert!(outcome.png_path.exists());
        assert!(outcome.adf.p_value >= 0.0 && outcome.adf.p_value <= 1.0);
        assert!(outcome.adf.critical_values.one_percent < outcome.adf.critical_values.ten_percent);
    }
}

#[tokio::test]
async fn plot_from_dataset_resolves_via_catalog_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let provider = provider();
    build_dataset(Arc::clone(&provider), dir.path()).await;

    // An empty provider proves no network fetch happens on this path.
    let offline = Arc::new(StaticProvider::new(vec![]));
    let service = PlotService::new(offline, SeriesStore::new(dir.path()));
    let catalog = DatasetCatalog::new(dir.path());

    let artifacts = service
        .plot_from_dataset(&catalog, "UNRATE", "CPIAUCSL_YoY", None)
        .await
        .unwrap();
    assert_eq!(artifacts.dataset_name, "FRED_dataset_UNRATE_CPIAUCSL");
    assert!(artifacts.png_path.exists());
    assert!(
        artifacts
            .png_path
            .starts_with(dir.path().join("FRED_dataset_UNRATE_CPIAUCSL").join("plots"))
    );
}

#[tokio::test]
async fn unknown_column_lists_what_is_available() {
    let dir = tempfile::tempdir().unwrap();
    let provider = provider();
    build_dataset(Arc::clone(&provider), dir.path()).await;

    let service = PlotService::new(provider, SeriesStore::new(dir.path()));
    let catalog = DatasetCatalog::new(dir.path());

    // Catalog resolution falls back to the dataset holding UNRATE, and
    // validation names the column that is actually missing.
    let err = service
        .plot_from_dataset(&catalog, "UNRATE", "CPIAUCSL_XYZ", None)
        .await
        .unwrap_err();
    match err {
        PlotError::UnknownColumn { column, available } => {
            assert_eq!(column, "CPIAUCSL_XYZ");
            assert!(available.contains(&"CPIAUCSL_YoY".to_string()));
        }
        other => panic!("expected UnknownColumn, got {other:?}"),
    }

    // Columns absent from every dataset are refused outright.
    let err = service
        .plot_from_dataset(&catalog, "NOPE_A", "NOPE_B", None)
        .await
        .unwrap_err();
    match err {
        PlotError::NoDatasetWithColumns { columns } => {
            assert_eq!(columns, vec!["NOPE_A".to_string(), "NOPE_B".to_string()]);
        }
        other => panic!("expected NoDatasetWithColumns, got {other:?}"),
    }

    // An explicit dataset path reports the same unknown-column error.
    let entry = catalog.most_recent_with_columns(&["UNRATE"]).unwrap();
    let err = service
        .plot_from_dataset(
            &catalog,
            "UNRATE",
            "CPIAUCSL_XYZ",
            Some(&entry.metadata.csv_path),
        )
        .await
        .unwrap_err();
    match err {
        PlotError::UnknownColumn { column, .. } => assert_eq!(column, "CPIAUCSL_XYZ"),
        other => panic!("expected UnknownColumn, got {other:?}"),
    }
}

#[tokio::test]
async fn incomplete_dataset_paths_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("FRED_dataset_BROKEN");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("data.csv"), "date,BROKEN\n").unwrap();

    let service = PlotService::new(
        Arc::new(StaticProvider::new(vec![])),
        SeriesStore::new(dir.path()),
    );
    let catalog = DatasetCatalog::new(dir.path());

    let err = service
        .plot_from_dataset(&catalog, "A", "B", Some(&broken))
        .await
        .unwrap_err();
    assert!(matches!(err, PlotError::IncompleteDataset { .. }));
}
