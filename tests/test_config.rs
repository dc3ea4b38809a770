//! Integration tests for loading configuration from disk.

use std::io::Write;

use screen_sections::config::{BlockSource, SegmentationConfig, StrategyType};
use screen_sections::Error;

#[test]
fn test_load_partial_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "ocr": {{ "min_confidence": 60 }},
            "blocks": {{ "source": "horizontal_bands" }},
            "proximity": {{ "breaks": {{ "header_keywords": ["shipping"] }} }},
            "strategy": {{ "strategy": "block_mapping", "include_empty_regions": true }}
        }}"#
    )
    .unwrap();

    let config = SegmentationConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.ocr.min_confidence, 60);
    assert!(config.ocr.binarize);
    assert_eq!(config.blocks.source, BlockSource::HorizontalBands);
    assert_eq!(config.blocks.dilate_iterations, 3);
    assert_eq!(config.proximity.breaks.header_keywords, vec!["shipping".to_string()]);
    assert_eq!(config.proximity.breaks.hard_gap_ceiling, 80.0);
    assert_eq!(config.strategy.strategy, StrategyType::BlockMapping);
    assert!(config.strategy.include_empty_regions);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = SegmentationConfig::default()
        .with_strategy(StrategyType::ProximityClustering)
        .with_min_confidence(45);
    let json = serde_json::to_string_pretty(&config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tuned.json");
    std::fs::write(&path, json).unwrap();

    assert_eq!(SegmentationConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SegmentationConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_malformed_file_is_json_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    let err = SegmentationConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_out_of_range_coverage_rejected() {
    let err = SegmentationConfig::from_json_str(r#"{"strategy": {"min_coverage": 1.5}}"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
