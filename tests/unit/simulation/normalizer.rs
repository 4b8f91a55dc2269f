//! Unit tests for historical series normalization

use serde_json::json;
use stratlab::simulation::normalizer::{normalize, parse_observation, DEFAULT_VOLUME};
use stratlab::simulation::SimulationError;

#[test]
fn test_rejects_missing_or_non_list_series() {
    for raw in [json!(null), json!({"close": 1}), json!("2023-01-01"), json!(42)] {
        assert!(
            matches!(normalize(&raw), Err(SimulationError::MissingHistoricalData)),
            "expected rejection for {}",
            raw
        );
    }
}

#[test]
fn test_empty_list_is_valid() {
    let raw = json!([]);
    assert_eq!(normalize(&raw).unwrap().count(), 0);
}

#[test]
fn test_keeps_supplied_order() {
    let raw = json!([
        {"date": "2023-01-03", "close": 3, "volume": 1},
        {"date": "2023-01-01", "close": 1, "volume": 1},
        {"date": "2023-01-02", "close": 2, "volume": 1},
    ]);
    let dates: Vec<String> = normalize(&raw).unwrap().map(|o| o.date).collect();
    assert_eq!(dates, vec!["2023-01-03", "2023-01-01", "2023-01-02"]);
}

#[test]
fn test_drops_rows_missing_required_fields() {
    let raw = json!([
        {"date": "2023-01-01", "volume": 10},
        {"close": 101, "volume": 10},
        {"date": null, "close": 101},
        {"date": "2023-01-02", "close": null},
        "not an object",
        {"date": "2023-01-03", "close": 99.5, "volume": 2},
    ]);
    let observations: Vec<_> = normalize(&raw).unwrap().collect();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].date, "2023-01-03");
    assert_eq!(observations[0].close, 99.5);
    assert_eq!(observations[0].volume, 2.0);
}

#[test]
fn test_drops_rows_with_non_numeric_values() {
    assert!(parse_observation(&json!({"date": "d", "close": "101"})).is_none());
    assert!(parse_observation(&json!({"date": "d", "close": 101, "volume": "ten"})).is_none());
}

#[test]
fn test_volume_defaults_to_one() {
    let absent = parse_observation(&json!({"date": "d", "close": 5})).unwrap();
    let null = parse_observation(&json!({"date": "d", "close": 5, "volume": null})).unwrap();
    assert_eq!(absent.volume, DEFAULT_VOLUME);
    assert_eq!(null.volume, DEFAULT_VOLUME);
}

#[test]
fn test_non_string_date_kept_as_text() {
    let observation = parse_observation(&json!({"date": 20230101, "close": 5})).unwrap();
    assert_eq!(observation.date, "20230101");
}

#[test]
fn test_extra_fields_ignored() {
    let observation =
        parse_observation(&json!({"date": "d", "close": 5, "volume": 3, "open": 4})).unwrap();
    assert_eq!(observation.close, 5.0);
    assert_eq!(observation.volume, 3.0);
}

#[test]
fn test_drops_rows_with_overflowing_notional() {
    assert!(parse_observation(&json!({"date": "d", "close": 10, "volume": 1e308})).is_none());
    assert!(parse_observation(&json!({"date": "d", "close": -1e200, "volume": 1e200})).is_none());
    assert!(parse_observation(&json!({"date": "d", "close": 1e150, "volume": 1e150})).is_some());
}
