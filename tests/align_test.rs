use chrono::NaiveDate;
use csvchart::align::{AlignError, align, normalize};
use csvchart::config::NormalizationMode;
use csvchart::series::{DataPoint, Dataset};

fn day(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

// Helper function to build a dataset from (date, value) pairs already in order
fn dataset(label: &str, column: &str, index: usize, rows: &[(&str, f64)]) -> Dataset {
    let points = rows
        .iter()
        .map(|&(date, value)| DataPoint::new(day(date), date, value))
        .collect();
    Dataset::new(label, points, column, index)
}

#[test]
fn test_disjoint_ranges_share_one_continuous_axis() {
    let a = dataset("a", "Price", 0, &[("2024-01-01", 10.0), ("2024-01-03", 20.0)]);
    let b = dataset("b", "Units", 1, &[("2024-01-05", 4.0)]);

    let data = align(&[a, b], NormalizationMode::Max, 1000).unwrap();

    assert_eq!(
        data.label_strings(),
        vec!["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]
    );
    assert_eq!(data.series.len(), 2);

    let first = &data.series[0];
    assert_eq!(first.label, "Price");
    assert_eq!(first.file_label, "a");
    assert_eq!(first.border_color, "#FF6384");
    assert_eq!(first.original, vec![Some(10.0), None, Some(20.0), None, None]);
    assert_eq!(first.normalized, vec![Some(0.5), None, Some(1.0), None, None]);

    let second = &data.series[1];
    assert_eq!(second.original, vec![None, None, None, None, Some(4.0)]);
    assert_eq!(second.normalized, vec![None, None, None, None, Some(1.0)]);
    println!("✓ Union of date ranges densified to one label per day");
}

#[test]
fn test_every_series_matches_axis_length() {
    let a = dataset("a", "A", 0, &[("2023-12-30", 1.0)]);
    let b = dataset("b", "B", 1, &[("2024-01-02", 2.0), ("2024-01-04", 3.0)]);

    let data = align(&[a, b], NormalizationMode::Max, 1000).unwrap();

    assert_eq!(data.labels.len(), 6);
    assert_eq!(data.labels.first(), Some(&day("2023-12-30")));
    assert_eq!(data.labels.last(), Some(&day("2024-01-04")));
    for series in &data.series {
        assert_eq!(series.original.len(), data.labels.len());
        assert_eq!(series.normalized.len(), data.labels.len());
    }
}

#[test]
fn test_no_datasets_gives_empty_chart() {
    let data = align(&[], NormalizationMode::Max, 10).unwrap();
    assert!(data.is_empty());
    assert!(data.labels.is_empty());
}

#[test]
fn test_range_limit() {
    let a = dataset("a", "A", 0, &[("2000-01-01", 1.0), ("2000-01-11", 2.0)]);

    let err = align(std::slice::from_ref(&a), NormalizationMode::Max, 10).unwrap_err();
    assert_eq!(
        err,
        AlignError::RangeTooLarge {
            start: day("2000-01-01"),
            end: day("2000-01-11"),
            days: 11,
            limit: 10,
        }
    );

    assert!(align(&[a], NormalizationMode::Max, 11).is_ok());
}

#[test]
fn test_repeated_date_uses_first_value() {
    let a = dataset("a", "A", 0, &[("2024-01-01", 5.0), ("2024-01-01", 9.0)]);
    let data = align(&[a], NormalizationMode::Raw, 10).unwrap();
    assert_eq!(data.series[0].original, vec![Some(5.0)]);
}

#[test]
fn test_max_scaling_keeps_zero_at_zero() {
    let values = [Some(0.0), Some(5.0), None, Some(10.0)];
    assert_eq!(
        normalize(&values, NormalizationMode::Max),
        vec![Some(0.0), Some(0.5), None, Some(1.0)]
    );

    let negative = [Some(-2.0), Some(4.0)];
    assert_eq!(
        normalize(&negative, NormalizationMode::Max),
        vec![Some(-0.5), Some(1.0)]
    );
}

#[test]
fn test_zero_maximum_maps_to_zero() {
    let values = [Some(0.0), None, Some(0.0)];
    assert_eq!(
        normalize(&values, NormalizationMode::Max),
        vec![Some(0.0), None, Some(0.0)]
    );
}

#[test]
fn test_min_max_scaling() {
    let values = [Some(2.0), Some(4.0), None, Some(6.0)];
    assert_eq!(
        normalize(&values, NormalizationMode::MinMax),
        vec![Some(0.0), Some(0.5), None, Some(1.0)]
    );

    let flat = [Some(3.0), Some(3.0)];
    assert_eq!(
        normalize(&flat, NormalizationMode::MinMax),
        vec![Some(0.0), Some(0.0)]
    );
}

#[test]
fn test_raw_mode_leaves_values() {
    let values = [Some(2.0), None, Some(-7.5)];
    assert_eq!(normalize(&values, NormalizationMode::Raw), values.to_vec());
}

#[test]
fn test_dataset_lookup_helpers() {
    let a = dataset(
        "a",
        "A",
        0,
        &[("2024-01-01", 1.0), ("2024-01-03", 2.0), ("2024-01-03", 5.0)],
    );

    assert_eq!(a.date_range(), Some((day("2024-01-01"), day("2024-01-03"))));
    assert_eq!(a.value_on(day("2024-01-03")), Some(2.0));
    assert_eq!(a.value_on(day("2024-01-02")), None);
    assert_eq!(a.value_on(day("2024-02-01")), None);
}

#[test]
fn test_min_max_scaling_with_extreme_values() {
    let values = [Some(f64::MAX), Some(-f64::MAX), Some(0.0)];
    let scaled = normalize(&values, NormalizationMode::MinMax);

    assert_eq!(scaled, vec![Some(1.0), Some(0.0), Some(0.5)]);
    assert!(scaled.iter().flatten().all(|v| v.is_finite()));
}
