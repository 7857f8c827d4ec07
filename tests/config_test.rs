use csvchart::config::{Config, NormalizationMode};

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
    assert_eq!((config.chart_width, config.chart_height), (1000, 500));
    assert_eq!(config.normalization, NormalizationMode::Max);
    assert_eq!(config.max_days, 36_600);
}

#[test]
fn test_normalization_names() {
    for mode in [
        NormalizationMode::Max,
        NormalizationMode::MinMax,
        NormalizationMode::Raw,
    ] {
        let name = mode.to_string();
        assert_eq!(name.parse::<NormalizationMode>().unwrap(), mode);
        println!("✓ Mode {} parses back from its name", name);
    }

    assert_eq!("MinMax".parse::<NormalizationMode>(), Ok(NormalizationMode::MinMax));
    assert_eq!(" raw ".parse::<NormalizationMode>(), Ok(NormalizationMode::Raw));
    assert!("median".parse::<NormalizationMode>().is_err());
}

#[test]
fn test_normalization_serde_names() {
    let json = serde_json::to_string(&NormalizationMode::MinMax).unwrap();
    assert_eq!(json, "\"min-max\"");
    let raw: NormalizationMode = serde_json::from_str("\"none\"").unwrap();
    assert_eq!(raw, NormalizationMode::Raw);
}

// Helper function to look variables up from a fixed list
fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

#[test]
fn test_overrides_from_variables() {
    let config = Config::from_vars(vars(&[
        ("CSVCHART_ADDR", "0.0.0.0:8080"),
        ("CSVCHART_WIDTH", "640"),
        ("CSVCHART_HEIGHT", "480"),
        ("CSVCHART_NORMALIZE", "min-max"),
        ("CSVCHART_MAX_DAYS", "365"),
        ("CSVCHART_MAX_UPLOAD", "1024"),
    ]));

    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
    assert_eq!((config.chart_width, config.chart_height), (640, 480));
    assert_eq!(config.normalization, NormalizationMode::MinMax);
    assert_eq!(config.max_days, 365);
    assert_eq!(config.max_upload_bytes, 1024);
}

#[test]
fn test_bad_chart_sizes_are_ignored() {
    let config = Config::from_vars(vars(&[
        ("CSVCHART_WIDTH", "0"),
        ("CSVCHART_HEIGHT", "70000"),
        ("CSVCHART_MAX_DAYS", "lots"),
    ]));

    let defaults = Config::default();
    assert_eq!(config.chart_width, defaults.chart_width);
    assert_eq!(config.chart_height, defaults.chart_height);
    assert_eq!(config.max_days, defaults.max_days);
    println!("✓ Zero, oversized and unparseable values fall back to defaults");
}
