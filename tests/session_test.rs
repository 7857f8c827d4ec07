use csvchart::config::Config;
use csvchart::series::{PALETTE, color_for, label_from_file_name};
use csvchart::session::{ChartError, ChartSession, UploadedFile};

const PRICES: &str = "Date,Price\n2024-01-01,10\n2024-01-02,12\n2024-01-03,11\n";
const VOLUME: &str = "Date,Volume\n2024-01-02,300\n2024-01-04,150\n";

#[test]
fn test_add_csv_labels_and_colours() {
    let mut session = ChartSession::new();

    let first = session.add_csv("prices.csv", PRICES).unwrap();
    assert_eq!(first.label, "prices");
    assert_eq!(first.value_column_name, "Price");
    assert_eq!(first.len(), 3);
    assert_eq!(first.border_color, "#FF6384");
    assert_eq!(first.background_color, "#FF638420");

    let second = session.add_csv("volume.csv", VOLUME).unwrap();
    assert_eq!(second.border_color, "#36A2EB");

    assert_eq!(session.len(), 2);
    println!("✓ Datasets labelled from file names and coloured in upload order");
}

#[test]
fn test_rejected_file_keeps_session_and_reports_error() {
    let mut session = ChartSession::new();
    session.add_csv("prices.csv", PRICES).unwrap();

    let err = session.add_csv("notes.csv", "Date,Value\nhello,world\n").unwrap_err();
    assert!(matches!(err, ChartError::Parse { .. }));
    assert_eq!(session.len(), 1);

    let message = session.last_error().unwrap();
    assert!(message.starts_with("notes.csv:"), "unexpected message: {}", message);

    session.add_csv("volume.csv", VOLUME).unwrap();
    assert!(session.last_error().is_none());
}

#[test]
fn test_batch_is_ingested_in_order() {
    let mut session = ChartSession::new();
    session.add_csv("prices.csv", PRICES).unwrap();

    let batch = vec![
        UploadedFile::new("volume.csv", VOLUME),
        UploadedFile::new("empty.csv", ""),
        UploadedFile::new("again.csv", PRICES),
    ];
    let results = session.add_files(&batch);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), "volume");
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap(), "again");

    let colours: Vec<&str> = session
        .datasets()
        .iter()
        .map(|d| d.border_color.as_str())
        .collect();
    assert_eq!(colours, vec![PALETTE[0], PALETTE[1], PALETTE[2]]);

    // The failure stays visible after a later success in the same batch
    assert!(session.last_error().unwrap().contains("empty.csv"));
}

#[test]
fn test_palette_wraps_after_eight_files() {
    let mut session = ChartSession::new();
    for i in 0..9 {
        session.add_csv(&format!("f{}.csv", i), PRICES).unwrap();
    }
    assert_eq!(session.datasets()[8].border_color, PALETTE[0]);
    assert_eq!(color_for(6).0, color_for(0).0);
}

#[test]
fn test_upload_decoding() {
    let mut session = ChartSession::new();

    let mut with_bom = b"\xEF\xBB\xBF".to_vec();
    with_bom.extend_from_slice(PRICES.as_bytes());
    let invalid = vec![0xFF, 0xFE, 0x00, 0x41];

    let results = session.add_files(&[
        UploadedFile::new("bom.csv", with_bom),
        UploadedFile::new("binary.csv", invalid),
    ]);

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ChartError::Encoding { .. })));
    assert_eq!(session.datasets()[0].value_column_name, "Price");
}

#[test]
fn test_clear_and_revision() {
    let mut session = ChartSession::new();
    let start = session.revision();

    session.add_csv("prices.csv", PRICES).unwrap();
    let _ = session.add_csv("bad.csv", "");
    assert_eq!(session.revision(), start + 1);

    session.clear();
    assert!(session.is_empty());
    assert!(session.last_error().is_none());
    assert_eq!(session.revision(), start + 2);
}

#[test]
fn test_chart_data_reflects_all_datasets() {
    let mut session = ChartSession::new();
    session.add_csv("prices.csv", PRICES).unwrap();
    session.add_csv("volume.csv", VOLUME).unwrap();

    let data = session.chart_data(&Config::default()).unwrap();
    assert_eq!(data.labels.len(), 4);
    assert_eq!(data.series[1].normalized, vec![None, Some(1.0), None, Some(0.5)]);
}

#[test]
fn test_label_from_file_name() {
    assert_eq!(label_from_file_name("sales.csv"), "sales");
    assert_eq!(label_from_file_name("sales.csv.bak"), "sales.bak");
    assert_eq!(label_from_file_name("SALES.CSV"), "SALES.CSV");
    assert_eq!(label_from_file_name("notes"), "notes");
}
