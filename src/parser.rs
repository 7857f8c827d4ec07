use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::series::{DEFAULT_VALUE_COLUMN, DataPoint};

lazy_static! {
    // Timestamps such as `2024-03-01T09:30:00Z` or `2024-03-01 09:30`
    static ref TIMESTAMP_DATE: Regex =
        Regex::new(r"^(\d{4}-\d{1,2}-\d{1,2})[T ]\d{1,2}:\d{2}").unwrap();
}

/// Day-first formats are deliberately absent: `03/04/2024` is read as March 4th.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Errors raised while turning CSV text into a series
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("CSV file is empty")]
    Empty,

    #[error("no valid date/value rows found ({skipped} rows skipped)")]
    NoData { skipped: usize },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Result of parsing one CSV file
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedCsv {
    /// Valid observations sorted by date
    pub points: Vec<DataPoint>,

    /// Second header column, or `"Value"` when the header has one column
    pub value_column_name: String,

    /// Data rows that were ignored
    pub skipped_rows: usize,
}

/// Parses CSV text holding a date column followed by a value column
///
/// The first record is always treated as the header. Every later record
/// needs at least two columns, a non-empty recognisable date in the first and
/// a finite number in the second; anything else is skipped. Extra columns are
/// ignored.
///
/// # Arguments
/// * `text` - Full contents of the uploaded file
///
/// # Returns
/// * `Result<ParsedCsv, ParseError>` - Points sorted by date, or an error when
///   the file is empty or holds no usable rows
///
/// # Examples
/// ```
/// use csvchart::parser::parse_csv;
///
/// let parsed = parse_csv("Date,Price\n2024-01-02,11\n2024-01-01,10\n").unwrap();
/// assert_eq!(parsed.value_column_name, "Price");
/// assert_eq!(parsed.points[0].value, 10.0);
/// ```
pub fn parse_csv(text: &str) -> Result<ParsedCsv, ParseError> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let value_column_name = match records.next() {
        Some(header) => value_column_from_header(&header?),
        None => return Err(ParseError::Empty),
    };

    let mut points = Vec::new();
    let mut skipped_rows = 0;

    for (line, record) in records.enumerate() {
        let record = record?;
        match point_from_record(&record) {
            Some(point) => points.push(point),
            None => {
                // +2: one for the header, one for 1-based numbering
                debug!("skipping row {}: {:?}", line + 2, record);
                skipped_rows += 1;
            }
        }
    }

    if points.is_empty() {
        return Err(ParseError::NoData {
            skipped: skipped_rows,
        });
    }

    // Stable, so repeated dates keep file order
    points.sort_by_key(|p| p.date);

    Ok(ParsedCsv {
        points,
        value_column_name,
        skipped_rows,
    })
}

fn value_column_from_header(header: &StringRecord) -> String {
    if header.len() >= 2 {
        header[1].to_string()
    } else {
        DEFAULT_VALUE_COLUMN.to_string()
    }
}

fn point_from_record(record: &StringRecord) -> Option<DataPoint> {
    if record.len() < 2 {
        return None;
    }

    let raw_date = &record[0];
    if raw_date.is_empty() {
        return None;
    }

    let value: f64 = record[1].parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let date = parse_date(raw_date)?;
    Some(DataPoint::new(date, raw_date, value))
}

/// Normalizes the date text of a row to a calendar day
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` and ISO timestamps whose
/// time part (and offset) is dropped.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use csvchart::parser::parse_date;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(parse_date("2024-03-01"), Some(day));
/// assert_eq!(parse_date("03/01/2024"), Some(day));
/// assert_eq!(parse_date("2024-03-01T23:59:00-05:00"), Some(day));
/// assert_eq!(parse_date("yesterday"), None);
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Some(caps) = TIMESTAMP_DATE.captures(text) {
        return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
