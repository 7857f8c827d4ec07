use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Colours handed out to uploaded files in upload order.
///
/// The first and seventh entries are the same pink; the cycle repeats after
/// eight files.
pub const PALETTE: [&str; 8] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF",
];

/// Alpha suffix appended to a border colour to obtain the fill colour
pub const BACKGROUND_ALPHA: &str = "20";

/// Fallback value column name for files whose header has a single column
pub const DEFAULT_VALUE_COLUMN: &str = "Value";

/// A single observation read from a CSV row
///
/// The parsed `date` drives sorting and alignment while `raw_date` keeps the
/// text exactly as it appeared in the file (after trimming), which is what
/// the raw-data table shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Calendar day of the observation
    pub date: NaiveDate,

    /// Date text as written in the file
    pub raw_date: String,

    /// Numeric value of the observation
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: NaiveDate, raw_date: impl Into<String>, value: f64) -> Self {
        Self {
            date,
            raw_date: raw_date.into(),
            value,
        }
    }
}

/// One uploaded file, parsed and styled
///
/// Points are always sorted ascending by date; the parser guarantees this
/// and nothing mutates the vector afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// File name with the `.csv` extension removed
    pub label: String,

    /// Sorted observations
    pub points: Vec<DataPoint>,

    /// Line colour, e.g. `#36A2EB`
    pub border_color: String,

    /// Fill colour, the border colour with a low alpha suffix
    pub background_color: String,

    /// Name of the second header column, used as the chart legend entry
    pub value_column_name: String,
}

impl Dataset {
    /// Builds a dataset coloured by its position among the uploaded files
    pub fn new(
        label: impl Into<String>,
        points: Vec<DataPoint>,
        value_column_name: impl Into<String>,
        color_index: usize,
    ) -> Self {
        let (border_color, background_color) = color_for(color_index);
        Self {
            label: label.into(),
            points,
            border_color,
            background_color,
            value_column_name: value_column_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last day covered by the dataset
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some((first.date, last.date))
    }

    /// Value recorded on `date`
    ///
    /// When a file repeats a date the earliest row in sorted order wins.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date < date);
        self.points
            .get(idx)
            .filter(|p| p.date == date)
            .map(|p| p.value)
    }
}

/// Returns the `(border, background)` colour pair for the `index`-th file
///
/// # Examples
/// ```
/// use csvchart::series::color_for;
///
/// assert_eq!(color_for(1), ("#36A2EB".to_string(), "#36A2EB20".to_string()));
/// assert_eq!(color_for(9).0, "#36A2EB");
/// ```
pub fn color_for(index: usize) -> (String, String) {
    let border = PALETTE[index % PALETTE.len()];
    (border.to_string(), format!("{}{}", border, BACKGROUND_ALPHA))
}

/// Derives a dataset label from an uploaded file name
///
/// Only the first `.csv` occurrence is removed, so `prices.csv.bak` becomes
/// `prices.bak` and `DATA.CSV` is left untouched.
pub fn label_from_file_name(file_name: &str) -> String {
    file_name.replacen(".csv", "", 1)
}
