use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::align::ChartData;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV export produced invalid text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("XLSX export failed: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Column headers of an aligned export: `Date` then one per series
///
/// Series are named `file label (value column)` so two files with the same
/// value column stay distinguishable.
fn headers(data: &ChartData) -> Vec<String> {
    let mut headers = vec!["Date".to_string()];
    headers.extend(
        data.series
            .iter()
            .map(|s| format!("{} ({})", s.file_label, s.label)),
    );
    headers
}

/// Convert aligned chart data to CSV format
///
/// One row per day of the shared axis with the unscaled values of every
/// series. Days a series has no observation for are left empty. Quoting of
/// labels containing commas or quotes is handled by the `csv` writer.
///
/// # Arguments
/// * `data` - Aligned chart data
///
/// # Returns
/// * `Result<String, ExportError>` - CSV content as a string or an error
///
/// # Examples
/// ```
/// use csvchart::align::align;
/// use csvchart::config::NormalizationMode;
/// use csvchart::export::aligned_csv;
///
/// let data = align(&[], NormalizationMode::Max, 100).unwrap();
/// assert_eq!(aligned_csv(&data).unwrap(), "Date\n");
/// ```
pub fn aligned_csv(data: &ChartData) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers(data))?;

    for (row, label) in data.label_strings().into_iter().enumerate() {
        let mut record = Vec::with_capacity(data.series.len() + 1);
        record.push(label);
        for series in &data.series {
            record.push(series.original[row].map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Convert aligned chart data to XLSX format
///
/// Same layout as [`aligned_csv`]; gaps are left as blank cells and dates
/// are written as text in `YYYY-MM-DD` form.
pub fn aligned_xlsx(data: &ChartData) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in headers(data).iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    for (row, label) in data.label_strings().iter().enumerate() {
        let xl_row = (row + 1) as u32;
        worksheet.write_string(xl_row, 0, label)?;
        for (col, series) in data.series.iter().enumerate() {
            if let Some(value) = series.original[row] {
                worksheet.write_number(xl_row, (col + 1) as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
