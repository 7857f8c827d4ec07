use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NormalizationMode;
use crate::series::Dataset;

#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    #[error("date range {start} to {end} spans {days} days (limit is {limit})")]
    RangeTooLarge {
        start: NaiveDate,
        end: NaiveDate,
        days: usize,
        limit: usize,
    },
}

/// One plotted line, aligned to the shared day axis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Legend entry, the value column name of the file
    pub label: String,

    /// Label of the dataset the series came from
    pub file_label: String,

    pub border_color: String,
    pub background_color: String,

    /// Rescaled values, `None` on days without an observation
    pub normalized: Vec<Option<f64>>,

    /// Values as read from the file, `None` on days without an observation
    pub original: Vec<Option<f64>>,
}

/// Everything needed to draw the overlaid chart
///
/// `labels` is a gap-free run of days and every series vector has exactly
/// `labels.len()` entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<NaiveDate>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() || self.labels.is_empty()
    }

    /// Day labels formatted as `YYYY-MM-DD`
    pub fn label_strings(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect()
    }
}

/// Aligns every dataset onto one continuous day axis and rescales it
///
/// The axis runs from the earliest to the latest date found in any dataset,
/// one label per calendar day, so series with disjoint or partially
/// overlapping ranges share the same x positions. Days a dataset has no
/// observation for are `None`.
///
/// # Arguments
/// * `datasets` - Parsed datasets, each sorted by date
/// * `mode` - Rescaling applied to each series independently
/// * `max_days` - Refuse axes longer than this many days
///
/// # Returns
/// * `Result<ChartData, AlignError>` - Empty chart data when there is nothing
///   to plot
pub fn align(
    datasets: &[Dataset],
    mode: NormalizationMode,
    max_days: usize,
) -> Result<ChartData, AlignError> {
    let Some((start, end)) = union_range(datasets) else {
        return Ok(ChartData::default());
    };

    let days = (end - start).num_days() as usize + 1;
    if days > max_days {
        return Err(AlignError::RangeTooLarge {
            start,
            end,
            days,
            limit: max_days,
        });
    }

    let labels: Vec<NaiveDate> = start.iter_days().take(days).collect();

    let series = datasets
        .iter()
        .map(|dataset| {
            let original = densify(dataset, start, days);
            let normalized = normalize(&original, mode);
            ChartSeries {
                label: dataset.value_column_name.clone(),
                file_label: dataset.label.clone(),
                border_color: dataset.border_color.clone(),
                background_color: dataset.background_color.clone(),
                normalized,
                original,
            }
        })
        .collect();

    Ok(ChartData { labels, series })
}

fn union_range(datasets: &[Dataset]) -> Option<(NaiveDate, NaiveDate)> {
    datasets
        .iter()
        .filter_map(Dataset::date_range)
        .reduce(|(lo, hi), (first, last)| (lo.min(first), hi.max(last)))
}

// Places each observation at its day offset; the first point of a repeated
// date wins.
fn densify(dataset: &Dataset, start: NaiveDate, days: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; days];
    for point in &dataset.points {
        let offset = (point.date - start).num_days() as usize;
        if let Some(slot) = values.get_mut(offset) {
            if slot.is_none() {
                *slot = Some(point.value);
            }
        }
    }
    values
}

/// Rescales the present values of one series
///
/// Gaps stay gaps. A series whose scale collapses (maximum of zero for
/// [`NormalizationMode::Max`], a flat line for
/// [`NormalizationMode::MinMax`]) maps every present value to `0.0`.
///
/// # Examples
/// ```
/// use csvchart::align::normalize;
/// use csvchart::config::NormalizationMode;
///
/// let values = [Some(5.0), None, Some(10.0)];
/// assert_eq!(
///     normalize(&values, NormalizationMode::Max),
///     vec![Some(0.5), None, Some(1.0)]
/// );
/// ```
pub fn normalize(values: &[Option<f64>], mode: NormalizationMode) -> Vec<Option<f64>> {
    let present = values.iter().flatten().copied();
    let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    values
        .iter()
        .map(|value| {
            value.map(|v| match mode {
                NormalizationMode::Max => {
                    if max == 0.0 { 0.0 } else { v / max }
                }
                NormalizationMode::MinMax => min_max(v, min, max),
                NormalizationMode::Raw => v,
            })
        })
        .collect()
}

fn min_max(v: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span == 0.0 {
        0.0
    } else if span.is_finite() {
        (v - min) / span
    } else {
        // Span overflowed; halving keeps every difference finite
        (v / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
    }
}
