use log::{info, warn};
use thiserror::Error;

use crate::align::{AlignError, ChartData, align};
use crate::config::Config;
use crate::parser::{ParseError, parse_csv};
use crate::series::{Dataset, label_from_file_name};

/// Failure while ingesting one uploaded file
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("{file}: file is not valid UTF-8 text")]
    Encoding { file: String },
}

/// An uploaded file waiting to be ingested
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// The set of files currently shown on the chart
///
/// Datasets are kept in upload order, which also decides their colours.
/// Chart data is recomputed from scratch on every request so a new upload
/// can widen the shared day axis of files that were already loaded.
#[derive(Debug, Default)]
pub struct ChartSession {
    datasets: Vec<Dataset>,
    last_error: Option<String>,
    revision: u64,
}

impl ChartSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a session from previously saved datasets
    pub fn from_datasets(datasets: Vec<Dataset>) -> Self {
        Self {
            datasets,
            last_error: None,
            revision: 0,
        }
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Bumped whenever the set of datasets changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Message of the most recent failed upload, if the last upload failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Parses one CSV file and appends it to the session
    ///
    /// The dataset takes the next palette colour. A file with no usable
    /// rows is rejected and leaves the session unchanged apart from
    /// `last_error`.
    ///
    /// # Examples
    /// ```
    /// use csvchart::session::ChartSession;
    ///
    /// let mut session = ChartSession::new();
    /// let dataset = session.add_csv("sales.csv", "Date,Units\n2024-01-01,4\n").unwrap();
    /// assert_eq!(dataset.label, "sales");
    /// assert_eq!(dataset.value_column_name, "Units");
    /// ```
    pub fn add_csv(&mut self, file_name: &str, text: &str) -> Result<&Dataset, ChartError> {
        let index = self.datasets.len();
        match build_dataset(file_name, text, index) {
            Ok(dataset) => {
                self.last_error = None;
                self.revision += 1;
                self.datasets.push(dataset);
                Ok(&self.datasets[index])
            }
            Err(e) => {
                warn!("rejected upload: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Ingests a batch of files in the order given
    ///
    /// Each file is handled independently; a bad file does not stop the rest
    /// of the batch. Returns the label or the error for every file.
    pub fn add_files(&mut self, files: &[UploadedFile]) -> Vec<Result<String, ChartError>> {
        let mut results = Vec::with_capacity(files.len());
        let mut failure = None;

        for file in files {
            let outcome = match decode_text(file) {
                Ok(text) => self.add_csv(&file.name, &text).map(|d| d.label.clone()),
                Err(e) => {
                    warn!("rejected upload: {}", e);
                    Err(e)
                }
            };
            if let Err(e) = &outcome {
                failure = Some(e.to_string());
            }
            results.push(outcome);
        }

        // Keep the last failure visible even if a later file in the batch succeeded
        if failure.is_some() {
            self.last_error = failure;
        }

        results
    }

    /// Replaces every dataset with a restored set
    pub fn restore(&mut self, datasets: Vec<Dataset>) {
        info!("restoring {} datasets", datasets.len());
        self.datasets = datasets;
        self.last_error = None;
        self.revision += 1;
    }

    pub fn into_datasets(self) -> Vec<Dataset> {
        self.datasets
    }

    /// Removes every dataset
    pub fn clear(&mut self) {
        info!("clearing {} datasets", self.datasets.len());
        self.datasets.clear();
        self.last_error = None;
        self.revision += 1;
    }

    /// Aligns and normalizes the current datasets for plotting
    pub fn chart_data(&self, config: &Config) -> Result<ChartData, AlignError> {
        align(&self.datasets, config.normalization, config.max_days)
    }
}

fn build_dataset(file_name: &str, text: &str, index: usize) -> Result<Dataset, ChartError> {
    let parsed = parse_csv(text).map_err(|source| ChartError::Parse {
        file: file_name.to_string(),
        source,
    })?;

    let label = label_from_file_name(file_name);
    info!(
        "loaded {} ({} points, {} rows skipped)",
        label,
        parsed.points.len(),
        parsed.skipped_rows
    );

    Ok(Dataset::new(
        label,
        parsed.points,
        parsed.value_column_name,
        index,
    ))
}

/// Decodes an upload as UTF-8, dropping a leading byte order mark
pub fn decode_text(file: &UploadedFile) -> Result<String, ChartError> {
    let bytes = file
        .contents
        .strip_prefix(b"\xEF\xBB\xBF")
        .unwrap_or(file.contents.as_slice());
    String::from_utf8(bytes.to_vec()).map_err(|_| ChartError::Encoding {
        file: file.name.clone(),
    })
}
