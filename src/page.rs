use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

use crate::session::ChartSession;

const INDEX_TEMPLATE: &str = "index";

#[derive(Debug, Serialize)]
struct FileEntry {
    label: String,
    count: usize,
    color: String,
}

#[derive(Debug, Serialize)]
struct TableRow {
    date: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct RawTable {
    label: String,
    value_column_name: String,
    rows: Vec<TableRow>,
}

/// Everything the index template needs
#[derive(Debug, Serialize)]
pub struct PageView {
    files: Vec<FileEntry>,
    tables: Vec<RawTable>,
    chart_url: Option<String>,
    error: Option<String>,
}

impl PageView {
    /// Builds the view for the current session
    ///
    /// `chart_error` is shown in place of the upload error when the datasets
    /// loaded but could not be aligned; in that case no chart is linked.
    pub fn from_session(session: &ChartSession, chart_error: Option<String>) -> Self {
        let files = session
            .datasets()
            .iter()
            .map(|d| FileEntry {
                label: d.label.clone(),
                count: d.len(),
                color: d.border_color.clone(),
            })
            .collect();

        let tables = session
            .datasets()
            .iter()
            .map(|d| RawTable {
                label: d.label.clone(),
                value_column_name: d.value_column_name.clone(),
                rows: d
                    .points
                    .iter()
                    .map(|p| TableRow {
                        date: p.raw_date.clone(),
                        value: p.value.to_string(),
                    })
                    .collect(),
            })
            .collect();

        let chart_url = if session.is_empty() || chart_error.is_some() {
            None
        } else {
            // Revision in the query string defeats browser image caching
            Some(format!("/chart.svg?rev={}", session.revision()))
        };

        let error = chart_error.or_else(|| session.last_error().map(str::to_string));

        Self {
            files,
            tables,
            chart_url,
            error,
        }
    }
}

/// Creates the template registry with the index page registered
pub fn registry() -> Result<Handlebars<'static>, TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_template_string(INDEX_TEMPLATE, include_str!("./static/index.hbs"))?;
    Ok(handlebars)
}

/// Renders the single page of the application
pub fn render_page(handlebars: &Handlebars<'_>, view: &PageView) -> Result<String, RenderError> {
    handlebars.render(INDEX_TEMPLATE, view)
}
