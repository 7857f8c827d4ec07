/*!
# Simple CSV Chart

Upload CSV files holding a date column and a numeric value column and see
them overlaid on one line chart, with the raw data listed underneath.

## Overview

Each file is parsed into a dated series. All series are then aligned onto a
single continuous day axis running from the earliest to the latest date found
in any file, and every series is rescaled on its own so that files measured
in very different units can still be compared by shape.

## Pipeline

1. **Ingestion** - uploaded bytes are decoded as UTF-8 text
2. **Parsing** - the header names the value column; rows without a usable
   date or number are skipped; points are sorted by date
3. **Alignment** - the union of all dates is densified to one label per day
4. **Normalization** - each series is divided by its maximum (or min-max
   scaled, or left raw)
5. **Rendering** - SVG/PNG chart via plotters, HTML page via handlebars

## Modules

- **series**: data points, datasets and the colour palette
- **parser**: CSV text to sorted series
- **align**: shared day axis and per-series normalization
- **session**: the set of uploaded datasets
- **chart**: chart rendering
- **export**: aligned CSV and XLSX downloads
- **saving**: gzip-compressed session snapshots
- **config**: runtime settings
- **page**: HTML view (web feature)
- **app**: routing and handlers (web feature)

## Endpoints

- `/` - the page
- `/upload`, `/clear` - form actions
- `/api/upload`, `/api/clear`, `/api/datasets`, `/api/chart` - JSON API
- `/chart.svg`, `/chart.png` - rendered chart
- `/export/aligned.csv`, `/export/aligned.xlsx` - aligned values
- `/session` - snapshot download (GET) and restore (POST)
*/

pub mod align;
pub mod chart;
pub mod config;
pub mod export;
pub mod parser;
pub mod saving;
pub mod series;
pub mod session;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod page;

pub use align::{ChartData, ChartSeries, align};
pub use config::{Config, NormalizationMode};
pub use parser::{ParsedCsv, parse_csv};
pub use series::{DataPoint, Dataset};
pub use session::{ChartError, ChartSession, UploadedFile};
