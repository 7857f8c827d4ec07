use clap::ValueEnum;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::chart::{MAX_DIMENSION, dimension_in_range};

/// How each series is rescaled before plotting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationMode {
    /// Divide by the series maximum; zero stays at zero
    #[default]
    Max,

    /// Map the series minimum to 0 and its maximum to 1
    MinMax,

    /// Plot raw values
    #[serde(rename = "none")]
    #[value(name = "none")]
    Raw,
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizationMode::Max => "max",
            NormalizationMode::MinMax => "min-max",
            NormalizationMode::Raw => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for NormalizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(NormalizationMode::Max),
            "min-max" | "minmax" => Ok(NormalizationMode::MinMax),
            "none" | "raw" => Ok(NormalizationMode::Raw),
            other => Err(format!("unknown normalization mode: {}", other)),
        }
    }
}

/// Runtime settings shared by the web server and the CLI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the web server listens on
    pub bind_addr: SocketAddr,

    /// Rendered chart width in pixels
    pub chart_width: u32,

    /// Rendered chart height in pixels
    pub chart_height: u32,

    /// Rescaling applied to every series
    pub normalization: NormalizationMode,

    /// Longest day range the densified axis may span
    pub max_days: usize,

    /// Upper bound on an upload request body
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            chart_width: 1000,
            chart_height: 500,
            normalization: NormalizationMode::Max,
            // A century of days
            max_days: 36_600,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Builds the configuration from defaults overridden by `CSVCHART_*`
    /// environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with variables read through `lookup`
    ///
    /// Chart sizes of zero or above [`MAX_DIMENSION`] are ignored like any
    /// other bad value.
    ///
    /// # Examples
    /// ```
    /// use csvchart::config::Config;
    ///
    /// let config = Config::from_vars(|key| match key {
    ///     "CSVCHART_WIDTH" => Some("640".to_string()),
    ///     "CSVCHART_HEIGHT" => Some("0".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!((config.chart_width, config.chart_height), (640, 500));
    /// ```
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        override_from(&lookup, "CSVCHART_ADDR", &mut config.bind_addr);
        override_dimension(&lookup, "CSVCHART_WIDTH", &mut config.chart_width);
        override_dimension(&lookup, "CSVCHART_HEIGHT", &mut config.chart_height);
        override_from(&lookup, "CSVCHART_NORMALIZE", &mut config.normalization);
        override_from(&lookup, "CSVCHART_MAX_DAYS", &mut config.max_days);
        override_from(&lookup, "CSVCHART_MAX_UPLOAD", &mut config.max_upload_bytes);
        config
    }
}

fn read_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

fn override_from<T, F>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(value) = read_var(lookup, key) {
        *slot = value;
    }
}

fn override_dimension<F>(lookup: &F, key: &str, slot: &mut u32)
where
    F: Fn(&str) -> Option<String>,
{
    match read_var::<u32, F>(lookup, key) {
        Some(pixels) if dimension_in_range(pixels) => *slot = pixels,
        Some(pixels) => warn!(
            "ignoring {}={}: must be between 1 and {}",
            key, pixels, MAX_DIMENSION
        ),
        None => {}
    }
}
