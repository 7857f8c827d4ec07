use image::{ImageOutputFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

use crate::align::{ChartData, ChartSeries};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to plot")]
    EmptyChart,

    #[error("drawing failed: {0}")]
    Drawing(String),

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
}

/// Largest width or height, in pixels, a chart may be rendered at
pub const MAX_DIMENSION: u32 = 10_000;

/// Whether `pixels` is a usable chart width or height
pub fn dimension_in_range(pixels: u32) -> bool {
    (1..=MAX_DIMENSION).contains(&pixels)
}

fn check_size(options: &ChartOptions) -> Result<(), RenderError> {
    if dimension_in_range(options.width) && dimension_in_range(options.height) {
        Ok(())
    } else {
        Err(RenderError::Drawing(format!(
            "chart size {}x{} outside 1..={} pixels",
            options.width, options.height, MAX_DIMENSION
        )))
    }
}

fn drawing_err<E: fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Configuration options for chart rendering
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "CSV Data Chart".to_string(),
            width: 1000,
            height: 500,
        }
    }
}

/// Renders the overlaid line chart as an SVG document
///
/// # Arguments
/// * `data` - Aligned chart data
/// * `options` - Title and pixel size
///
/// # Returns
/// * `Result<String, RenderError>` - SVG markup, or [`RenderError::EmptyChart`]
///   when no series is loaded
pub fn render_svg(data: &ChartData, options: &ChartOptions) -> Result<String, RenderError> {
    if data.is_empty() {
        return Err(RenderError::EmptyChart);
    }
    check_size(options)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        draw_chart(&root, data, options)?;
        root.present().map_err(drawing_err)?;
    }
    Ok(svg)
}

/// Renders the overlaid line chart as a PNG image
///
/// Drawing happens into an in-memory RGB buffer that is then encoded, so no
/// temporary file is involved.
pub fn render_png(data: &ChartData, options: &ChartOptions) -> Result<Vec<u8>, RenderError> {
    if data.is_empty() {
        return Err(RenderError::EmptyChart);
    }
    check_size(options)?;

    let (width, height) = (options.width, options.height);
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| RenderError::Drawing("pixel buffer too large".to_string()))?;
    let mut pixels = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw_chart(&root, data, options)?;
        root.present().map_err(drawing_err)?;
    }

    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| RenderError::Drawing("pixel buffer size mismatch".to_string()))?;
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageOutputFormat::Png)?;
    Ok(png.into_inner())
}

fn draw_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &ChartData,
    options: &ChartOptions,
) -> Result<(), RenderError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(drawing_err)?;

    let labels = data.label_strings();
    let x_max = (labels.len().saturating_sub(1)).max(1) as f64;
    let (y_min, y_max) = value_bounds(&data.series);

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(0)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(drawing_err)?;

    let x_label_formatter = |x: &f64| {
        let idx = x.round().max(0.0) as usize;
        labels.get(idx).cloned().unwrap_or_default()
    };

    // Values are rescaled per series, so a shared y axis would be meaningless
    chart
        .configure_mesh()
        .disable_y_axis()
        .disable_y_mesh()
        .x_labels(8)
        .x_label_formatter(&x_label_formatter)
        .draw()
        .map_err(drawing_err)?;

    for series in &data.series {
        let color = parse_hex_color(&series.border_color).unwrap_or(BLUE);
        let points = present_points(series);

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(drawing_err)?
            .label(series.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )
            .map_err(drawing_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperMiddle)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .draw()
        .map_err(drawing_err)?;

    Ok(())
}

// Gaps are skipped rather than broken so the line spans missing days
fn present_points(series: &ChartSeries) -> Vec<(f64, f64)> {
    series
        .normalized
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect()
}

fn value_bounds(series: &[ChartSeries]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.normalized.iter().flatten().copied())
        .fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let hi = if hi.is_finite() && hi > lo { hi } else { lo + 1.0 };
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Parses `#RRGGBB` (an alpha suffix is ignored) into a plotters colour
///
/// # Examples
/// ```
/// use csvchart::chart::parse_hex_color;
/// use plotters::style::RGBColor;
///
/// assert_eq!(parse_hex_color("#36A2EB"), Some(RGBColor(0x36, 0xA2, 0xEB)));
/// assert_eq!(parse_hex_color("#36A2EB20"), Some(RGBColor(0x36, 0xA2, 0xEB)));
/// assert_eq!(parse_hex_color("blue"), None);
/// ```
pub fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() < 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Hover text for one point: the unscaled value, or `N/A` on a gap
///
/// # Examples
/// ```
/// use csvchart::align::ChartSeries;
/// use csvchart::chart::tooltip_text;
///
/// let series = ChartSeries {
///     label: "Price".to_string(),
///     file_label: "prices".to_string(),
///     border_color: "#FF6384".to_string(),
///     background_color: "#FF638420".to_string(),
///     normalized: vec![Some(1.0), None],
///     original: vec![Some(12.5), None],
/// };
/// assert_eq!(tooltip_text(&series, 0), "Price: 12.5");
/// assert_eq!(tooltip_text(&series, 1), "Price: N/A");
/// ```
pub fn tooltip_text(series: &ChartSeries, index: usize) -> String {
    match series.original.get(index).copied().flatten() {
        Some(value) => format!("{}: {}", series.label, value),
        None => format!("{}: N/A", series.label),
    }
}
