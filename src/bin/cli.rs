#![cfg(not(tarpaulin_include))]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueHint};
use csvchart::chart::{self, ChartOptions, MAX_DIMENSION};
use csvchart::config::{Config, NormalizationMode};
use csvchart::export;
use csvchart::saving;
use csvchart::session::{ChartSession, UploadedFile};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simple CSV Chart command line renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overlay one or more date/value CSV files on a single chart
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// CSV files to ingest, in colour order
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Output SVG path
    #[arg(short, long, default_value = "chart.svg", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Also write a PNG figure
    #[arg(long, value_hint = ValueHint::FilePath)]
    png: Option<PathBuf>,

    /// Write the aligned values as CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    export: Option<PathBuf>,

    /// Save the parsed datasets as a session snapshot
    #[arg(long, value_hint = ValueHint::FilePath)]
    snapshot: Option<PathBuf>,

    /// Series normalization
    #[arg(long, value_enum)]
    mode: Option<NormalizationMode>,

    /// Chart width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DIMENSION as i64))]
    width: Option<u32>,

    /// Chart height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DIMENSION as i64))]
    height: Option<u32>,

    /// Chart title
    #[arg(long, default_value = "CSV Data Chart")]
    title: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Command::Render(args) => handle_render(args),
    }
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(mode) = args.mode {
        config.normalization = mode;
    }

    let mut files = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let contents =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(UploadedFile::new(name, contents));
    }

    let mut session = ChartSession::new();
    for result in session.add_files(&files) {
        if let Err(e) = result {
            eprintln!("skipped {}", e);
        }
    }
    for dataset in session.datasets() {
        println!("{} ({} points)", dataset.label, dataset.len());
    }

    if session.is_empty() {
        bail!("none of the input files contained date/value rows");
    }

    let data = session
        .chart_data(&config)
        .context("failed to align the input series")?;

    let options = ChartOptions {
        title: args.title,
        width: args.width.unwrap_or(config.chart_width),
        height: args.height.unwrap_or(config.chart_height),
    };

    let svg = chart::render_svg(&data, &options).context("failed to render chart")?;
    fs::write(&args.output, svg)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    if let Some(path) = &args.png {
        let png = chart::render_png(&data, &options).context("failed to render PNG")?;
        fs::write(path, png).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }

    if let Some(path) = &args.export {
        let csv = export::aligned_csv(&data)?;
        fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }

    if let Some(path) = &args.snapshot {
        saving::save_session(&session, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
