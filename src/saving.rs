use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::series::Dataset;
use crate::session::ChartSession;

fn write_datasets<W: Write>(datasets: &[Dataset], sink: W) -> io::Result<()> {
    let encoder = GzEncoder::new(sink, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, datasets).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?;
    Ok(())
}

fn read_datasets<R: Read>(source: R) -> io::Result<Vec<Dataset>> {
    let decoder = GzDecoder::new(source);
    let mut reader = BufReader::new(decoder);

    let datasets: Vec<Dataset> = deserialize_from(&mut reader)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    datasets.into_iter().map(checked_dataset).collect()
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

// Restored datasets must look like parser output: sorted points, finite
// values, `#RRGGBB[AA]` colours.
fn checked_dataset(mut dataset: Dataset) -> io::Result<Dataset> {
    if dataset.points.is_empty() {
        return Err(invalid(format!("dataset {:?} has no points", dataset.label)));
    }
    if let Some(point) = dataset.points.iter().find(|p| !p.value.is_finite()) {
        return Err(invalid(format!(
            "dataset {:?} has a non-finite value on {}",
            dataset.label, point.date
        )));
    }
    for color in [&dataset.border_color, &dataset.background_color] {
        if !well_formed_color(color) {
            return Err(invalid(format!(
                "dataset {:?} has a malformed colour {:?}",
                dataset.label, color
            )));
        }
    }

    dataset.points.sort_by_key(|p| p.date);
    Ok(dataset)
}

fn well_formed_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Writes the datasets of a session to a gzip-compressed snapshot file
pub fn save_session(session: &ChartSession, filename: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(filename)?;
    write_datasets(session.datasets(), file)
}

/// Reads a snapshot written by [`save_session`]
///
/// Points are put back in date order. A dataset holding a non-finite value,
/// a malformed colour or no points fails with [`io::ErrorKind::InvalidData`].
pub fn load_session(filename: impl AsRef<Path>) -> io::Result<ChartSession> {
    let file = File::open(filename)?;
    Ok(ChartSession::from_datasets(read_datasets(file)?))
}

/// In-memory form of [`save_session`], used for snapshot downloads
pub fn to_bytes(session: &ChartSession) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_datasets(session.datasets(), &mut buffer)?;
    Ok(buffer)
}

/// In-memory form of [`load_session`]
pub fn from_bytes(bytes: &[u8]) -> io::Result<ChartSession> {
    Ok(ChartSession::from_datasets(read_datasets(bytes)?))
}
