//! The persisted artifact: the finished event list as one JSON array.

use crate::{error::GenResult, event::EventRecord};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn write_json(path: impl AsRef<Path>, events: &[EventRecord]) -> GenResult<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut out, events)?;
    out.flush()?;
    log::info!("wrote {} events to {}", events.len(), path.as_ref().display());
    Ok(())
}

pub fn read_json(path: impl AsRef<Path>) -> GenResult<Vec<EventRecord>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Loose read for reporting: any JSON array, no schema enforced.
pub fn read_raw(path: impl AsRef<Path>) -> GenResult<Vec<serde_json::Value>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}
