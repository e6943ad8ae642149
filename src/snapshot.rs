//! CSV snapshots of the raw and enriched playlist tables.
//!
//! Snapshots are write-only from the core's point of view: nothing here is
//! read back, they exist so a run's inputs and derivations can be inspected.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::playlist::{EnrichedTrack, TrackRecord, ENRICHED_COLUMNS, RAW_COLUMNS};

pub fn write_raw_csv(records: &[TrackRecord], writer: impl Write) -> Result<(), String> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(RAW_COLUMNS)
        .map_err(|e| format!("CSV write error: {e}"))?;
    for record in records {
        let row: Vec<String> = RAW_COLUMNS
            .iter()
            .map(|column| record.value(column).unwrap_or_default())
            .collect();
        csv.write_record(&row)
            .map_err(|e| format!("CSV write error: {e}"))?;
    }
    csv.flush().map_err(|e| format!("CSV flush error: {e}"))
}

pub fn write_enriched_csv(tracks: &[EnrichedTrack], writer: impl Write) -> Result<(), String> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(ENRICHED_COLUMNS)
        .map_err(|e| format!("CSV write error: {e}"))?;
    for track in tracks {
        let row: Vec<String> = ENRICHED_COLUMNS
            .iter()
            .map(|column| track.value(column).unwrap_or_default())
            .collect();
        csv.write_record(&row)
            .map_err(|e| format!("CSV write error: {e}"))?;
    }
    csv.flush().map_err(|e| format!("CSV flush error: {e}"))
}

pub fn write_raw_csv_file(records: &[TrackRecord], path: &Path) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|error| format!("failed to create {}: {error}", path.display()))?;
    write_raw_csv(records, file)
}

pub fn write_enriched_csv_file(tracks: &[EnrichedTrack], path: &Path) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|error| format!("failed to create {}: {error}", path.display()))?;
    write_enriched_csv(tracks, file)
}
