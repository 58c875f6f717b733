//! CSV and JSON encodings of record sets

use std::io::{Read, Write};

use crate::error::Result;
use crate::metadata::UnifiedRecord;

/// Write records as CSV. The header is written even for an empty set.
pub fn write_csv<W: Write>(writer: W, records: &[UnifiedRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(UnifiedRecord::COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read records written by [`write_csv`]
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<UnifiedRecord>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut records = Vec::new();
    for record in rdr.deserialize::<UnifiedRecord>() {
        records.push(record?);
    }
    Ok(records)
}

/// Format records as a pretty-printed JSON array of objects
pub fn format_json(records: &[UnifiedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
