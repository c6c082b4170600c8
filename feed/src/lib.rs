//! The raw prediction feed: one row per (vehicle, query time) sample of a predicted arrival.

#[macro_use]
extern crate log;

mod ids;
mod record;

use anyhow::Result;

pub use ids::{RecordID, StopID, VehicleID};
pub use record::{InvalidInput, PredictionRecord};

/// Reads a batch of predictions from a CSV table dump. Columns are `Stop_ID`, `Vehicle`,
/// `Query_Time` and `Predicted_Time`, with times in epoch milliseconds. Other columns (like the
/// table's `Id`) are ignored.
///
/// Any malformed row aborts the whole load. No rows at all is just an empty batch.
pub fn load<R: std::io::Read>(reader: R) -> Result<Vec<PredictionRecord>> {
    let mut records = Vec::new();
    for (idx, rec) in csv::Reader::from_reader(reader).deserialize().enumerate() {
        // Row 1 is the first line after the header
        let row = idx + 1;
        let raw: record::RawRecord = rec.map_err(|err| InvalidInput::Malformed {
            row,
            message: err.to_string(),
        })?;
        records.push(raw.into_record(RecordID(idx), row)?);
    }
    if records.is_empty() {
        warn!("No predictions in the input");
    } else {
        info!("Loaded {} predictions", records.len());
    }
    Ok(records)
}
