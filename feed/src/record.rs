use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::{RecordID, StopID, VehicleID};

/// One observation from the feed: at `query_time`, the vehicle was predicted to reach the stop at
/// `predicted_arrival`.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionRecord {
    pub id: RecordID,
    pub vehicle: VehicleID,
    pub stop: StopID,
    pub query_time: NaiveDateTime,
    pub predicted_arrival: NaiveDateTime,
}

/// Structural problems with the input. These are fatal for the batch.
#[derive(Debug, Error)]
pub enum InvalidInput {
    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: &'static str },
    #[error("row {row}: {field} = {value} isn't a valid epoch-millisecond timestamp")]
    BadTimestamp {
        row: usize,
        field: &'static str,
        value: i64,
    },
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
}

// Every column is optional here, so a missing value turns into a precise error instead of a
// generic deserialization failure.
#[derive(Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "Stop_ID", default)]
    stop: Option<u64>,
    #[serde(rename = "Vehicle", default)]
    vehicle: Option<u64>,
    #[serde(rename = "Query_Time", default)]
    query_time: Option<i64>,
    #[serde(rename = "Predicted_Time", default)]
    predicted_time: Option<i64>,
}

impl RawRecord {
    pub(crate) fn into_record(
        self,
        id: RecordID,
        row: usize,
    ) -> Result<PredictionRecord, InvalidInput> {
        let stop = require(self.stop, row, "Stop_ID")?;
        let vehicle = require(self.vehicle, row, "Vehicle")?;
        let query_time = require(self.query_time, row, "Query_Time")?;
        let predicted_time = require(self.predicted_time, row, "Predicted_Time")?;

        Ok(PredictionRecord {
            id,
            vehicle: VehicleID(vehicle),
            stop: StopID(stop),
            query_time: parse_millis(query_time, row, "Query_Time")?,
            predicted_arrival: parse_millis(predicted_time, row, "Predicted_Time")?,
        })
    }
}

impl PredictionRecord {
    /// Builds a record from epoch-millisecond timestamps, the way the feed stores them.
    pub fn from_millis(
        id: RecordID,
        vehicle: VehicleID,
        stop: StopID,
        query_time: i64,
        predicted_arrival: i64,
    ) -> Result<Self, InvalidInput> {
        let row = id.0 + 1;
        Ok(Self {
            id,
            vehicle,
            stop,
            query_time: parse_millis(query_time, row, "Query_Time")?,
            predicted_arrival: parse_millis(predicted_arrival, row, "Predicted_Time")?,
        })
    }
}

fn require<T>(value: Option<T>, row: usize, field: &'static str) -> Result<T, InvalidInput> {
    value.ok_or(InvalidInput::MissingField { row, field })
}

fn parse_millis(
    value: i64,
    row: usize,
    field: &'static str,
) -> Result<NaiveDateTime, InvalidInput> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .map(|dt| dt.naive_utc())
        .ok_or(InvalidInput::BadTimestamp { row, field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis() {
        let rec =
            PredictionRecord::from_millis(RecordID(0), VehicleID(1), StopID(2), 0, 60_000).unwrap();
        assert_eq!(rec.query_time.to_string(), "1970-01-01 00:00:00");
        assert_eq!(rec.predicted_arrival.to_string(), "1970-01-01 00:01:00");
    }

    #[test]
    fn test_bad_timestamp() {
        let err = PredictionRecord::from_millis(RecordID(3), VehicleID(1), StopID(2), 0, i64::MAX)
            .unwrap_err();
        assert!(matches!(
            err,
            InvalidInput::BadTimestamp {
                row: 4,
                field: "Predicted_Time",
                ..
            }
        ));
    }
}
