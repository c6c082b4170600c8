use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use feed::{PredictionRecord, RecordID, StopID, VehicleID};

use crate::minutes;

/// A trip is named after the record that started it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TripID(pub RecordID);

/// A maximal run of one vehicle's predictions anchored to the same initial prediction.
#[derive(Clone, Debug, PartialEq)]
pub struct Trip {
    pub id: TripID,
    pub vehicle: VehicleID,
    /// The predicted arrival at the start of the trip. Every delay is measured against this.
    pub initial_prediction: NaiveDateTime,
    /// Sorted by query time, never empty
    pub points: Vec<TrajectoryPoint>,
}

/// All durations are in minutes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub record: RecordID,
    pub stop: StopID,
    pub query_time: NaiveDateTime,
    pub predicted_arrival: NaiveDateTime,
    /// `query_time - initial_prediction`, so negative until the initially predicted arrival
    pub time_to_initial_prediction: f64,
    /// `predicted_arrival - initial_prediction`
    pub cumulative_delay: f64,
    /// The `time_to_initial_prediction` when the trip first deviated from the initial prediction.
    /// Identical for every point in the trip, or None if it never deviated.
    pub departure_offset: Option<f64>,
}

impl Trip {
    /// `records` are one vehicle's readings for one trip, sorted by query time. `epsilon` is the
    /// smallest delay in minutes that counts as departing.
    pub fn new(records: &[&PredictionRecord], epsilon: f64) -> Result<Self> {
        let first = match records.first() {
            Some(rec) => *rec,
            None => bail!("Can't make a trip from no predictions"),
        };
        for pair in records.windows(2) {
            if pair[0].query_time > pair[1].query_time {
                bail!(
                    "Trip input out-of-order: {} then {}",
                    pair[0].query_time,
                    pair[1].query_time
                );
            }
            if pair[1].vehicle != first.vehicle {
                bail!(
                    "Trip for {:?} includes a prediction for {:?}",
                    first.vehicle,
                    pair[1].vehicle
                );
            }
        }

        let initial_prediction = first.predicted_arrival;
        let mut departure = None;
        let mut points = Vec::with_capacity(records.len());
        for rec in records {
            let delay = rec.predicted_arrival - initial_prediction;
            let time_to_initial_prediction = minutes(rec.query_time - initial_prediction);
            if departure.is_none() && minutes(delay).abs() >= epsilon {
                departure = Some(time_to_initial_prediction);
            }
            points.push(TrajectoryPoint {
                record: rec.id,
                stop: rec.stop,
                query_time: rec.query_time,
                predicted_arrival: rec.predicted_arrival,
                time_to_initial_prediction,
                cumulative_delay: minutes(delay),
                departure_offset: None,
            });
        }

        // Only known after the whole trip is seen, but it applies to the earlier points too
        for pt in &mut points {
            pt.departure_offset = departure;
        }

        Ok(Self {
            id: TripID(first.id),
            vehicle: first.vehicle,
            initial_prediction,
            points,
        })
    }

    pub fn departure_offset(&self) -> Option<f64> {
        self.points[0].departure_offset
    }

    /// The latest observation of the trip. If several share the latest query time, the first of
    /// them.
    pub fn final_point(&self) -> &TrajectoryPoint {
        let mut best = &self.points[0];
        for pt in &self.points[1..] {
            if pt.query_time > best.query_time {
                best = pt;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{approx_eq, record};

    #[test]
    fn test_delay_anchored_to_initial_prediction() {
        let records = vec![
            record(10, 1, 0.0, 20.0),
            record(11, 1, 2.0, 21.0),
            record(12, 1, 4.0, 23.5),
            record(13, 1, 6.0, 22.0),
        ];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        let trip = Trip::new(&refs, 0.01).unwrap();

        assert_eq!(trip.id, TripID(RecordID(10)));
        assert_eq!(trip.vehicle, VehicleID(1));
        assert_eq!(trip.initial_prediction, records[0].predicted_arrival);
        let delays: Vec<f64> = trip.points.iter().map(|pt| pt.cumulative_delay).collect();
        assert_eq!(delays, vec![0.0, 1.0, 3.5, 2.0]);
        let to_initial: Vec<f64> = trip
            .points
            .iter()
            .map(|pt| pt.time_to_initial_prediction)
            .collect();
        assert_eq!(to_initial, vec![-20.0, -18.0, -16.0, -14.0]);
    }

    #[test]
    fn test_departure_backfilled() {
        let records = vec![
            record(0, 1, 0.0, 20.0),
            record(1, 1, 1.0, 20.0),
            record(2, 1, 2.0, 20.5),
            record(3, 1, 3.0, 22.0),
        ];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        let trip = Trip::new(&refs, 0.01).unwrap();
        assert!(approx_eq(trip.departure_offset().unwrap(), -18.0));
        for pt in &trip.points {
            assert_eq!(pt.departure_offset, trip.departure_offset());
        }
    }

    #[test]
    fn test_never_departed() {
        let records = vec![record(0, 1, 0.0, 20.0), record(1, 1, 5.0, 20.0)];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        let trip = Trip::new(&refs, 0.01).unwrap();
        assert!(trip.points.iter().all(|pt| pt.departure_offset.is_none()));
        assert_eq!(trip.final_point().record, RecordID(1));
    }

    #[test]
    fn test_epsilon_threshold() {
        // A 30 second delay is below a one minute threshold, but a 90 second one isn't
        let records = vec![
            record(0, 1, 0.0, 20.0),
            record(1, 1, 1.0, 20.5),
            record(2, 1, 2.0, 21.5),
        ];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        let trip = Trip::new(&refs, 1.0).unwrap();
        assert!(approx_eq(trip.departure_offset().unwrap(), -18.0));

        let trip = Trip::new(&refs, 0.01).unwrap();
        assert!(approx_eq(trip.departure_offset().unwrap(), -19.0));
    }

    #[test]
    fn test_sub_second_timestamps() {
        // 8am plus 30 minutes, in epoch milliseconds
        let initial = 1460448000000 + 30 * 60_000;
        let records = vec![
            PredictionRecord::from_millis(
                RecordID(0),
                VehicleID(1),
                StopID(5),
                1460448000000,
                initial,
            )
            .unwrap(),
            // Queried at 08:10:00.500, predicted 105.5 seconds late
            PredictionRecord::from_millis(
                RecordID(1),
                VehicleID(1),
                StopID(5),
                1460448000000 + 10 * 60_000 + 500,
                initial + 105_500,
            )
            .unwrap(),
        ];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        let trip = Trip::new(&refs, 0.01).unwrap();
        let pt = &trip.points[1];
        assert!(approx_eq(pt.time_to_initial_prediction, -1_199_500.0 / 60_000.0));
        assert!(approx_eq(pt.cumulative_delay, 105_500.0 / 60_000.0));
        assert!(approx_eq(
            trip.departure_offset().unwrap(),
            -1_199_500.0 / 60_000.0
        ));
    }

    #[test]
    fn test_bad_input() {
        assert!(Trip::new(&[], 0.01).is_err());

        let records = vec![record(0, 1, 5.0, 20.0), record(1, 1, 1.0, 21.0)];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        assert!(Trip::new(&refs, 0.01).is_err());

        let records = vec![record(0, 1, 0.0, 20.0), record(1, 2, 1.0, 21.0)];
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        assert!(Trip::new(&refs, 0.01).is_err());
    }
}
