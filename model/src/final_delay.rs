use std::collections::BTreeMap;

use abstutil::Counter;
use chrono::NaiveDateTime;
use serde::Serialize;

use feed::VehicleID;

use crate::{Demarcations, TimeOfDay, Trip, TripID};

/// How late a trip ended up, as of its last observation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalDelay {
    pub trip: TripID,
    pub vehicle: VehicleID,
    /// Of the last observation
    pub query_time: NaiveDateTime,
    pub initial_prediction: NaiveDateTime,
    /// In minutes
    pub final_delay: f64,
    pub time_of_day: TimeOfDay,
}

/// One result per trip, except trips that finished with exactly no delay. Those don't say
/// anything.
pub fn summarize(trips: &[Trip], demarcations: &Demarcations) -> Vec<FinalDelay> {
    let mut results = Vec::new();
    let mut skipped = 0;
    for trip in trips {
        let last = trip.final_point();
        if last.cumulative_delay == 0.0 {
            skipped += 1;
            continue;
        }
        results.push(FinalDelay {
            trip: trip.id,
            vehicle: trip.vehicle,
            query_time: last.query_time,
            initial_prediction: trip.initial_prediction,
            final_delay: last.cumulative_delay,
            time_of_day: TimeOfDay::classify(trip.initial_prediction, demarcations),
        });
    }
    if skipped > 0 {
        info!(
            "Skipped {} / {} trips that ended with no delay",
            skipped,
            trips.len()
        );
    }
    results
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeOfDaySummary {
    pub time_of_day: TimeOfDay,
    pub trips: usize,
    /// In minutes
    pub mean_final_delay: f64,
}

/// The distribution of final delays per time of day. Buckets without any trips are omitted.
pub fn summarize_by_time_of_day(final_delays: &[FinalDelay]) -> Vec<TimeOfDaySummary> {
    let mut count: Counter<TimeOfDay> = Counter::new();
    let mut total: BTreeMap<TimeOfDay, f64> = BTreeMap::new();
    for x in final_delays {
        count.inc(x.time_of_day);
        *total.entry(x.time_of_day).or_insert(0.0) += x.final_delay;
    }

    let mut results = Vec::new();
    for time_of_day in TimeOfDay::all() {
        let trips = count.get(time_of_day);
        if trips == 0 {
            continue;
        }
        results.push(TimeOfDaySummary {
            time_of_day,
            trips,
            mean_final_delay: total[&time_of_day] / trips as f64,
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use feed::{PredictionRecord, RecordID};

    use super::*;
    use crate::tests::{approx_eq, record, weekend_record};

    fn trip(records: &[PredictionRecord]) -> Trip {
        let refs: Vec<&PredictionRecord> = records.iter().collect();
        Trip::new(&refs, 0.01).unwrap()
    }

    #[test]
    fn test_last_point_wins() {
        let late = trip(&[
            record(0, 1, 0.0, 60.0),
            record(1, 1, 10.0, 63.0),
            record(2, 1, 20.0, 62.0),
        ]);
        let results = summarize(&[late], &Demarcations::default());
        assert_eq!(results.len(), 1);
        let x = &results[0];
        assert_eq!(x.trip, TripID(RecordID(0)));
        assert_eq!(x.vehicle, VehicleID(1));
        assert_eq!(x.final_delay, 2.0);
        assert_eq!(x.query_time.to_string(), "2016-04-12 08:20:00");
        // The initial prediction is 09:00 on a Tuesday
        assert_eq!(x.time_of_day, TimeOfDay::MorningRush);
    }

    #[test]
    fn test_zero_delay_skipped() {
        let back_on_time = trip(&[
            record(0, 1, 0.0, 60.0),
            record(1, 1, 10.0, 63.0),
            record(2, 1, 20.0, 60.0),
        ]);
        let single = trip(&[record(3, 2, 0.0, 30.0)]);
        let early = trip(&[record(4, 3, 0.0, 30.0), record(5, 3, 1.0, 29.0)]);
        let results = summarize(&[back_on_time, single, early], &Demarcations::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].trip, TripID(RecordID(4)));
        assert_eq!(results[0].final_delay, -1.0);
        assert!(results.iter().all(|x| x.final_delay != 0.0));
    }

    #[test]
    fn test_weekend() {
        let saturday = trip(&[weekend_record(0, 1, 0.0, 0.0), weekend_record(1, 1, 5.0, 4.0)]);
        let results = summarize(&[saturday], &Demarcations::default());
        assert_eq!(results[0].time_of_day, TimeOfDay::Weekend);
    }

    #[test]
    fn test_summarize_by_time_of_day() {
        let trips = vec![
            // Initial predictions at 08:30, 08:40, and 12:00
            trip(&[record(0, 1, 0.0, 30.0), record(1, 1, 5.0, 32.0)]),
            trip(&[record(2, 2, 0.0, 40.0), record(3, 2, 5.0, 45.0)]),
            trip(&[record(4, 3, 0.0, 240.0), record(5, 3, 5.0, 241.0)]),
        ];
        let final_delays = summarize(&trips, &Demarcations::default());
        let summary = summarize_by_time_of_day(&final_delays);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].time_of_day, TimeOfDay::MorningRush);
        assert_eq!(summary[0].trips, 2);
        assert!(approx_eq(summary[0].mean_final_delay, 3.5));
        assert_eq!(summary[1].time_of_day, TimeOfDay::Midday);
        assert_eq!(summary[1].trips, 1);
        assert!(approx_eq(summary[1].mean_final_delay, 1.0));
    }
}
