//! Turns repeated samples of predicted arrival times into per-trip delays, and projects the final
//! delay of a trip before it finishes.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod export;
mod extrapolate;
mod final_delay;
pub mod segment;
mod time_of_day;
mod trajectory;

use abstutil::Timer;
use anyhow::Result;

use feed::PredictionRecord;

pub use config::{Config, Demarcations};
pub use export::{export_final_delays_csv, export_summary_csv};
pub use extrapolate::{
    evaluate, extrapolate, extrapolate_all, BadFit, ExtrapolatedDelay, ExtrapolationReport,
};
pub use final_delay::{summarize, summarize_by_time_of_day, FinalDelay, TimeOfDaySummary};
pub use time_of_day::TimeOfDay;
pub use trajectory::{TrajectoryPoint, Trip, TripID};

/// Every trip found in one batch of predictions.
pub struct DelayModel {
    pub config: Config,
    /// Grouped by vehicle (ascending), then in order of time
    pub trips: Vec<Trip>,
}

impl DelayModel {
    pub fn new(records: &[PredictionRecord], config: Config, timer: &mut Timer) -> Result<Self> {
        config.validate()?;
        let max_delta = config.max_delta;
        let epsilon = config.epsilon;

        timer.start("group predictions by vehicle");
        let per_vehicle = segment::group_by_vehicle(records);
        timer.stop("group predictions by vehicle");

        // Vehicles are independent of each other
        let per_vehicle_trips = timer.parallelize(
            "build trips per vehicle",
            per_vehicle.into_iter().collect(),
            move |(vehicle, sorted)| {
                segment::segment_vehicle(vehicle, sorted, max_delta)
                    .into_iter()
                    .map(|readings| Trip::new(&readings, epsilon))
                    .collect::<Result<Vec<_>>>()
            },
        );
        let mut trips = Vec::new();
        for result in per_vehicle_trips {
            trips.extend(result?);
        }

        let model = Self { config, trips };
        info!(
            "Found {} trips with {} points from {} predictions",
            model.trips.len(),
            model.num_points(),
            records.len()
        );
        Ok(model)
    }

    /// Every point of every trip. Per-point results like `extrapolated_delays` are in this order.
    pub fn points(&self) -> impl Iterator<Item = (&Trip, &TrajectoryPoint)> {
        self.trips
            .iter()
            .flat_map(|trip| trip.points.iter().map(move |pt| (trip, pt)))
    }

    pub fn num_points(&self) -> usize {
        self.trips.iter().map(|trip| trip.points.len()).sum()
    }

    pub fn final_delays(&self) -> Vec<FinalDelay> {
        summarize(&self.trips, &self.config.demarcations)
    }

    pub fn extrapolated_delays(&self) -> Vec<ExtrapolatedDelay> {
        extrapolate_all(&self.trips)
    }

    pub fn evaluate_extrapolation(
        &self,
        extrapolated: &[ExtrapolatedDelay],
    ) -> Result<ExtrapolationReport> {
        evaluate(&self.trips, extrapolated)
    }
}

/// Fractional minutes, to millisecond precision
pub(crate) fn minutes(duration: chrono::Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
pub(crate) mod tests {
    use feed::{PredictionRecord, RecordID, StopID, VehicleID};

    // 2016-04-12 08:00:00, a Tuesday
    const WEEKDAY_MORNING: i64 = 1460448000000;
    // 2016-04-16 10:00:00, a Saturday
    const SATURDAY_MORNING: i64 = 1460800800000;

    /// Times are in minutes after 8am on a Tuesday
    pub fn record(id: usize, vehicle: u64, query: f64, predicted: f64) -> PredictionRecord {
        at(WEEKDAY_MORNING, id, vehicle, query, predicted)
    }

    /// Times are in minutes after 10am on a Saturday
    pub fn weekend_record(id: usize, vehicle: u64, query: f64, predicted: f64) -> PredictionRecord {
        at(SATURDAY_MORNING, id, vehicle, query, predicted)
    }

    fn at(base: i64, id: usize, vehicle: u64, query: f64, predicted: f64) -> PredictionRecord {
        let offset = |minutes: f64| base + (minutes * 60_000.0).round() as i64;
        PredictionRecord::from_millis(
            RecordID(id),
            VehicleID(vehicle),
            StopID(5),
            offset(query),
            offset(predicted),
        )
        .unwrap()
    }

    pub fn approx_eq(x: f64, y: f64) -> bool {
        (x - y).abs() < 1e-9
    }

    #[test]
    fn test_minutes_keep_fractional_seconds() {
        assert_eq!(super::minutes(chrono::Duration::milliseconds(90_000)), 1.5);
        assert!(approx_eq(
            super::minutes(chrono::Duration::milliseconds(90_999)),
            90.999 / 60.0
        ));
        assert!(approx_eq(
            super::minutes(chrono::Duration::milliseconds(-30_500)),
            -30.5 / 60.0
        ));
    }
}
