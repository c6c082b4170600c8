use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use feed::{StopID, VehicleID};

use crate::{DelayModel, ExtrapolatedDelay, FinalDelay, TimeOfDaySummary, TripID};

impl DelayModel {
    /// One row per trajectory point
    pub fn export_trajectories_csv(&self) -> Result<String> {
        to_csv(self.points().map(|(trip, pt)| TrajectoryRow {
            vehicle: trip.vehicle,
            stop: pt.stop,
            trip: trip.id,
            initial_prediction: trip.initial_prediction,
            query_time: pt.query_time,
            cumulative_delay: pt.cumulative_delay,
            time_to_initial_prediction: pt.time_to_initial_prediction,
            departure_offset: pt.departure_offset,
        }))
    }

    /// `extrapolated` must line up with `points()`. With `joined`, each row also has the full
    /// trajectory point it came from.
    pub fn export_extrapolated_csv(
        &self,
        extrapolated: &[ExtrapolatedDelay],
        joined: bool,
    ) -> Result<String> {
        if extrapolated.len() != self.num_points() {
            bail!(
                "{} extrapolated delays for {} trajectory points",
                extrapolated.len(),
                self.num_points()
            );
        }
        if !joined {
            return to_csv(extrapolated.iter());
        }
        to_csv(
            self.points()
                .zip(extrapolated)
                .map(|((trip, pt), x)| JoinedRow {
                    vehicle: trip.vehicle,
                    stop: pt.stop,
                    trip: trip.id,
                    initial_prediction: trip.initial_prediction,
                    query_time: pt.query_time,
                    cumulative_delay: pt.cumulative_delay,
                    time_to_initial_prediction: pt.time_to_initial_prediction,
                    departure_offset: pt.departure_offset,
                    extrapolated_delay: x.extrapolated_delay,
                    good_fit: x.good_fit,
                }),
        )
    }
}

pub fn export_final_delays_csv(final_delays: &[FinalDelay]) -> Result<String> {
    to_csv(final_delays.iter())
}

pub fn export_summary_csv(summary: &[TimeOfDaySummary]) -> Result<String> {
    to_csv(summary.iter())
}

fn to_csv<T: Serialize, I: Iterator<Item = T>>(rows: I) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    let out = String::from_utf8(out)?;
    Ok(out)
}

#[derive(Serialize)]
struct TrajectoryRow {
    vehicle: VehicleID,
    stop: StopID,
    trip: TripID,
    initial_prediction: NaiveDateTime,
    query_time: NaiveDateTime,
    cumulative_delay: f64,
    time_to_initial_prediction: f64,
    departure_offset: Option<f64>,
}

// The csv crate can't flatten, so this repeats TrajectoryRow
#[derive(Serialize)]
struct JoinedRow {
    vehicle: VehicleID,
    stop: StopID,
    trip: TripID,
    initial_prediction: NaiveDateTime,
    query_time: NaiveDateTime,
    cumulative_delay: f64,
    time_to_initial_prediction: f64,
    departure_offset: Option<f64>,
    extrapolated_delay: f64,
    good_fit: bool,
}
