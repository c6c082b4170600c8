use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::{TrajectoryPoint, Trip};

/// The hyperbolic model can't say anything sensible about this point. All values are in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum BadFit {
    #[error("Bad fit with tx = {tx}, ty = {ty}, tdep = {tdep}: delay isn't smaller than the time since departure")]
    DelayExceedsElapsed { tx: f64, ty: f64, tdep: f64 },
    #[error("Bad fit with tx = {tx}, tdep = {tdep}: no delay yet")]
    ZeroDelay { tx: f64, tdep: f64 },
    /// Only happens when an input isn't finite itself
    #[error("Bad fit with tx = {tx}, ty = {ty}, tdep = {tdep}: result isn't finite")]
    NonFinite { tx: f64, ty: f64, tdep: f64 },
}

/// Projects the final delay of a trip from one point along it, assuming the delay grows
/// hyperbolically after departure. A trip that hasn't departed (including one that never does)
/// has no delay yet.
///
/// Negative projections are returned as-is.
pub fn extrapolate(
    time_to_initial_prediction: f64,
    departure_offset: Option<f64>,
    cumulative_delay: f64,
) -> Result<f64, BadFit> {
    let tdep = match departure_offset {
        Some(tdep) if time_to_initial_prediction > tdep => tdep,
        _ => {
            return Ok(0.0);
        }
    };
    let tx = time_to_initial_prediction - tdep;
    let ty = cumulative_delay;
    if ty >= tx {
        return Err(BadFit::DelayExceedsElapsed { tx, ty, tdep });
    }
    if ty == 0.0 {
        return Err(BadFit::ZeroDelay { tx, tdep });
    }
    let result = tdep / (1.0 - tx / ty);
    if !result.is_finite() {
        return Err(BadFit::NonFinite { tx, ty, tdep });
    }
    Ok(result)
}

impl TrajectoryPoint {
    pub fn extrapolate(&self) -> Result<f64, BadFit> {
        extrapolate(
            self.time_to_initial_prediction,
            self.departure_offset,
            self.cumulative_delay,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExtrapolatedDelay {
    /// In minutes
    pub extrapolated_delay: f64,
    pub good_fit: bool,
}

impl ExtrapolatedDelay {
    /// When the model doesn't fit, fall back to the delay observed so far.
    pub fn from_point(pt: &TrajectoryPoint) -> Self {
        match pt.extrapolate() {
            Ok(extrapolated_delay) => Self {
                extrapolated_delay,
                good_fit: true,
            },
            Err(err) => {
                trace!("{:?}: {}", pt.record, err);
                Self {
                    extrapolated_delay: pt.cumulative_delay,
                    good_fit: false,
                }
            }
        }
    }
}

/// One result per point of every trip, in the same order as the points.
pub fn extrapolate_all(trips: &[Trip]) -> Vec<ExtrapolatedDelay> {
    let results: Vec<ExtrapolatedDelay> = trips
        .iter()
        .flat_map(|trip| trip.points.iter().map(ExtrapolatedDelay::from_point))
        .collect();
    let bad = results.iter().filter(|x| !x.good_fit).count();
    info!("Extrapolated {} points, {} bad fits", results.len(), bad);
    results
}

/// How close the projections came to what each trip's delay actually ended up being
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtrapolationReport {
    pub good_fits: usize,
    pub bad_fits: usize,
    /// In minutes, over good fits only. None if there weren't any.
    pub mean_absolute_error: Option<f64>,
}

/// `extrapolated` must line up with the points of `trips`, like the output of `extrapolate_all`.
pub fn evaluate(trips: &[Trip], extrapolated: &[ExtrapolatedDelay]) -> Result<ExtrapolationReport> {
    let num_points: usize = trips.iter().map(|trip| trip.points.len()).sum();
    if num_points != extrapolated.len() {
        bail!(
            "{} extrapolated delays for {} trajectory points",
            extrapolated.len(),
            num_points
        );
    }

    let mut report = ExtrapolationReport {
        good_fits: 0,
        bad_fits: 0,
        mean_absolute_error: None,
    };
    let mut total_error = 0.0;
    let mut results = extrapolated.iter();
    for trip in trips {
        let actual = trip.final_point().cumulative_delay;
        for result in results.by_ref().take(trip.points.len()) {
            if result.good_fit {
                report.good_fits += 1;
                total_error += (result.extrapolated_delay - actual).abs();
            } else {
                report.bad_fits += 1;
            }
        }
    }
    if report.good_fits > 0 {
        report.mean_absolute_error = Some(total_error / report.good_fits as f64);
    }
    Ok(report)
}
