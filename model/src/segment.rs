use std::collections::BTreeMap;

use feed::{PredictionRecord, VehicleID};

use crate::minutes;

/// Groups a batch of predictions per vehicle, each sorted by query time. The input can be in any
/// order.
pub fn group_by_vehicle(
    records: &[PredictionRecord],
) -> BTreeMap<VehicleID, Vec<&PredictionRecord>> {
    let mut per_vehicle: BTreeMap<VehicleID, Vec<&PredictionRecord>> = BTreeMap::new();
    for rec in records {
        per_vehicle
            .entry(rec.vehicle)
            .or_insert_with(Vec::new)
            .push(rec);
    }
    for list in per_vehicle.values_mut() {
        // Ties are broken by the rest of the record, not by the input order
        list.sort_by_key(|rec| (rec.query_time, rec.predicted_arrival, rec.stop));
    }
    per_vehicle
}

/// Splits one vehicle's predictions (sorted by query time) into trips. Flat readings are dropped
/// first.
pub fn segment_vehicle(
    vehicle: VehicleID,
    sorted: Vec<&PredictionRecord>,
    max_delta: f64,
) -> Vec<Vec<&PredictionRecord>> {
    let total = sorted.len();
    let readings = drop_flat_readings(sorted);
    if readings.len() != total {
        debug!(
            "{:?}: dropped {} / {} readings that repeat both neighbors",
            vehicle,
            total - readings.len(),
            total
        );
    }
    split_into_trips(readings, max_delta)
}

/// Keeps a reading only if its predicted arrival differs from at least one neighbor. The first
/// and last readings always survive.
pub fn drop_flat_readings(sorted: Vec<&PredictionRecord>) -> Vec<&PredictionRecord> {
    let keep: Vec<bool> = (0..sorted.len())
        .map(|idx| {
            let arrival = sorted[idx].predicted_arrival;
            let differs_from_prev = idx == 0 || sorted[idx - 1].predicted_arrival != arrival;
            let differs_from_next =
                idx + 1 == sorted.len() || sorted[idx + 1].predicted_arrival != arrival;
            differs_from_prev || differs_from_next
        })
        .collect();
    sorted
        .into_iter()
        .zip(keep)
        .filter_map(|(rec, keep)| keep.then_some(rec))
        .collect()
}

/// A jump in predicted arrival of more than `max_delta` minutes from the previous reading means
/// the vehicle is now being predicted for a new trip.
pub fn split_into_trips(
    readings: Vec<&PredictionRecord>,
    max_delta: f64,
) -> Vec<Vec<&PredictionRecord>> {
    let mut trips = Vec::new();
    let mut current: Vec<&PredictionRecord> = Vec::new();
    for rec in readings {
        let jump = current
            .last()
            .map(|prev| minutes(rec.predicted_arrival - prev.predicted_arrival).abs() > max_delta)
            .unwrap_or(false);
        if jump {
            trips.push(std::mem::take(&mut current));
        }
        current.push(rec);
    }
    if !current.is_empty() {
        trips.push(current);
    }
    trips
}
