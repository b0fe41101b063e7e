//! Planning of the duration bands and of the sampled times of trip

use crate::Time;

pub const DEFAULT_DELTA_INTERVAL_SECONDS: Time = 60;

/// Duration thresholds of the polygons, in descending order.
///
/// The first band is `max_duration`, the following ones split it evenly:
/// `ceil(i * max_duration / number_of_bands)` for `i` from
/// `number_of_bands - 1` down to 1. Zero bands is treated as one.
pub fn compute_durations(max_duration: Time, number_of_bands: u32) -> Vec<Time> {
    let bands = u64::from(number_of_bands.max(1));
    let max = u64::from(max_duration);

    std::iter::once(max_duration)
        .chain((1..bands).rev().map(|i| {
            // ceil(i * max / bands) <= max, fits back into Time
            (i * max).div_ceil(bands) as Time
        }))
        .collect()
}

/// Times of trip sampled around `center_time`: from `center_time - delta` to
/// `center_time + delta` every `delta_interval` seconds. A zero interval
/// falls back to 60 seconds, times before midnight are dropped.
pub fn compute_time_samples(center_time: Time, delta: Time, delta_interval: Time) -> Vec<Time> {
    let interval = if delta_interval == 0 {
        DEFAULT_DELTA_INTERVAL_SECONDS
    } else {
        delta_interval
    };

    let first = i64::from(center_time) - i64::from(delta);
    let last = i64::from(center_time) + i64::from(delta);

    (first..=last)
        .step_by(interval as usize)
        .filter_map(|time| Time::try_from(time).ok())
        .collect()
}
