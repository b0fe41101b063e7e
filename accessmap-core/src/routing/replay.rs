use std::collections::BTreeMap;
use std::future::{self, Future};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Time;
use crate::routing::{
    AccessibleMapQuery, AccessibleMapResult, RoutingEngine, RoutingError,
};

/// Routing engine answering from precomputed results keyed by time of trip.
///
/// Used when the routing happened elsewhere (the results were saved, or
/// come from another process) and only the polygons remain to be built.
#[derive(Debug, Default)]
pub struct ReplayRouting {
    by_time: BTreeMap<Time, Result<AccessibleMapResult, RoutingError>>,
    fallback: Option<Result<AccessibleMapResult, RoutingError>>,
    calls: AtomicUsize,
}

impl ReplayRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every query with the same result
    pub fn uniform(result: Result<AccessibleMapResult, RoutingError>) -> Self {
        Self {
            fallback: Some(result),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_result(
        mut self,
        time_of_trip: Time,
        result: Result<AccessibleMapResult, RoutingError>,
    ) -> Self {
        self.by_time.insert(time_of_trip, result);
        self
    }

    /// Number of queries answered so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn answer(&self, time_of_trip: Time) -> Result<AccessibleMapResult, RoutingError> {
        self.by_time
            .get(&time_of_trip)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| {
                Err(RoutingError::NoRoutingFound(format!(
                    "no recorded result at {time_of_trip}"
                )))
            })
    }
}

impl RoutingEngine for ReplayRouting {
    fn accessible_map(
        &self,
        query: AccessibleMapQuery,
    ) -> impl Future<Output = Result<AccessibleMapResult, RoutingError>> + Send {
        self.calls.fetch_add(1, Ordering::Relaxed);
        future::ready(self.answer(query.time_of_trip))
    }
}
