//! Calculation of transit accessibility maps.
//!
//! A calculation has two phases. The routing phase queries the routing
//! engine once per sampled time of trip, concurrently, and aggregates the
//! travel time of every reached node. The polygon phase then builds, for
//! each duration band in descending order, the union of the walking circles
//! around the reference location and the reached nodes.

use std::time::Instant;

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::algo::circles::CircleBandBuilder;
use crate::algo::outline::{AreaMetrics, polygon_strokes};
use crate::algo::planner::{compute_durations, compute_time_samples};
use crate::algo::stats::AccessibilityStats;
use crate::algo::union::CancellableUnionEngine;
use crate::control::{NoProgress, ProgressSink};
use crate::model::{
    AccessibilityMapAttributes, AccessibilityMapResult, AccessibilityPolygon, AccessibilityStroke,
    CalculationOptions, IsochroneConfig, NodeLookup, ValidationError,
};
use crate::routing::{
    AccessibleMapQuery, AccessibleMapResult, RoutingEngine, RoutingError, RoutingResultAggregator,
};
use crate::{Error, PROGRESS_EVENT_NAME, Time};

/// Outcome of the routing phase
#[derive(Debug, Clone)]
pub struct RoutingPhaseResult {
    pub aggregator: RoutingResultAggregator,
    /// Duration bands, descending
    pub durations: Vec<Time>,
    /// Number of sampled times of trip, successful or not
    pub nb_calculations: usize,
    /// Result at the requested time of trip, if that query succeeded
    pub routing_result: Option<AccessibleMapResult>,
}

/// Builds the polygons of every duration band from aggregated travel times
pub struct IsochroneBuilder<'a> {
    nodes: &'a dyn NodeLookup,
    progress: &'a dyn ProgressSink,
    config: IsochroneConfig,
}

impl<'a> IsochroneBuilder<'a> {
    pub fn new(
        nodes: &'a dyn NodeLookup,
        progress: &'a dyn ProgressSink,
        config: IsochroneConfig,
    ) -> Self {
        Self {
            nodes,
            progress,
            config,
        }
    }

    /// Polygons and strokes of every band, in descending duration order.
    ///
    /// Two progress events are emitted per band, right before and right
    /// after its union.
    pub async fn build(
        &self,
        attributes: &AccessibilityMapAttributes,
        routing: &RoutingPhaseResult,
        options: &CalculationOptions,
    ) -> Result<(Vec<AccessibilityPolygon>, Vec<AccessibilityStroke>), Error> {
        let cancellation = &options.cancellation;
        let mut durations = routing.durations.clone();
        durations.sort_unstable_by(|a, b| b.cmp(a));

        let circles = CircleBandBuilder::new(
            attributes,
            routing.nb_calculations,
            self.nodes,
            &self.config,
        );
        let union_engine = CancellableUnionEngine::new(self.config.union_chunk_size);
        let travel_times = routing.aggregator.travel_times_by_node_id();
        let attribute_properties = attributes.to_properties();

        let steps_count = (durations.len() * 2) as f64;
        let mut step: u32 = 0;
        let mut polygons = Vec::with_capacity(durations.len());
        let mut strokes = Vec::with_capacity(durations.len());

        for duration in durations {
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let band_circles = circles.build(duration, travel_times);
            log::debug!(
                "Accessibility map band of {duration} s: {} circles",
                band_circles.len()
            );

            step += 1;
            self.progress
                .emit_progress(PROGRESS_EVENT_NAME, f64::from(step) / steps_count);

            let geometry = union_engine.union(band_circles, cancellation).await?;

            let stats = routing
                .aggregator
                .accessibility_stats_for_duration(duration, self.nodes);
            let properties = polygon_properties(
                duration,
                &AreaMetrics::of(&geometry),
                attributes,
                &stats,
                &attribute_properties,
                &options.additional_properties,
            );

            strokes.push(AccessibilityStroke {
                geometry: polygon_strokes(&geometry),
                properties: Map::new(),
            });
            polygons.push(AccessibilityPolygon {
                geometry,
                properties,
            });

            step += 1;
            self.progress
                .emit_progress(PROGRESS_EVENT_NAME, f64::from(step) / steps_count);
        }

        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok((polygons, strokes))
    }
}

fn polygon_properties(
    duration: Time,
    area: &AreaMetrics,
    attributes: &AccessibilityMapAttributes,
    stats: &AccessibilityStats,
    attribute_properties: &Map<String, Value>,
    additional_properties: &Map<String, Value>,
) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("durationSeconds".to_string(), Value::from(duration));
    properties.insert(
        "durationMinutes".to_string(),
        Value::from((f64::from(duration) / 60.0).round() as u64),
    );
    area.write_properties(&mut properties);
    properties.insert(
        "color".to_string(),
        attributes.color.clone().map_or(Value::Null, Value::from),
    );
    stats.write_properties(&mut properties);

    properties.extend(
        attribute_properties
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    properties.extend(
        additional_properties
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    properties
}

/// Entry point of an accessibility map calculation.
///
/// The routing engine, the node collection and the progress sink are
/// injected, the calculator keeps no state between calls.
pub struct AccessibilityMapCalculator<'a, R> {
    routing: &'a R,
    nodes: &'a dyn NodeLookup,
    progress: &'a dyn ProgressSink,
    config: IsochroneConfig,
}

impl<'a, R: RoutingEngine> AccessibilityMapCalculator<'a, R> {
    pub fn new(routing: &'a R, nodes: &'a dyn NodeLookup) -> Self {
        Self {
            routing,
            nodes,
            progress: &NoProgress,
            config: IsochroneConfig::default(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: IsochroneConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the routing phase only.
    ///
    /// Queries for every sampled time of trip are issued concurrently. A
    /// failed sample is dropped, the calculation fails only if every sample
    /// fails.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for invalid attributes, [`Error::Cancelled`] if
    /// cancelled once the queries settled, [`Error::RoutingFailure`] if no
    /// query succeeded.
    pub async fn calculate(
        &self,
        attributes: &AccessibilityMapAttributes,
        options: &CalculationOptions,
    ) -> Result<RoutingPhaseResult, Error> {
        attributes.validate().map_err(Error::Validation)?;
        let (time_of_trip, time_of_trip_type) = attributes
            .time_of_trip()
            .ok_or_else(|| Error::Validation(vec![ValidationError::DepartureAndArrivalTimeAreBlank]))?;

        let durations = compute_durations(
            attributes.max_total_travel_time_seconds,
            attributes.number_of_polygons,
        );
        let max_travel_time = durations[0];
        let times = compute_time_samples(
            time_of_trip,
            attributes.delta_seconds,
            attributes.delta_interval_seconds,
        );
        log::info!(
            "Calculating accessibility map: {} bands, {} time samples around {time_of_trip}",
            durations.len(),
            times.len()
        );

        let queries = times.iter().map(|time| {
            AccessibleMapQuery::from_attributes(
                attributes,
                *time,
                time_of_trip_type,
                max_travel_time,
                options.accessible_nodes.as_ref(),
            )
        });
        let settled = join_all(queries.map(|query| self.routing.accessible_map(query))).await;

        if options.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let requested_index = times.iter().position(|time| *time == time_of_trip);
        for (time, result) in times.iter().zip(&settled) {
            if let Err(e) = result {
                log::warn!("Routing failed for the time sample {time}: {e}");
            }
        }

        if settled.iter().all(Result::is_err) {
            return Err(Error::RoutingFailure(routing_failure_cause(
                &settled,
                requested_index,
            )));
        }

        let routing_result = requested_index.and_then(|index| settled[index].as_ref().ok().cloned());
        if routing_result.is_none() {
            log::warn!("No routing result at the requested time {time_of_trip}");
        }

        let aggregator = RoutingResultAggregator::from_settled(&settled, max_travel_time);
        log::debug!(
            "Aggregated {} reachable nodes from {} successful samples",
            aggregator.travel_times_by_node_id().len(),
            aggregator.results_count()
        );

        Ok(RoutingPhaseResult {
            aggregator,
            durations,
            nb_calculations: times.len(),
            routing_result,
        })
    }

    /// Runs a complete calculation: routing, then the polygons of every band.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::calculate`], [`Error::Cancelled`] when cancelled
    /// while building polygons, [`Error::Geometry`] when the union fails.
    pub async fn calculate_with_polygons(
        &self,
        attributes: &AccessibilityMapAttributes,
        options: &CalculationOptions,
    ) -> Result<AccessibilityMapResult, Error> {
        let routing = self.calculate(attributes, options).await?;

        let started = Instant::now();
        let (polygons, strokes) = IsochroneBuilder::new(self.nodes, self.progress, self.config)
            .build(attributes, &routing, options)
            .await?;
        log::info!(
            "Generated {} accessibility polygons in {:?}",
            polygons.len(),
            started.elapsed()
        );

        Ok(AccessibilityMapResult {
            polygons,
            strokes,
            result_by_node: routing.routing_result,
        })
    }
}

/// Error of the requested sample when it failed, else of the last sample
fn routing_failure_cause(
    settled: &[Result<AccessibleMapResult, RoutingError>],
    requested_index: Option<usize>,
) -> RoutingError {
    requested_index
        .and_then(|index| settled.get(index))
        .or_else(|| settled.last())
        .and_then(|result| result.as_ref().err().cloned())
        .unwrap_or_else(|| RoutingError::NoRoutingFound("no time sample to query".to_string()))
}
