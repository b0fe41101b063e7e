use std::collections::BTreeMap;

use crate::algo::stats::{self, AccessibilityStats};
use crate::model::NodeLookup;
use crate::routing::{AccessibleMapResult, RoutingError};
use crate::{NodeId, Time};

/// Travel times of every reached node across the time samples of one
/// calculation. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingResultAggregator {
    travel_times_by_node_id: BTreeMap<NodeId, Vec<Time>>,
    results_count: usize,
}

impl RoutingResultAggregator {
    /// Aggregates successful results, ignoring failed samples.
    ///
    /// Travel times above `max_travel_time` are discarded, as are nodes
    /// listed without a travel time.
    pub fn from_settled(
        results: &[Result<AccessibleMapResult, RoutingError>],
        max_travel_time: Time,
    ) -> Self {
        Self::from_results(results.iter().filter_map(|r| r.as_ref().ok()), max_travel_time)
    }

    pub fn from_results<'a>(
        results: impl IntoIterator<Item = &'a AccessibleMapResult>,
        max_travel_time: Time,
    ) -> Self {
        let mut aggregator = Self::default();
        for result in results {
            aggregator.results_count += 1;
            aggregator.update_travel_times(result, max_travel_time);
        }
        aggregator
    }

    fn update_travel_times(&mut self, result: &AccessibleMapResult, max_travel_time: Time) {
        for node in &result.nodes {
            let Some(travel_time) = node.travel_time_seconds else {
                continue;
            };
            // A travel time of 0 (node at the location) is kept as reachable
            if travel_time > max_travel_time {
                continue;
            }
            self.travel_times_by_node_id
                .entry(node.id.clone())
                .or_default()
                .push(travel_time);
        }
    }

    pub fn travel_times_by_node_id(&self) -> &BTreeMap<NodeId, Vec<Time>> {
        &self.travel_times_by_node_id
    }

    /// Number of successful samples aggregated
    pub fn results_count(&self) -> usize {
        self.results_count
    }

    pub fn is_empty(&self) -> bool {
        self.travel_times_by_node_id.is_empty()
    }

    /// Counts the nodes accessible within `duration` by category
    pub fn accessibility_stats_for_duration(
        &self,
        duration: Time,
        nodes: &dyn NodeLookup,
    ) -> AccessibilityStats {
        stats::accessibility_stats(&self.travel_times_by_node_id, duration, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::NodeTravelTime;

    fn result(nodes: &[(&str, Time)]) -> AccessibleMapResult {
        AccessibleMapResult::new(
            nodes
                .iter()
                .map(|(id, time)| NodeTravelTime::new(*id, *time))
                .collect(),
        )
    }

    #[test]
    fn failed_samples_contribute_nothing() {
        let settled = vec![
            Ok(result(&[("a", 300), ("b", 600)])),
            Err(RoutingError::Unavailable("timeout".into())),
            Ok(result(&[("a", 420)])),
        ];
        let aggregator = RoutingResultAggregator::from_settled(&settled, 900);

        assert_eq!(aggregator.results_count(), 2);
        let times = aggregator.travel_times_by_node_id();
        assert_eq!(times["a"], vec![300, 420]);
        assert_eq!(times["b"], vec![600]);
    }

    #[test]
    fn travel_times_above_the_maximum_are_dropped() {
        let mut unreached = NodeTravelTime::new("c", 0);
        unreached.travel_time_seconds = None;
        let mut sample = result(&[("a", 901), ("b", 900), ("origin", 0)]);
        sample.nodes.push(unreached);

        let aggregator = RoutingResultAggregator::from_results([&sample], 900);
        let times = aggregator.travel_times_by_node_id();
        assert!(!times.contains_key("a"));
        assert!(!times.contains_key("c"));
        assert_eq!(times["b"], vec![900]);
        assert_eq!(times["origin"], vec![0]);
    }

    #[test]
    fn aggregation_does_not_depend_on_sample_order() {
        let first = result(&[("a", 100), ("b", 200)]);
        let second = result(&[("b", 200), ("a", 100)]);
        assert_eq!(
            RoutingResultAggregator::from_results([&first, &second], 900),
            RoutingResultAggregator::from_results([&second, &first], 900)
        );
    }
}
