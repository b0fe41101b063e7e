//! Walking circles around the reference location and the reached nodes

use std::collections::BTreeMap;

use geo::{Coord, Destination, Haversine, LineString, Point, Polygon};
use rayon::prelude::*;

use crate::model::{AccessibilityMapAttributes, IsochroneConfig, NodeLookup};
use crate::{NodeId, Time};

/// Polygon approximating a geodesic circle with `steps` segments.
///
/// Vertices go clockwise from north. A zero radius gives a degenerate
/// polygon with every vertex on the center.
pub fn circle_polygon(center: Point<f64>, radius_meters: f64, steps: usize) -> Polygon<f64> {
    let steps = steps.max(3);
    let mut coords: Vec<Coord<f64>> = (0..steps)
        .map(|i| {
            let bearing = i as f64 * -360.0 / steps as f64;
            Haversine.destination(center, bearing, radius_meters).0
        })
        .collect();
    coords.push(coords[0]);

    Polygon::new(LineString::new(coords), vec![])
}

/// Builds the circles of one duration band.
///
/// Each reached node gets a circle whose radius is the walking distance
/// left after reaching it, averaged over every time sample. Samples in
/// which the node was not reached count as no time left.
pub struct CircleBandBuilder<'a> {
    location: Point<f64>,
    walking_speed_mps: f64,
    max_distance_meters: f64,
    sample_count: usize,
    circle_steps: usize,
    nodes: &'a dyn NodeLookup,
}

impl<'a> CircleBandBuilder<'a> {
    pub fn new(
        attributes: &AccessibilityMapAttributes,
        sample_count: usize,
        nodes: &'a dyn NodeLookup,
        config: &IsochroneConfig,
    ) -> Self {
        let walking_speed_mps = attributes.walking_speed_mps;
        Self {
            location: attributes.location,
            walking_speed_mps,
            max_distance_meters: (f64::from(attributes.max_access_egress_travel_time_seconds)
                * walking_speed_mps)
                .floor(),
            sample_count: sample_count.max(1),
            circle_steps: config.circle_steps,
            nodes,
        }
    }

    /// Walking distance ceiling of every circle
    pub fn max_distance_meters(&self) -> f64 {
        self.max_distance_meters
    }

    /// Radius of the circle around the reference location
    pub fn location_radius_meters(&self, duration: Time) -> f64 {
        self.max_distance_meters
            .min((f64::from(duration) * self.walking_speed_mps).floor())
    }

    /// Average remaining time over the configured number of samples
    pub fn average_remaining_seconds(&self, travel_times: &[Time], duration: Time) -> f64 {
        let remaining: u64 = travel_times
            .iter()
            .map(|travel_time| u64::from(duration.saturating_sub(*travel_time)))
            .sum();
        remaining as f64 / self.sample_count as f64
    }

    pub fn node_radius_meters(&self, travel_times: &[Time], duration: Time) -> f64 {
        let distance =
            (self.average_remaining_seconds(travel_times, duration) * self.walking_speed_mps).floor();
        distance.min(self.max_distance_meters)
    }

    /// Circles of the band: the reference location first, then the nodes in
    /// id order. Nodes unknown to the node collection are skipped.
    pub fn build(
        &self,
        duration: Time,
        travel_times_by_node_id: &BTreeMap<NodeId, Vec<Time>>,
    ) -> Vec<Polygon<f64>> {
        let location_circle = circle_polygon(
            self.location,
            self.location_radius_meters(duration),
            self.circle_steps,
        );

        let node_circles: Vec<Polygon<f64>> = travel_times_by_node_id
            .par_iter()
            .filter_map(|(node_id, travel_times)| {
                let Some(node) = self.nodes.node(node_id) else {
                    log::warn!("Node not found in collection: {node_id}");
                    return None;
                };
                let radius = self.node_radius_meters(travel_times, duration);
                Some(circle_polygon(node.geometry, radius, self.circle_steps))
            })
            .collect();

        std::iter::once(location_circle).chain(node_circles).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeCollection, TransitNode};
    use geo::{Area, Distance};

    fn attributes() -> AccessibilityMapAttributes {
        let mut attributes =
            AccessibilityMapAttributes::departing_at(Point::new(-73.6, 45.5), 28800, "scenario");
        attributes.walking_speed_mps = 1.0;
        attributes.max_access_egress_travel_time_seconds = 600;
        attributes
    }

    fn nodes() -> NodeCollection {
        NodeCollection::new([
            TransitNode::new("a", Point::new(-73.61, 45.5)),
            TransitNode::new("b", Point::new(-73.62, 45.5)),
        ])
    }

    #[test]
    fn circle_has_closed_ring_at_radius() {
        let center = Point::new(-73.6, 45.5);
        let circle = circle_polygon(center, 500.0, 64);
        assert_eq!(circle.exterior().0.len(), 65);
        assert_eq!(circle.exterior().0.first(), circle.exterior().0.last());
        for coord in circle.exterior().coords() {
            let distance = Haversine.distance(center, Point::from(*coord));
            assert!((distance - 500.0).abs() < 1e-3);
        }
        // first vertex due north
        assert!(circle.exterior().0[0].y > center.y());
    }

    #[test]
    fn zero_radius_circle_has_no_area() {
        let circle = circle_polygon(Point::new(2.35, 48.85), 0.0, 64);
        assert_eq!(circle.unsigned_area(), 0.0);
    }

    #[test]
    fn remaining_time_is_averaged_over_every_sample() {
        let nodes = nodes();
        let builder = CircleBandBuilder::new(&attributes(), 4, &nodes, &IsochroneConfig::default());
        assert_eq!(builder.average_remaining_seconds(&[300], 600), 75.0);
        assert_eq!(builder.node_radius_meters(&[300], 600), 75.0);
        // times above the duration leave nothing
        assert_eq!(builder.node_radius_meters(&[700, 600], 600), 0.0);
    }

    #[test]
    fn radii_are_capped_by_the_access_egress_budget() {
        let nodes = nodes();
        let builder = CircleBandBuilder::new(&attributes(), 1, &nodes, &IsochroneConfig::default());
        assert_eq!(builder.max_distance_meters(), 600.0);
        assert_eq!(builder.location_radius_meters(300), 300.0);
        assert_eq!(builder.location_radius_meters(1200), 600.0);
        assert_eq!(builder.node_radius_meters(&[100], 1200), 600.0);
    }

    #[test]
    fn band_contains_location_and_known_nodes() {
        let nodes = nodes();
        let builder = CircleBandBuilder::new(&attributes(), 1, &nodes, &IsochroneConfig::default());
        let travel_times = BTreeMap::from([
            ("a".to_string(), vec![100]),
            ("b".to_string(), vec![900]),
            ("unknown".to_string(), vec![100]),
        ]);

        let circles = builder.build(600, &travel_times);
        assert_eq!(circles.len(), 3);
        assert!(circles[0].unsigned_area() > 0.0);
        assert!(circles[1].unsigned_area() > 0.0);
        // unreached within the band, kept as a degenerate circle
        assert_eq!(circles[2].unsigned_area(), 0.0);
    }
}
