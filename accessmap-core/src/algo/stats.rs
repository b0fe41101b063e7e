//! Counts of accessible places by category for one duration band

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::NodeLookup;
use crate::{NodeId, Time};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessibilityStats {
    #[serde(rename = "accessiblePlacesCountByCategory")]
    pub by_category: BTreeMap<String, u32>,
    #[serde(rename = "accessiblePlacesCountByDetailedCategory")]
    pub by_detailed_category: BTreeMap<String, u32>,
}

impl AccessibilityStats {
    /// Writes the counts into a polygon property bag, both as nested objects
    /// and flattened as `cat_<category>` / `catDet_<detailed category>`.
    pub fn write_properties(&self, properties: &mut Map<String, Value>) {
        properties.insert(
            "accessiblePlacesCountByCategory".to_string(),
            counts_object(&self.by_category),
        );
        properties.insert(
            "accessiblePlacesCountByDetailedCategory".to_string(),
            counts_object(&self.by_detailed_category),
        );
        for (category, count) in &self.by_category {
            properties.insert(format!("cat_{category}"), Value::from(*count));
        }
        for (category, count) in &self.by_detailed_category {
            properties.insert(format!("catDet_{category}"), Value::from(*count));
        }
    }
}

fn counts_object(counts: &BTreeMap<String, u32>) -> Value {
    Value::Object(
        counts
            .iter()
            .map(|(key, count)| (key.clone(), Value::from(*count)))
            .collect(),
    )
}

/// A node is accessible within `duration` when any of its sampled travel
/// times is strictly below it. Nodes unknown to `nodes` are skipped.
pub fn accessibility_stats(
    travel_times_by_node_id: &BTreeMap<NodeId, Vec<Time>>,
    duration: Time,
    nodes: &dyn NodeLookup,
) -> AccessibilityStats {
    let mut stats = AccessibilityStats::default();

    let accessible = travel_times_by_node_id
        .iter()
        .filter(|(_, times)| times.iter().any(|time| *time < duration));

    for (node_id, _) in accessible {
        let Some(node) = nodes.node(node_id) else {
            log::warn!("Accessibility statistics: unknown node {node_id}");
            continue;
        };
        if let Some(category) = &node.category {
            *stats.by_category.entry(category.clone()).or_default() += 1;
        }
        if let Some(detailed_category) = &node.detailed_category {
            *stats
                .by_detailed_category
                .entry(detailed_category.clone())
                .or_default() += 1;
        }
    }

    stats
}
