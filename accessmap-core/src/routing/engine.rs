use std::future::Future;

use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AccessibilityMapAttributes, TimeOfTripType};
use crate::{NodeId, Time};

/// Failure of a single routing engine call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Routing engine unavailable: {0}")]
    Unavailable(String),
    #[error("Routing engine rejected the query: {0}")]
    Query(String),
    #[error("Routing engine reported a data error: {0}")]
    Data(String),
    #[error("No routing found: {0}")]
    NoRoutingFound(String),
    #[error("Unexpected routing engine response: {0}")]
    InvalidResponse(String),
}

/// Precomputed access (or egress) nodes with their walking durations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibleNodes {
    pub ids: Vec<NodeId>,
    pub durations: Vec<Time>,
}

impl AccessibleNodes {
    /// Both lists describe the same nodes. Inconsistent lists are not sent
    /// to the routing engine.
    pub fn is_consistent(&self) -> bool {
        self.ids.len() == self.durations.len()
    }
}

/// One accessibility query, for a single time of trip
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibleMapQuery {
    pub location: Point<f64>,
    pub time_of_trip: Time,
    pub time_of_trip_type: TimeOfTripType,
    pub scenario_id: String,
    pub min_waiting_time: Time,
    pub max_access_travel_time: Time,
    pub max_egress_travel_time: Time,
    pub max_transfer_travel_time: Time,
    pub max_travel_time: Time,
    pub accessible_nodes: Option<AccessibleNodes>,
}

impl AccessibleMapQuery {
    /// Query at `time_of_trip` for the given attributes. The access and
    /// egress budgets both come from the access/egress attribute.
    pub fn from_attributes(
        attributes: &AccessibilityMapAttributes,
        time_of_trip: Time,
        time_of_trip_type: TimeOfTripType,
        max_travel_time: Time,
        accessible_nodes: Option<&AccessibleNodes>,
    ) -> Self {
        Self {
            location: attributes.location,
            time_of_trip,
            time_of_trip_type,
            scenario_id: attributes.scenario_id.clone(),
            min_waiting_time: attributes.min_waiting_time_seconds,
            max_access_travel_time: attributes.max_access_egress_travel_time_seconds,
            max_egress_travel_time: attributes.max_access_egress_travel_time_seconds,
            max_transfer_travel_time: attributes.max_transfer_travel_time_seconds,
            max_travel_time,
            accessible_nodes: accessible_nodes
                .filter(|nodes| nodes.is_consistent())
                .cloned(),
        }
    }
}

/// Travel time to one node at one time sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTravelTime {
    pub id: NodeId,
    /// Absent when the engine lists the node without reaching it
    #[serde(rename = "totalTravelTimeSeconds", default)]
    pub travel_time_seconds: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_transfers: Option<u32>,
}

impl NodeTravelTime {
    pub fn new(id: impl Into<NodeId>, travel_time_seconds: Time) -> Self {
        Self {
            id: id.into(),
            travel_time_seconds: Some(travel_time_seconds),
            number_of_transfers: None,
        }
    }
}

/// Nodes reached by one accessibility query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibleMapResult {
    pub nodes: Vec<NodeTravelTime>,
}

impl AccessibleMapResult {
    pub fn new(nodes: Vec<NodeTravelTime>) -> Self {
        Self { nodes }
    }
}

/// External transit routing engine answering accessibility queries.
///
/// Calls for different time samples of the same calculation are issued
/// concurrently, implementations must tolerate that.
pub trait RoutingEngine: Send + Sync {
    fn accessible_map(
        &self,
        query: AccessibleMapQuery,
    ) -> impl Future<Output = Result<AccessibleMapResult, RoutingError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inconsistent_accessible_nodes_are_not_forwarded() {
        let attributes =
            AccessibilityMapAttributes::departing_at(Point::new(-73.0, 45.0), 28800, "scenario");
        let nodes = AccessibleNodes {
            ids: vec!["a".into(), "b".into()],
            durations: vec![120],
        };
        let query = AccessibleMapQuery::from_attributes(
            &attributes,
            28800,
            TimeOfTripType::Departure,
            900,
            Some(&nodes),
        );
        assert_eq!(query.accessible_nodes, None);
        assert_eq!(query.max_access_travel_time, 900);
        assert_eq!(query.max_egress_travel_time, 900);

        let nodes = AccessibleNodes {
            ids: vec!["a".into()],
            durations: vec![120],
        };
        let query = AccessibleMapQuery::from_attributes(
            &attributes,
            28800,
            TimeOfTripType::Departure,
            900,
            Some(&nodes),
        );
        assert_eq!(query.accessible_nodes, Some(nodes));
    }

    #[test]
    fn result_uses_routing_engine_keys() {
        let result: AccessibleMapResult = serde_json::from_value(json!({
            "nodes": [
                { "id": "a", "totalTravelTimeSeconds": 300, "numberOfTransfers": 1 },
                { "id": "b" }
            ]
        }))
        .unwrap();
        assert_eq!(result.nodes[0].travel_time_seconds, Some(300));
        assert_eq!(result.nodes[0].number_of_transfers, Some(1));
        assert_eq!(result.nodes[1].travel_time_seconds, None);

        let value = serde_json::to_value(AccessibleMapResult::new(vec![NodeTravelTime::new(
            "c", 60,
        )]))
        .unwrap();
        assert_eq!(
            value,
            json!({ "nodes": [{ "id": "c", "totalTravelTimeSeconds": 60 }] })
        );
    }
}
