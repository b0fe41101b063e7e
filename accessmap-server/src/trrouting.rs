//! Client of the trRouting v2 accessibility endpoint

use std::time::Duration;

use accessmap_core::prelude::*;
use itertools::Itertools;
use reqwest::StatusCode;
use serde::Deserialize;

const ACCESSIBILITY_PATH: &str = "v2/accessibility";
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// [`RoutingEngine`] backed by a trRouting HTTP server
#[derive(Debug, Clone)]
pub struct TrRoutingClient {
    client: reqwest::Client,
    base_url: String,
    attempts: u32,
}

impl TrRoutingClient {
    pub fn new(base_url: &str, timeout: Duration, attempts: u32) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            attempts: attempts.max(1),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{ACCESSIBILITY_PATH}", self.base_url)
    }

    async fn request_once(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<AccessibleMapResult, RoutingError> {
        let response = self
            .client
            .get(self.endpoint())
            .query(params)
            .send()
            .await
            .map_err(|e| RoutingError::Unavailable(e.to_string()))?;

        // trRouting reports query and data errors with a 400 and a JSON body
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::BAD_REQUEST {
            return Err(RoutingError::Unavailable(format!(
                "unexpected HTTP status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::Unavailable(e.to_string()))?;
        parse_response(&body)
    }
}

impl RoutingEngine for TrRoutingClient {
    async fn accessible_map(
        &self,
        query: AccessibleMapQuery,
    ) -> Result<AccessibleMapResult, RoutingError> {
        let params = query_params(&query);
        let mut attempt = 1;
        loop {
            match self.request_once(&params).await {
                Err(RoutingError::Unavailable(reason)) if attempt < self.attempts => {
                    tracing::warn!(attempt, %reason, "trRouting request failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Query string of an accessibility request
pub fn query_params(query: &AccessibleMapQuery) -> Vec<(&'static str, String)> {
    let time_type = match query.time_of_trip_type {
        TimeOfTripType::Departure => "0",
        TimeOfTripType::Arrival => "1",
    };
    let mut params = vec![
        (
            "place",
            format!("{},{}", query.location.x(), query.location.y()),
        ),
        ("scenario_id", query.scenario_id.clone()),
        ("time_of_trip", query.time_of_trip.to_string()),
        ("time_type", time_type.to_string()),
        ("min_waiting_time", query.min_waiting_time.to_string()),
        (
            "max_access_travel_time",
            query.max_access_travel_time.to_string(),
        ),
        (
            "max_egress_travel_time",
            query.max_egress_travel_time.to_string(),
        ),
        (
            "max_transfer_travel_time",
            query.max_transfer_travel_time.to_string(),
        ),
        ("max_travel_time", query.max_travel_time.to_string()),
    ];

    if let Some(nodes) = &query.accessible_nodes {
        let (ids_key, times_key) = match query.time_of_trip_type {
            TimeOfTripType::Departure => ("access_node_uuids", "access_node_travel_times"),
            TimeOfTripType::Arrival => ("egress_node_uuids", "egress_node_travel_times"),
        };
        params.push((ids_key, nodes.ids.iter().join(",")));
        params.push((times_key, nodes.durations.iter().join(",")));
    }

    params
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AccessibilityResponse {
    Success { result: SuccessResult },
    NoRoutingFound {
        #[serde(default)]
        reason: Option<String>,
    },
    DataError {
        #[serde(rename = "errorCode", default)]
        error_code: Option<String>,
    },
    QueryError {
        #[serde(rename = "errorCode", default)]
        error_code: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct SuccessResult {
    #[serde(default)]
    nodes: Vec<ResponseNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseNode {
    node_uuid: NodeId,
    #[serde(default)]
    total_travel_time: Option<Time>,
    #[serde(default)]
    number_of_transfers: Option<u32>,
}

/// Maps a trRouting accessibility response body to a routing result
pub fn parse_response(body: &str) -> Result<AccessibleMapResult, RoutingError> {
    let response: AccessibilityResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

    let unknown = || "UNKNOWN".to_string();
    match response {
        AccessibilityResponse::Success { result } => Ok(AccessibleMapResult::new(
            result
                .nodes
                .into_iter()
                .map(|node| NodeTravelTime {
                    id: node.node_uuid,
                    travel_time_seconds: node.total_travel_time,
                    number_of_transfers: node.number_of_transfers,
                })
                .collect(),
        )),
        AccessibilityResponse::NoRoutingFound { reason } => {
            Err(RoutingError::NoRoutingFound(reason.unwrap_or_else(unknown)))
        }
        AccessibilityResponse::DataError { error_code } => {
            Err(RoutingError::Data(error_code.unwrap_or_else(unknown)))
        }
        AccessibilityResponse::QueryError { error_code } => {
            Err(RoutingError::Query(error_code.unwrap_or_else(unknown)))
        }
    }
}
