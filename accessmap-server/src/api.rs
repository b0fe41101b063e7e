//! HTTP API of the accessibility map service

use std::sync::Arc;
use std::time::Duration;

use accessmap_core::prelude::*;
use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use geojson::FeatureCollection;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Router of the service. The concurrency limit is shared by every route.
pub fn build_router<R>(
    state: Arc<AppState<R>>,
    request_timeout: Duration,
    concurrency_limit: usize,
) -> Router
where
    R: RoutingEngine + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/accessibility-map", post(accessibility_map::<R>))
        .route("/accessibility-map/compare", post(compare))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(GlobalConcurrencyLimitLayer::new(concurrency_limit.max(1)))
                .timeout(request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityMapRequest {
    #[serde(flatten)]
    pub attributes: AccessibilityMapAttributes,
    #[serde(default)]
    pub additional_properties: Map<String, Value>,
    #[serde(default)]
    pub accessible_nodes: Option<AccessibleNodes>,
}

async fn accessibility_map<R: RoutingEngine + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(request): Json<AccessibilityMapRequest>,
) -> Result<Json<Value>, ApiError> {
    let options = CalculationOptions {
        additional_properties: request.additional_properties,
        accessible_nodes: request.accessible_nodes,
        cancellation: state.cancellation(),
    };
    let progress = |name: &str, value: f64| tracing::debug!(event = name, progress = value);

    let result = AccessibilityMapCalculator::new(&state.routing, &state.nodes)
        .with_config(state.isochrone)
        .with_progress(&progress)
        .calculate_with_polygons(&request.attributes, &options)
        .await?;

    Ok(Json(result.to_json()?))
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub polygons1: FeatureCollection,
    pub polygons2: FeatureCollection,
    pub colors: ComparisonColors,
}

async fn compare(Json(request): Json<CompareRequest>) -> Result<Json<Value>, ApiError> {
    let comparisons = tokio::task::spawn_blocking(move || -> Result<Vec<Value>, Error> {
        let first = polygons_of(&request.polygons1)?;
        let second = polygons_of(&request.polygons2)?;
        compare_maps(&first, &second, &request.colors)?
            .iter()
            .map(MapComparison::to_json)
            .collect()
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(Value::Array(comparisons)))
}

fn polygons_of(collection: &FeatureCollection) -> Result<Vec<AccessibilityPolygon>, Error> {
    collection
        .features
        .iter()
        .map(AccessibilityPolygon::from_feature)
        .collect()
}

#[derive(Debug)]
pub enum ApiError {
    Calculation(Error),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::Calculation(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Calculation(error) => {
                let status = match &error {
                    Error::Validation(_) | Error::InvalidData(_) | Error::GeoJson(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    Error::RoutingFailure(_) => StatusCode::BAD_GATEWAY,
                    Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                    Error::Geometry(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let mut body = json!({
                    "status": "error",
                    "error": error.code(),
                    "message": error.to_string(),
                });
                if let Error::Validation(errors) = &error {
                    body["errors"] = errors.iter().map(ValidationError::code).collect();
                }
                if status.is_server_error() {
                    tracing::error!(code = error.code(), "{error}");
                }
                (status, body)
            }
            ApiError::Internal(message) => {
                tracing::error!("{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "error": "InternalError", "message": message }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn handle_middleware_error(error: BoxError) -> (StatusCode, Json<Value>) {
    if error.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "error": "Timeout", "message": "request timed out" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "error": "InternalError", "message": error.to_string() })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use geo::Point;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    fn nodes() -> NodeCollection {
        NodeCollection::new([
            TransitNode::new("n1", Point::new(-73.57, 45.51)).with_categories("school", "primary"),
            TransitNode::new("n2", Point::new(-73.56, 45.52)),
        ])
    }

    fn router(routing: ReplayRouting) -> Router {
        let state = Arc::new(AppState::new(routing, nodes(), IsochroneConfig::default()));
        build_router(state, Duration::from_secs(30), 4)
    }

    fn reachable() -> ReplayRouting {
        ReplayRouting::uniform(Ok(AccessibleMapResult::new(vec![
            NodeTravelTime::new("n1", 300),
            NodeTravelTime::new("n2", 600),
        ])))
    }

    async fn send(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn map_request() -> Value {
        json!({
            "location": [-73.565, 45.515],
            "departureTimeSecondsSinceMidnight": 28800,
            "maxTotalTravelTimeSeconds": 1200,
            "numberOfPolygons": 2,
            "scenarioId": "scenario",
            "additionalProperties": { "layer": "test" }
        })
    }

    /// Holds every routing query until released
    #[derive(Default)]
    struct GatedRouting {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl RoutingEngine for GatedRouting {
        async fn accessible_map(
            &self,
            _query: AccessibleMapQuery,
        ) -> Result<AccessibleMapResult, RoutingError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(AccessibleMapResult::new(vec![NodeTravelTime::new("n1", 300)]))
        }
    }

    #[tokio::test]
    async fn concurrency_limit_is_shared_by_all_routes() {
        let routing = GatedRouting::default();
        let entered = Arc::clone(&routing.entered);
        let release = Arc::clone(&routing.release);
        let state = Arc::new(AppState::new(routing, nodes(), IsochroneConfig::default()));
        let router = build_router(state, Duration::from_secs(30), 1);

        let running = tokio::spawn(send(router.clone(), "/accessibility-map", map_request()));
        entered.notified().await;

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap());
        assert!(
            tokio::time::timeout(Duration::from_millis(200), health)
                .await
                .is_err()
        );

        release.notify_one();
        let (status, _) = running.await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_check() {
        let response = router(reachable())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn accessibility_map_polygons() {
        let (status, body) = send(router(reachable()), "/accessibility-map", map_request()).await;
        assert_eq!(status, StatusCode::OK);

        let polygons = body["polygons"]["features"].as_array().unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0]["properties"]["durationSeconds"], json!(1200));
        assert_eq!(polygons[0]["properties"]["layer"], json!("test"));
        assert_eq!(body["strokes"]["features"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["resultByNode"]["nodes"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn invalid_attributes_are_rejected() {
        let mut request = map_request();
        request["numberOfPolygons"] = json!(0);
        let (status, body) = send(router(reachable()), "/accessibility-map", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("ValidationFailed"));
        assert!(!body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn routing_failure_is_a_bad_gateway() {
        let routing =
            ReplayRouting::uniform(Err(RoutingError::Unavailable("connection refused".into())));
        let (status, body) = send(router(routing), "/accessibility-map", map_request()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], json!("TRRAM0001"));
    }

    #[tokio::test]
    async fn shutdown_cancels_calculations() {
        let state = Arc::new(AppState::new(reachable(), nodes(), IsochroneConfig::default()));
        state.begin_shutdown();
        let router = build_router(Arc::clone(&state), Duration::from_secs(30), 4);
        let (status, body) = send(router, "/accessibility-map", map_request()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], json!("Cancelled"));
    }

    #[tokio::test]
    async fn compare_maps_band_by_band() {
        let (_, map) = send(router(reachable()), "/accessibility-map", map_request()).await;
        let request = json!({
            "polygons1": map["polygons"],
            "polygons2": map["polygons"],
            "colors": {
                "intersectionColor": "#888888",
                "scenario1Minus2Color": "#ff0000",
                "scenario2Minus1Color": "#0000ff"
            }
        });

        let (status, body) = send(router(reachable()), "/accessibility-map/compare", request).await;
        assert_eq!(status, StatusCode::OK);
        let bands = body.as_array().unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0]["polygons"]["intersection"].as_array().map(Vec::len), Some(1));
        assert_eq!(bands[0]["polygons"]["scenario1Minus2"], json!([]));
    }

    #[tokio::test]
    async fn compare_requires_matching_bands() {
        let (_, map) = send(router(reachable()), "/accessibility-map", map_request()).await;
        let request = json!({
            "polygons1": map["polygons"],
            "polygons2": { "type": "FeatureCollection", "features": [] },
            "colors": {
                "intersectionColor": "#888888",
                "scenario1Minus2Color": "#ff0000",
                "scenario2Minus1Color": "#0000ff"
            }
        });
        let (status, body) = send(router(reachable()), "/accessibility-map/compare", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("InvalidData"));
    }
}
