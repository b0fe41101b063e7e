use std::collections::BTreeMap;

use accessmap_core::prelude::*;
use futures::executor::block_on;
use pyo3::exceptions::{PyKeyboardInterrupt, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3_stub_gen::derive::gen_stub_pyfunction;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::nodes::PyNodeCollection;

/// Routing results computed elsewhere, either one result answering every
/// time sample or results keyed by time of trip
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoutingResults {
    Uniform(AccessibleMapResult),
    ByTime(BTreeMap<String, AccessibleMapResult>),
}

fn replay_routing(json: &str) -> PyResult<ReplayRouting> {
    let results: RoutingResults = serde_json::from_str(json)
        .map_err(|e| PyValueError::new_err(format!("Invalid routing results: {e}")))?;

    match results {
        RoutingResults::Uniform(result) => Ok(ReplayRouting::uniform(Ok(result))),
        RoutingResults::ByTime(by_time) => {
            by_time
                .into_iter()
                .try_fold(ReplayRouting::new(), |routing, (time, result)| {
                    let time: Time = time.parse().map_err(|_| {
                        PyValueError::new_err(format!("Invalid time of trip key: {time}"))
                    })?;
                    Ok(routing.with_result(time, Ok(result)))
                })
        }
    }
}

fn to_py_err(error: Error) -> PyErr {
    match error {
        Error::Validation(_) | Error::InvalidData(_) | Error::GeoJson(_) => {
            PyValueError::new_err(error.to_string())
        }
        Error::Cancelled => PyKeyboardInterrupt::new_err(error.to_string()),
        Error::RoutingFailure(_) | Error::Geometry(_) => PyRuntimeError::new_err(error.to_string()),
    }
}

/// Calculate an accessibility map from precomputed routing results
///
/// Builds one polygon per duration band around the location, from the
/// travel times of every time sample of the calculation. Ctrl-C cancels the
/// calculation between two steps of the polygon union.
///
/// Parameters
/// ----------
/// nodes : NodeCollection
///     Transit nodes referenced by the routing results
/// attributes : str
///     JSON object of the accessibility map attributes (camelCase keys)
/// routing_results : str
///     JSON routing result ``{"nodes": [...]}`` used for every time sample,
///     or an object mapping times of trip (seconds since midnight) to results
/// additional_properties : str, optional
///     JSON object merged into the properties of every polygon
/// progress : Callable[[str, float], None], optional
///     Called with the event name and the progress between 0 and 1
/// circle_steps : int
///     Number of segments of each walking circle
/// union_chunk_size : int
///     Number of circles merged between two cancellation checks
///
/// Returns
/// -------
/// str
///     JSON object ``{"polygons", "strokes", "resultByNode"}``
#[pyfunction]
#[pyo3(signature = (
    nodes,
    attributes,
    routing_results,
    additional_properties=None,
    progress=None,
    circle_steps=64,
    union_chunk_size=20
))]
#[gen_stub_pyfunction]
#[allow(clippy::too_many_arguments)]
pub fn calculate_accessibility_map(
    py: Python<'_>,
    nodes: &PyNodeCollection,
    attributes: &str,
    routing_results: &str,
    additional_properties: Option<&str>,
    progress: Option<Py<PyAny>>,
    circle_steps: usize,
    union_chunk_size: usize,
) -> PyResult<String> {
    let attributes: AccessibilityMapAttributes = serde_json::from_str(attributes)
        .map_err(|e| PyValueError::new_err(format!("Invalid attributes: {e}")))?;
    let additional_properties: Map<String, Value> = match additional_properties {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| PyValueError::new_err(format!("Invalid additional properties: {e}")))?,
        None => Map::new(),
    };
    let routing = replay_routing(routing_results)?;
    let config = IsochroneConfig {
        circle_steps,
        union_chunk_size,
    };

    py.detach(|| {
        let options = CalculationOptions::default()
            .with_additional_properties(additional_properties)
            .with_cancellation(CancellationToken::from_fn(|| {
                Python::attach(|py| py.check_signals().is_err())
            }));
        let report = |name: &str, value: f64| {
            if let Some(callback) = &progress {
                Python::attach(|py| {
                    if let Err(e) = callback.call1(py, (name, value)) {
                        e.write_unraisable(py, None);
                    }
                });
            }
        };

        let result = block_on(
            AccessibilityMapCalculator::new(&routing, &nodes.inner)
                .with_config(config)
                .with_progress(&report)
                .calculate_with_polygons(&attributes, &options),
        )
        .map_err(to_py_err)?;

        let json = result.to_json().map_err(to_py_err)?;
        Ok(json.to_string())
    })
}

/// Compare two accessibility maps band by band
///
/// Parameters
/// ----------
/// polygons1 : str
///     GeoJSON FeatureCollection of the polygons of the first map
/// polygons2 : str
///     GeoJSON FeatureCollection of the polygons of the second map, with the
///     same number of bands
/// colors : str
///     JSON object with ``intersectionColor``, ``scenario1Minus2Color`` and
///     ``scenario2Minus1Color``
///
/// Returns
/// -------
/// str
///     JSON list, one ``{"polygons", "strokes"}`` object per band
#[pyfunction]
#[gen_stub_pyfunction]
pub fn compare_accessibility_maps(
    py: Python<'_>,
    polygons1: &str,
    polygons2: &str,
    colors: &str,
) -> PyResult<String> {
    let first = polygons_from_geojson(polygons1)?;
    let second = polygons_from_geojson(polygons2)?;
    let colors: ComparisonColors = serde_json::from_str(colors)
        .map_err(|e| PyValueError::new_err(format!("Invalid colors: {e}")))?;

    py.detach(|| {
        let comparisons = compare_maps(&first, &second, &colors)
            .and_then(|bands| {
                bands
                    .iter()
                    .map(MapComparison::to_json)
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(to_py_err)?;
        Ok(Value::Array(comparisons).to_string())
    })
}

fn polygons_from_geojson(json: &str) -> PyResult<Vec<AccessibilityPolygon>> {
    let collection: geojson::FeatureCollection = serde_json::from_str(json)
        .map_err(|e| PyValueError::new_err(format!("Invalid polygons: {e}")))?;
    collection
        .features
        .iter()
        .map(AccessibilityPolygon::from_feature)
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_py_err)
}

/// Durations of the polygon bands, longest first
#[pyfunction]
#[gen_stub_pyfunction]
#[pyo3(name = "compute_durations")]
pub fn py_compute_durations(max_total_travel_time: Time, number_of_polygons: u32) -> Vec<Time> {
    compute_durations(max_total_travel_time, number_of_polygons)
}

/// Times of trip sampled around `time_of_trip`, in seconds since midnight
#[pyfunction]
#[pyo3(name = "compute_time_samples", signature = (time_of_trip, delta, delta_interval=60))]
#[gen_stub_pyfunction]
pub fn py_compute_time_samples(time_of_trip: Time, delta: Time, delta_interval: Time) -> Vec<Time> {
    compute_time_samples(time_of_trip, delta, delta_interval)
}
