//! Band by band comparison of two accessibility maps

use std::panic::{self, AssertUnwindSafe};

use geo::{BooleanOps, MultiPolygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::Error;
use crate::algo::outline::{AreaMetrics, polygon_strokes};
use crate::model::{AccessibilityPolygon, AccessibilityStroke};

/// Colors of the comparison layers, as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonColors {
    pub intersection_color: String,
    #[serde(rename = "scenario1Minus2Color")]
    pub scenario1_minus_2_color: String,
    #[serde(rename = "scenario2Minus1Color")]
    pub scenario2_minus_1_color: String,
}

/// Features of one comparison layer, empty when the operation yields nothing
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonLayers<T> {
    pub intersection: Vec<T>,
    pub scenario1_minus_2: Vec<T>,
    pub scenario2_minus_1: Vec<T>,
}

impl<T> Default for ComparisonLayers<T> {
    fn default() -> Self {
        Self {
            intersection: Vec::new(),
            scenario1_minus_2: Vec::new(),
            scenario2_minus_1: Vec::new(),
        }
    }
}

/// Comparison of the polygons of one duration band
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapComparison {
    pub polygons: ComparisonLayers<AccessibilityPolygon>,
    pub strokes: ComparisonLayers<AccessibilityStroke>,
}

impl MapComparison {
    pub fn to_json(&self) -> Result<Value, Error> {
        let polygon_features = |polygons: &[AccessibilityPolygon]| {
            polygons
                .iter()
                .map(AccessibilityPolygon::to_feature)
                .collect::<Result<Vec<_>, _>>()
        };
        let stroke_features = |strokes: &[AccessibilityStroke]| {
            strokes
                .iter()
                .map(AccessibilityStroke::to_feature)
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(json!({
            "polygons": {
                "intersection": polygon_features(&self.polygons.intersection)?,
                "scenario1Minus2": polygon_features(&self.polygons.scenario1_minus_2)?,
                "scenario2Minus1": polygon_features(&self.polygons.scenario2_minus_1)?,
            },
            "strokes": {
                "intersection": stroke_features(&self.strokes.intersection)?,
                "scenario1Minus2": stroke_features(&self.strokes.scenario1_minus_2)?,
                "scenario2Minus1": stroke_features(&self.strokes.scenario2_minus_1)?,
            },
        }))
    }
}

/// Compares two maps with the same duration bands, band by band: the area
/// reachable in both, and the areas reachable in only one of them.
///
/// # Errors
///
/// Returns an error if the maps do not have the same number of bands or if
/// the polygon clipper fails.
pub fn compare_maps(
    first: &[AccessibilityPolygon],
    second: &[AccessibilityPolygon],
    colors: &ComparisonColors,
) -> Result<Vec<MapComparison>, Error> {
    if first.len() != second.len() {
        return Err(Error::InvalidData(format!(
            "cannot compare maps with {} and {} polygons",
            first.len(),
            second.len()
        )));
    }

    first
        .iter()
        .zip(second)
        .map(|(polygon1, polygon2)| compare_band(polygon1, polygon2, colors))
        .collect()
}

fn compare_band(
    first: &AccessibilityPolygon,
    second: &AccessibilityPolygon,
    colors: &ComparisonColors,
) -> Result<MapComparison, Error> {
    let (intersection, first_only, second_only) = panic::catch_unwind(AssertUnwindSafe(|| {
        (
            first.geometry.intersection(&second.geometry),
            first.geometry.difference(&second.geometry),
            second.geometry.difference(&first.geometry),
        )
    }))
    .map_err(|_| Error::Geometry("cannot compare accessibility polygons".to_string()))?;

    let mut comparison = MapComparison::default();

    let mut intersection_properties = colored(&colors.intersection_color);
    intersection_properties.insert(
        "durationMinutes".to_string(),
        first.properties.get("durationMinutes").cloned().unwrap_or(Value::Null),
    );
    AreaMetrics::of(&intersection).write_properties(&mut intersection_properties);
    push_layer(
        &mut comparison.polygons.intersection,
        &mut comparison.strokes.intersection,
        intersection,
        intersection_properties,
    );
    push_layer(
        &mut comparison.polygons.scenario1_minus_2,
        &mut comparison.strokes.scenario1_minus_2,
        first_only,
        colored(&colors.scenario1_minus_2_color),
    );
    push_layer(
        &mut comparison.polygons.scenario2_minus_1,
        &mut comparison.strokes.scenario2_minus_1,
        second_only,
        colored(&colors.scenario2_minus_1_color),
    );

    Ok(comparison)
}

fn colored(color: &str) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("color".to_string(), Value::from(color));
    properties
}

fn push_layer(
    polygons: &mut Vec<AccessibilityPolygon>,
    strokes: &mut Vec<AccessibilityStroke>,
    geometry: MultiPolygon<f64>,
    properties: Map<String, Value>,
) {
    if geometry.0.is_empty() {
        return;
    }
    strokes.push(AccessibilityStroke {
        geometry: polygon_strokes(&geometry),
        properties: Map::new(),
    });
    polygons.push(AccessibilityPolygon {
        geometry,
        properties,
    });
}
