use geo::{MultiLineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Map, Value, json};

use crate::Error;
use crate::routing::AccessibleMapResult;

/// Area reachable within one duration band, with its property bag
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityPolygon {
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

/// Outline of an [`AccessibilityPolygon`], one line per ring
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityStroke {
    pub geometry: MultiLineString<f64>,
    pub properties: Map<String, Value>,
}

/// Output of a complete calculation, bands in descending duration order
#[derive(Debug, Clone)]
pub struct AccessibilityMapResult {
    pub polygons: Vec<AccessibilityPolygon>,
    pub strokes: Vec<AccessibilityStroke>,
    /// Raw routing result at the requested time, when that sample succeeded
    pub result_by_node: Option<AccessibleMapResult>,
}

impl AccessibilityPolygon {
    pub fn duration_seconds(&self) -> Option<u64> {
        self.properties.get("durationSeconds").and_then(Value::as_u64)
    }

    pub fn area_sq_m(&self) -> Option<f64> {
        self.properties.get("areaSqM").and_then(Value::as_f64)
    }

    /// Converts the polygon to a `GeoJSON` feature.
    pub fn to_feature(&self) -> Result<Feature, Error> {
        let geometry = Geometry::new(GeoJsonValue::from(&self.geometry));
        feature_from_parts(&geometry, &self.properties)
    }

    /// Reads a polygon back from a `GeoJSON` feature, accepting `Polygon`
    /// and `MultiPolygon` geometries.
    pub fn from_feature(feature: &Feature) -> Result<Self, Error> {
        let value = feature
            .geometry
            .as_ref()
            .map(|geometry| geometry.value.clone())
            .ok_or_else(|| Error::InvalidData("accessibility polygon without geometry".into()))?;

        let geometry = match value {
            polygon @ GeoJsonValue::Polygon(_) => {
                let polygon = Polygon::<f64>::try_from(polygon)
                    .map_err(|e| Error::GeoJson(e.to_string()))?;
                MultiPolygon::new(vec![polygon])
            }
            multi_polygon @ GeoJsonValue::MultiPolygon(_) => {
                MultiPolygon::<f64>::try_from(multi_polygon)
                    .map_err(|e| Error::GeoJson(e.to_string()))?
            }
            _ => {
                return Err(Error::InvalidData(
                    "accessibility polygon must be a Polygon or a MultiPolygon".into(),
                ));
            }
        };

        Ok(Self {
            geometry,
            properties: feature.properties.clone().unwrap_or_default(),
        })
    }
}

impl AccessibilityStroke {
    pub fn to_feature(&self) -> Result<Feature, Error> {
        let geometry = Geometry::new(GeoJsonValue::from(&self.geometry));
        feature_from_parts(&geometry, &self.properties)
    }
}

impl AccessibilityMapResult {
    pub fn polygons_geojson(&self) -> Result<FeatureCollection, Error> {
        collection(self.polygons.iter().map(AccessibilityPolygon::to_feature))
    }

    pub fn strokes_geojson(&self) -> Result<FeatureCollection, Error> {
        collection(self.strokes.iter().map(AccessibilityStroke::to_feature))
    }

    /// `{ polygons, strokes, resultByNode }` as served to consumers
    pub fn to_json(&self) -> Result<Value, Error> {
        let result_by_node = match &self.result_by_node {
            Some(result) => {
                serde_json::to_value(result).map_err(|e| Error::GeoJson(e.to_string()))?
            }
            None => Value::Null,
        };
        Ok(json!({
            "polygons": self.polygons_geojson()?,
            "strokes": self.strokes_geojson()?,
            "resultByNode": result_by_node,
        }))
    }
}

pub(crate) fn collection(
    features: impl Iterator<Item = Result<Feature, Error>>,
) -> Result<FeatureCollection, Error> {
    Ok(FeatureCollection {
        features: features.collect::<Result<Vec<_>, _>>()?,
        bbox: None,
        foreign_members: None,
    })
}

fn feature_from_parts(geometry: &Geometry, properties: &Map<String, Value>) -> Result<Feature, Error> {
    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    });

    Feature::from_json_value(value).map_err(|e| Error::GeoJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> AccessibilityPolygon {
        let mut properties = Map::new();
        properties.insert("durationSeconds".into(), json!(600));
        AccessibilityPolygon {
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 1.0),
            ]]),
            properties,
        }
    }

    #[test]
    fn polygon_feature_keeps_geometry_and_properties() {
        let polygon = square();
        let feature = polygon.to_feature().unwrap();
        assert_eq!(feature.property("durationSeconds"), Some(&json!(600)));

        let back = AccessibilityPolygon::from_feature(&feature).unwrap();
        assert_eq!(back, polygon);
        assert_eq!(back.duration_seconds(), Some(600));
    }

    #[test]
    fn plain_polygons_are_accepted() {
        let feature = Feature::from_json_value(json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
            },
            "properties": null
        }))
        .unwrap();
        let polygon = AccessibilityPolygon::from_feature(&feature).unwrap();
        assert_eq!(polygon.geometry.0.len(), 1);
        assert!(polygon.properties.is_empty());
    }

    #[test]
    fn result_json_shape() {
        let result = AccessibilityMapResult {
            polygons: vec![square()],
            strokes: vec![],
            result_by_node: None,
        };
        let value = result.to_json().unwrap();
        assert_eq!(value["polygons"]["type"], json!("FeatureCollection"));
        assert_eq!(value["polygons"]["features"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["strokes"]["features"], json!([]));
        assert_eq!(value["resultByNode"], Value::Null);
    }
}
