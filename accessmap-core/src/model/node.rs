use geo::Point;
use geojson::{Feature, GeoJson, feature::Id};
use hashbrown::HashMap;
use serde_json::Value;

use crate::{Error, NodeId};

/// Transit node (stop) reachable by the routing engine
#[derive(Debug, Clone, PartialEq)]
pub struct TransitNode {
    pub id: NodeId,
    pub geometry: Point<f64>,
    pub category: Option<String>,
    pub detailed_category: Option<String>,
}

impl TransitNode {
    pub fn new(id: impl Into<NodeId>, geometry: Point<f64>) -> Self {
        Self {
            id: id.into(),
            geometry,
            category: None,
            detailed_category: None,
        }
    }

    #[must_use]
    pub fn with_categories(
        mut self,
        category: impl Into<String>,
        detailed_category: impl Into<String>,
    ) -> Self {
        self.category = Some(category.into());
        self.detailed_category = Some(detailed_category.into());
        self
    }
}

/// Read access to the node collection, injected into the calculator
pub trait NodeLookup: Send + Sync {
    fn node(&self, id: &str) -> Option<&TransitNode>;
}

/// In-memory node collection indexed by node id
#[derive(Debug, Clone, Default)]
pub struct NodeCollection {
    nodes: HashMap<NodeId, TransitNode>,
}

impl NodeCollection {
    pub fn new(nodes: impl IntoIterator<Item = TransitNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|node| (node.id.clone(), node)).collect(),
        }
    }

    /// Loads nodes from a GeoJSON `FeatureCollection` of points.
    ///
    /// The node id is read from the `id` property, falling back to the
    /// feature id. Optional `category` and `detailedCategory` properties
    /// classify the node for the accessibility statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a feature collection of
    /// identified points.
    pub fn from_geojson_str(geojson: &str) -> Result<Self, Error> {
        let parsed: GeoJson = geojson
            .parse()
            .map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;
        let GeoJson::FeatureCollection(collection) = parsed else {
            return Err(Error::GeoJson(
                "node collection must be a FeatureCollection".to_string(),
            ));
        };

        let nodes = collection
            .features
            .into_iter()
            .map(node_from_feature)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Loaded {} transit nodes", nodes.len());

        Ok(Self::new(nodes))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitNode> {
        self.nodes.values()
    }
}

impl NodeLookup for NodeCollection {
    fn node(&self, id: &str) -> Option<&TransitNode> {
        self.nodes.get(id)
    }
}

fn node_from_feature(feature: Feature) -> Result<TransitNode, Error> {
    let id = match (feature.property("id"), &feature.id) {
        (Some(Value::String(id)), _) => id.clone(),
        (Some(Value::Number(id)), _) => id.to_string(),
        (_, Some(Id::String(id))) => id.clone(),
        (_, Some(Id::Number(id))) => id.to_string(),
        _ => {
            return Err(Error::InvalidData(
                "node feature without an id".to_string(),
            ));
        }
    };

    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| Error::InvalidData(format!("node {id} has no geometry")))?;
    let point = Point::<f64>::try_from(geometry.value.clone())
        .map_err(|e| Error::InvalidData(format!("node {id} is not a point: {e}")))?;

    let text_property = |key: &str| {
        feature
            .property(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(TransitNode {
        category: text_property("category"),
        detailed_category: text_property("detailedCategory"),
        id,
        geometry: point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 1,
                "geometry": { "type": "Point", "coordinates": [-73.1, 45.0] },
                "properties": { "id": "node1uuid", "category": "education", "detailedCategory": "school_secondary" }
            },
            {
                "type": "Feature",
                "id": 2,
                "geometry": { "type": "Point", "coordinates": [-73.2, 45.0] },
                "properties": {}
            }
        ]
    }"#;

    #[test]
    fn loads_nodes_from_geojson() {
        let collection = NodeCollection::from_geojson_str(NODES).unwrap();
        assert_eq!(collection.len(), 2);

        let node1 = collection.node("node1uuid").unwrap();
        assert_eq!(node1.geometry, Point::new(-73.1, 45.0));
        assert_eq!(node1.category.as_deref(), Some("education"));
        assert_eq!(node1.detailed_category.as_deref(), Some("school_secondary"));

        // falls back to the feature id
        let node2 = collection.node("2").unwrap();
        assert_eq!(node2.category, None);
    }

    #[test]
    fn rejects_non_point_nodes() {
        let line = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": { "id": "a" }
            }]
        }"#;
        assert!(matches!(
            NodeCollection::from_geojson_str(line),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            NodeCollection::from_geojson_str(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#),
            Err(Error::GeoJson(_))
        ));
    }
}
