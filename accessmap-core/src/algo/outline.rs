//! Strokes and area of accessibility polygons

use geo::{ChamberlainDuquetteArea, LineString, MultiLineString, MultiPolygon};
use serde_json::{Map, Value};

const SQ_KM_PER_SQ_MILE: f64 = 2.58999;

/// One line per ring. Holes of a polygon come first, each as its own line,
/// then its exterior ring.
pub fn polygon_strokes(geometry: &MultiPolygon<f64>) -> MultiLineString<f64> {
    let lines: Vec<LineString<f64>> = geometry
        .iter()
        .flat_map(|polygon| {
            polygon
                .interiors()
                .iter()
                .chain(std::iter::once(polygon.exterior()))
                .cloned()
        })
        .collect();

    MultiLineString::new(lines)
}

/// Geodesic area of a polygon in the units shown to users
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaMetrics {
    pub sq_m: f64,
    pub sq_km: f64,
    pub sq_miles: f64,
}

impl AreaMetrics {
    pub fn of(geometry: &MultiPolygon<f64>) -> Self {
        let sq_m = geometry.chamberlain_duquette_unsigned_area();
        let sq_km = sq_m / 1_000_000.0;
        Self {
            sq_m,
            sq_km,
            sq_miles: sq_km / SQ_KM_PER_SQ_MILE,
        }
    }

    pub fn write_properties(&self, properties: &mut Map<String, Value>) {
        properties.insert("areaSqM".to_string(), Value::from(self.sq_m));
        properties.insert("areaSqKm".to_string(), Value::from(self.sq_km));
        properties.insert("areaSqMiles".to_string(), Value::from(self.sq_miles));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Polygon, line_string, polygon};

    #[test]
    fn holes_come_before_their_exterior() {
        let with_hole: Polygon<f64> = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0)]],
        );
        let plain: Polygon<f64> =
            polygon![(x: 20.0, y: 0.0), (x: 21.0, y: 0.0), (x: 21.0, y: 1.0)];

        let strokes = polygon_strokes(&MultiPolygon::new(vec![with_hole.clone(), plain.clone()]));
        assert_eq!(strokes.0.len(), 3);
        assert_eq!(strokes.0[0], with_hole.interiors()[0]);
        assert_eq!(strokes.0[1], *with_hole.exterior());
        assert_eq!(strokes.0[2], *plain.exterior());
        assert!(strokes.0[0].is_closed());
    }

    #[test]
    fn empty_polygon_has_no_stroke() {
        assert!(polygon_strokes(&MultiPolygon::new(vec![])).0.is_empty());
    }

    #[test]
    fn area_units() {
        // about 1 km by 1 km at the equator
        let square = MultiPolygon::new(vec![Polygon::new(
            line_string![
                (x: 0.0, y: 0.0),
                (x: 0.008_983, y: 0.0),
                (x: 0.008_983, y: 0.008_983),
                (x: 0.0, y: 0.008_983),
                (x: 0.0, y: 0.0),
            ],
            vec![],
        )]);
        let area = AreaMetrics::of(&square);
        assert!((area.sq_km - 1.0).abs() < 0.01);
        assert!((area.sq_m - area.sq_km * 1_000_000.0).abs() < 1e-6);
        assert!((area.sq_miles - area.sq_km / 2.58999).abs() < 1e-12);

        let mut properties = Map::new();
        area.write_properties(&mut properties);
        assert_eq!(properties.len(), 3);
        assert!(properties["areaSqM"].as_f64().is_some());
    }
}
