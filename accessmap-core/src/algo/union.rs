//! Union of many polygons in chunks, yielding to the scheduler between
//! chunks so that a calculation can be cancelled while it runs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use geo::{Area, BooleanOps, CoordsIter, MultiPolygon, Polygon, unary_union};

use crate::Error;
use crate::control::CancellationToken;

pub const DEFAULT_CHUNK_SIZE: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct CancellableUnionEngine {
    chunk_size: usize,
}

impl Default for CancellableUnionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl CancellableUnionEngine {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Unions `polygons` into a single multi-polygon.
    ///
    /// Polygons without area are ignored. After each chunk the task yields,
    /// then the cancellation token is checked.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] when the token fires, no partial result is kept.
    /// [`Error::Geometry`] for non-finite coordinates or a failure of the
    /// polygon clipper.
    pub async fn union(
        &self,
        polygons: Vec<Polygon<f64>>,
        cancellation: &CancellationToken,
    ) -> Result<MultiPolygon<f64>, Error> {
        let polygons = usable_polygons(polygons)?;

        let mut accumulated = MultiPolygon::new(Vec::new());
        for chunk in polygons.chunks(self.chunk_size) {
            accumulated = union_chunk(&accumulated, chunk)?;

            tokio::task::yield_now().await;
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        Ok(accumulated)
    }

    /// Union of every polygon in one pass, without yielding
    pub fn union_all(&self, polygons: Vec<Polygon<f64>>) -> Result<MultiPolygon<f64>, Error> {
        let polygons = usable_polygons(polygons)?;
        union_chunk(&MultiPolygon::new(Vec::new()), &polygons)
    }
}

fn usable_polygons(polygons: Vec<Polygon<f64>>) -> Result<Vec<Polygon<f64>>, Error> {
    if let Some(coord) = polygons
        .iter()
        .flat_map(|polygon| polygon.coords_iter())
        .find(|coord| !coord.x.is_finite() || !coord.y.is_finite())
    {
        return Err(Error::Geometry(format!(
            "invalid ring coordinate ({}, {})",
            coord.x, coord.y
        )));
    }

    Ok(polygons
        .into_iter()
        .filter(|polygon| polygon.unsigned_area() > 0.0)
        .collect())
}

fn union_chunk(
    accumulated: &MultiPolygon<f64>,
    chunk: &[Polygon<f64>],
) -> Result<MultiPolygon<f64>, Error> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let chunk_union = unary_union(chunk);
        if accumulated.0.is_empty() {
            chunk_union
        } else {
            accumulated.union(&chunk_union)
        }
    }))
    .map_err(|payload| {
        Error::Geometry(format!(
            "polygon union failed: {}",
            panic_message(payload.as_ref())
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown clipper error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::circles::circle_polygon;
    use geo::Point;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 45 overlapping circles on a 9 x 5 grid
    fn grid_of_circles() -> Vec<Polygon<f64>> {
        (0..45_i32)
            .map(|i| {
                let center = Point::new(
                    -73.6 + f64::from(i % 9) * 0.004,
                    45.5 + f64::from(i / 9) * 0.004,
                );
                circle_polygon(center, 250.0 + f64::from(i % 4) * 40.0, 64)
            })
            .collect()
    }

    #[tokio::test]
    async fn chunk_size_does_not_change_the_union() {
        let circles = grid_of_circles();
        let one_pass = CancellableUnionEngine::new(circles.len())
            .union_all(circles.clone())
            .unwrap();
        let chunked = CancellableUnionEngine::new(20)
            .union(circles, &CancellationToken::none())
            .await
            .unwrap();

        let area = one_pass.unsigned_area();
        assert!(area > 0.0);
        assert!((chunked.unsigned_area() - area).abs() < area * 1e-6);
        assert!(one_pass.difference(&chunked).unsigned_area() < area * 1e-6);
        assert!(chunked.difference(&one_pass).unsigned_area() < area * 1e-6);
        assert_eq!(chunked.0.len(), one_pass.0.len());
    }

    #[tokio::test]
    async fn degenerate_circles_add_no_area() {
        let center = Point::new(-73.6, 45.5);
        let engine = CancellableUnionEngine::default();
        let alone = engine
            .union(vec![circle_polygon(center, 100.0, 64)], &CancellationToken::none())
            .await
            .unwrap();
        let with_degenerate = engine
            .union(
                vec![
                    circle_polygon(center, 100.0, 64),
                    circle_polygon(Point::new(-73.0, 45.0), 0.0, 64),
                ],
                &CancellationToken::none(),
            )
            .await
            .unwrap();
        assert_eq!(alone, with_degenerate);
        assert!(
            engine
                .union(Vec::new(), &CancellationToken::none())
                .await
                .unwrap()
                .0
                .is_empty()
        );
    }

    #[tokio::test]
    async fn cancellation_is_checked_between_chunks() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = checks.clone();
        // cancels on the second check
        let token = CancellationToken::from_fn(move || counter.fetch_add(1, Ordering::SeqCst) >= 1);

        let result = CancellableUnionEngine::new(20)
            .union(grid_of_circles(), &token)
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(checks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_geometry_errors() {
        let circle = circle_polygon(Point::new(f64::NAN, 45.0), 100.0, 16);
        let result = CancellableUnionEngine::default()
            .union(vec![circle], &CancellationToken::none())
            .await;
        assert!(matches!(result, Err(Error::Geometry(_))));
    }
}
