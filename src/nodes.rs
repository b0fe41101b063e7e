use accessmap_core::prelude::*;
use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};

/// NodeCollection
///
/// Transit nodes (stops) reachable by the routing engine, with their
/// location and optional category used for the accessible places
/// statistics of the polygons.
///
/// Example:
///
/// .. code-block:: python
///
///     nodes = create_node_collection(open("nodes.geojson").read())
///     len(nodes)
#[gen_stub_pyclass]
#[pyclass(name = "NodeCollection")]
pub struct PyNodeCollection {
    pub(crate) inner: NodeCollection,
}

#[gen_stub_pymethods]
#[pymethods]
impl PyNodeCollection {
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.iter().map(|node| node.id.clone()).collect();
        ids.sort_unstable();
        ids
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("NodeCollection with {} nodes", self.inner.len())
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Create a node collection from a GeoJSON FeatureCollection
///
/// Every feature must be a Point with an `id` property. The optional
/// `category` and `detailedCategory` properties feed the accessible places
/// statistics.
///
/// Parameters
/// ----------
/// geojson : str
///     FeatureCollection of the transit nodes
///
/// Returns
/// -------
/// NodeCollection
#[pyfunction]
#[gen_stub_pyfunction]
pub fn create_node_collection(geojson: &str) -> PyResult<PyNodeCollection> {
    let inner = NodeCollection::from_geojson_str(geojson).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Failed to load nodes: {e}"))
    })?;
    Ok(PyNodeCollection { inner })
}
