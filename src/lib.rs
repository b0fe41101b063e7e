//! Python bindings of the accessibility map engine.
//!
//! The engine itself lives in `accessmap_core`, re-exported here for Rust
//! users of this crate.

pub use accessmap_core::prelude;

#[cfg(feature = "python")]
pub mod accessibility;
#[cfg(feature = "python")]
pub mod nodes;

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;
    use pyo3_stub_gen::define_stub_info_gatherer;

    use crate::accessibility::{
        calculate_accessibility_map, compare_accessibility_maps, py_compute_durations,
        py_compute_time_samples,
    };
    use crate::nodes::{PyNodeCollection, create_node_collection};

    /// Transit accessibility maps
    #[pymodule]
    fn accessmap(m: &Bound<'_, PyModule>) -> PyResult<()> {
        pyo3_log::init();

        m.add_class::<PyNodeCollection>()?;
        m.add_function(wrap_pyfunction!(create_node_collection, m)?)?;

        m.add_function(wrap_pyfunction!(calculate_accessibility_map, m)?)?;
        m.add_function(wrap_pyfunction!(compare_accessibility_maps, m)?)?;
        m.add_function(wrap_pyfunction!(py_compute_durations, m)?)?;
        m.add_function(wrap_pyfunction!(py_compute_time_samples, m)?)?;
        m.add("PROGRESS_EVENT_NAME", accessmap_core::PROGRESS_EVENT_NAME)?;
        Ok(())
    }

    define_stub_info_gatherer!(stub_info);
}

#[cfg(feature = "python")]
pub use python::stub_info;

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn engine_is_usable_without_python() {
        assert_eq!(compute_durations(1200, 3), vec![1200, 800, 400]);
        assert!(NodeCollection::default().is_empty());
        assert_eq!(PROGRESS_EVENT_NAME, "AccessibilityMapPolygonGeneration");
    }
}
