//! Transit accessibility map engine.
//!
//! Turns the per-node travel times returned by an external transit routing
//! engine into nested accessibility polygons (isochrones), their outlines
//! and the accessible places statistics for every duration band.

pub mod algo;
pub mod calculator;
pub mod control;
pub mod error;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;

/// Seconds, either a duration or a time of day since midnight
pub type Time = u32;

/// Identifier of a transit node (stop) as known by the routing engine
pub type NodeId = String;

/// Name of the progress events emitted while polygons are generated
pub const PROGRESS_EVENT_NAME: &str = "AccessibilityMapPolygonGeneration";
