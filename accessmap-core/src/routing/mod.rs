//! Seam to the external transit routing engine and aggregation of its
//! per-time-sample answers

pub mod aggregator;
pub mod engine;
pub mod replay;

pub use aggregator::RoutingResultAggregator;
pub use engine::{
    AccessibleMapQuery, AccessibleMapResult, AccessibleNodes, NodeTravelTime, RoutingEngine,
    RoutingError,
};
pub use replay::ReplayRouting;
