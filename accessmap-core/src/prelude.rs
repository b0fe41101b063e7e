pub use crate::PROGRESS_EVENT_NAME;

// Re-export key components
pub use crate::algo::comparison::{ComparisonColors, MapComparison, compare_maps};
pub use crate::algo::planner::{compute_durations, compute_time_samples};
pub use crate::algo::union::CancellableUnionEngine;
pub use crate::calculator::{AccessibilityMapCalculator, IsochroneBuilder, RoutingPhaseResult};
pub use crate::control::{CancellationToken, NoProgress, ProgressSink};
pub use crate::model::{
    AccessibilityMapAttributes, AccessibilityMapResult, AccessibilityPolygon, AccessibilityStroke,
    CalculationOptions, IsochroneConfig, NodeCollection, NodeLookup, TimeOfTripType, TransitNode,
    ValidationError,
};
pub use crate::routing::{
    AccessibleMapQuery, AccessibleMapResult, AccessibleNodes, NodeTravelTime, ReplayRouting,
    RoutingEngine, RoutingError, RoutingResultAggregator,
};

// Core types
pub use crate::Error;
pub use crate::NodeId;
pub use crate::Time; // seconds
