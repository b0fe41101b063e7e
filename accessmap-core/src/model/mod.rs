//! Data model of an accessibility map calculation
//!
//! Contains the calculation input (attributes and options), the transit
//! nodes consumed from an external node collection and the produced polygons.

pub mod attributes;
pub mod node;
pub mod options;
pub mod result;

pub use attributes::{AccessibilityMapAttributes, TimeOfTripType, ValidationError};
pub use node::{NodeCollection, NodeLookup, TransitNode};
pub use options::{CalculationOptions, IsochroneConfig};
pub use result::{AccessibilityMapResult, AccessibilityPolygon, AccessibilityStroke};
