use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::control::CancellationToken;
use crate::routing::AccessibleNodes;

/// Per-call options of an accessibility map calculation
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Merged into the property bag of every polygon, winning on collisions
    pub additional_properties: Map<String, Value>,
    /// Precomputed access nodes passed to the routing engine unchanged
    pub accessible_nodes: Option<AccessibleNodes>,
    pub cancellation: CancellationToken,
}

impl CalculationOptions {
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    #[must_use]
    pub fn with_additional_properties(mut self, properties: Map<String, Value>) -> Self {
        self.additional_properties = properties;
        self
    }
}

/// Engine tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    /// Number of segments approximating each walking circle
    pub circle_steps: usize,
    /// Number of circles merged between two cancellation checkpoints
    pub union_chunk_size: usize,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            circle_steps: 64,
            union_chunk_size: 20,
        }
    }
}
