use itertools::Itertools;
use thiserror::Error;

use crate::model::ValidationError;
use crate::routing::RoutingError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid accessibility map attributes: {}", .0.iter().join(", "))]
    Validation(Vec<ValidationError>),
    #[error("Accessibility map calculation was cancelled")]
    Cancelled,
    #[error("Cannot calculate transit accessibility map with the routing engine: {0}")]
    RoutingFailure(#[source] RoutingError),
    #[error("Geometry error: {0}")]
    Geometry(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
}

impl Error {
    /// Machine-readable code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationFailed",
            Error::Cancelled => "Cancelled",
            Error::RoutingFailure(_) => "TRRAM0001",
            Error::Geometry(_) => "GeometryError",
            Error::InvalidData(_) => "InvalidData",
            Error::GeoJson(_) => "GeoJsonError",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
