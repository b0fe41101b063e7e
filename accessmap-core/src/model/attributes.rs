//! Input attributes of an accessibility map calculation and their validation

use chrono::TimeDelta;
use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Time;

pub const MAX_DELTA_SECONDS: Time = 30 * 60;
pub const MAX_DELTA_INTERVAL_SECONDS: Time = 30 * 60;
pub const MIN_ACCESS_EGRESS_TRAVEL_TIME_SECONDS: Time = 60;
pub const MAX_ACCESS_EGRESS_TRAVEL_TIME_SECONDS: Time = 20 * 60;
pub const MIN_WALKING_SPEED_MPS: f64 = 2.0 / 3.6;
pub const MAX_WALKING_SPEED_MPS: f64 = 10.0 / 3.6;

/// Whether the requested time is the departure time from the location or
/// the arrival time at the location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfTripType {
    Departure,
    Arrival,
}

/// Attributes of an accessibility map calculation.
///
/// JSON keys are camelCase. Missing values default to 15 minutes of total
/// travel time, one polygon, no delta, a 60 s delta interval, 3 min of
/// minimum waiting time, 15 min access, egress and transfer budgets, and a
/// 5 km/h walking speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityMapAttributes {
    /// Reference location, serialized as `[lon, lat]`
    #[serde(with = "lon_lat")]
    pub location: Point<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time_seconds_since_midnight: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time_seconds_since_midnight: Option<Time>,
    #[serde(default = "defaults::max_total_travel_time_seconds")]
    pub max_total_travel_time_seconds: Time,
    #[serde(default = "defaults::number_of_polygons")]
    pub number_of_polygons: u32,
    #[serde(default)]
    pub delta_seconds: Time,
    #[serde(default = "defaults::delta_interval_seconds")]
    pub delta_interval_seconds: Time,
    #[serde(default = "defaults::min_waiting_time_seconds")]
    pub min_waiting_time_seconds: Time,
    #[serde(default = "defaults::max_access_egress_travel_time_seconds")]
    pub max_access_egress_travel_time_seconds: Time,
    #[serde(default = "defaults::max_transfer_travel_time_seconds")]
    pub max_transfer_travel_time_seconds: Time,
    #[serde(default = "defaults::walking_speed_mps")]
    pub walking_speed_mps: f64,
    #[serde(default)]
    pub scenario_id: String,
    /// Fill color of the polygons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Color of the reference location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

mod defaults {
    use crate::Time;

    pub(super) fn max_total_travel_time_seconds() -> Time {
        900
    }
    pub(super) fn number_of_polygons() -> u32 {
        1
    }
    pub(super) fn delta_interval_seconds() -> Time {
        60
    }
    pub(super) fn min_waiting_time_seconds() -> Time {
        180
    }
    pub(super) fn max_access_egress_travel_time_seconds() -> Time {
        900
    }
    pub(super) fn max_transfer_travel_time_seconds() -> Time {
        900
    }
    pub(super) fn walking_speed_mps() -> f64 {
        5.0 / 3.6
    }
}

impl AccessibilityMapAttributes {
    /// Attributes for a departure from `location` at `departure_time`,
    /// every other value at its default
    pub fn departing_at(location: Point<f64>, departure_time: Time, scenario_id: &str) -> Self {
        Self {
            location,
            departure_time_seconds_since_midnight: Some(departure_time),
            arrival_time_seconds_since_midnight: None,
            max_total_travel_time_seconds: defaults::max_total_travel_time_seconds(),
            number_of_polygons: defaults::number_of_polygons(),
            delta_seconds: 0,
            delta_interval_seconds: defaults::delta_interval_seconds(),
            min_waiting_time_seconds: defaults::min_waiting_time_seconds(),
            max_access_egress_travel_time_seconds: defaults::max_access_egress_travel_time_seconds(),
            max_transfer_travel_time_seconds: defaults::max_transfer_travel_time_seconds(),
            walking_speed_mps: defaults::walking_speed_mps(),
            scenario_id: scenario_id.to_string(),
            color: None,
            location_color: None,
            place_name: None,
        }
    }

    /// Attributes for an arrival at `location` at `arrival_time`
    pub fn arriving_at(location: Point<f64>, arrival_time: Time, scenario_id: &str) -> Self {
        Self {
            departure_time_seconds_since_midnight: None,
            arrival_time_seconds_since_midnight: Some(arrival_time),
            ..Self::departing_at(location, arrival_time, scenario_id)
        }
    }

    /// Checks every rule and returns all the violations at once.
    ///
    /// # Errors
    ///
    /// Returns the list of violated rules, never empty.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.location.x().is_finite() || !self.location.y().is_finite() {
            errors.push(ValidationError::LocationIsInvalid);
        }

        match (
            self.departure_time_seconds_since_midnight,
            self.arrival_time_seconds_since_midnight,
        ) {
            (None, None) => errors.push(ValidationError::DepartureAndArrivalTimeAreBlank),
            (Some(_), Some(_)) => {
                errors.push(ValidationError::DepartureAndArrivalTimeAreBothNotBlank);
            }
            _ => {}
        }

        let max_travel_time = self.max_total_travel_time_seconds;
        if max_travel_time == 0 {
            errors.push(ValidationError::MaxTotalTravelTimeSecondsIsMissing);
        }

        if self.number_of_polygons == 0 {
            errors.push(ValidationError::NumberOfPolygonsIsInvalid);
        } else if max_travel_time > 0
            && u64::from(self.number_of_polygons) * 60 > u64::from(max_travel_time)
        {
            errors.push(ValidationError::NumberOfPolygonsIsTooLarge);
        }

        if self.delta_seconds > MAX_DELTA_SECONDS {
            errors.push(ValidationError::DeltaIsTooLarge);
        }

        let delta_interval = self.delta_interval_seconds;
        if delta_interval == 0 {
            errors.push(ValidationError::DeltaIntervalIsMissing);
        } else if delta_interval > MAX_DELTA_INTERVAL_SECONDS {
            errors.push(ValidationError::DeltaIntervalIsTooLarge);
        } else if self.delta_seconds != 0 && self.delta_seconds % delta_interval != 0 {
            errors.push(ValidationError::DeltaIsNotAMultipleOfDeltaInterval);
        }

        let access_egress = self.max_access_egress_travel_time_seconds;
        if access_egress < MIN_ACCESS_EGRESS_TRAVEL_TIME_SECONDS {
            errors.push(ValidationError::MaxAccessEgressTravelTimeSecondsIsInvalid);
        } else if access_egress > MAX_ACCESS_EGRESS_TRAVEL_TIME_SECONDS {
            errors.push(ValidationError::MaxAccessEgressTravelTimeSecondsIsTooLarge);
        }

        let speed = self.walking_speed_mps;
        if !speed.is_finite() || speed <= 0.0 {
            errors.push(ValidationError::WalkingSpeedMpsIsInvalid);
        } else if speed > MAX_WALKING_SPEED_MPS {
            errors.push(ValidationError::WalkingSpeedMpsIsTooLarge);
        } else if speed < MIN_WALKING_SPEED_MPS {
            errors.push(ValidationError::WalkingSpeedMpsIsTooLow);
        }

        if self.scenario_id.trim().is_empty() {
            errors.push(ValidationError::ScenarioIdIsMissing);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The requested time of trip and whether it is a departure or an arrival.
    /// Departure wins when both are set, validation rejects that case anyway.
    pub fn time_of_trip(&self) -> Option<(Time, TimeOfTripType)> {
        self.departure_time_seconds_since_midnight
            .map(|time| (time, TimeOfTripType::Departure))
            .or_else(|| {
                self.arrival_time_seconds_since_midnight
                    .map(|time| (time, TimeOfTripType::Arrival))
            })
    }

    /// Attributes as polygon properties, with the `departureTime` and
    /// `arrivalTime` strings formatted as `HH:MM`
    pub fn to_properties(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut properties = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        properties.insert(
            "departureTime".to_string(),
            self.departure_time_seconds_since_midnight
                .map(seconds_since_midnight_to_time_str)
                .unwrap_or_default()
                .into(),
        );
        properties.insert(
            "arrivalTime".to_string(),
            self.arrival_time_seconds_since_midnight
                .map(seconds_since_midnight_to_time_str)
                .unwrap_or_default()
                .into(),
        );
        properties
    }
}

/// Formats seconds since midnight as `HH:MM`. Hours go past 23 for trips
/// ending after midnight of the service day.
pub fn seconds_since_midnight_to_time_str(seconds: Time) -> String {
    let delta = TimeDelta::seconds(i64::from(seconds));
    format!("{:02}:{:02}", delta.num_hours(), delta.num_minutes() % 60)
}

/// One violated attribute rule
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationError {
    #[error("location must have finite coordinates")]
    LocationIsInvalid,
    #[error("departure and arrival time are both blank")]
    DepartureAndArrivalTimeAreBlank,
    #[error("departure and arrival time cannot both be set")]
    DepartureAndArrivalTimeAreBothNotBlank,
    #[error("maximum total travel time is missing")]
    MaxTotalTravelTimeSecondsIsMissing,
    #[error("number of polygons must be at least 1")]
    NumberOfPolygonsIsInvalid,
    #[error("number of polygons cannot exceed one per minute of maximum travel time")]
    NumberOfPolygonsIsTooLarge,
    #[error("delta cannot exceed 30 minutes")]
    DeltaIsTooLarge,
    #[error("delta interval is missing")]
    DeltaIntervalIsMissing,
    #[error("delta interval cannot exceed 30 minutes")]
    DeltaIntervalIsTooLarge,
    #[error("delta must be a multiple of the delta interval")]
    DeltaIsNotAMultipleOfDeltaInterval,
    #[error("maximum access/egress travel time must be at least 1 minute")]
    MaxAccessEgressTravelTimeSecondsIsInvalid,
    #[error("maximum access/egress travel time cannot exceed 20 minutes")]
    MaxAccessEgressTravelTimeSecondsIsTooLarge,
    #[error("walking speed must be a positive number")]
    WalkingSpeedMpsIsInvalid,
    #[error("walking speed cannot exceed 10 km/h")]
    WalkingSpeedMpsIsTooLarge,
    #[error("walking speed cannot be lower than 2 km/h")]
    WalkingSpeedMpsIsTooLow,
    #[error("scenario id is missing")]
    ScenarioIdIsMissing,
}

impl ValidationError {
    /// Localisation key understood by the front end
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::LocationIsInvalid => "transit:transitRouting:errors:LocationIsInvalid",
            ValidationError::DepartureAndArrivalTimeAreBlank => {
                "transit:transitRouting:errors:DepartureAndArrivalTimeAreBlank"
            }
            ValidationError::DepartureAndArrivalTimeAreBothNotBlank => {
                "transit:transitRouting:errors:DepartureAndArrivalTimeAreBothNotBlank"
            }
            ValidationError::MaxTotalTravelTimeSecondsIsMissing => {
                "transit:transitRouting:errors:MaxTotalTravelTimeSecondsIsMissing"
            }
            ValidationError::NumberOfPolygonsIsInvalid => {
                "transit:transitRouting:errors:NumberOfPolygonsIsInvalid"
            }
            ValidationError::NumberOfPolygonsIsTooLarge => {
                "transit:transitRouting:errors:NumberOfPolygonsIsTooLarge"
            }
            ValidationError::DeltaIsTooLarge => "transit:transitRouting:errors:DeltaIsTooLarge",
            ValidationError::DeltaIntervalIsMissing => {
                "transit:transitRouting:errors:DeltaIntervalIsMissing"
            }
            ValidationError::DeltaIntervalIsTooLarge => {
                "transit:transitRouting:errors:DeltaIntervalIsTooLarge"
            }
            ValidationError::DeltaIsNotAMultipleOfDeltaInterval => {
                "transit:transitRouting:errors:DeltaIntervalMustBeAMultipleOfDelta"
            }
            ValidationError::MaxAccessEgressTravelTimeSecondsIsInvalid => {
                "transit:transitRouting:errors:MaxAccessEgressTravelTimeSecondsIsInvalid"
            }
            ValidationError::MaxAccessEgressTravelTimeSecondsIsTooLarge => {
                "transit:transitRouting:errors:MaxAccessEgressTravelTimeSecondsIsTooLarge"
            }
            ValidationError::WalkingSpeedMpsIsInvalid => {
                "transit:transitRouting:errors:WalkingSpeedMpsIsInvalid"
            }
            ValidationError::WalkingSpeedMpsIsTooLarge => {
                "transit:transitRouting:errors:WalkingSpeedMpsIsTooLarge"
            }
            ValidationError::WalkingSpeedMpsIsTooLow => {
                "transit:transitRouting:errors:WalkingSpeedMpsIsTooLow"
            }
            ValidationError::ScenarioIdIsMissing => {
                "transit:transitRouting:errors:ScenarioIdIsMissing"
            }
        }
    }
}

mod lon_lat {
    use geo::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(point: &Point<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        [point.x(), point.y()].serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Point<f64>, D::Error> {
        let [lon, lat] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Point::new(lon, lat))
    }
}
