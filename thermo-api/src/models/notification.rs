use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatesError {
    /// Input is not of the form `lat,lng`.
    InvalidFormat,
    /// A component is not a finite number.
    InvalidNumber,
}

impl fmt::Display for CoordinatesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatesError::InvalidFormat => write!(f, "expected two comma-separated values"),
            CoordinatesError::InvalidNumber => write!(f, "coordinate is not a finite number"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoordinatesError {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinatesRepr")]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

/// Accepts both the wire object and the `"lat,lng"` shorthand used in configuration.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinatesRepr {
    Object { lat: f64, lng: f64 },
    Text(String),
}

impl TryFrom<CoordinatesRepr> for Coordinates {
    type Error = CoordinatesError;

    fn try_from(repr: CoordinatesRepr) -> Result<Self, Self::Error> {
        match repr {
            CoordinatesRepr::Object { lat, lng } if lat.is_finite() && lng.is_finite() => {
                Ok(Self { lat, lng })
            }
            CoordinatesRepr::Object { .. } => Err(CoordinatesError::InvalidNumber),
            CoordinatesRepr::Text(text) => text.parse(),
        }
    }
}

impl FromStr for Coordinates {
    type Err = CoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoordinatesError::InvalidFormat);
        };

        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(CoordinatesError::InvalidNumber)
        };

        Ok(Self {
            lat: parse(lat)?,
            lng: parse(lng)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationParameters {
    /// Device type label
    #[serde(rename = "type")]
    pub device_type: String,
    /// Measured value
    pub value: f64,
    /// Measurement unit label
    pub units: String,
}

/// Periodic measurement report sent by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Device identity, or a unique per-message identifier
    pub id: String,
    /// Device location
    pub coordinates: Coordinates,
    /// Measurement data
    pub parameters: NotificationParameters,
    /// Instant the measurement was taken
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}
