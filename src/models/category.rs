//! Weather categories produced by the labeler and predicted by the classifier

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PredictorError;

/// Categorical weather type for one station-day.
///
/// Only the first eight variants are valid model outputs. `Unknown`,
/// `Severe` and `Hail` are produced by the labeler but never reach the
/// classifier's label space (see [`crate::weather::labeler::retain_trainable`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCategory {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Thunderstorm,
    Snowy,
    Drizzle,
    Foggy,
    Unknown,
    Severe,
    Hail,
}

impl WeatherCategory {
    /// The eight trainable categories, in forecast walk order.
    ///
    /// Position in this list is the only notion of "similar weather": the
    /// projector's random walk moves one step left or right, so neighbours
    /// (Sunny/PartlyCloudy, PartlyCloudy/Cloudy, ...) are the only
    /// transitions a single day can make.
    pub const FORECAST_ORDER: [WeatherCategory; 8] = [
        WeatherCategory::Sunny,
        WeatherCategory::PartlyCloudy,
        WeatherCategory::Cloudy,
        WeatherCategory::Rainy,
        WeatherCategory::Thunderstorm,
        WeatherCategory::Snowy,
        WeatherCategory::Drizzle,
        WeatherCategory::Foggy,
    ];

    /// Human-readable name, also used on the wire and in cached datasets
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCategory::Sunny => "Sunny",
            WeatherCategory::PartlyCloudy => "Partly Cloudy",
            WeatherCategory::Cloudy => "Cloudy",
            WeatherCategory::Rainy => "Rainy",
            WeatherCategory::Thunderstorm => "Thunderstorm",
            WeatherCategory::Snowy => "Snowy",
            WeatherCategory::Drizzle => "Drizzle",
            WeatherCategory::Foggy => "Foggy",
            WeatherCategory::Unknown => "Unknown",
            WeatherCategory::Severe => "Severe",
            WeatherCategory::Hail => "Hail",
        }
    }

    /// Whether the category belongs to the trainable label space
    #[must_use]
    pub fn is_trainable(self) -> bool {
        self.forecast_index().is_some()
    }

    /// Position in [`Self::FORECAST_ORDER`], `None` for filtered-out states
    #[must_use]
    pub fn forecast_index(self) -> Option<usize> {
        Self::FORECAST_ORDER.iter().position(|c| *c == self)
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherCategory {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = match s.trim() {
            "Sunny" => WeatherCategory::Sunny,
            "Partly Cloudy" | "PartlyCloudy" => WeatherCategory::PartlyCloudy,
            "Cloudy" => WeatherCategory::Cloudy,
            "Rainy" => WeatherCategory::Rainy,
            "Thunderstorm" => WeatherCategory::Thunderstorm,
            "Snowy" => WeatherCategory::Snowy,
            "Drizzle" => WeatherCategory::Drizzle,
            "Foggy" => WeatherCategory::Foggy,
            "Unknown" => WeatherCategory::Unknown,
            "Severe" => WeatherCategory::Severe,
            "Hail" => WeatherCategory::Hail,
            other => {
                return Err(PredictorError::validation(format!(
                    "Unrecognized weather type '{other}'"
                )));
            }
        };
        Ok(category)
    }
}

impl Serialize for WeatherCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WeatherCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
