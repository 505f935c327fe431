//! Weather type labeling from GSOD indicator flags
//!
//! The cascade is strictly ordered, first match wins:
//! tornado, thunder, hail, snow, rain (split on precipitation), fog, and
//! finally a temperature fallback for days with no flag set.

use crate::models::{TrainingRow, WeatherCategory, WeatherIndicatorCode};

/// Precipitation above this turns a rain day into `Rainy` instead of `Drizzle`
pub const RAIN_PRECIPITATION_THRESHOLD: f64 = 0.1;
/// Flag-free days strictly warmer than this are `Sunny`
pub const SUNNY_ABOVE_C: f64 = 25.0;
/// Flag-free days strictly warmer than this (and not sunny) are `PartlyCloudy`
pub const PARTLY_CLOUDY_ABOVE_C: f64 = 15.0;

/// Label one station-day.
///
/// A missing code, or one that is not exactly six characters long, is `Unknown`.
#[must_use]
pub fn label(
    indicators: Option<&WeatherIndicatorCode>,
    precipitation: f64,
    temperature: f64,
) -> WeatherCategory {
    let Some(flags) = indicators.and_then(WeatherIndicatorCode::flags) else {
        return WeatherCategory::Unknown;
    };

    if flags.tornado {
        return WeatherCategory::Severe;
    }
    if flags.thunder {
        return WeatherCategory::Thunderstorm;
    }
    if flags.hail {
        return WeatherCategory::Hail;
    }
    if flags.snow {
        return WeatherCategory::Snowy;
    }
    if flags.rain {
        return if precipitation > RAIN_PRECIPITATION_THRESHOLD {
            WeatherCategory::Rainy
        } else {
            WeatherCategory::Drizzle
        };
    }
    if flags.fog {
        return WeatherCategory::Foggy;
    }

    if temperature > SUNNY_ABOVE_C {
        WeatherCategory::Sunny
    } else if temperature > PARTLY_CLOUDY_ABOVE_C {
        WeatherCategory::PartlyCloudy
    } else {
        WeatherCategory::Cloudy
    }
}

/// Drop rows whose label is outside the trainable set.
///
/// `Unknown`, `Severe` and `Hail` days are removed outright rather than
/// merged into a neighbouring category, so tornado and hail events are
/// absent from the training distribution.
pub fn retain_trainable(rows: &mut Vec<TrainingRow>) -> usize {
    let before = rows.len();
    rows.retain(|row| row.weather_type.is_trainable());
    before - rows.len()
}
