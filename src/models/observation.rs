//! Station observations and the training rows derived from them

use serde::{Deserialize, Serialize};

use super::WeatherCategory;

/// GSOD `FRSHTT` indicator code: six positional `'0'`/`'1'` flags for
/// fog, rain, snow, hail, thunder and tornado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherIndicatorCode(String);

/// Decoded indicator flags, in code order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorFlags {
    pub fog: bool,
    pub rain: bool,
    pub snow: bool,
    pub hail: bool,
    pub thunder: bool,
    pub tornado: bool,
}

impl WeatherIndicatorCode {
    pub const LEN: usize = 6;

    /// Wrap a raw code without validating it; validation happens in [`Self::flags`]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Normalise a code read from a CSV cell.
    ///
    /// GSOD codes lose their leading zeros when a file has been through a
    /// numeric round trip ("10000" for rain only). All-digit cells shorter
    /// than six characters are left-padded back; anything else is kept
    /// verbatim so the labeler can reject it.
    #[must_use]
    pub fn from_csv_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if !cell.is_empty() && cell.len() < Self::LEN && cell.bytes().all(|b| b.is_ascii_digit()) {
            Self(format!("{cell:0>6}"))
        } else {
            Self(cell.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the positional flags; `None` when the code is not exactly six characters.
    ///
    /// Only the character `'1'` sets a flag.
    #[must_use]
    pub fn flags(&self) -> Option<IndicatorFlags> {
        let chars: Vec<char> = self.0.chars().collect();
        let [fog, rain, snow, hail, thunder, tornado] = chars.as_slice() else {
            return None;
        };
        Some(IndicatorFlags {
            fog: *fog == '1',
            rain: *rain == '1',
            snow: *snow == '1',
            hail: *hail == '1',
            thunder: *thunder == '1',
            tornado: *tornado == '1',
        })
    }
}

/// One raw station-day after unit conversion, consumed immediately by the labeler
#[derive(Debug, Clone)]
pub struct ObservationRecord {
    /// Mean temperature in Celsius
    pub temperature: f64,
    /// Mean dew point in Celsius
    pub dew_point: f64,
    /// Mean sea-level pressure in hPa
    pub sea_level_pressure: f64,
    /// Mean wind speed in knots
    pub wind_speed: f64,
    /// Total precipitation in inches
    pub precipitation: f64,
    /// `FRSHTT` indicators, absent when the cell was empty
    pub indicators: Option<WeatherIndicatorCode>,
}

/// Feature row handed to the classifier, with its derived label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub weather_type: WeatherCategory,
}

impl TrainingRow {
    /// Features in model column order
    #[must_use]
    pub fn features(&self) -> [f64; 5] {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.wind_speed,
            self.precipitation,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_positional() {
        let flags = WeatherIndicatorCode::new("010010").flags().unwrap();
        assert!(!flags.fog);
        assert!(flags.rain);
        assert!(!flags.snow);
        assert!(!flags.hail);
        assert!(flags.thunder);
        assert!(!flags.tornado);
    }

    #[test]
    fn test_flags_rejects_wrong_length() {
        assert!(WeatherIndicatorCode::new("").flags().is_none());
        assert!(WeatherIndicatorCode::new("01000").flags().is_none());
        assert!(WeatherIndicatorCode::new("0100000").flags().is_none());
    }

    #[test]
    fn test_from_csv_cell_restores_leading_zeros() {
        assert_eq!(WeatherIndicatorCode::from_csv_cell("10000").as_str(), "010000");
        assert_eq!(WeatherIndicatorCode::from_csv_cell("0").as_str(), "000000");
        assert_eq!(WeatherIndicatorCode::from_csv_cell(" 100000 ").as_str(), "100000");
        assert_eq!(WeatherIndicatorCode::from_csv_cell("1x").as_str(), "1x");
    }

    #[test]
    fn test_training_row_feature_order() {
        let row = TrainingRow {
            temperature: 1.0,
            humidity: 2.0,
            pressure: 3.0,
            wind_speed: 4.0,
            precipitation: 5.0,
            weather_type: WeatherCategory::Cloudy,
        };
        assert_eq!(row.features(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
