//! Synthetic forecast day produced by the projector

use serde::{Deserialize, Serialize};

use super::WeatherCategory;

/// One projected day. A forecast is always exactly five of these, starting tomorrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// Weekday abbreviation ("Mon" .. "Sun")
    pub day: String,
    pub weather_type: WeatherCategory,
    /// Daytime high in Celsius, one decimal
    pub temp_high: f64,
    /// Overnight low in Celsius, one decimal
    pub temp_low: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let day = ForecastDay {
            day: "Mon".to_string(),
            weather_type: WeatherCategory::Rainy,
            temp_high: 18.4,
            temp_low: 12.1,
        };
        let value = serde_json::to_value(&day).unwrap();
        assert_eq!(value["day"], "Mon");
        assert_eq!(value["weatherType"], "Rainy");
        assert_eq!(value["tempHigh"], 18.4);
        assert_eq!(value["tempLow"], 12.1);
    }
}
