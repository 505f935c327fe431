//! Relative humidity from temperature and dew point (Magnus-Tetens)

const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

/// Relative humidity in percent, rounded to two decimals.
///
/// Values are not clamped: a dew point above the temperature yields more
/// than 100%. Inputs of exactly -237.7 °C divide by zero and produce a
/// non-finite result, which is returned as-is.
#[must_use]
pub fn estimate_humidity(temperature_c: f64, dew_point_c: f64) -> f64 {
    let alpha = (MAGNUS_A * dew_point_c) / (MAGNUS_B + dew_point_c)
        - (MAGNUS_A * temperature_c) / (MAGNUS_B + temperature_c);
    round_to(100.0 * alpha.exp(), 2)
}

/// Convert a GSOD Fahrenheit reading to Celsius
#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
