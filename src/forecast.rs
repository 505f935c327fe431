//! Synthetic 5-day forecast projection
//!
//! Starting from today's predicted category and temperature, each upcoming
//! day may step the category one place along
//! [`WeatherCategory::FORECAST_ORDER`] and draws a temperature range from a
//! noisy, mean-reverting walk. Randomness comes from a caller-supplied
//! [`Rng`]; [`project`] uses the thread-local generator and the local date.

use chrono::{Datelike, Local, Weekday};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::models::{ForecastDay, WeatherCategory};
use crate::weather::humidity::round_to;

/// Number of projected days
pub const FORECAST_DAYS: usize = 5;

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Starting index when the current category is outside the forecast order (Cloudy)
const FALLBACK_INDEX: usize = 2;

/// Temperature the walk reverts toward, in Celsius
const SEASONAL_MEAN_C: f64 = 20.0;
const REVERSION_KEEP: f64 = 0.8;

/// Conditions the projection starts from
#[derive(Debug, Clone, Copy)]
pub struct CurrentConditions {
    pub category: WeatherCategory,
    pub temperature: f64,
    /// Accepted for completeness; does not influence the walk
    pub humidity: f64,
    /// Accepted for completeness; does not influence the walk
    pub precipitation: f64,
}

/// Running state carried from one projected day to the next
#[derive(Debug)]
struct ForecastState {
    category_index: usize,
    temperature: f64,
}

/// Weekday abbreviations for the five days after `today`
#[must_use]
pub fn day_names(today: Weekday) -> [&'static str; FORECAST_DAYS] {
    let today = today.num_days_from_monday() as usize;
    std::array::from_fn(|i| DAY_NAMES[(today + i + 1) % DAY_NAMES.len()])
}

/// Probability threshold for day `step` (zero-based): the category changes
/// only when a uniform draw exceeds `0.7 + 0.3 / (step + 1)`.
#[must_use]
pub fn transition_threshold(step: usize) -> f64 {
    0.7 + 0.3 / (step as f64 + 1.0)
}

/// Project five days from now using the thread-local RNG and today's local weekday
#[must_use]
pub fn project(conditions: CurrentConditions) -> Vec<ForecastDay> {
    project_with_rng(&mut rand::thread_rng(), Local::now().weekday(), conditions)
}

/// Project five days after `today`, drawing all randomness from `rng`
pub fn project_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    today: Weekday,
    conditions: CurrentConditions,
) -> Vec<ForecastDay> {
    let mut state = ForecastState {
        category_index: conditions
            .category
            .forecast_index()
            .unwrap_or(FALLBACK_INDEX),
        temperature: conditions.temperature,
    };

    let mut forecast = Vec::with_capacity(FORECAST_DAYS);
    for (step, day) in day_names(today).into_iter().enumerate() {
        let draws = DayDraws::sample(rng, step);
        let (weather_type, temp_high, temp_low) = advance(&mut state, step, &draws);
        forecast.push(ForecastDay {
            day: day.to_string(),
            weather_type,
            temp_high,
            temp_low,
        });
    }

    forecast
}

/// Random inputs consumed by one projected day, in draw order
#[derive(Debug, Clone, Copy)]
struct DayDraws {
    /// Category step, drawn only when the transition fires
    direction: Option<isize>,
    /// Standard normal scaling the high's spread
    spread: f64,
    /// Uniform in `[0, 1)` choosing the high/low gap
    gap: f64,
    /// Standard normal added to the next day's base temperature
    noise: f64,
}

impl DayDraws {
    fn sample<R: Rng + ?Sized>(rng: &mut R, step: usize) -> Self {
        let direction =
            (rng.r#gen::<f64>() > transition_threshold(step)).then(|| draw_direction(rng));
        let spread = rng.sample(StandardNormal);
        let gap = rng.r#gen::<f64>();
        let noise = rng.sample(StandardNormal);
        Self {
            direction,
            spread,
            gap,
            noise,
        }
    }
}

/// Apply one day's draws: returns `(category, high, low)` and moves `state`
/// to the next day's base temperature.
fn advance(state: &mut ForecastState, step: usize, draws: &DayDraws) -> (WeatherCategory, f64, f64) {
    let horizon = step as f64;

    if let Some(direction) = draws.direction {
        state.category_index = step_index(state.category_index, direction);
    }
    let weather_type = WeatherCategory::FORECAST_ORDER[state.category_index];

    let variation = draws.spread * (1.0 + 0.5 * horizon);
    let temp_high = round_to(state.temperature + variation + 0.2 * horizon, 1);
    let temp_low = round_to(temp_high - (3.0 + draws.gap * 5.0), 1);

    state.temperature = state.temperature * REVERSION_KEEP
        + SEASONAL_MEAN_C * (1.0 - REVERSION_KEEP)
        + draws.noise;

    (weather_type, temp_high, temp_low)
}

/// Move `index` by `direction`, clamped to the ends of the forecast order
fn step_index(index: usize, direction: isize) -> usize {
    let last = WeatherCategory::FORECAST_ORDER.len() as isize - 1;
    (index as isize + direction).clamp(0, last) as usize
}

fn draw_direction<R: Rng + ?Sized>(rng: &mut R) -> isize {
    direction_for(rng.r#gen())
}

/// -1, 0 or +1 for a uniform `u`, with probabilities 0.3, 0.4, 0.3
fn direction_for(u: f64) -> isize {
    if u < 0.3 {
        -1
    } else if u < 0.7 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    fn conditions(category: WeatherCategory, temperature: f64) -> CurrentConditions {
        CurrentConditions {
            category,
            temperature,
            humidity: 60.0,
            precipitation: 0.0,
        }
    }

    #[test]
    fn test_day_names_wrap_after_sunday() {
        assert_eq!(day_names(Weekday::Sun), ["Mon", "Tue", "Wed", "Thu", "Fri"]);
    }

    #[test]
    fn test_day_names_wrap_mid_week() {
        assert_eq!(day_names(Weekday::Thu), ["Fri", "Sat", "Sun", "Mon", "Tue"]);
        assert_eq!(day_names(Weekday::Mon), ["Tue", "Wed", "Thu", "Fri", "Sat"]);
    }

    #[test]
    fn test_transition_threshold_formula() {
        assert_eq!(transition_threshold(0), 1.0);
        assert!((transition_threshold(1) - 0.85).abs() < 1e-12);
        assert!((transition_threshold(4) - 0.76).abs() < 1e-12);
    }

    #[test]
    fn test_always_five_days_with_bounded_gap() {
        let mut rng = StdRng::seed_from_u64(7);
        for seed_round in 0..200 {
            let start = -10.0 + f64::from(seed_round) * 0.2;
            let forecast = project_with_rng(
                &mut rng,
                Weekday::Wed,
                conditions(WeatherCategory::Rainy, start),
            );
            assert_eq!(forecast.len(), FORECAST_DAYS);
            for day in &forecast {
                let gap = day.temp_high - day.temp_low;
                assert!(day.temp_low < day.temp_high);
                // Both ends are rounded to one decimal, so allow rounding slack
                assert!(gap >= 3.0 - 0.051 && gap < 8.0 + 0.051, "gap {gap}");
                assert!(day.weather_type.is_trainable());
            }
        }
    }

    #[test]
    fn test_same_seed_same_forecast() {
        let start = conditions(WeatherCategory::Sunny, 24.0);
        let a = project_with_rng(&mut StdRng::seed_from_u64(42), Weekday::Fri, start);
        let b = project_with_rng(&mut StdRng::seed_from_u64(42), Weekday::Fri, start);
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_day_never_transitions() {
        // threshold is 1.0 on day one and uniform draws are < 1.0
        let mut rng = StdRng::seed_from_u64(3);
        for category in WeatherCategory::FORECAST_ORDER {
            let forecast = project_with_rng(&mut rng, Weekday::Mon, conditions(category, 15.0));
            assert_eq!(forecast[0].weather_type, category);
        }
    }

    #[test]
    fn test_unknown_category_starts_cloudy() {
        let mut rng = StdRng::seed_from_u64(11);
        for category in [
            WeatherCategory::Unknown,
            WeatherCategory::Severe,
            WeatherCategory::Hail,
        ] {
            let forecast = project_with_rng(&mut rng, Weekday::Tue, conditions(category, 18.0));
            assert_eq!(forecast.len(), FORECAST_DAYS);
            assert_eq!(forecast[0].weather_type, WeatherCategory::Cloudy);
        }
    }

    #[test]
    fn test_walk_moves_at_most_one_step_per_day() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let forecast = project_with_rng(
                &mut rng,
                Weekday::Sat,
                conditions(WeatherCategory::Cloudy, 20.0),
            );
            let mut previous = WeatherCategory::Cloudy.forecast_index().unwrap();
            for day in &forecast {
                let index = day.weather_type.forecast_index().unwrap();
                assert!(index.abs_diff(previous) <= 1);
                previous = index;
            }
        }
    }

    fn draws(direction: Option<isize>, spread: f64, gap: f64, noise: f64) -> DayDraws {
        DayDraws {
            direction,
            spread,
            gap,
            noise,
        }
    }

    #[test]
    fn test_first_step_formulas() {
        let mut state = ForecastState {
            category_index: 3,
            temperature: 25.0,
        };
        let (category, high, low) = advance(&mut state, 0, &draws(None, 1.0, 0.5, 0.5));

        assert_eq!(category, WeatherCategory::FORECAST_ORDER[3]);
        // 25 + 1.0 * (1 + 0) + 0.2 * 0
        assert_eq!(high, 26.0);
        // 26 - (3 + 0.5 * 5)
        assert_eq!(low, 20.5);
        // 25 * 0.8 + 20 * 0.2 + 0.5
        assert!((state.temperature - 24.5).abs() < 1e-9);
    }

    #[test]
    fn test_last_step_formulas() {
        let mut state = ForecastState {
            category_index: 3,
            temperature: 10.0,
        };
        let (category, high, low) = advance(&mut state, 4, &draws(Some(1), -1.0, 0.0, -0.5));

        assert_eq!(category, WeatherCategory::FORECAST_ORDER[4]);
        // 10 - 1.0 * (1 + 0.5 * 4) + 0.2 * 4
        assert_eq!(high, 7.8);
        assert_eq!(low, 4.8);
        // 10 * 0.8 + 20 * 0.2 - 0.5
        assert!((state.temperature - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_reverts_toward_seasonal_mean() {
        for start in [-10.0, 5.0, 35.0] {
            let mut state = ForecastState {
                category_index: 0,
                temperature: start,
            };
            advance(&mut state, 1, &draws(None, 0.0, 0.0, 0.0));
            assert!((state.temperature - (0.8 * start + 4.0)).abs() < 1e-9);
        }
    }

    #[rstest]
    #[case(0.0, -1)]
    #[case(0.29, -1)]
    #[case(0.3, 0)]
    #[case(0.69, 0)]
    #[case(0.7, 1)]
    #[case(0.99, 1)]
    fn test_direction_bands(#[case] u: f64, #[case] expected: isize) {
        assert_eq!(direction_for(u), expected);
    }

    #[test]
    fn test_step_index_clamps_at_both_ends() {
        assert_eq!(step_index(7, 1), 7);
        assert_eq!(step_index(0, -1), 0);
        assert_eq!(step_index(2, 1), 3);
        assert_eq!(step_index(2, -1), 1);
        assert_eq!(step_index(5, 0), 5);
    }

    #[test]
    fn test_project_uses_default_rng() {
        let forecast = project(conditions(WeatherCategory::Snowy, -2.0));
        assert_eq!(forecast.len(), FORECAST_DAYS);
        let expected = day_names(Local::now().weekday());
        // The date can roll over between the two calls only at midnight
        if forecast[0].day == expected[0] {
            let names: Vec<&str> = forecast.iter().map(|d| d.day.as_str()).collect();
            assert_eq!(names, expected);
        }
    }
}
