//! Model fitting and hold-out evaluation

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use super::{WeatherClassifier, WeatherModel};
use crate::PredictorError;
use crate::config::ModelConfig;
use crate::models::TrainingRow;

/// A freshly fitted model together with its hold-out accuracy
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: WeatherModel,
    /// Share of held-out rows classified correctly, in `[0, 1]`
    pub accuracy: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Shuffle with `seed` and split off `ceil(len * test_fraction)` rows for testing.
///
/// Both sides get at least one row; fewer than two rows is an error.
pub fn train_test_split(
    rows: &[TrainingRow],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<TrainingRow>, Vec<TrainingRow>), PredictorError> {
    if rows.len() < 2 {
        return Err(PredictorError::model(format!(
            "Need at least 2 labelled rows to train, got {}",
            rows.len()
        )));
    }

    let mut shuffled = rows.to_vec();
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

    let test_len = ((rows.len() as f64) * test_fraction).ceil() as usize;
    let test_len = test_len.clamp(1, rows.len() - 1);
    let train = shuffled.split_off(test_len);
    Ok((train, shuffled))
}

/// Fit the scaler + kNN pipeline and score it on a held-out split
pub fn train_weather_model(
    rows: &[TrainingRow],
    config: &ModelConfig,
) -> Result<TrainingOutcome, PredictorError> {
    info!(
        samples = rows.len(),
        distribution = ?label_distribution(rows),
        "Training weather model"
    );

    let (train, test) = train_test_split(rows, config.test_fraction, config.seed)?;

    let samples: Vec<_> = train.iter().map(TrainingRow::features).collect();
    let labels = train.iter().map(|r| r.weather_type).collect();
    let model = WeatherModel::fit(config.neighbours, &samples, labels)?;

    let mut correct = 0usize;
    for row in &test {
        if model.predict(&row.features())?.category == row.weather_type {
            correct += 1;
        }
    }
    let accuracy = correct as f64 / test.len() as f64;
    info!("Model accuracy: {accuracy:.2}");

    Ok(TrainingOutcome {
        model,
        accuracy,
        train_rows: train.len(),
        test_rows: test.len(),
    })
}

fn label_distribution(rows: &[TrainingRow]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row.weather_type.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherCategory;

    fn row(temperature: f64, humidity: f64, weather_type: WeatherCategory) -> TrainingRow {
        TrainingRow {
            temperature,
            humidity,
            pressure: 1013.0,
            wind_speed: 5.0,
            precipitation: 0.0,
            weather_type,
        }
    }

    fn separable_rows() -> Vec<TrainingRow> {
        let mut rows = Vec::new();
        for i in 0..40 {
            let jitter = f64::from(i % 5) * 0.1;
            rows.push(row(30.0 + jitter, 40.0 + jitter, WeatherCategory::Sunny));
            rows.push(row(-5.0 - jitter, 90.0 - jitter, WeatherCategory::Snowy));
        }
        rows
    }

    #[test]
    fn test_split_sizes() {
        let rows = separable_rows();
        let (train, test) = train_test_split(&rows, 0.2, 42).unwrap();
        assert_eq!(test.len(), 16);
        assert_eq!(train.len(), 64);
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let rows = separable_rows();
        let a = train_test_split(&rows, 0.2, 42).unwrap();
        let b = train_test_split(&rows, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_keeps_both_sides_non_empty() {
        let rows = vec![
            row(20.0, 50.0, WeatherCategory::Cloudy),
            row(21.0, 55.0, WeatherCategory::Cloudy),
        ];
        let (train, test) = train_test_split(&rows, 0.9, 1).unwrap();
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn test_split_rejects_tiny_datasets() {
        let rows = vec![row(20.0, 50.0, WeatherCategory::Cloudy)];
        assert!(train_test_split(&rows, 0.2, 42).is_err());
        assert!(train_test_split(&[], 0.2, 42).is_err());
    }

    #[test]
    fn test_separable_data_scores_perfectly() {
        let config = ModelConfig {
            neighbours: 5,
            test_fraction: 0.25,
            seed: 7,
        };
        let outcome = train_weather_model(&separable_rows(), &config).unwrap();
        assert_eq!(outcome.accuracy, 1.0);
        assert_eq!(outcome.train_rows + outcome.test_rows, 80);

        let prediction = outcome
            .model
            .predict(&[28.0, 45.0, 1013.0, 5.0, 0.0])
            .unwrap();
        assert_eq!(prediction.category, WeatherCategory::Sunny);
    }
}
