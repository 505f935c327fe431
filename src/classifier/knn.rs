//! k-nearest-neighbour classifier over (already scaled) feature vectors

use serde::{Deserialize, Serialize};

use super::{ClassPrediction, Features};
use crate::PredictorError;
use crate::models::WeatherCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNearestClassifier {
    k: usize,
    samples: Vec<Features>,
    labels: Vec<WeatherCategory>,
}

impl KNearestClassifier {
    pub fn fit(
        k: usize,
        samples: Vec<Features>,
        labels: Vec<WeatherCategory>,
    ) -> Result<Self, PredictorError> {
        if k == 0 {
            return Err(PredictorError::model("k must be at least 1"));
        }
        if samples.is_empty() {
            return Err(PredictorError::model("Cannot fit a classifier on zero samples"));
        }
        if samples.len() != labels.len() {
            return Err(PredictorError::model(format!(
                "Sample/label length mismatch: {} vs {}",
                samples.len(),
                labels.len()
            )));
        }
        Ok(Self { k, samples, labels })
    }

    /// Majority vote among the `k` nearest samples (Euclidean distance).
    ///
    /// Probability is the winning share of votes. Ties go to the class whose
    /// closest member is nearest. A classifier with no usable neighbours
    /// (possible only for a decoded model that bypassed `fit`) is an error.
    pub fn predict(&self, features: &Features) -> Result<ClassPrediction, PredictorError> {
        let mut neighbours: Vec<(f64, WeatherCategory)> = self
            .samples
            .iter()
            .zip(&self.labels)
            .map(|(sample, label)| (squared_distance(sample, features), *label))
            .collect();
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbours.truncate(self.k);

        // (category, votes) in order of first appearance, i.e. by proximity
        let mut votes: Vec<(WeatherCategory, usize)> = Vec::new();
        for (_, label) in &neighbours {
            match votes.iter_mut().find(|(c, _)| c == label) {
                Some((_, count)) => *count += 1,
                None => votes.push((*label, 1)),
            }
        }

        let Some(&(_, nearest)) = neighbours.first() else {
            return Err(PredictorError::model(format!(
                "Classifier has no neighbours to vote (k = {}, {} samples)",
                self.k,
                self.samples.len()
            )));
        };
        let (category, count) = votes
            .iter()
            .fold((nearest, 0), |best, &(c, n)| if n > best.1 { (c, n) } else { best });

        Ok(ClassPrediction {
            category,
            probability: count as f64 / neighbours.len() as f64,
        })
    }
}

fn squared_distance(a: &Features, b: &Features) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
