//! Per-feature standardisation (zero mean, unit variance)

use serde::{Deserialize, Serialize};

use super::{FEATURE_COUNT, Features};
use crate::PredictorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Features,
    scale: Features,
}

impl StandardScaler {
    /// Learn mean and population standard deviation of each column.
    /// Constant columns get a scale of 1 so they pass through centred.
    pub fn fit(samples: &[Features]) -> Result<Self, PredictorError> {
        if samples.is_empty() {
            return Err(PredictorError::model("Cannot fit a scaler on zero samples"));
        }
        let n = samples.len() as f64;

        let mut mean = [0.0; FEATURE_COUNT];
        for sample in samples {
            for (m, x) in mean.iter_mut().zip(sample) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut scale = [0.0; FEATURE_COUNT];
        for sample in samples {
            for ((s, x), m) in scale.iter_mut().zip(sample).zip(&mean) {
                *s += (x - m).powi(2);
            }
        }
        for s in &mut scale {
            *s = (*s / n).sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    #[must_use]
    pub fn transform(&self, features: &Features) -> Features {
        std::array::from_fn(|i| (features[i] - self.mean[i]) / self.scale[i])
    }
}
