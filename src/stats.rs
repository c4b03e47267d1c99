use serde::Serialize;

/// Welford's online algorithm for computing mean and variance in O(1) memory
#[derive(Debug, Clone)]
pub struct WelfordStats {
    count: u64,
    mean: f64,
    m2: f64, // Sum of squares of differences from current mean
    min: Option<f64>,
    max: Option<f64>,
}

impl WelfordStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: None,
            max: None,
        }
    }

    /// Add a new value to the running statistics
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.mean)
        } else {
            None
        }
    }

    pub fn variance(&self) -> Option<f64> {
        if self.count > 1 {
            Some(self.m2 / (self.count - 1) as f64)
        } else {
            None
        }
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(|v| v.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

impl Default for WelfordStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Utility summary of one noise stage: how far values were moved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseSummary {
    pub attribute: String,
    pub mechanism: String,
    /// Laplace `b` or Gaussian `sigma`
    pub scale: f64,
    pub records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_noise: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_std_dev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_abs_noise: Option<f64>,
}

impl NoiseSummary {
    pub fn new(attribute: &str, mechanism: &str, scale: f64, stats: &WelfordStats) -> Self {
        let max_abs_noise = match (stats.min(), stats.max()) {
            (Some(lo), Some(hi)) => Some(lo.abs().max(hi.abs())),
            _ => None,
        };
        Self {
            attribute: attribute.to_string(),
            mechanism: mechanism.to_string(),
            scale,
            records: stats.count(),
            mean_noise: stats.mean(),
            noise_std_dev: stats.std_dev(),
            max_abs_noise,
        }
    }
}
