//! Single-shot differential privacy noise on one numeric attribute.
//!
//! Two named mechanisms are provided and they are not interchangeable:
//!
//! * [`NoiseMechanism::Laplace`] draws from Laplace(0, b) with
//!   `b = sensitivity / epsilon`, which gives pure epsilon-DP for an
//!   L1 sensitivity.
//! * [`NoiseMechanism::Gaussian`] draws from N(0, sigma^2) with
//!   `sigma = sensitivity * sqrt(2 ln(1.25 / delta)) / epsilon`, which gives
//!   (epsilon, delta)-DP for an L2 sensitivity when `epsilon < 1`.

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::stats::{NoiseSummary, WelfordStats};
use crate::table::{Column, Table};
use crate::types::{ColumnType, Result, Value};

/// Noise distribution used to perturb values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum NoiseMechanism {
    #[default]
    Laplace,
    Gaussian { delta: f64 },
}

impl NoiseMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            NoiseMechanism::Laplace => "laplace",
            NoiseMechanism::Gaussian { .. } => "gaussian",
        }
    }

    /// Reject parameters outside the mechanism's privacy analysis
    pub fn validate(&self, epsilon: f64, sensitivity: f64) -> Result<()> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::configuration(format!(
                "epsilon must be a positive finite number, got {}",
                epsilon
            )));
        }
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(Error::configuration(format!(
                "sensitivity must be a positive finite number, got {}",
                sensitivity
            )));
        }
        if let NoiseMechanism::Gaussian { delta } = self {
            if !(*delta > 0.0 && *delta < 1.0) {
                return Err(Error::configuration(format!(
                    "gaussian delta must lie in (0, 1), got {}",
                    delta
                )));
            }
            if epsilon >= 1.0 {
                return Err(Error::configuration(format!(
                    "gaussian mechanism requires epsilon < 1, got {}",
                    epsilon
                )));
            }
        }
        Ok(())
    }

    /// Spread parameter: Laplace `b` or Gaussian `sigma`
    pub fn scale(&self, epsilon: f64, sensitivity: f64) -> f64 {
        match self {
            NoiseMechanism::Laplace => sensitivity / epsilon,
            NoiseMechanism::Gaussian { delta } => {
                sensitivity * (2.0 * (1.25 / delta).ln()).sqrt() / epsilon
            }
        }
    }

    /// Draw one zero-mean sample with the given spread
    pub fn sample<R: Rng + ?Sized>(&self, scale: f64, rng: &mut R) -> f64 {
        match self {
            NoiseMechanism::Laplace => loop {
                // inverse CDF; u = -0.5 would hit ln(0), so draw again
                let u: f64 = rng.random::<f64>() - 0.5;
                let tail = 1.0 - 2.0 * u.abs();
                if tail > 0.0 {
                    break -scale * u.signum() * tail.ln();
                }
            },
            NoiseMechanism::Gaussian { .. } => {
                // Box-Muller, u1 in (0, 1]
                let u1 = 1.0 - rng.random::<f64>();
                let u2: f64 = rng.random();
                scale * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
            }
        }
    }
}

/// Add independent noise to every value of `attribute`.
///
/// Values must be finite numbers (integer, float or numeric text); NaN and
/// infinities are domain errors. The output column holds floats. The generator is always supplied by the caller.
pub fn add_noise<R: Rng + ?Sized>(
    table: &Table,
    attribute: &str,
    epsilon: f64,
    sensitivity: f64,
    mechanism: &NoiseMechanism,
    rng: &mut R,
) -> Result<Table> {
    add_noise_with_summary(table, attribute, epsilon, sensitivity, mechanism, rng).map(|(t, _)| t)
}

/// Same as [`add_noise`], also returning statistics of the applied noise
pub fn add_noise_with_summary<R: Rng + ?Sized>(
    table: &Table,
    attribute: &str,
    epsilon: f64,
    sensitivity: f64,
    mechanism: &NoiseMechanism,
    rng: &mut R,
) -> Result<(Table, NoiseSummary)> {
    mechanism.validate(epsilon, sensitivity)?;
    let index = table.column_index(attribute)?;
    let scale = mechanism.scale(epsilon, sensitivity);

    let mut perturbation = WelfordStats::new();
    let mut noisy = Vec::with_capacity(table.len());
    for record in table.records() {
        let value = &record.values()[index];
        let x = value
            .as_f64()
            .ok_or_else(|| Error::domain(attribute, value, "is not a finite number"))?;
        let noise = mechanism.sample(scale, rng);
        perturbation.update(noise);
        noisy.push(Value::Float(x + noise));
    }

    let summary = NoiseSummary::new(attribute, mechanism.name(), scale, &perturbation);
    tracing::debug!(
        attribute,
        mechanism = mechanism.name(),
        scale,
        mean_noise = ?summary.mean_noise,
        "added noise"
    );

    let column = Column::new(attribute, ColumnType::Numeric).with_role(table.columns()[index].role);
    let table = table.with_column_replaced(index, column, noisy)?;
    Ok((table, summary))
}
