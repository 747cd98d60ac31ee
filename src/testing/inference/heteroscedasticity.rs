//! Breusch-Pagan test for heteroscedasticity.
//!
//! Squared residuals are regressed on a single regressor (for one-way ANOVA, the
//! fitted group mean of each observation). Under constant variance the slope is
//! zero, and the studentized (Koenker) statistic LM = n·R² follows a chi-squared
//! distribution with one degree of freedom.

use crate::testing::inference::parametric::f_distribution_sf;
use crate::testing::utils::chi_squared_sf;
use crate::testing::{Degeneracy, TestResult};

// Regressor spread at or below this fraction of its raw sum of squares is treated as none
const CONSTANT_REGRESSOR_TOLERANCE: f64 = 1e-12;

/// Breusch-Pagan test of `residuals` against one `regressor`.
///
/// # Returns
///
/// `TestResult` with the LM statistic, its chi-squared p-value, one degree of freedom,
/// and metadata `r_squared`, `slope`, `f_statistic`, `f_p_value`. A constant regressor
/// gives LM = 0 and p = 1 with the `ConstantRegressor` marker; constant squared
/// residuals give NaN with the `ConstantResiduals` marker.
///
/// # Errors
///
/// Fails when the two slices differ in length.
pub fn breusch_pagan(residuals: &[f64], regressor: &[f64]) -> anyhow::Result<TestResult<f64>> {
    if residuals.len() != regressor.len() {
        return Err(anyhow::anyhow!(
            "Residuals ({}) and regressor ({}) must have the same length",
            residuals.len(),
            regressor.len()
        ));
    }

    let n = residuals.len();
    if n < 3 {
        return Ok(TestResult::degenerate(Degeneracy::InsufficientObservations)
            .with_metadata("n", n as f64));
    }
    let nf = n as f64;

    let squared: Vec<f64> = residuals.iter().map(|e| e * e).collect();
    let mean_u = squared.iter().sum::<f64>() / nf;
    let mean_x = regressor.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    let mut raw_xx = 0.0;
    for (&u, &x) in squared.iter().zip(regressor) {
        let dx = x - mean_x;
        let du = u - mean_u;
        sxx += dx * dx;
        sxy += dx * du;
        syy += du * du;
        raw_xx += x * x;
    }

    if syy <= 0.0 {
        return Ok(TestResult::degenerate(Degeneracy::ConstantResiduals)
            .with_degrees_of_freedom(1.0)
            .with_metadata("n", nf));
    }

    if sxx <= CONSTANT_REGRESSOR_TOLERANCE * raw_xx.max(f64::MIN_POSITIVE) {
        return Ok(TestResult::new(0.0, 1.0)
            .with_degrees_of_freedom(1.0)
            .with_degeneracy(Degeneracy::ConstantRegressor)
            .with_metadata("n", nf)
            .with_metadata("r_squared", 0.0));
    }

    let r_squared = (sxy * sxy / (sxx * syy)).clamp(0.0, 1.0);
    let lm = nf * r_squared;
    let p_value = chi_squared_sf(lm, 1.0);

    let df_resid = nf - 2.0;
    let f_stat = r_squared / ((1.0 - r_squared) / df_resid);
    let f_p_value = f_distribution_sf(f_stat, 1.0, df_resid);

    Ok(TestResult::new(lm, p_value)
        .with_degrees_of_freedom(1.0)
        .with_metadata("n", nf)
        .with_metadata("r_squared", r_squared)
        .with_metadata("slope", sxy / sxx)
        .with_metadata("f_statistic", f_stat)
        .with_metadata("f_p_value", f_p_value))
}
