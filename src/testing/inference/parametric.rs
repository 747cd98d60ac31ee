//! Parametric tests built on the F distribution.
//!
//! The one-way ANOVA F-test is evaluated directly from the sum-of-squares
//! partition, so the observations themselves never need to be revisited once
//! the decomposition is done.

use crate::testing::effect::{eta_squared, omega_squared};
use crate::testing::{Degeneracy, TestResult};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Error sums of squares at or below this fraction of the total count as zero.
const ZERO_ERROR_TOLERANCE: f64 = 1e-12;

/// Perform the one-way ANOVA F-test from a precomputed sum-of-squares partition.
///
/// # Arguments
///
/// * `ss_total`, `ss_model`, `ss_error` - Total, between-group and within-group sums of squares
/// * `df_model`, `df_error` - Degrees of freedom k - 1 and n - k
///
/// # Returns
///
/// `TestResult` whose statistic is F, whose effect size is eta-squared, and whose
/// metadata holds `omega_squared`, `df_model`, `df_error`, `ms_model` and `ms_error`.
/// Zero error variance or zero error degrees of freedom leave the raw (non-finite)
/// statistic in place and set the degeneracy marker. Rounding noise is clipped so
/// that `0 <= ss_model <= ss_total` and `ss_error >= 0`.
pub fn f_test_from_sums(
    ss_total: f64,
    ss_model: f64,
    ss_error: f64,
    df_model: f64,
    df_error: f64,
) -> TestResult<f64> {
    let ss_total = ss_total.max(0.0);
    let ss_model = ss_model.clamp(0.0, ss_total);
    let ss_error = ss_error.max(0.0);

    let ms_model = ss_model / df_model;
    let ms_error = ss_error / df_error;
    let f_stat = ms_model / ms_error;
    let eta_2 = eta_squared(ss_model, ss_total);
    let omega_2 = omega_squared(ss_model, ss_total, df_model, ms_error);

    let degeneracy = if df_error <= 0.0 {
        Some(Degeneracy::ZeroErrorDegreesOfFreedom)
    } else if ss_total <= 0.0 {
        Some(Degeneracy::ZeroTotalVariance)
    } else if ss_error <= ss_total * ZERO_ERROR_TOLERANCE {
        Some(Degeneracy::ZeroErrorVariance)
    } else {
        None
    };

    let p_value = match degeneracy {
        Some(Degeneracy::ZeroErrorDegreesOfFreedom) => f64::NAN,
        _ => f_distribution_sf(f_stat, df_model, df_error),
    };

    let result = TestResult::with_effect_size(f_stat, p_value, eta_2)
        .with_degrees_of_freedom(df_model)
        .with_metadata("df_model", df_model)
        .with_metadata("df_error", df_error)
        .with_metadata("ms_model", ms_model)
        .with_metadata("ms_error", ms_error)
        .with_metadata("omega_squared", omega_2);

    match degeneracy {
        Some(reason) => result.with_degeneracy(reason),
        None => result,
    }
}

/// Upper-tail probability P(F > f_stat) for the F distribution with (d1, d2) degrees of freedom.
///
/// Returns NaN when the distribution is undefined for the given degrees of freedom or
/// the statistic itself is NaN.
pub fn f_distribution_sf(f_stat: f64, d1: f64, d2: f64) -> f64 {
    if f_stat.is_nan() {
        return f64::NAN;
    }
    if f_stat == f64::INFINITY {
        return 0.0;
    }
    if f_stat <= 0.0 {
        return 1.0;
    }

    match FisherSnedecor::new(d1, d2) {
        Ok(f_dist) => f_dist.sf(f_stat),
        Err(_) => f64::NAN,
    }
}
