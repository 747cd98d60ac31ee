//! Normality tests for ANOVA residuals.
//!
//! Two tests are available and the choice between them is an explicit strategy
//! ([`NormalitySelection`]) rather than a branch buried in the caller: Shapiro-Wilk
//! for small and moderate samples, D'Agostino-Pearson K² for large ones. Both test
//! the null hypothesis that the sample was drawn from a normal distribution.

use crate::testing::utils::chi_squared_sf;
use crate::testing::{Degeneracy, TestResult};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Sample size from which the automatic selection switches to D'Agostino-Pearson.
pub const LARGE_SAMPLE_THRESHOLD: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalityTest {
    /// Shapiro-Wilk W test (Royston's approximation)
    ShapiroWilk,
    /// D'Agostino-Pearson omnibus K² test on skewness and kurtosis
    DAgostinoPearson,
}

impl NormalityTest {
    /// Smallest sample the test is defined for.
    pub fn min_observations(self) -> usize {
        match self {
            NormalityTest::ShapiroWilk => 3,
            NormalityTest::DAgostinoPearson => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NormalityTest::ShapiroWilk => "Shapiro-Wilk",
            NormalityTest::DAgostinoPearson => "D'Agostino-Pearson",
        }
    }

    /// Run the test on `data`.
    ///
    /// Too few observations or a constant sample give a NaN result carrying a
    /// degeneracy marker instead of an error.
    pub fn run(self, data: &[f64]) -> anyhow::Result<TestResult<f64>> {
        match self {
            NormalityTest::ShapiroWilk => shapiro_wilk(data),
            NormalityTest::DAgostinoPearson => dagostino_pearson(data),
        }
    }
}

/// How the normality test is picked for a given sample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalitySelection {
    /// Shapiro-Wilk below the threshold, D'Agostino-Pearson at or above it
    Auto { large_sample_threshold: usize },
    /// Always use the given test
    Fixed(NormalityTest),
}

impl Default for NormalitySelection {
    fn default() -> Self {
        NormalitySelection::Auto {
            large_sample_threshold: LARGE_SAMPLE_THRESHOLD,
        }
    }
}

impl NormalitySelection {
    pub fn select(&self, n: usize) -> NormalityTest {
        match *self {
            NormalitySelection::Auto {
                large_sample_threshold,
            } => {
                if n < large_sample_threshold {
                    NormalityTest::ShapiroWilk
                } else {
                    NormalityTest::DAgostinoPearson
                }
            }
            NormalitySelection::Fixed(test) => test,
        }
    }
}

fn insufficient(test: NormalityTest, n: usize) -> TestResult<f64> {
    TestResult::degenerate(Degeneracy::InsufficientObservations)
        .with_metadata("n", n as f64)
        .with_metadata("min_n", test.min_observations() as f64)
}

/// Shapiro-Wilk normality test.
///
/// Coefficients and the p-value transformation follow Royston (1992, 1995), AS R94:
/// Blom scores for the expected normal order statistics, polynomial corrections for
/// the two extreme coefficients, then a log-normal approximation of 1 - W. The
/// n = 3 case uses the exact distribution of W.
///
/// # Returns
///
/// `TestResult` with W as statistic. NaN values in `data` are ignored.
pub fn shapiro_wilk(data: &[f64]) -> anyhow::Result<TestResult<f64>> {
    let mut x: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = x.len();
    if n < NormalityTest::ShapiroWilk.min_observations() {
        return Ok(insufficient(NormalityTest::ShapiroWilk, n));
    }

    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    if x[n - 1] - x[0] <= 0.0 || ss <= 0.0 {
        return Ok(TestResult::degenerate(Degeneracy::ConstantResiduals)
            .with_metadata("n", n as f64));
    }

    let normal = Normal::new(0.0, 1.0)?;

    let (w, p_value) = if n == 3 {
        // Exact for n = 3: a = (-sqrt(1/2), 0, sqrt(1/2))
        let numerator = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
        let w = (numerator * numerator / ss).clamp(0.75, 1.0);
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - (0.75f64).sqrt().asin());
        (w, p.clamp(0.0, 1.0))
    } else {
        let a = sw_coefficients(n, &normal);
        let nn2 = n / 2;
        let numerator: f64 = (0..nn2).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
        let w = (numerator * numerator / ss).min(1.0);
        (w, sw_p_value(w, n, &normal))
    };

    Ok(TestResult::new(w, p_value).with_metadata("n", n as f64))
}

// Royston polynomial coefficients (AS R94)
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

// c[0] + c[1]*x + c[2]*x^2 + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &coef| acc * x + coef)
}

fn sw_coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    let nn2 = n / 2;
    let nf = n as f64;

    let m: Vec<f64> = (0..nn2)
        .map(|i| normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; nn2];
    a[0] = poly(&SW_C1, rsn) - m[0] / ssumm2;

    // n = 4, 5 correct only the outermost coefficient
    let corrected = if n > 5 { 2 } else { 1 };
    if corrected == 2 {
        a[1] = -m[1] / ssumm2 + poly(&SW_C2, rsn);
    }

    let fac_sq = summ2 - 2.0 * m[..corrected].iter().map(|v| v * v).sum::<f64>();
    let one_minus = 1.0 - 2.0 * a[..corrected].iter().map(|v| v * v).sum::<f64>();
    let fac = (fac_sq / one_minus).sqrt();
    for i in corrected..nn2 {
        a[i] = -m[i] / fac;
    }

    a
}

fn sw_p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let m = poly(&SW_C3, nf);
        let s = poly(&SW_C4, nf).exp();
        (y2 - m) / s
    } else {
        let xx = nf.ln();
        let m = poly(&SW_C5, xx);
        let s = poly(&SW_C6, xx).exp();
        (y - m) / s
    };

    normal.sf(z).clamp(0.0, 1.0)
}

/// D'Agostino-Pearson K² omnibus normality test.
///
/// Combines the z-scores of the skewness test and the Anscombe-Glynn kurtosis
/// test, K² = Z_s² + Z_k², referred to a chi-squared distribution with 2 degrees
/// of freedom. Moments are the biased sample moments.
///
/// # Returns
///
/// `TestResult` with K² as statistic and `z_skewness`, `z_kurtosis` in the metadata.
pub fn dagostino_pearson(data: &[f64]) -> anyhow::Result<TestResult<f64>> {
    let x: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = x.len();
    if n < NormalityTest::DAgostinoPearson.min_observations() {
        return Ok(insufficient(NormalityTest::DAgostinoPearson, n));
    }

    let nf = n as f64;
    let mean = x.iter().sum::<f64>() / nf;
    let (m2, m3, m4) = x.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), &v| {
        let d = v - mean;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / nf, m3 / nf, m4 / nf);
    if m2 <= 0.0 {
        return Ok(TestResult::degenerate(Degeneracy::ConstantResiduals)
            .with_metadata("n", nf));
    }

    let skewness = m3 / m2.powf(1.5);
    let kurtosis = m4 / (m2 * m2);

    let z_skew = skewness_z(skewness, nf);
    let z_kurt = kurtosis_z(kurtosis, nf);
    let k2 = z_skew * z_skew + z_kurt * z_kurt;
    let p_value = chi_squared_sf(k2, 2.0);

    Ok(TestResult::new(k2, p_value)
        .with_degrees_of_freedom(2.0)
        .with_metadata("n", nf)
        .with_metadata("z_skewness", z_skew)
        .with_metadata("z_kurtosis", z_kurt))
}

// D'Agostino (1970) transformation of sample skewness to a standard normal score
fn skewness_z(b1: f64, n: f64) -> f64 {
    let y = b1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    delta * (y / alpha).asinh()
}

// Anscombe-Glynn (1983) transformation of sample kurtosis to a standard normal score
fn kurtosis_z(b2: f64, n: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}
